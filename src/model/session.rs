//! Live session state: the single mutable aggregate for a guided workout.

use std::collections::BTreeSet;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExerciseEntry, PlanComplete, PlannedExercise, PlannedTemplate, Suggestion};

/// How a performed exercise relates to the planned one.
///
/// Ordered from closest to furthest, so the session's recording mode
/// is the maximum seen so far.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Deviation {
    /// Same exercise after normalization.
    #[default]
    Exact,

    /// A known substitute or equipment variant of the planned exercise.
    Modified,

    /// Unrelated. Logged as an addition; the planned slot stays open.
    Different,
}

impl Deviation {
    /// Whether this classification consumes the planned slot.
    pub fn consumes_slot(self) -> bool {
        matches!(self, Self::Exact | Self::Modified)
    }
}

/// One plan-versus-actual comparison made while recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationRecord {
    pub plan_index: usize,
    pub planned: String,
    pub performed: String,
    pub kind: Deviation,
}

/// Where a session stands between requests.
///
/// `initializing` and `suggesting` run inside a single request and are
/// never persisted, so they have no variant here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SessionPhase {
    /// Waiting for the user to report what they performed.
    Recording { suggestion: Option<Suggestion> },

    /// The plan is exhausted. Waiting for finish or continue.
    PlanComplete { signal: PlanComplete },

    /// A save was attempted and has not yet succeeded.
    Saving,

    /// Terminal.
    Done { outcome: SessionOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SessionOutcome {
    Saved { record_id: String },
    Cancelled,
}

/// The full state of a live session, persisted between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: Uuid,
    pub planned_template: PlannedTemplate,

    /// Next planned slot. Only exact or modified entries and skips move it.
    pub current_plan_index: usize,

    /// Append-only.
    pub accumulated_exercises: Vec<ExerciseEntry>,

    pub equipment_unavailable: BTreeSet<String>,
    pub recording_mode: Deviation,

    /// Set when the plan is first exhausted. Never reset.
    pub plan_complete: bool,

    pub saved: bool,

    /// Set once the record write has committed.
    pub record_id: Option<String>,

    pub phase: SessionPhase,
    pub deviations: Vec<DeviationRecord>,

    /// Plan slots the user chose to skip.
    pub skipped: Vec<usize>,

    /// Entries recorded after the plan was complete.
    pub bonus_exercises: usize,

    pub started_at: Timestamp,
    pub last_activity_at: Timestamp,
}

impl SessionState {
    /// Whether the session still accepts steps.
    pub fn is_open(&self) -> bool {
        !self.saved && !matches!(self.phase, SessionPhase::Done { .. })
    }

    pub fn total_planned(&self) -> usize {
        self.planned_template.exercises.len()
    }

    /// Planned slots consumed by an actual entry (skips excluded).
    pub fn total_completed(&self) -> usize {
        self.current_plan_index
            .min(self.total_planned())
            .saturating_sub(self.skipped.len())
    }

    /// The planned exercise at the current index, if any remain.
    pub fn current_planned(&self) -> Option<&PlannedExercise> {
        self.planned_template.exercises.get(self.current_plan_index)
    }

    pub fn plan_complete_signal(&self) -> PlanComplete {
        PlanComplete {
            total_planned: self.total_planned(),
            total_completed: self.total_completed(),
        }
    }

    /// Short label for the current phase, used in errors and output.
    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            SessionPhase::Recording { .. } => "recording",
            SessionPhase::PlanComplete { .. } => "plan_complete",
            SessionPhase::Saving => "saving",
            SessionPhase::Done { .. } => "done",
        }
    }
}
