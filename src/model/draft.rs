//! Retrospective log drafts and the log workflow's persisted state.

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExerciseEntry, WorkoutType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftStatus {
    Drafting,
    AwaitingConfirmation,
    Approved,
    Cancelled,
}

/// The extractor's reading of the user's notes, pending confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    /// The notes as first submitted. Never rewritten.
    pub raw_input: String,

    /// Edit instructions, oldest first. Each re-parse sees all of them.
    pub corrections: Vec<String>,

    /// `None` until parsed, and after a failed extraction.
    pub exercises: Option<Vec<ExerciseEntry>>,

    pub workout_type: WorkoutType,
    pub status: DraftStatus,

    /// Extraction found nothing; the user should rephrase or edit.
    pub needs_clarification: bool,

    pub confidence: Option<f32>,
}

impl WorkoutDraft {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            corrections: Vec::new(),
            exercises: None,
            workout_type: WorkoutType::Other,
            status: DraftStatus::Drafting,
            needs_clarification: false,
            confidence: None,
        }
    }

    /// The text handed to the extractor: original notes plus corrections.
    pub fn extraction_input(&self) -> String {
        let mut text = self.raw_input.clone();
        for correction in &self.corrections {
            text.push_str("\n\nCorrection: ");
            text.push_str(correction);
        }
        text
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum LogPhase {
    Parsing,
    AwaitingConfirmation,
    Saving,
    Done { outcome: LogOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum LogOutcome {
    Saved { record_id: String },
    Cancelled,
}

/// One retrospective log attempt, persisted between confirmation steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogState {
    pub handle: Uuid,
    pub phase: LogPhase,
    pub draft: WorkoutDraft,

    /// The day the workout is recorded against.
    pub date: Date,
    pub started_at: Timestamp,
}

impl LogState {
    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            LogPhase::Parsing => "parsing",
            LogPhase::AwaitingConfirmation => "awaiting_confirmation",
            LogPhase::Saving => "saving",
            LogPhase::Done { .. } => "done",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, LogPhase::Done { .. })
    }
}
