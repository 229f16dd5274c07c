//! Live guided sessions.
//!
//! ```text
//! recording ──record/skip──▶ (suggest) ──exercise──▶ recording
//!                                └──plan complete──▶ plan_complete
//! plan_complete ──continue──▶ recording (adaptive)
//! plan_complete ──finish──▶ saving ──saved──▶ done
//! any open state ──cancel──▶ done
//! ```
//!
//! Planning and suggesting happen inside a single request, so they are
//! effects rather than persisted phases. A `different` exercise is logged
//! without consuming the planned slot; nothing about a deviation blocks
//! saving.

use std::collections::BTreeSet;

use jiff::{Timestamp, civil::Date};
use log::debug;

use crate::{
    catalog::{Catalog, normalize_equipment},
    deviation::DeviationDetector,
    model::{
        DeviationRecord, ExerciseEntry, NextStep, SessionOutcome, SessionPhase, SessionState,
        SessionSummary, SuggestionSource, Workout,
    },
    planner,
};

use super::{Result, TransitionError};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// The suggestion engine answered.
    Suggested(NextStep),
    Record(ExerciseEntry),
    Skip,
    ExcludeEquipment(Vec<String>),
    Finish,
    Continue,
    Cancel,
    Retry,
    Saved { record_id: String },
}

impl SessionSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Suggested(_) => "suggest",
            Self::Record(_) => "record",
            Self::Skip => "skip",
            Self::ExcludeEquipment(_) => "exclude equipment",
            Self::Finish => "finish",
            Self::Continue => "continue",
            Self::Cancel => "cancel",
            Self::Retry => "retry",
            Self::Saved { .. } => "save",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    None,
    Suggest(SuggestionSource),
    Save(Workout),
}

/// What a transition may consult besides the state itself.
pub struct SessionContext<'a> {
    pub catalog: &'a Catalog,
    pub now: Timestamp,

    /// The date a finished session is recorded against.
    pub today: Date,
}

pub fn step(
    mut state: SessionState,
    signal: SessionSignal,
    ctx: &SessionContext<'_>,
) -> Result<(SessionState, SessionEffect)> {
    if !state.is_open() {
        return Err(TransitionError::Closed);
    }
    let invalid = |state: &SessionState, signal: &SessionSignal| TransitionError::InvalidSignal {
        state: state.phase_name(),
        signal: signal.name(),
    };

    let bonus_mode = state.plan_complete;
    let effect = match (state.phase.clone(), signal) {
        (SessionPhase::Recording { .. }, SessionSignal::Suggested(next)) => {
            state.phase = match next {
                NextStep::Exercise(suggestion) => SessionPhase::Recording {
                    suggestion: Some(suggestion),
                },
                NextStep::PlanComplete(signal) => {
                    state.plan_complete = true;
                    SessionPhase::PlanComplete { signal }
                }
                NextStep::PoolExhausted => SessionPhase::Recording { suggestion: None },
            };
            SessionEffect::None
        }

        (SessionPhase::Recording { .. }, SessionSignal::Record(entry)) => {
            record(&mut state, entry, ctx.catalog);
            SessionEffect::Suggest(source_for(&state))
        }

        (SessionPhase::Recording { .. }, SessionSignal::Skip) if !bonus_mode => {
            if state.current_planned().is_none() {
                return Err(invalid(&state, &SessionSignal::Skip));
            }
            state.skipped.push(state.current_plan_index);
            state.current_plan_index += 1;
            SessionEffect::Suggest(SuggestionSource::Plan)
        }

        (
            phase @ (SessionPhase::Recording { .. } | SessionPhase::PlanComplete { .. }),
            SessionSignal::ExcludeEquipment(items),
        ) => {
            let added: BTreeSet<String> = items.iter().map(|i| normalize_equipment(i)).collect();
            state.equipment_unavailable.extend(added);
            if !bonus_mode {
                let from = state.current_plan_index;
                let adapted = planner::adapt_remaining(
                    &mut state.planned_template,
                    from,
                    &state.equipment_unavailable,
                    ctx.catalog,
                );
                debug!("excluding equipment adapted {adapted} remaining exercise(s)");
            }
            match phase {
                SessionPhase::Recording { .. } => SessionEffect::Suggest(source_for(&state)),
                _ => SessionEffect::None,
            }
        }

        (SessionPhase::PlanComplete { .. }, SessionSignal::Finish)
        | (SessionPhase::Recording { .. }, SessionSignal::Finish)
            if state.plan_complete =>
        {
            if state.accumulated_exercises.is_empty() {
                return Err(TransitionError::EmptyWorkout);
            }
            state.phase = SessionPhase::Saving;
            SessionEffect::Save(session_workout(&state, ctx))
        }

        (SessionPhase::PlanComplete { .. }, SessionSignal::Continue) => {
            state.phase = SessionPhase::Recording { suggestion: None };
            SessionEffect::Suggest(SuggestionSource::Adaptive)
        }

        (_, SessionSignal::Cancel) => {
            state.phase = SessionPhase::Done {
                outcome: SessionOutcome::Cancelled,
            };
            SessionEffect::None
        }

        (SessionPhase::Saving, SessionSignal::Retry) => {
            SessionEffect::Save(session_workout(&state, ctx))
        }

        (SessionPhase::Saving, SessionSignal::Saved { record_id }) => {
            state.saved = true;
            state.record_id = Some(record_id.clone());
            state.phase = SessionPhase::Done {
                outcome: SessionOutcome::Saved { record_id },
            };
            SessionEffect::None
        }

        (_, signal) => return Err(invalid(&state, &signal)),
    };

    state.last_activity_at = ctx.now;
    Ok((state, effect))
}

/// Where the next suggestion should come from.
fn source_for(state: &SessionState) -> SuggestionSource {
    if state.plan_complete {
        SuggestionSource::Adaptive
    } else {
        SuggestionSource::Plan
    }
}

/// Appends a performed exercise, classifying it against the plan.
///
/// After the plan is complete entries are bonus work and are not compared.
fn record(state: &mut SessionState, mut entry: ExerciseEntry, catalog: &Catalog) {
    entry.name = catalog.canonical_name(&entry.name);

    match state.current_planned().filter(|_| !state.plan_complete) {
        Some(planned) => {
            let kind = DeviationDetector::new(catalog).classify(planned, &entry.name);
            state.deviations.push(DeviationRecord {
                plan_index: state.current_plan_index,
                planned: planned.name.clone(),
                performed: entry.name.clone(),
                kind,
            });
            state.recording_mode = state.recording_mode.max(kind);
            if kind.consumes_slot() {
                state.current_plan_index += 1;
            }
        }
        None => state.bonus_exercises += 1,
    }
    state.accumulated_exercises.push(entry);
}

/// The finished session as a workout. The session id is its source id.
fn session_workout(state: &SessionState, ctx: &SessionContext<'_>) -> Workout {
    let plan = &state.planned_template;
    let performed = |name: &str| {
        state
            .accumulated_exercises
            .iter()
            .any(|e| ctx.catalog.same_exercise(&e.name, name))
    };
    let skipped = state
        .skipped
        .iter()
        .filter_map(|&i| plan.exercises.get(i))
        .map(|e| e.name.clone())
        .filter(|name| !performed(name))
        .collect();

    Workout {
        source_id: state.session_id,
        date: ctx.today,
        workout_type: plan.workout_type,
        exercises: state.accumulated_exercises.clone(),
        notes: None,
        session: Some(SessionSummary {
            session_id: state.session_id,
            planned_template_id: plan.template_id.clone(),
            suggested_type: plan.workout_type,
            suggestion_reason: plan.reason.clone(),
            adaptations: plan.adaptations.clone(),
            deviations: state.deviations.clone(),
            skipped,
            equipment_unavailable: state.equipment_unavailable.iter().cloned().collect(),
            recording_mode: state.recording_mode,
            bonus_exercises: state.bonus_exercises,
        }),
    }
}
