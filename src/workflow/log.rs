//! Retrospective logging: parse, confirm, save.
//!
//! ```text
//! parsing ──parsed──▶ awaiting_confirmation ──approve──▶ saving ──saved──▶ done
//!    ▲                   │        │                        │ ▲
//!    └──────edit─────────┘        └──cancel──▶ done         └─┘ retry
//! ```
//!
//! Nothing reaches `saving` without an explicit approve. An edit throws the
//! parsed draft away and re-extracts from the original notes plus every
//! correction so far.

use crate::{
    extract::{Extraction, ExtractionFailed},
    model::{DraftStatus, LogOutcome, LogPhase, LogState, Workout, WorkoutDraft},
};

use super::{Result, TransitionError};

#[derive(Debug, Clone, PartialEq)]
pub enum LogSignal {
    /// The extractor finished.
    Parsed(core::result::Result<Extraction, ExtractionFailed>),
    Approve,
    Edit(String),
    Cancel,
    /// Re-attempt a failed save.
    Retry,
    /// The store accepted the workout.
    Saved { record_id: String },
}

impl LogSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parsed(_) => "parse",
            Self::Approve => "approve",
            Self::Edit(_) => "edit",
            Self::Cancel => "cancel",
            Self::Retry => "retry",
            Self::Saved { .. } => "save",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogEffect {
    None,
    /// Run the extractor over this text.
    Extract(String),
    Save(Workout),
}

pub fn step(mut state: LogState, signal: LogSignal) -> Result<(LogState, LogEffect)> {
    let invalid = |state: &LogState, signal: &LogSignal| TransitionError::InvalidSignal {
        state: state.phase_name(),
        signal: signal.name(),
    };

    let effect = match (state.phase.clone(), signal) {
        (LogPhase::Done { .. }, _) => return Err(TransitionError::Closed),

        (LogPhase::Parsing, LogSignal::Parsed(result)) => {
            apply_extraction(&mut state.draft, result);
            state.phase = LogPhase::AwaitingConfirmation;
            LogEffect::None
        }

        (LogPhase::AwaitingConfirmation, LogSignal::Approve) => {
            if state.draft.exercise_count() == 0 {
                return Err(TransitionError::EmptyWorkout);
            }
            state.draft.status = DraftStatus::Approved;
            state.phase = LogPhase::Saving;
            LogEffect::Save(workout_from(&state))
        }

        (LogPhase::AwaitingConfirmation, LogSignal::Edit(text)) => {
            let mut draft = WorkoutDraft::new(state.draft.raw_input.clone());
            draft.corrections = std::mem::take(&mut state.draft.corrections);
            draft.corrections.push(text);
            let input = draft.extraction_input();
            state.draft = draft;
            state.phase = LogPhase::Parsing;
            LogEffect::Extract(input)
        }

        (LogPhase::AwaitingConfirmation, LogSignal::Cancel) => {
            state.draft.status = DraftStatus::Cancelled;
            state.phase = LogPhase::Done {
                outcome: LogOutcome::Cancelled,
            };
            LogEffect::None
        }

        (LogPhase::Saving, LogSignal::Retry) => LogEffect::Save(workout_from(&state)),

        (LogPhase::Saving, LogSignal::Saved { record_id }) => {
            state.phase = LogPhase::Done {
                outcome: LogOutcome::Saved { record_id },
            };
            LogEffect::None
        }

        (_, signal) => return Err(invalid(&state, &signal)),
    };
    Ok((state, effect))
}

fn apply_extraction(
    draft: &mut WorkoutDraft,
    result: core::result::Result<Extraction, ExtractionFailed>,
) {
    draft.status = DraftStatus::AwaitingConfirmation;
    match result {
        Ok(extraction) => {
            draft.exercises = Some(extraction.exercises);
            draft.workout_type = extraction.workout_type;
            draft.confidence = Some(extraction.confidence);
            draft.needs_clarification = false;
        }
        Err(_) => {
            draft.exercises = None;
            draft.confidence = None;
            draft.needs_clarification = true;
        }
    }
}

/// The approved draft as a workout. The log handle is its source id.
fn workout_from(state: &LogState) -> Workout {
    Workout {
        source_id: state.handle,
        date: state.date,
        workout_type: state.draft.workout_type,
        exercises: state.draft.exercises.clone().unwrap_or_default(),
        notes: Some(state.draft.raw_input.clone()),
        session: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use uuid::Uuid;

    use crate::model::{ExerciseEntry, Set, WorkoutType};

    fn parsing(raw: &str) -> LogState {
        LogState {
            handle: Uuid::new_v4(),
            phase: LogPhase::Parsing,
            draft: WorkoutDraft::new(raw),
            date: jiff::civil::date(2025, 6, 12),
            started_at: Timestamp::now(),
        }
    }

    fn extraction(name: &str) -> Extraction {
        Extraction {
            exercises: vec![ExerciseEntry {
                name: name.into(),
                sets: vec![Set::new(8, Some(135.0), None).unwrap(); 3],
                notes: None,
            }],
            workout_type: WorkoutType::Push,
            confidence: 1.0,
        }
    }

    fn awaiting(raw: &str, name: &str) -> LogState {
        let (state, _) = step(parsing(raw), LogSignal::Parsed(Ok(extraction(name)))).unwrap();
        state
    }

    #[test]
    fn parse_then_approve_emits_save() {
        let state = awaiting("bench 135x8x3", "Barbell Bench Press");
        assert_eq!(state.phase, LogPhase::AwaitingConfirmation);
        assert_eq!(state.draft.status, DraftStatus::AwaitingConfirmation);

        let (state, effect) = step(state, LogSignal::Approve).unwrap();
        assert_eq!(state.phase, LogPhase::Saving);
        let LogEffect::Save(workout) = effect else {
            panic!("expected a save");
        };
        assert_eq!(workout.source_id, state.handle);
        assert_eq!(workout.exercises.len(), 1);
    }

    #[test]
    fn failed_extraction_asks_for_clarification() {
        let failed = Err(ExtractionFailed {
            reason: "nothing".into(),
        });
        let (state, _) = step(parsing("felt good"), LogSignal::Parsed(failed)).unwrap();

        assert_eq!(state.phase, LogPhase::AwaitingConfirmation);
        assert!(state.draft.needs_clarification);
        assert_eq!(state.draft.exercises, None);
        assert_eq!(
            step(state, LogSignal::Approve).unwrap_err(),
            TransitionError::EmptyWorkout
        );
    }

    #[test]
    fn edit_discards_previous_draft() {
        let state = awaiting("bench 135x8x3", "Barbell Bench Press");

        let (state, effect) = step(state, LogSignal::Edit("bench 145x8x3".into())).unwrap();
        assert_eq!(state.phase, LogPhase::Parsing);
        assert_eq!(state.draft.exercises, None);
        assert_eq!(state.draft.confidence, None);
        assert_eq!(state.draft.raw_input, "bench 135x8x3");
        assert_eq!(
            effect,
            LogEffect::Extract("bench 135x8x3\n\nCorrection: bench 145x8x3".into())
        );

        // A second edit keeps every correction.
        let state = step(state, LogSignal::Parsed(Ok(extraction("Squat"))))
            .unwrap()
            .0;
        let (_, effect) = step(state, LogSignal::Edit("remove squat".into())).unwrap();
        let LogEffect::Extract(input) = effect else {
            panic!("expected an extract");
        };
        assert_eq!(input.matches("Correction:").count(), 2);
    }

    #[test]
    fn approve_is_required_before_saving() {
        let state = parsing("bench");
        let err = step(state, LogSignal::Saved {
            record_id: "x".into(),
        })
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidSignal { state: "parsing", .. }));

        let state = awaiting("bench", "Barbell Bench Press");
        let err = step(state, LogSignal::Retry).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidSignal {
                state: "awaiting_confirmation",
                signal: "retry"
            }
        ));
    }

    #[test]
    fn cancel_is_terminal() {
        let state = awaiting("bench", "Barbell Bench Press");
        let (state, effect) = step(state, LogSignal::Cancel).unwrap();

        assert_eq!(effect, LogEffect::None);
        assert_eq!(state.draft.status, DraftStatus::Cancelled);
        assert!(!state.is_open());
        assert_eq!(
            step(state, LogSignal::Approve).unwrap_err(),
            TransitionError::Closed
        );
    }

    #[test]
    fn retry_re_emits_the_same_save() {
        let state = awaiting("bench", "Barbell Bench Press");
        let (state, first) = step(state, LogSignal::Approve).unwrap();
        let (state, second) = step(state, LogSignal::Retry).unwrap();
        assert_eq!(first, second);

        let (state, _) = step(state, LogSignal::Saved {
            record_id: "2025-06-12-001".into(),
        })
        .unwrap();
        assert_eq!(
            state.phase,
            LogPhase::Done {
                outcome: LogOutcome::Saved {
                    record_id: "2025-06-12-001".into()
                }
            }
        );
    }
}
