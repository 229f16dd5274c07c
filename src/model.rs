//! Core data model for liftlog.
//!
//! Workouts and their sets, templates and plans, the live session
//! aggregate, log drafts, weekly split status, and suggestions.

mod draft;
mod plan;
mod session;
mod split;
mod suggestion;
mod workout;

pub use draft::{DraftStatus, LogOutcome, LogPhase, LogState, WorkoutDraft};
pub use plan::{PlannedExercise, PlannedTemplate, TemplateDefinition, TemplateExercise};
pub use session::{Deviation, DeviationRecord, SessionOutcome, SessionPhase, SessionState};
pub use split::WeeklySplitStatus;
pub use suggestion::{NextStep, PlanComplete, Suggestion, SuggestionSource};
pub use workout::{
    ExerciseEntry, ExercisePerformance, SessionSummary, Set, SetError, StoredWorkout, Workout,
    WorkoutType,
};
