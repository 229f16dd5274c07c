//! Suggestion types produced by the suggestion engine.

use serde::{Deserialize, Serialize};

/// Where a suggestion comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionSource {
    /// The next slot of the planned template.
    Plan,

    /// Bonus work after the plan is complete. Only used when asked for.
    Adaptive,
}

/// A proposed next exercise with its target scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub source: SuggestionSource,
    pub exercise: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub weight: Option<f64>,
    pub rationale: String,

    /// Position in the plan, for plan suggestions.
    pub plan_index: Option<usize>,
}

/// The plan ran out of exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanComplete {
    pub total_planned: usize,
    pub total_completed: usize,
}

/// What the engine says should happen next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NextStep {
    Exercise(Suggestion),
    PlanComplete(PlanComplete),

    /// Adaptive mode has nothing left to propose.
    /// The caller can still record freely or finish.
    PoolExhausted,
}
