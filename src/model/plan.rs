//! Templates and plans: what a session intends to do.

use serde::{Deserialize, Serialize};

use super::WorkoutType;

/// A canonical workout template as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    pub id: String,
    pub name: String,
    pub workout_type: WorkoutType,
    pub exercises: Vec<TemplateExercise>,
}

/// One exercise slot in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
}

/// The plan for a single live session.
///
/// Built once by the planner. Later edits only come from equipment
/// adaptations, which append to `adaptations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTemplate {
    pub template_id: String,
    pub workout_type: WorkoutType,

    /// Why this workout type was chosen.
    pub reason: String,

    pub exercises: Vec<PlannedExercise>,

    /// Human-readable notes for every substitution or removal.
    pub adaptations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,

    /// The template exercise this one replaced, if it is a substitute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substituted_for: Option<String>,
}

impl From<&TemplateExercise> for PlannedExercise {
    fn from(ex: &TemplateExercise) -> Self {
        Self {
            name: ex.name.clone(),
            target_sets: ex.target_sets,
            target_reps: ex.target_reps,
            target_weight: ex.target_weight,
            substituted_for: None,
        }
    }
}
