//! Next-exercise suggestions.
//!
//! In plan mode the engine walks the planned template and sets a target
//! weight from recent history. Once the plan runs out it says so with an
//! explicit [`PlanComplete`](crate::model::PlanComplete) and never
//! improvises. Bonus work only comes from adaptive mode, which the caller
//! asks for by name.

use log::debug;

use crate::{
    catalog::Catalog,
    config::{AdaptiveConfig, ProgressionConfig},
    model::{
        ExercisePerformance, NextStep, PlannedExercise, SessionState, Suggestion,
        SuggestionSource,
    },
    storage::Result,
    store::RecordStore,
};

const BONUS_SETS: u32 = 3;
const BONUS_REPS: u32 = 10;

pub struct SuggestionEngine<'a> {
    store: &'a dyn RecordStore,
    catalog: &'a Catalog,
    progression: &'a ProgressionConfig,
    adaptive: &'a AdaptiveConfig,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        catalog: &'a Catalog,
        progression: &'a ProgressionConfig,
        adaptive: &'a AdaptiveConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            progression,
            adaptive,
        }
    }

    pub fn suggest_next(&self, state: &SessionState, source: SuggestionSource) -> Result<NextStep> {
        match source {
            SuggestionSource::Plan => self.from_plan(state),
            SuggestionSource::Adaptive => self.adaptive(state),
        }
    }

    fn from_plan(&self, state: &SessionState) -> Result<NextStep> {
        let index = state.current_plan_index;
        let Some(planned) = state.planned_template.exercises.get(index) else {
            return Ok(NextStep::PlanComplete(state.plan_complete_signal()));
        };

        let history = self
            .store
            .get_exercise_history(&planned.name, self.progression.history_days)?;
        let increment = self.increment_for(&planned.name);
        let (weight, rationale) =
            progression(planned, &history, increment, self.progression.deload_factor);
        debug!("suggesting {} at {weight:?}: {rationale}", planned.name);

        Ok(NextStep::Exercise(Suggestion {
            source: SuggestionSource::Plan,
            exercise: planned.name.clone(),
            target_sets: planned.target_sets,
            target_reps: planned.target_reps,
            weight,
            rationale,
            plan_index: Some(index),
        }))
    }

    fn adaptive(&self, state: &SessionState) -> Result<NextStep> {
        let performed = &state.accumulated_exercises;
        let mut ranked = Vec::new();
        for candidate in self.catalog.pool_for(state.planned_template.workout_type) {
            if candidate.needs_any(&state.equipment_unavailable)
                || performed
                    .iter()
                    .any(|e| self.catalog.same_exercise(&e.name, candidate.name))
            {
                continue;
            }
            let recent = self
                .store
                .get_exercise_history(candidate.name, self.adaptive.lookback_days)?;
            ranked.push((recent.len(), candidate, recent));
        }
        // Stable: ties keep catalog order.
        ranked.sort_by_key(|(count, _, _)| *count);

        let Some((count, pick, recent)) = ranked.into_iter().next() else {
            debug!("adaptive pool exhausted");
            return Ok(NextStep::PoolExhausted);
        };
        let weight = recent
            .first()
            .and_then(|p| p.entry.top_set())
            .and_then(|s| s.weight);
        let rationale = format!(
            "Bonus work: trained {count} time{} in the last {} days",
            if count == 1 { "" } else { "s" },
            self.adaptive.lookback_days
        );

        Ok(NextStep::Exercise(Suggestion {
            source: SuggestionSource::Adaptive,
            exercise: pick.name.to_string(),
            target_sets: BONUS_SETS,
            target_reps: BONUS_REPS,
            weight,
            rationale,
            plan_index: None,
        }))
    }

    fn increment_for(&self, name: &str) -> f64 {
        if self.catalog.is_lower_body(name) {
            self.progression.lower_increment
        } else {
            self.progression.upper_increment
        }
    }
}

/// Target weight for a planned exercise given its history: one performance
/// per workout, newest first.
///
/// Adds `increment` when the last top set met the target reps at the target
/// weight, deloads after two short sessions in a row, and otherwise holds.
pub fn progression(
    planned: &PlannedExercise,
    history: &[ExercisePerformance],
    increment: f64,
    deload_factor: f64,
) -> (Option<f64>, String) {
    let reps = planned.target_reps;
    let Some(last) = history.first().and_then(|p| p.entry.top_set()) else {
        return match planned.target_weight {
            Some(w) => (Some(w), format!("No recent history; starting at {w} lbs")),
            None => (
                None,
                "No recent history; pick a weight you can move for every rep".into(),
            ),
        };
    };

    let Some(last_weight) = last.weight else {
        return (
            None,
            format!("Bodyweight; last time {} reps, aim for {reps}", last.reps),
        );
    };

    let target = planned.target_weight.unwrap_or(last_weight);
    if last.reps >= reps && last_weight >= target {
        let next = last_weight + increment;
        return (
            Some(next),
            format!("Hit {reps} reps at {last_weight} lbs last time; add {increment} lbs"),
        );
    }

    let short = |p: &ExercisePerformance| p.entry.top_set().is_some_and(|s| s.reps < reps);
    if history.len() >= 2 && history[..2].iter().all(short) {
        let deloaded = round_to(last_weight * deload_factor, increment);
        return (
            Some(deloaded),
            format!("Short of {reps} reps two sessions running; deload to {deloaded} lbs"),
        );
    }

    (
        Some(last_weight),
        format!(
            "Hold at {last_weight} lbs until you hit {}x{reps}",
            planned.target_sets
        ),
    )
}

fn round_to(weight: f64, step: f64) -> f64 {
    if step > 0.0 {
        (weight / step).round() * step
    } else {
        weight
    }
}
