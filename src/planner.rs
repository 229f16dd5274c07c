//! Session planning: which workout to do today, and with what exercises.
//!
//! The workout type is the requested one if given. Otherwise the weekly split
//! decides: a type that can no longer reach its target at one session per
//! day is caught up first, else the rotation's next type. The type's template
//! is then adapted to missing equipment, substituting each affected exercise
//! with its closest available equivalent or dropping it.

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::{
    catalog::{Catalog, CatalogExercise},
    model::{PlannedExercise, PlannedTemplate, WeeklySplitStatus, WorkoutType},
    storage::Result,
    store::RecordStore,
};

/// Builds the plan for a new session.
pub fn initialize(
    store: &dyn RecordStore,
    catalog: &Catalog,
    rotation: &[WorkoutType],
    equipment_unavailable: &BTreeSet<String>,
    requested: Option<WorkoutType>,
) -> Result<PlannedTemplate> {
    let status = store.get_weekly_split_status()?;
    let (workout_type, reason) = choose_type(&status, rotation, requested);
    debug!("planning {workout_type}: {reason}");

    let Some(template) = store.get_template(workout_type)? else {
        warn!("no template stored for {workout_type}; planning an empty session");
        return Ok(PlannedTemplate {
            template_id: format!("{}_none", workout_type.as_str()),
            workout_type,
            reason,
            exercises: Vec::new(),
            adaptations: vec![format!(
                "No {workout_type} template is stored; continue for bonus suggestions"
            )],
        });
    };

    let exercises = template
        .exercises
        .iter()
        .map(|slot| PlannedExercise {
            name: catalog.canonical_name(&slot.name),
            ..PlannedExercise::from(slot)
        })
        .collect();
    let mut plan = PlannedTemplate {
        template_id: template.id,
        workout_type,
        reason,
        exercises,
        adaptations: Vec::new(),
    };
    let adapted = adapt_remaining(&mut plan, 0, equipment_unavailable, catalog);
    if adapted > 0 {
        debug!("{adapted} planned exercise(s) adapted for missing equipment");
    }
    Ok(plan)
}

/// Picks the workout type and explains why.
pub fn choose_type(
    status: &WeeklySplitStatus,
    rotation: &[WorkoutType],
    requested: Option<WorkoutType>,
) -> (WorkoutType, String) {
    if let Some(t) = requested {
        return (t, format!("{t} requested"));
    }

    let days_left = status.days_left_in_week;
    let mut behind: Option<(WorkoutType, u32)> = None;
    for t in rotation_order(rotation, status) {
        let remaining = status.remaining_for(t);
        if remaining > days_left && behind.is_none_or(|(_, best)| remaining > best) {
            behind = Some((t, remaining));
        }
    }
    if let Some((t, remaining)) = behind {
        return (
            t,
            format!(
                "catching up: {remaining} {t} sessions left with {days_left} days remaining this week"
            ),
        );
    }

    let t = status.next_suggested;
    let reason = match status.targets.get(&t) {
        Some(target) => format!(
            "next in rotation ({}/{target} {t} this week)",
            status.completed_for(t)
        ),
        None => format!("next in rotation ({t})"),
    };
    (t, reason)
}

/// Distinct types in rotation order starting at `next_suggested`, followed by
/// any targeted types the rotation doesn't mention.
fn rotation_order(rotation: &[WorkoutType], status: &WeeklySplitStatus) -> Vec<WorkoutType> {
    let start = rotation
        .iter()
        .position(|t| *t == status.next_suggested)
        .unwrap_or(0);
    let mut order = Vec::new();
    let cycled = rotation.iter().cycle().skip(start).take(rotation.len());
    for t in cycled.chain(status.targets.keys()) {
        if !order.contains(t) {
            order.push(*t);
        }
    }
    order
}

/// Re-plans exercises from `from_index` onward around unavailable equipment.
///
/// Returns the number of new adaptations, which are also appended to the
/// plan.
pub fn adapt_remaining(
    plan: &mut PlannedTemplate,
    from_index: usize,
    unavailable: &BTreeSet<String>,
    catalog: &Catalog,
) -> usize {
    if unavailable.is_empty() || from_index >= plan.exercises.len() {
        return 0;
    }

    let remaining = plan.exercises.split_off(from_index);
    let mut taken: Vec<String> = plan
        .exercises
        .iter()
        .chain(&remaining)
        .map(|e| e.name.clone())
        .collect();
    let mut notes = Vec::new();

    for exercise in remaining {
        let Some(entry) = catalog.resolve(&exercise.name) else {
            plan.exercises.push(exercise);
            continue;
        };
        if !entry.needs_any(unavailable) {
            plan.exercises.push(exercise);
            continue;
        }

        let missing = missing_equipment(entry, unavailable);
        match closest_substitute(entry, unavailable, &taken, catalog) {
            Some(sub) => {
                notes.push(format!(
                    "{} → {} (no {missing})",
                    exercise.name, sub.name
                ));
                taken.push(sub.name.to_string());
                plan.exercises.push(PlannedExercise {
                    name: sub.name.to_string(),
                    target_weight: None,
                    substituted_for: Some(
                        exercise
                            .substituted_for
                            .clone()
                            .unwrap_or_else(|| exercise.name.clone()),
                    ),
                    ..exercise
                });
            }
            None => {
                notes.push(format!(
                    "Removed {} (needs {missing}, no substitute available)",
                    exercise.name
                ));
            }
        }
    }

    let added = notes.len();
    plan.adaptations.extend(notes);
    added
}

/// The table's substitutes first, then anything in the same muscle group.
fn closest_substitute(
    entry: &CatalogExercise,
    unavailable: &BTreeSet<String>,
    taken: &[String],
    catalog: &Catalog,
) -> Option<&'static CatalogExercise> {
    let usable = |c: &&'static CatalogExercise| {
        !c.needs_any(unavailable) && !taken.iter().any(|t| catalog.same_exercise(t, c.name))
    };
    catalog
        .substitutes(entry.name)
        .into_iter()
        .find(usable)
        .or_else(|| catalog.same_group(entry.name).into_iter().find(usable))
}

fn missing_equipment(entry: &CatalogExercise, unavailable: &BTreeSet<String>) -> String {
    entry
        .equipment
        .iter()
        .filter(|e| unavailable.contains(**e))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}
