//! Output formatting for CLI display.

use std::fmt::Write;

use uuid::Uuid;

use crate::{
    model::{
        LogOutcome, LogPhase, LogState, PlannedTemplate, SessionOutcome, SessionPhase,
        SessionState, Set, StoredWorkout, Suggestion, TemplateDefinition, WeeklySplitStatus,
    },
    stats::ExerciseStats,
};

pub(super) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(super) fn format_weight(weight: Option<f64>) -> String {
    match weight {
        Some(w) => format!("{w} lbs"),
        None => "bodyweight".to_string(),
    }
}

/// Sets as `3 × 8 @ 135 lbs` when identical, otherwise one by one.
pub(super) fn format_sets(sets: &[Set]) -> String {
    match sets {
        [] => "no sets".to_string(),
        [first, rest @ ..] if rest.iter().all(|s| s == first) => {
            format!("{} × {first}", sets.len())
        }
        _ => sets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub(super) fn format_draft(state: &LogState) -> String {
    let draft = &state.draft;
    let mut out = format!(
        "Draft {} [{}] {}, {}\n",
        short_id(state.handle),
        state.phase_name(),
        draft.workout_type,
        state.date
    );

    match &draft.exercises {
        Some(exercises) => {
            for (i, e) in exercises.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}: {}", i + 1, e.name, format_sets(&e.sets));
            }
        }
        None if draft.needs_clarification => {
            out.push_str(
                "  Couldn't find any exercises. Edit with something like `bench 135x8x3`.\n",
            );
        }
        None => {}
    }
    if let Some(confidence) = draft.confidence {
        let _ = writeln!(out, "Confidence: {:.0}%", confidence * 100.0);
    }
    for correction in &draft.corrections {
        let _ = writeln!(out, "Correction: {correction}");
    }

    match &state.phase {
        LogPhase::AwaitingConfirmation if draft.exercise_count() > 0 => {
            out.push_str("Approve, edit, or cancel.");
        }
        LogPhase::AwaitingConfirmation => out.push_str("Edit or cancel."),
        LogPhase::Saving => out.push_str("Save failed; retry to try again."),
        LogPhase::Done {
            outcome: LogOutcome::Saved { record_id },
        } => {
            let _ = write!(out, "Saved as {record_id}");
        }
        LogPhase::Done {
            outcome: LogOutcome::Cancelled,
        } => out.push_str("Cancelled"),
        LogPhase::Parsing => {}
    }
    out
}

pub(super) fn format_suggestion(s: &Suggestion) -> String {
    format!(
        "{} {}×{} @ {} ({})",
        s.exercise,
        s.target_sets,
        s.target_reps,
        format_weight(s.weight),
        s.rationale
    )
}

pub(super) fn format_plan(plan: &PlannedTemplate, current: usize, skipped: &[usize]) -> String {
    let mut out = String::new();
    for (i, e) in plan.exercises.iter().enumerate() {
        let marker = if skipped.contains(&i) {
            "-"
        } else if i < current {
            "✓"
        } else if i == current {
            "→"
        } else {
            " "
        };
        let _ = write!(
            out,
            "  {marker} {}. {} {}×{}",
            i + 1,
            e.name,
            e.target_sets,
            e.target_reps
        );
        if let Some(original) = &e.substituted_for {
            let _ = write!(out, " (for {original})");
        }
        out.push('\n');
    }
    out
}

pub(super) fn format_session(state: &SessionState) -> String {
    let plan = &state.planned_template;
    let mut out = format!(
        "Session {} [{}] {} ({}): {}\n",
        short_id(state.session_id),
        state.phase_name(),
        plan.workout_type,
        plan.template_id,
        plan.reason
    );
    out.push_str(&format_plan(plan, state.current_plan_index, &state.skipped));
    for note in &plan.adaptations {
        let _ = writeln!(out, "Adapted: {note}");
    }
    if !state.accumulated_exercises.is_empty() {
        out.push_str("Recorded:\n");
        for e in &state.accumulated_exercises {
            let _ = writeln!(out, "  {}: {}", e.name, format_sets(&e.sets));
        }
    }

    match &state.phase {
        SessionPhase::Recording {
            suggestion: Some(s),
        } => {
            let _ = write!(out, "Next: {}", format_suggestion(s));
        }
        SessionPhase::Recording { suggestion: None } => {
            out.push_str("No more suggestions. Record anything else, or finish.");
        }
        SessionPhase::PlanComplete { signal } => {
            let _ = write!(
                out,
                "Plan complete: {}/{} planned exercises done. Finish to save, or continue for bonus work.",
                signal.total_completed, signal.total_planned
            );
        }
        SessionPhase::Saving => out.push_str("Save failed; finish again to retry."),
        SessionPhase::Done {
            outcome: SessionOutcome::Saved { record_id },
        } => {
            let _ = write!(out, "Saved as {record_id}");
        }
        SessionPhase::Done {
            outcome: SessionOutcome::Cancelled,
        } => out.push_str("Cancelled"),
    }
    out
}

pub(super) fn format_split(status: &WeeklySplitStatus) -> String {
    let mut out = format!(
        "Week of {} ({} day{} left)\n",
        status.week_start,
        status.days_left_in_week,
        if status.days_left_in_week == 1 { "" } else { "s" }
    );
    for (t, target) in &status.targets {
        let _ = writeln!(out, "  {:<6} {}/{target}", t.to_string(), status.completed_for(*t));
    }
    for (t, done) in &status.completed {
        if !status.targets.contains_key(t) {
            let _ = writeln!(out, "  {:<6} {done}", t.to_string());
        }
    }
    let left = status.total_remaining();
    let _ = writeln!(
        out,
        "{left} session{} to go",
        if left == 1 { "" } else { "s" }
    );
    let _ = write!(out, "Next: {}", status.next_suggested);
    out
}

pub(super) fn format_record_line(record: &StoredWorkout) -> String {
    let w = &record.workout;
    let source = if w.session.is_some() { "session" } else { "log" };
    let deleted = if record.deleted_at.is_some() {
        " [deleted]"
    } else {
        ""
    };
    format!(
        "{}  {:<6} {} exercise(s) [{source}]{deleted}",
        record.id,
        w.workout_type.to_string(),
        w.exercises.len()
    )
}

pub(super) fn format_record(record: &StoredWorkout) -> String {
    let w = &record.workout;
    let mut out = format!("{} {} on {}\n", record.id, w.workout_type, w.date);
    for e in &w.exercises {
        let _ = writeln!(out, "  {}: {}", e.name, format_sets(&e.sets));
    }
    if let Some(summary) = &w.session {
        let _ = writeln!(
            out,
            "Planned {} ({}), recorded as {:?}",
            summary.planned_template_id, summary.suggestion_reason, summary.recording_mode
        );
        for d in &summary.deviations {
            let _ = writeln!(out, "  {} → {} ({:?})", d.planned, d.performed, d.kind);
        }
        if !summary.skipped.is_empty() {
            let _ = writeln!(out, "Skipped: {}", summary.skipped.join(", "));
        }
        if !summary.equipment_unavailable.is_empty() {
            let _ = writeln!(out, "Without: {}", summary.equipment_unavailable.join(", "));
        }
    }
    if let Some(notes) = &w.notes {
        let _ = writeln!(out, "Notes: {notes}");
    }
    out.trim_end().to_string()
}

pub(super) fn format_template(template: &TemplateDefinition) -> String {
    let mut out = format!("{} ({}, {})\n", template.name, template.id, template.workout_type);
    for (i, e) in template.exercises.iter().enumerate() {
        let _ = write!(out, "  {}. {} {}×{}", i + 1, e.name, e.target_sets, e.target_reps);
        if let Some(w) = e.target_weight {
            let _ = write!(out, " @ {w} lbs");
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub(super) fn format_stats(stats: &ExerciseStats) -> String {
    let mut out = format!(
        "{} ({} session{})",
        stats.exercise,
        stats.sessions,
        if stats.sessions == 1 { "" } else { "s" }
    );
    let (Some(first), Some(current)) = (stats.first_weight, stats.current_weight) else {
        out.push_str("\n  No weighted sets recorded");
        return out;
    };
    let _ = write!(out, "\n  Weight: {first} → {current} lbs");
    if let Some(change) = stats.weekly_change {
        let _ = write!(out, " ({change:+} lbs/week)");
    }
    let _ = write!(out, "\n  Trend: {}", stats.trend);
    if let Some(pr) = &stats.personal_record {
        let _ = write!(
            out,
            "\n  PR: {} × {} lbs on {} ({})",
            pr.reps, pr.weight, pr.date, pr.record_id
        );
        if pr.is_latest {
            out.push_str(", set last session");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> Set {
        s.parse().unwrap()
    }

    #[test]
    fn identical_sets_collapse() {
        let sets = vec![set("135x8"), set("135x8"), set("135x8")];
        assert_eq!(format_sets(&sets), "3 × 8 @ 135 lbs");
    }

    #[test]
    fn mixed_sets_are_listed() {
        let sets = vec![set("135x8"), set("145x6@9")];
        assert_eq!(format_sets(&sets), "8 @ 135 lbs, 6 @ 145 lbs (RPE 9)");
        assert_eq!(format_sets(&[]), "no sets");
    }

    #[test]
    fn stats_show_range_trend_and_pr() {
        use jiff::civil::date;

        use crate::stats::{PersonalRecord, Trend};

        let stats = ExerciseStats {
            exercise: "Barbell Bench Press".into(),
            sessions: 4,
            first_weight: Some(115.0),
            current_weight: Some(135.0),
            max_weight: Some(135.0),
            personal_record: Some(PersonalRecord {
                weight: 135.0,
                reps: 8,
                date: date(2025, 5, 29),
                record_id: "2025-05-29-001".into(),
                is_latest: true,
            }),
            trend: Trend::Increasing,
            weekly_change: Some(5.0),
        };
        assert_eq!(
            format_stats(&stats),
            "Barbell Bench Press (4 sessions)\n  Weight: 115 → 135 lbs (+5 lbs/week)\n  \
             Trend: increasing\n  PR: 8 × 135 lbs on 2025-05-29 (2025-05-29-001), set last session"
        );
    }

    #[test]
    fn split_lists_targets_and_what_is_left() {
        use std::collections::BTreeMap;

        use jiff::civil::date;

        use crate::model::WorkoutType;

        let status = WeeklySplitStatus {
            week_start: date(2025, 6, 9),
            completed: BTreeMap::from([(WorkoutType::Push, 1)]),
            targets: BTreeMap::from([(WorkoutType::Push, 2), (WorkoutType::Legs, 1)]),
            remaining: BTreeMap::from([(WorkoutType::Push, 1), (WorkoutType::Legs, 1)]),
            next_suggested: WorkoutType::Legs,
            days_left_in_week: 4,
        };
        assert_eq!(
            format_split(&status),
            "Week of 2025-06-09 (4 days left)\n  Push   1/2\n  Legs   0/1\n2 sessions to go\nNext: Legs"
        );
    }

    #[test]
    fn weight_defaults_to_bodyweight() {
        assert_eq!(format_weight(None), "bodyweight");
        assert_eq!(format_weight(Some(137.5)), "137.5 lbs");
    }
}
