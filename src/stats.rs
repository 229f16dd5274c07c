//! Progression statistics and personal records for one exercise.
//!
//! Each workout in the history contributes its top set. Bodyweight sessions
//! count toward `sessions` but carry no load, so they are left out of the
//! weight figures.

use std::fmt;

use jiff::civil::Date;
use serde::Serialize;

use crate::model::ExercisePerformance;

/// Relative change between the older and newer half that counts as a trend.
const TREND_THRESHOLD: f64 = 0.05;

/// Weighted sessions needed before a trend is called.
const TREND_MIN_SESSIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Increasing => "increasing",
            Self::Stable => "stable",
            Self::Decreasing => "decreasing",
            Self::InsufficientData => "not enough data",
        })
    }
}

/// The heaviest top set on record, first reached in `record_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub weight: f64,
    pub reps: u32,
    pub date: Date,
    pub record_id: String,

    /// Set in the most recent weighted session.
    pub is_latest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseStats {
    pub exercise: String,
    pub sessions: usize,
    pub first_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub personal_record: Option<PersonalRecord>,
    pub trend: Trend,

    /// Average change in top-set weight per week, once the history spans
    /// more than a week.
    pub weekly_change: Option<f64>,
}

/// Summarizes `history` (newest first, one item per workout).
pub fn exercise_stats(exercise: &str, history: &[ExercisePerformance]) -> ExerciseStats {
    // Oldest first, weighted top sets only.
    let weighted: Vec<(&ExercisePerformance, f64, u32)> = history
        .iter()
        .rev()
        .filter_map(|p| {
            let top = p.entry.top_set()?;
            Some((p, top.weight?, top.reps))
        })
        .collect();

    let mut personal_record: Option<PersonalRecord> = None;
    for &(p, weight, reps) in &weighted {
        if personal_record.as_ref().is_none_or(|pr| weight > pr.weight) {
            personal_record = Some(PersonalRecord {
                weight,
                reps,
                date: p.date,
                record_id: p.record_id.clone(),
                is_latest: false,
            });
        }
    }
    if let (Some(pr), Some((latest, _, _))) = (personal_record.as_mut(), weighted.last()) {
        pr.is_latest = pr.record_id == latest.record_id;
    }

    let weights: Vec<f64> = weighted.iter().map(|&(_, w, _)| w).collect();
    let first = weighted.first();
    let last = weighted.last();

    ExerciseStats {
        exercise: exercise.to_string(),
        sessions: history.len(),
        first_weight: first.map(|&(_, w, _)| w),
        current_weight: last.map(|&(_, w, _)| w),
        max_weight: personal_record.as_ref().map(|pr| pr.weight),
        personal_record,
        trend: trend(&weights),
        weekly_change: first
            .zip(last)
            .and_then(|(&(a, wa, _), &(b, wb, _))| weekly_change(a.date, wa, b.date, wb)),
    }
}

/// Compares the mean of the older half of `weights` with the newer half.
#[allow(clippy::cast_precision_loss)]
fn trend(weights: &[f64]) -> Trend {
    if weights.len() < TREND_MIN_SESSIONS {
        return Trend::InsufficientData;
    }
    let (older, newer) = weights.split_at(weights.len() / 2);
    let mean = |w: &[f64]| w.iter().sum::<f64>() / w.len() as f64;
    let (older, newer) = (mean(older), mean(newer));

    if newer > older * (1.0 + TREND_THRESHOLD) {
        Trend::Increasing
    } else if newer < older * (1.0 - TREND_THRESHOLD) {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn weekly_change(from: Date, from_weight: f64, to: Date, to_weight: f64) -> Option<f64> {
    let days = (to - from).get_days();
    if days <= 7 {
        return None;
    }
    let weeks = f64::from(days) / 7.0;
    Some(((to_weight - from_weight) / weeks * 100.0).round() / 100.0)
}
