//! Weekly split status, read from the record store.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::WorkoutType;

/// Where the current week stands against the per-type targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySplitStatus {
    /// Monday of the current week.
    pub week_start: Date,
    pub completed: BTreeMap<WorkoutType, u32>,
    pub targets: BTreeMap<WorkoutType, u32>,
    pub remaining: BTreeMap<WorkoutType, u32>,
    pub next_suggested: WorkoutType,

    /// Days left including today (7 on Monday, 1 on Sunday).
    pub days_left_in_week: u32,
}

impl WeeklySplitStatus {
    pub fn remaining_for(&self, workout_type: WorkoutType) -> u32 {
        self.remaining.get(&workout_type).copied().unwrap_or(0)
    }

    pub fn completed_for(&self, workout_type: WorkoutType) -> u32 {
        self.completed.get(&workout_type).copied().unwrap_or(0)
    }

    pub fn total_remaining(&self) -> u32 {
        self.remaining.values().sum()
    }
}
