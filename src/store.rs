//! Persistence seams used by the workflows.
//!
//! [`RecordStore`] holds finished workouts, templates, and the weekly split
//! counter. [`SnapshotStore`] holds in-flight workflow state between
//! requests. [`Storage`](crate::storage::Storage) implements both.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::{
        ExercisePerformance, LogState, SessionState, StoredWorkout, TemplateDefinition,
        WeeklySplitStatus, Workout, WorkoutType,
    },
    storage::Result,
};

/// The result of committing a workout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub record_id: String,

    /// False when the source had already been committed and nothing changed.
    pub created: bool,
}

pub trait RecordStore {
    /// Writes a workout without touching the weekly counter.
    /// Returns the existing id if this source was already stored.
    fn add_record(&self, workout: &Workout) -> Result<String>;

    /// Writes a workout and bumps the weekly counter for its type in one
    /// transaction. Re-committing the same source changes nothing.
    fn commit_workout(&self, workout: &Workout) -> Result<Commit>;

    fn get_weekly_split_status(&self) -> Result<WeeklySplitStatus>;

    fn get_template(&self, workout_type: WorkoutType) -> Result<Option<TemplateDefinition>>;

    fn put_template(&self, template: &TemplateDefinition) -> Result<()>;

    /// Past performances of `name`, one per workout, newest first.
    /// `days == 0` reads all time.
    fn get_exercise_history(&self, name: &str, days: u32) -> Result<Vec<ExercisePerformance>>;

    fn increment_weekly_count(&self, workout_type: WorkoutType) -> Result<()>;

    fn get_record(&self, id: &str) -> Result<StoredWorkout>;

    /// Records in date order, oldest first.
    fn list_records(&self, include_deleted: bool) -> Result<Vec<StoredWorkout>>;

    fn update_notes(&self, id: &str, notes: &str) -> Result<()>;

    fn soft_delete(&self, id: &str) -> Result<()>;

    fn restore(&self, id: &str) -> Result<()>;

    fn list_deleted(&self) -> Result<Vec<StoredWorkout>>;

    /// Permanently removes records deleted before `cutoff`. Returns their ids.
    fn purge_deleted(&self, cutoff: Timestamp) -> Result<Vec<String>>;
}

/// Workflow state as persisted between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Bumped on every store. Writers pass the version they loaded.
    pub version: u64,
    pub state: T,
}

pub trait SnapshotStore {
    /// Persists a new session at version 1.
    ///
    /// Fails with `SessionOpen` if another session is still open.
    fn insert_session(&self, state: &SessionState) -> Result<Snapshot<SessionState>>;

    fn load_session(&self, id: Uuid) -> Result<Snapshot<SessionState>>;

    /// Replaces the session if its stored version is still `expected_version`.
    /// Returns the new version.
    fn store_session(&self, state: &SessionState, expected_version: u64) -> Result<u64>;

    /// The id of the open session, if any.
    fn open_session(&self) -> Result<Option<Uuid>>;

    /// Every session id, newest first.
    fn list_sessions(&self) -> Result<Vec<Uuid>>;

    fn insert_log(&self, state: &LogState) -> Result<Snapshot<LogState>>;

    fn load_log(&self, handle: Uuid) -> Result<Snapshot<LogState>>;

    fn store_log(&self, state: &LogState, expected_version: u64) -> Result<u64>;

    /// Every log handle, newest first.
    fn list_logs(&self) -> Result<Vec<Uuid>>;
}
