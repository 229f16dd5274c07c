//! The coach: every user-facing operation, resolved by id.
//!
//! Each operation loads a snapshot, steps the workflow on a copy, carries out
//! the effects it asks for, and stores the result with a compare-and-swap on
//! the loaded version. If anything fails before the store, the persisted
//! snapshot is untouched. A failed save is the one exception: the workflow
//! stays in `saving` so the save can be retried, and the store error is
//! returned as-is.

use std::collections::BTreeSet;

use jiff::{Timestamp, Zoned, civil::Date};
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    catalog::{Catalog, normalize_equipment},
    config::Config,
    extract::TextExtractor,
    model::{
        Deviation, ExerciseEntry, LogOutcome, LogPhase, LogState, SessionOutcome, SessionPhase,
        SessionState, Set, SuggestionSource, WeeklySplitStatus, WorkoutDraft, WorkoutType,
    },
    planner,
    storage::StorageError,
    store::{RecordStore, SnapshotStore},
    suggest::SuggestionEngine,
    workflow::{
        self, LogEffect, LogSignal, SessionContext, SessionEffect, SessionSignal, TransitionError,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("session {existing} is still open; finish or cancel it first")]
    Conflict { existing: Uuid },

    #[error("cannot {signal} while {state}")]
    InvalidSignal {
        state: &'static str,
        signal: &'static str,
    },

    #[error("already saved or cancelled")]
    SessionClosed,

    #[error("nothing to save: no exercises recorded")]
    EmptyWorkout,

    #[error("snapshot changed underneath: expected version {expected}, found {found}")]
    StaleSnapshot { expected: u64, found: u64 },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CoachError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Stale { expected, found } => Self::StaleSnapshot { expected, found },
            StorageError::SessionOpen(existing) => Self::Conflict { existing },
            e => Self::Storage(e),
        }
    }
}

impl From<TransitionError> for CoachError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::InvalidSignal { state, signal } => {
                Self::InvalidSignal { state, signal }
            }
            TransitionError::EmptyWorkout => Self::EmptyWorkout,
            TransitionError::Closed => Self::SessionClosed,
        }
    }
}

pub type Result<T> = core::result::Result<T, CoachError>;

/// The user's answer to a parsed draft.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Approve,
    Edit(String),
    Cancel,
}

/// Every coach operation as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartLog {
        raw: String,
        date: Option<Date>,
    },
    Confirm {
        handle: Uuid,
        confirmation: Confirmation,
    },
    RetryLogSave {
        handle: Uuid,
    },
    ShowLog {
        handle: Uuid,
    },
    StartSession {
        requested: Option<WorkoutType>,
        equipment_unavailable: Vec<String>,
    },
    RecordPerformed {
        session: Uuid,
        exercise: String,
        sets: Vec<Set>,
    },
    SkipExercise {
        session: Uuid,
    },
    ExcludeEquipment {
        session: Uuid,
        items: Vec<String>,
    },
    FinishSession {
        session: Uuid,
    },
    ContinueSession {
        session: Uuid,
    },
    CancelSession {
        session: Uuid,
    },
    ShowSession {
        session: Uuid,
    },
    WeeklyStatus,
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reply {
    Log(LogState),
    Session(SessionState),
    Saved { record_id: String },
    Split(WeeklySplitStatus),
}

pub struct Coach<'a> {
    records: &'a dyn RecordStore,
    snapshots: &'a dyn SnapshotStore,
    extractor: &'a dyn TextExtractor,
    catalog: &'a Catalog,
    config: &'a Config,

    /// Pins the date new workouts are recorded against.
    today: Option<Date>,
}

impl<'a> Coach<'a> {
    pub fn new(
        records: &'a dyn RecordStore,
        snapshots: &'a dyn SnapshotStore,
        extractor: &'a dyn TextExtractor,
        catalog: &'a Catalog,
        config: &'a Config,
    ) -> Self {
        Self {
            records,
            snapshots,
            extractor,
            catalog,
            config,
            today: None,
        }
    }

    #[cfg(test)]
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    pub fn handle(&self, command: Command) -> Result<Reply> {
        match command {
            Command::StartLog { raw, date } => self.start_log(&raw, date).map(Reply::Log),
            Command::Confirm {
                handle,
                confirmation,
            } => self
                .submit_confirmation(handle, confirmation)
                .map(Reply::Log),
            Command::RetryLogSave { handle } => self.retry_log_save(handle).map(Reply::Log),
            Command::ShowLog { handle } => self.show_log(handle).map(Reply::Log),
            Command::StartSession {
                requested,
                equipment_unavailable,
            } => self
                .start_session(requested, &equipment_unavailable)
                .map(Reply::Session),
            Command::RecordPerformed {
                session,
                exercise,
                sets,
            } => self
                .record_performed(session, &exercise, sets)
                .map(Reply::Session),
            Command::SkipExercise { session } => self.skip_exercise(session).map(Reply::Session),
            Command::ExcludeEquipment { session, items } => self
                .exclude_equipment(session, items)
                .map(Reply::Session),
            Command::FinishSession { session } => self
                .finish_session(session)
                .map(|record_id| Reply::Saved { record_id }),
            Command::ContinueSession { session } => {
                self.continue_session(session).map(Reply::Session)
            }
            Command::CancelSession { session } => self.cancel_session(session).map(Reply::Session),
            Command::ShowSession { session } => self.show_session(session).map(Reply::Session),
            Command::WeeklyStatus => self.weekly_status().map(Reply::Split),
        }
    }

    fn today(&self) -> Date {
        self.today.unwrap_or_else(|| Zoned::now().date())
    }

    // Log workflow

    /// Parses free-form notes into a draft awaiting confirmation.
    pub fn start_log(&self, raw: &str, date: Option<Date>) -> Result<LogState> {
        let state = LogState {
            handle: Uuid::new_v4(),
            phase: LogPhase::Parsing,
            draft: WorkoutDraft::new(raw),
            date: date.unwrap_or_else(|| self.today()),
            started_at: Timestamp::now(),
        };
        let input = state.draft.extraction_input();
        let (state, _) = self.drive_log(state, LogEffect::Extract(input))?;
        let snapshot = self.snapshots.insert_log(&state)?;
        info!(
            "log {} parsed {} exercise(s)",
            state.handle,
            state.draft.exercise_count()
        );
        Ok(snapshot.state)
    }

    pub fn submit_confirmation(
        &self,
        handle: Uuid,
        confirmation: Confirmation,
    ) -> Result<LogState> {
        let signal = match confirmation {
            Confirmation::Approve => LogSignal::Approve,
            Confirmation::Edit(text) => LogSignal::Edit(text),
            Confirmation::Cancel => LogSignal::Cancel,
        };
        self.advance_log(handle, signal)
    }

    /// Re-attempts the save of an approved draft after a store failure.
    pub fn retry_log_save(&self, handle: Uuid) -> Result<LogState> {
        self.advance_log(handle, LogSignal::Retry)
    }

    pub fn show_log(&self, handle: Uuid) -> Result<LogState> {
        Ok(self.snapshots.load_log(handle)?.state)
    }

    /// Every log handle, newest first.
    pub fn logs(&self) -> Result<Vec<Uuid>> {
        Ok(self.snapshots.list_logs()?)
    }

    fn advance_log(&self, handle: Uuid, signal: LogSignal) -> Result<LogState> {
        let snapshot = self.snapshots.load_log(handle)?;
        let (state, effect) = workflow::step_log(snapshot.state, signal)?;
        let (state, failure) = self.drive_log(state, effect)?;
        self.snapshots.store_log(&state, snapshot.version)?;

        if let Some(e) = failure {
            return Err(e.into());
        }
        match &state.phase {
            LogPhase::Done {
                outcome: LogOutcome::Cancelled,
            } => info!("log {handle} cancelled"),
            LogPhase::Done {
                outcome: LogOutcome::Saved { record_id },
            } => info!("log {handle} saved as {record_id}"),
            _ => {}
        }
        Ok(state)
    }

    /// Runs effects until the workflow waits on the user.
    ///
    /// A failed save is returned alongside the `saving` state instead of
    /// as an error, so the caller can persist it first.
    fn drive_log(
        &self,
        mut state: LogState,
        mut effect: LogEffect,
    ) -> Result<(LogState, Option<StorageError>)> {
        loop {
            let signal = match effect {
                LogEffect::None => return Ok((state, None)),
                LogEffect::Extract(text) => LogSignal::Parsed(self.extractor.extract(&text)),
                LogEffect::Save(workout) => match self.records.commit_workout(&workout) {
                    Ok(commit) => LogSignal::Saved {
                        record_id: commit.record_id,
                    },
                    Err(e) => {
                        warn!("saving log {} failed: {e}", state.handle);
                        return Ok((state, Some(e)));
                    }
                },
            };
            (state, effect) = workflow::step_log(state, signal)?;
        }
    }

    // Session workflow

    /// Plans a session and returns it with its first suggestion.
    pub fn start_session(
        &self,
        requested: Option<WorkoutType>,
        equipment_unavailable: &[String],
    ) -> Result<SessionState> {
        if let Some(existing) = self.snapshots.open_session()? {
            return Err(CoachError::Conflict { existing });
        }

        let unavailable: BTreeSet<String> = equipment_unavailable
            .iter()
            .map(|item| normalize_equipment(item))
            .collect();
        let plan = planner::initialize(
            self.records,
            self.catalog,
            &self.config.split.rotation,
            &unavailable,
            requested,
        )?;

        let now = Timestamp::now();
        let state = SessionState {
            session_id: Uuid::new_v4(),
            planned_template: plan,
            current_plan_index: 0,
            accumulated_exercises: Vec::new(),
            equipment_unavailable: unavailable,
            recording_mode: Deviation::Exact,
            plan_complete: false,
            saved: false,
            record_id: None,
            phase: SessionPhase::Recording { suggestion: None },
            deviations: Vec::new(),
            skipped: Vec::new(),
            bonus_exercises: 0,
            started_at: now,
            last_activity_at: now,
        };
        let ctx = self.context();
        let (state, _) =
            self.drive_session(state, SessionEffect::Suggest(SuggestionSource::Plan), &ctx)?;
        let snapshot = self.snapshots.insert_session(&state)?;
        info!(
            "started session {} ({}, {} planned)",
            state.session_id,
            state.planned_template.workout_type,
            state.total_planned()
        );
        Ok(snapshot.state)
    }

    /// Records a performed exercise and moves to the next suggestion.
    pub fn record_performed(
        &self,
        session: Uuid,
        exercise: &str,
        sets: Vec<Set>,
    ) -> Result<SessionState> {
        let entry = ExerciseEntry {
            name: exercise.to_string(),
            sets,
            notes: None,
        };
        self.advance_session(session, SessionSignal::Record(entry))
    }

    pub fn skip_exercise(&self, session: Uuid) -> Result<SessionState> {
        self.advance_session(session, SessionSignal::Skip)
    }

    /// Marks equipment unavailable and re-plans the exercises not yet reached.
    pub fn exclude_equipment(&self, session: Uuid, items: Vec<String>) -> Result<SessionState> {
        self.advance_session(session, SessionSignal::ExcludeEquipment(items))
    }

    /// Saves the session as one workout. A session stuck in `saving`
    /// retries its save.
    pub fn finish_session(&self, session: Uuid) -> Result<String> {
        let signal = match self.snapshots.load_session(session)?.state.phase {
            SessionPhase::Saving => SessionSignal::Retry,
            _ => SessionSignal::Finish,
        };
        let state = self.advance_session(session, signal)?;
        match state.phase {
            SessionPhase::Done {
                outcome: SessionOutcome::Saved { record_id },
            } => {
                info!("session {session} saved as {record_id}");
                Ok(record_id)
            }
            _ => Err(CoachError::InvalidSignal {
                state: state.phase_name(),
                signal: "finish",
            }),
        }
    }

    /// Leaves `plan_complete` for adaptive bonus work.
    pub fn continue_session(&self, session: Uuid) -> Result<SessionState> {
        self.advance_session(session, SessionSignal::Continue)
    }

    pub fn cancel_session(&self, session: Uuid) -> Result<SessionState> {
        let state = self.advance_session(session, SessionSignal::Cancel)?;
        info!("session {session} cancelled");
        Ok(state)
    }

    pub fn show_session(&self, session: Uuid) -> Result<SessionState> {
        Ok(self.snapshots.load_session(session)?.state)
    }

    pub fn open_session(&self) -> Result<Option<Uuid>> {
        Ok(self.snapshots.open_session()?)
    }

    /// Every session id, newest first.
    pub fn sessions(&self) -> Result<Vec<Uuid>> {
        Ok(self.snapshots.list_sessions()?)
    }

    pub fn weekly_status(&self) -> Result<WeeklySplitStatus> {
        Ok(self.records.get_weekly_split_status()?)
    }

    fn context(&self) -> SessionContext<'a> {
        SessionContext {
            catalog: self.catalog,
            now: Timestamp::now(),
            today: self.today(),
        }
    }

    fn advance_session(&self, session: Uuid, signal: SessionSignal) -> Result<SessionState> {
        let snapshot = self.snapshots.load_session(session)?;
        let ctx = self.context();
        let (state, effect) = workflow::step_session(snapshot.state, signal, &ctx)?;
        let (state, failure) = self.drive_session(state, effect, &ctx)?;
        self.snapshots.store_session(&state, snapshot.version)?;

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(state),
        }
    }

    /// Runs effects until the session waits on the user. Failed saves are
    /// handed back as in [`Self::drive_log`].
    fn drive_session(
        &self,
        mut state: SessionState,
        mut effect: SessionEffect,
        ctx: &SessionContext<'_>,
    ) -> Result<(SessionState, Option<StorageError>)> {
        let engine = SuggestionEngine::new(
            self.records,
            self.catalog,
            &self.config.progression,
            &self.config.adaptive,
        );
        loop {
            let signal = match effect {
                SessionEffect::None => return Ok((state, None)),
                SessionEffect::Suggest(source) => {
                    SessionSignal::Suggested(engine.suggest_next(&state, source)?)
                }
                SessionEffect::Save(workout) => match self.records.commit_workout(&workout) {
                    Ok(commit) => SessionSignal::Saved {
                        record_id: commit.record_id,
                    },
                    Err(e) => {
                        warn!("saving session {} failed: {e}", state.session_id);
                        return Ok((state, Some(e)));
                    }
                },
            };
            (state, effect) = workflow::step_session(state, signal, ctx)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        cell::{Cell, RefCell},
        io,
    };

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::{
        extract::{Extraction, ExtractionFailed, ShorthandExtractor},
        model::{
            DraftStatus, ExercisePerformance, PlanComplete, StoredWorkout,
            TemplateDefinition, TemplateExercise, Workout,
        },
        storage::{self, Storage},
        store::{Commit, Snapshot},
    };

    const TODAY: Date = date(2025, 6, 12);

    /// A record store whose commits can be made to fail.
    struct FlakyStore<'a> {
        inner: &'a Storage,

        /// Fail before writing anything.
        fail: Cell<bool>,

        /// Write, then report failure as if the reply were lost.
        fail_after_write: Cell<bool>,
    }

    impl<'a> FlakyStore<'a> {
        fn new(inner: &'a Storage) -> Self {
            Self {
                inner,
                fail: Cell::new(false),
                fail_after_write: Cell::new(false),
            }
        }
    }

    fn unavailable() -> StorageError {
        StorageError::Io(io::Error::other("connection reset"))
    }

    impl RecordStore for FlakyStore<'_> {
        fn add_record(&self, workout: &Workout) -> storage::Result<String> {
            self.inner.add_record(workout)
        }

        fn commit_workout(&self, workout: &Workout) -> storage::Result<Commit> {
            if self.fail.get() {
                return Err(unavailable());
            }
            let commit = self.inner.commit_workout(workout)?;
            if self.fail_after_write.get() {
                return Err(unavailable());
            }
            Ok(commit)
        }

        fn get_weekly_split_status(&self) -> storage::Result<WeeklySplitStatus> {
            self.inner.get_weekly_split_status()
        }

        fn get_template(
            &self,
            workout_type: WorkoutType,
        ) -> storage::Result<Option<TemplateDefinition>> {
            self.inner.get_template(workout_type)
        }

        fn put_template(&self, template: &TemplateDefinition) -> storage::Result<()> {
            self.inner.put_template(template)
        }

        fn get_exercise_history(
            &self,
            name: &str,
            days: u32,
        ) -> storage::Result<Vec<ExercisePerformance>> {
            self.inner.get_exercise_history(name, days)
        }

        fn increment_weekly_count(&self, workout_type: WorkoutType) -> storage::Result<()> {
            self.inner.increment_weekly_count(workout_type)
        }

        fn get_record(&self, id: &str) -> storage::Result<StoredWorkout> {
            self.inner.get_record(id)
        }

        fn list_records(&self, include_deleted: bool) -> storage::Result<Vec<StoredWorkout>> {
            self.inner.list_records(include_deleted)
        }

        fn update_notes(&self, id: &str, notes: &str) -> storage::Result<()> {
            self.inner.update_notes(id, notes)
        }

        fn soft_delete(&self, id: &str) -> storage::Result<()> {
            self.inner.soft_delete(id)
        }

        fn restore(&self, id: &str) -> storage::Result<()> {
            self.inner.restore(id)
        }

        fn list_deleted(&self) -> storage::Result<Vec<StoredWorkout>> {
            self.inner.list_deleted()
        }

        fn purge_deleted(&self, cutoff: Timestamp) -> storage::Result<Vec<String>> {
            self.inner.purge_deleted(cutoff)
        }
    }

    /// Replays canned extractions in order.
    struct ScriptedExtractor {
        script: RefCell<Vec<core::result::Result<Extraction, ExtractionFailed>>>,
    }

    impl TextExtractor for ScriptedExtractor {
        fn extract(&self, _raw: &str) -> core::result::Result<Extraction, ExtractionFailed> {
            self.script.borrow_mut().remove(0)
        }
    }

    struct Fixture {
        _dir: TempDir,
        storage: Storage,
        catalog: Catalog,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = Config::default();
            let storage = Storage::new(dir.path(), config.split.clone())
                .unwrap()
                .with_today(TODAY);
            Self {
                _dir: dir,
                storage,
                catalog: Catalog::builtin(),
                config,
            }
        }

        fn coach<'a>(
            &'a self,
            records: &'a dyn RecordStore,
            extractor: &'a dyn TextExtractor,
        ) -> Coach<'a> {
            Coach::new(records, &self.storage, extractor, &self.catalog, &self.config)
                .with_today(TODAY)
        }

        fn completed(&self, workout_type: WorkoutType) -> u32 {
            self.storage
                .get_weekly_split_status()
                .unwrap()
                .completed_for(workout_type)
        }

        /// Replaces the push template with three exercises.
        fn abc_push_template(&self) {
            let slot = |name: &str| TemplateExercise {
                name: name.into(),
                target_sets: 3,
                target_reps: 8,
                target_weight: None,
            };
            self.storage
                .put_template(&TemplateDefinition {
                    id: "push_abc".into(),
                    name: "Push ABC".into(),
                    workout_type: WorkoutType::Push,
                    exercises: vec![
                        slot("Barbell Bench Press"),
                        slot("Overhead Press"),
                        slot("Lateral Raise"),
                    ],
                })
                .unwrap();
        }
    }

    fn sets(spec: &str) -> Vec<Set> {
        spec.split_whitespace().map(|s| s.parse().unwrap()).collect()
    }

    fn suggested(state: &SessionState) -> Option<&str> {
        match &state.phase {
            SessionPhase::Recording {
                suggestion: Some(s),
            } => Some(&s.exercise),
            _ => None,
        }
    }

    #[test]
    fn log_bench_and_overhead_then_approve() {
        let f = Fixture::new();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach
            .start_log("bench 135x8x3, overhead 95x8x3", None)
            .unwrap();
        assert_eq!(state.phase, LogPhase::AwaitingConfirmation);
        let exercises = state.draft.exercises.as_ref().unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].name, "Barbell Bench Press");
        assert_eq!(exercises[0].sets.len(), 3);
        assert_eq!(exercises[0].sets[0].weight, Some(135.0));
        assert_eq!(exercises[1].name, "Overhead Press");
        assert_eq!(state.draft.workout_type, WorkoutType::Push);

        // Nothing is written before approval.
        assert!(f.storage.list_records(true).unwrap().is_empty());

        let state = coach
            .submit_confirmation(state.handle, Confirmation::Approve)
            .unwrap();
        let LogPhase::Done {
            outcome: LogOutcome::Saved { record_id },
        } = &state.phase
        else {
            panic!("expected a saved log, got {:?}", state.phase);
        };
        assert_eq!(record_id, "2025-06-12-001");
        assert_eq!(f.completed(WorkoutType::Push), 1);

        let stored = f.storage.get_record(record_id).unwrap();
        assert_eq!(stored.workout.exercises.len(), 2);
    }

    #[test]
    fn edit_discards_previous_draft() {
        let f = Fixture::new();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_log("bench 135x8x3, squat 225x5x5", None).unwrap();
        let state = coach
            .submit_confirmation(
                state.handle,
                Confirmation::Edit("bench 145x8x3, remove squat".into()),
            )
            .unwrap();

        assert_eq!(state.phase, LogPhase::AwaitingConfirmation);
        assert_eq!(state.draft.raw_input, "bench 135x8x3, squat 225x5x5");
        assert_eq!(state.draft.corrections.len(), 1);
        let exercises = state.draft.exercises.unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].sets[0].weight, Some(145.0));
    }

    #[test]
    fn failed_extraction_asks_for_clarification() {
        let f = Fixture::new();
        let extractor = ScriptedExtractor {
            script: RefCell::new(vec![Err(ExtractionFailed {
                reason: "no exercises recognized".into(),
            })]),
        };
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_log("great pump today", None).unwrap();
        assert!(state.draft.needs_clarification);
        assert_eq!(state.draft.exercise_count(), 0);

        let err = coach
            .submit_confirmation(state.handle, Confirmation::Approve)
            .unwrap_err();
        assert!(matches!(err, CoachError::EmptyWorkout));
        // The rejected approve left the snapshot as it was.
        let stored = coach.show_log(state.handle).unwrap();
        assert_eq!(stored.phase, LogPhase::AwaitingConfirmation);
    }

    #[test]
    fn cancelled_log_never_counts() {
        let f = Fixture::new();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_log("bench 135x8x3", None).unwrap();
        let state = coach
            .submit_confirmation(state.handle, Confirmation::Cancel)
            .unwrap();
        assert_eq!(state.draft.status, DraftStatus::Cancelled);
        assert_eq!(f.completed(WorkoutType::Push), 0);
        assert!(f.storage.list_records(true).unwrap().is_empty());

        let err = coach
            .submit_confirmation(state.handle, Confirmation::Approve)
            .unwrap_err();
        assert!(matches!(err, CoachError::SessionClosed));
    }

    #[test]
    fn failed_log_save_stays_saving_and_retries_once() {
        let f = Fixture::new();
        let flaky = FlakyStore::new(&f.storage);
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&flaky, &extractor);

        let state = coach.start_log("bench 135x8x3", None).unwrap();
        flaky.fail_after_write.set(true);
        let err = coach
            .submit_confirmation(state.handle, Confirmation::Approve)
            .unwrap_err();
        assert!(matches!(
            err,
            CoachError::Storage(StorageError::Io(_))
        ));
        assert_eq!(coach.show_log(state.handle).unwrap().phase, LogPhase::Saving);

        flaky.fail_after_write.set(false);
        let state = coach.retry_log_save(state.handle).unwrap();
        assert!(!state.is_open());

        // The lost-reply write and the retry are the same record.
        assert_eq!(f.storage.list_records(false).unwrap().len(), 1);
        assert_eq!(f.completed(WorkoutType::Push), 1);
    }

    #[test]
    fn exact_session_reaches_plan_complete_and_saves() {
        let f = Fixture::new();
        f.abc_push_template();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let mut state = coach.start_session(Some(WorkoutType::Push), &[]).unwrap();
        assert_eq!(state.planned_template.template_id, "push_abc");
        for name in ["Barbell Bench Press", "Overhead Press", "Lateral Raise"] {
            assert_eq!(suggested(&state), Some(name));
            state = coach
                .record_performed(state.session_id, name, sets("135x8 135x8 135x8"))
                .unwrap();
        }
        assert_eq!(
            state.phase,
            SessionPhase::PlanComplete {
                signal: PlanComplete {
                    total_planned: 3,
                    total_completed: 3
                }
            }
        );
        assert_eq!(f.completed(WorkoutType::Push), 0);

        let record_id = coach.finish_session(state.session_id).unwrap();
        assert_eq!(f.completed(WorkoutType::Push), 1);
        let stored = f.storage.get_record(&record_id).unwrap();
        let summary = stored.workout.session.unwrap();
        assert_eq!(summary.recording_mode, Deviation::Exact);
        assert_eq!(summary.planned_template_id, "push_abc");
        assert_eq!(stored.workout.exercises.len(), 3);
        assert_eq!(coach.open_session().unwrap(), None);
    }

    #[test]
    fn different_exercise_is_logged_without_blocking() {
        let f = Fixture::new();
        f.abc_push_template();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_session(Some(WorkoutType::Push), &[]).unwrap();
        let state = coach
            .record_performed(state.session_id, "Barbell Curl", sets("65x10"))
            .unwrap();

        assert_eq!(state.current_plan_index, 0);
        assert_eq!(suggested(&state), Some("Barbell Bench Press"));
        assert_eq!(state.recording_mode, Deviation::Different);
        assert_eq!(state.accumulated_exercises.len(), 1);

        let id = state.session_id;
        coach.skip_exercise(id).unwrap();
        coach.skip_exercise(id).unwrap();
        let state = coach.skip_exercise(id).unwrap();
        assert!(state.plan_complete);
        let record_id = coach.finish_session(id).unwrap();
        let summary = f.storage.get_record(&record_id).unwrap().workout.session.unwrap();
        assert_eq!(summary.recording_mode, Deviation::Different);
        assert_eq!(summary.skipped.len(), 3);
    }

    #[test]
    fn second_start_conflicts_and_cancel_never_counts() {
        let f = Fixture::new();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let first = coach.start_session(None, &[]).unwrap();
        let err = coach.start_session(None, &[]).unwrap_err();
        let CoachError::Conflict { existing } = err else {
            panic!("expected a conflict, got {err:?}");
        };
        assert_eq!(existing, first.session_id);

        let first = coach
            .record_performed(first.session_id, "bench", sets("135x8"))
            .unwrap();
        let cancelled = coach.cancel_session(first.session_id).unwrap();
        assert!(!cancelled.saved);
        assert!(f.storage.list_records(true).unwrap().is_empty());
        let status = coach.weekly_status().unwrap();
        assert!(status.completed.is_empty());

        assert!(coach.start_session(None, &[]).is_ok());
        let err = coach.cancel_session(first.session_id).unwrap_err();
        assert!(matches!(err, CoachError::SessionClosed));
    }

    #[test]
    fn unavailable_equipment_never_planned() {
        let f = Fixture::new();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach
            .start_session(Some(WorkoutType::Push), &["Barbells".to_string()])
            .unwrap();
        assert!(state.equipment_unavailable.contains("barbell"));
        for planned in &state.planned_template.exercises {
            let entry = f.catalog.resolve(&planned.name).unwrap();
            assert!(!entry.equipment.contains(&"barbell"), "{}", planned.name);
        }
        assert_eq!(suggested(&state), Some("Dumbbell Bench Press"));
        assert!(!state.planned_template.adaptations.is_empty());
    }

    #[test]
    fn excluding_mid_session_replans_the_rest() {
        let f = Fixture::new();
        f.abc_push_template();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_session(Some(WorkoutType::Push), &[]).unwrap();
        let state = coach
            .record_performed(state.session_id, "bench", sets("135x8"))
            .unwrap();
        let state = coach
            .exclude_equipment(state.session_id, vec!["barbell".into()])
            .unwrap();

        assert_eq!(suggested(&state), Some("Dumbbell Shoulder Press"));
        let stored = coach.show_session(state.session_id).unwrap();
        assert_eq!(stored, state);
    }

    #[test]
    fn failed_session_save_keeps_progress() {
        let f = Fixture::new();
        f.abc_push_template();
        let flaky = FlakyStore::new(&f.storage);
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&flaky, &extractor);

        let state = coach.start_session(Some(WorkoutType::Push), &[]).unwrap();
        let id = state.session_id;
        for name in ["bench", "ohp", "lateral raise"] {
            coach.record_performed(id, name, sets("50x10")).unwrap();
        }

        flaky.fail.set(true);
        let err = coach.finish_session(id).unwrap_err();
        assert!(matches!(err, CoachError::Storage(_)));
        let stored = coach.show_session(id).unwrap();
        assert_eq!(stored.phase, SessionPhase::Saving);
        assert_eq!(stored.current_plan_index, 3);
        assert_eq!(stored.accumulated_exercises.len(), 3);
        assert_eq!(f.completed(WorkoutType::Push), 0);

        // A saving session can't take new entries.
        let err = coach.record_performed(id, "dips", sets("10")).unwrap_err();
        assert!(matches!(
            err,
            CoachError::InvalidSignal {
                state: "saving",
                ..
            }
        ));

        flaky.fail.set(false);
        coach.finish_session(id).unwrap();
        assert_eq!(f.completed(WorkoutType::Push), 1);
    }

    #[test]
    fn continue_suggests_bonus_work() {
        let f = Fixture::new();
        f.abc_push_template();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_session(Some(WorkoutType::Push), &[]).unwrap();
        let id = state.session_id;
        for name in ["bench", "ohp", "lateral raise"] {
            coach.record_performed(id, name, sets("50x10")).unwrap();
        }

        let state = coach.continue_session(id).unwrap();
        let SessionPhase::Recording {
            suggestion: Some(suggestion),
        } = &state.phase
        else {
            panic!("expected a bonus suggestion, got {:?}", state.phase);
        };
        assert_eq!(suggestion.source, SuggestionSource::Adaptive);
        assert!(
            !["Barbell Bench Press", "Overhead Press", "Lateral Raise"]
                .contains(&suggestion.exercise.as_str())
        );
    }

    #[test]
    fn command_dispatch_reaches_handlers() {
        let f = Fixture::new();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let reply = coach
            .handle(Command::StartSession {
                requested: Some(WorkoutType::Legs),
                equipment_unavailable: vec![],
            })
            .unwrap();
        let Reply::Session(state) = reply else {
            panic!("expected a session");
        };
        assert_eq!(state.planned_template.workout_type, WorkoutType::Legs);

        let reply = coach.handle(Command::WeeklyStatus).unwrap();
        assert!(matches!(reply, Reply::Split(_)));
    }

    #[test]
    fn stale_store_maps_to_stale_snapshot() {
        let err = CoachError::from(StorageError::Stale {
            expected: 2,
            found: 3,
        });
        assert!(matches!(
            err,
            CoachError::StaleSnapshot {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn each_step_reloads_and_bumps_the_version() {
        let f = Fixture::new();
        f.abc_push_template();
        let extractor = ShorthandExtractor::new(&f.catalog);
        let coach = f.coach(&f.storage, &extractor);

        let state = coach.start_session(Some(WorkoutType::Push), &[]).unwrap();
        let Snapshot { version, .. } = f.storage.load_session(state.session_id).unwrap();

        // Another writer got in first. The coach loads fresh, so its step
        // still lands, but the old version is now stale.
        f.storage.store_session(&state, version).unwrap();
        coach
            .record_performed(state.session_id, "bench", sets("135x8"))
            .unwrap();
        assert_eq!(
            f.storage.load_session(state.session_id).unwrap().version,
            version + 2
        );
        assert!(matches!(
            f.storage.store_session(&state, version),
            Err(StorageError::Stale { .. })
        ));
    }
}
