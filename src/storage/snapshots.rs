//! Workflow snapshots: versioned, id-keyed session and log state.
//!
//! Each store is a compare-and-swap on `version`. Sessions also carry an
//! `open` flag so at most one unfinished session exists at a time.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::{
    model::{LogState, SessionState},
    store::{Snapshot, SnapshotStore},
};

use super::{Result, Storage, StorageError, parse_uuid};

impl SnapshotStore for Storage {
    fn insert_session(&self, state: &SessionState) -> Result<Snapshot<SessionState>> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        if let Some(existing) = open_session_id(&tx)? {
            return Err(StorageError::SessionOpen(existing));
        }
        tx.execute(
            "INSERT INTO sessions (id, open, version, state, updated_at)
             VALUES (?1, ?2, 1, ?3, ?4)",
            rusqlite::params![
                state.session_id.to_string(),
                state.is_open(),
                serde_json::to_string(state)?,
                Timestamp::now().to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(Snapshot {
            version: 1,
            state: state.clone(),
        })
    }

    fn load_session(&self, id: Uuid) -> Result<Snapshot<SessionState>> {
        let conn = self.open_db()?;
        let row: Option<(u64, String)> = conn
            .query_row(
                "SELECT version, state FROM sessions WHERE id = ?1",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (version, state) = row.ok_or(StorageError::SessionNotFound(id))?;
        Ok(Snapshot {
            version,
            state: serde_json::from_str(&state)?,
        })
    }

    fn store_session(&self, state: &SessionState, expected_version: u64) -> Result<u64> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let id = state.session_id;
        check_version(&tx, "sessions", id, expected_version)
            .map_err(|e| not_found_as(e, StorageError::SessionNotFound(id)))?;
        tx.execute(
            "UPDATE sessions SET open = ?1, version = version + 1, state = ?2, updated_at = ?3
             WHERE id = ?4",
            rusqlite::params![
                state.is_open(),
                serde_json::to_string(state)?,
                Timestamp::now().to_string(),
                id.to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(expected_version + 1)
    }

    fn open_session(&self) -> Result<Option<Uuid>> {
        let conn = self.open_db()?;
        open_session_id(&conn)
    }

    fn list_sessions(&self) -> Result<Vec<Uuid>> {
        self.list_ids("sessions")
    }

    fn insert_log(&self, state: &LogState) -> Result<Snapshot<LogState>> {
        let conn = self.open_db()?;
        conn.execute(
            "INSERT INTO log_states (id, version, state, updated_at) VALUES (?1, 1, ?2, ?3)",
            rusqlite::params![
                state.handle.to_string(),
                serde_json::to_string(state)?,
                Timestamp::now().to_string(),
            ],
        )?;
        Ok(Snapshot {
            version: 1,
            state: state.clone(),
        })
    }

    fn load_log(&self, handle: Uuid) -> Result<Snapshot<LogState>> {
        let conn = self.open_db()?;
        let row: Option<(u64, String)> = conn
            .query_row(
                "SELECT version, state FROM log_states WHERE id = ?1",
                [handle.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (version, state) = row.ok_or(StorageError::LogNotFound(handle))?;
        Ok(Snapshot {
            version,
            state: serde_json::from_str(&state)?,
        })
    }

    fn store_log(&self, state: &LogState, expected_version: u64) -> Result<u64> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let id = state.handle;
        check_version(&tx, "log_states", id, expected_version)
            .map_err(|e| not_found_as(e, StorageError::LogNotFound(id)))?;
        tx.execute(
            "UPDATE log_states SET version = version + 1, state = ?1, updated_at = ?2
             WHERE id = ?3",
            rusqlite::params![
                serde_json::to_string(state)?,
                Timestamp::now().to_string(),
                id.to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(expected_version + 1)
    }

    fn list_logs(&self) -> Result<Vec<Uuid>> {
        self.list_ids("log_states")
    }
}

impl Storage {
    fn list_ids(&self, table: &str) -> Result<Vec<Uuid>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare(&format!("SELECT id FROM {table} ORDER BY rowid DESC"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(parse_uuid(&row?)?);
        }
        Ok(ids)
    }
}

fn open_session_id(conn: &Connection) -> Result<Option<Uuid>> {
    let id: Option<String> = conn
        .query_row("SELECT id FROM sessions WHERE open = 1 LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    id.as_deref().map(parse_uuid).transpose()
}

/// Fails with `Stale` unless the stored version equals `expected`.
fn check_version(conn: &Connection, table: &str, id: Uuid, expected: u64) -> Result<()> {
    let found: u64 = conn.query_row(
        &format!("SELECT version FROM {table} WHERE id = ?1"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    if found != expected {
        return Err(StorageError::Stale { expected, found });
    }
    Ok(())
}

fn not_found_as(err: StorageError, not_found: StorageError) -> StorageError {
    match err {
        StorageError::Sqlite(rusqlite::Error::QueryReturnedNoRows) => not_found,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    use tempfile::TempDir;

    use crate::{
        config::SplitConfig,
        model::{
            Deviation, LogPhase, PlannedTemplate, SessionOutcome, SessionPhase, WorkoutDraft,
            WorkoutType,
        },
    };

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path(), SplitConfig::default()).unwrap();
        (dir, storage)
    }

    fn sample_session() -> SessionState {
        SessionState {
            session_id: Uuid::new_v4(),
            planned_template: PlannedTemplate {
                template_id: "push_a".into(),
                workout_type: WorkoutType::Push,
                reason: "next in rotation".into(),
                exercises: vec![],
                adaptations: vec![],
            },
            current_plan_index: 0,
            accumulated_exercises: vec![],
            equipment_unavailable: BTreeSet::new(),
            recording_mode: Deviation::Exact,
            plan_complete: false,
            saved: false,
            record_id: None,
            phase: SessionPhase::Recording { suggestion: None },
            deviations: vec![],
            skipped: vec![],
            bonus_exercises: 0,
            started_at: Timestamp::now(),
            last_activity_at: Timestamp::now(),
        }
    }

    fn sample_log() -> LogState {
        LogState {
            handle: Uuid::new_v4(),
            phase: LogPhase::Parsing,
            draft: WorkoutDraft::new("bench 135x8x3"),
            date: jiff::civil::date(2025, 6, 12),
            started_at: Timestamp::now(),
        }
    }

    #[test]
    fn insert_and_load_session() {
        let (_dir, storage) = test_storage();
        let session = sample_session();

        let snapshot = storage.insert_session(&session).unwrap();
        assert_eq!(snapshot.version, 1);

        let loaded = storage.load_session(session.session_id).unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.state, session);
        assert_eq!(storage.open_session().unwrap(), Some(session.session_id));
    }

    #[test]
    fn second_open_session_conflicts() {
        let (_dir, storage) = test_storage();
        let first = sample_session();
        storage.insert_session(&first).unwrap();

        let err = storage.insert_session(&sample_session()).unwrap_err();
        assert!(matches!(err, StorageError::SessionOpen(id) if id == first.session_id));
    }

    #[test]
    fn closing_a_session_frees_the_slot() {
        let (_dir, storage) = test_storage();
        let mut first = sample_session();
        storage.insert_session(&first).unwrap();

        first.phase = SessionPhase::Done {
            outcome: SessionOutcome::Cancelled,
        };
        assert_eq!(storage.store_session(&first, 1).unwrap(), 2);
        assert_eq!(storage.open_session().unwrap(), None);
        storage.insert_session(&sample_session()).unwrap();
        assert_eq!(storage.list_sessions().unwrap().len(), 2);
    }

    #[test]
    fn stale_store_is_rejected_and_leaves_state() {
        let (_dir, storage) = test_storage();
        let mut session = sample_session();
        storage.insert_session(&session).unwrap();

        session.current_plan_index = 1;
        storage.store_session(&session, 1).unwrap();

        session.current_plan_index = 5;
        let err = storage.store_session(&session, 1).unwrap_err();
        assert!(matches!(err, StorageError::Stale { expected: 1, found: 2 }));

        let loaded = storage.load_session(session.session_id).unwrap();
        assert_eq!(loaded.state.current_plan_index, 1);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (_dir, storage) = test_storage();
        let err = storage.load_session(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorageError::SessionNotFound(_)));

        let err = storage.store_session(&sample_session(), 1).unwrap_err();
        assert!(matches!(err, StorageError::SessionNotFound(_)));

        let err = storage.load_log(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorageError::LogNotFound(_)));
    }

    #[test]
    fn log_snapshots_round_trip_with_versions() {
        let (_dir, storage) = test_storage();
        let mut log = sample_log();
        storage.insert_log(&log).unwrap();

        log.phase = LogPhase::AwaitingConfirmation;
        assert_eq!(storage.store_log(&log, 1).unwrap(), 2);

        let loaded = storage.load_log(log.handle).unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.state.phase, LogPhase::AwaitingConfirmation);
        assert_eq!(storage.list_logs().unwrap(), vec![log.handle]);
    }
}
