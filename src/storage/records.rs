//! Workout record storage and the [`RecordStore`] implementation.

use jiff::{Timestamp, ToSpan};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    catalog::normalize_name,
    model::{
        ExercisePerformance, StoredWorkout, TemplateDefinition, WeeklySplitStatus, Workout,
        WorkoutType,
    },
    store::{Commit, RecordStore},
};

use super::{Result, Storage, StorageError, parse_date, split::bump_count, week_start};

const RECORD_COLUMNS: &str = "id, created_at, deleted_at, body";

impl RecordStore for Storage {
    fn add_record(&self, workout: &Workout) -> Result<String> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let (id, _) = insert_record(&tx, workout, false)?;
        tx.commit()?;
        Ok(id)
    }

    fn commit_workout(&self, workout: &Workout) -> Result<Commit> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let (record_id, created) = insert_record(&tx, workout, true)?;
        if created {
            self.count_session(&tx, workout.date, workout.workout_type)?;
        }
        tx.commit()?;
        if created {
            info!("saved workout {record_id} ({})", workout.workout_type);
        } else {
            debug!("workout from {} already saved as {record_id}", workout.source_id);
        }
        Ok(Commit { record_id, created })
    }

    fn get_weekly_split_status(&self) -> Result<WeeklySplitStatus> {
        self.weekly_split_status()
    }

    fn get_template(&self, workout_type: WorkoutType) -> Result<Option<TemplateDefinition>> {
        self.load_template(workout_type)
    }

    fn put_template(&self, template: &TemplateDefinition) -> Result<()> {
        self.save_template(template)
    }

    fn get_exercise_history(&self, name: &str, days: u32) -> Result<Vec<ExercisePerformance>> {
        let cutoff = if days == 0 {
            None
        } else {
            Some(self.today().checked_sub(i64::from(days).days())?.to_string())
        };
        let key = normalize_name(name);

        let conn = self.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT id, date, body FROM records
             WHERE deleted_at IS NULL AND (?1 IS NULL OR date >= ?1)
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map([cutoff], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (record_id, date, body) = row?;
            let workout: Workout = serde_json::from_str(&body)?;
            let mut matching = workout
                .exercises
                .into_iter()
                .filter(|e| normalize_name(&e.name) == key);
            let Some(mut entry) = matching.next() else {
                continue;
            };
            for more in matching {
                entry.sets.extend(more.sets);
            }
            history.push(ExercisePerformance {
                record_id,
                date: parse_date(&date)?,
                entry,
            });
        }
        Ok(history)
    }

    fn increment_weekly_count(&self, workout_type: WorkoutType) -> Result<()> {
        self.increment_count(workout_type)
    }

    fn get_record(&self, id: &str) -> Result<StoredWorkout> {
        let conn = self.open_db()?;
        load_record(&conn, id)
    }

    fn list_records(&self, include_deleted: bool) -> Result<Vec<StoredWorkout>> {
        let filter = if include_deleted {
            ""
        } else {
            "WHERE deleted_at IS NULL"
        };
        self.query_records(&format!(
            "SELECT {RECORD_COLUMNS} FROM records {filter} ORDER BY date, id"
        ))
    }

    fn update_notes(&self, id: &str, notes: &str) -> Result<()> {
        let conn = self.open_db()?;
        let mut record = load_record(&conn, id)?;
        record.workout.notes = Some(notes.to_string());
        conn.execute(
            "UPDATE records SET body = ?1 WHERE id = ?2",
            rusqlite::params![serde_json::to_string(&record.workout)?, id],
        )?;
        Ok(())
    }

    fn soft_delete(&self, id: &str) -> Result<()> {
        self.set_deleted(id, Some(Timestamp::now()))
    }

    fn restore(&self, id: &str) -> Result<()> {
        self.set_deleted(id, None)
    }

    fn list_deleted(&self) -> Result<Vec<StoredWorkout>> {
        self.query_records(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC"
        ))
    }

    fn purge_deleted(&self, cutoff: Timestamp) -> Result<Vec<String>> {
        let expired: Vec<String> = self
            .list_deleted()?
            .into_iter()
            .filter(|r| r.deleted_at.is_some_and(|at| at < cutoff))
            .map(|r| r.id)
            .collect();

        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        for id in &expired {
            tx.execute(
                "DELETE FROM records WHERE id = ?1 AND deleted_at IS NOT NULL",
                [id],
            )?;
        }
        tx.commit()?;
        if !expired.is_empty() {
            info!("purged {} deleted workout(s)", expired.len());
        }
        Ok(expired)
    }
}

impl Storage {
    fn query_records(&self, sql: &str) -> Result<Vec<StoredWorkout>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], raw_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(parse_record(row?)?);
        }
        Ok(records)
    }

    /// Moves a record into or out of the trash.
    ///
    /// Counted records leave and rejoin their week's split count with it.
    /// Deleting a deleted record, or restoring a live one, does nothing.
    fn set_deleted(&self, id: &str, deleted_at: Option<Timestamp>) -> Result<()> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let record = load_record(&tx, id)?;
        let counted: bool = tx.query_row(
            "SELECT counted FROM records WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if record.deleted_at.is_some() == deleted_at.is_some() {
            return Ok(());
        }

        tx.execute(
            "UPDATE records SET deleted_at = ?1 WHERE id = ?2",
            rusqlite::params![deleted_at.map(|t| t.to_string()), id],
        )?;
        if counted {
            let delta = if deleted_at.is_some() { -1 } else { 1 };
            bump_count(
                &tx,
                week_start(record.workout.date)?,
                record.workout.workout_type,
                delta,
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Inserts `workout` unless its source is already stored.
///
/// Returns the record id and whether a row was created.
fn insert_record(conn: &Connection, workout: &Workout, counted: bool) -> Result<(String, bool)> {
    let source = workout.source_id.to_string();
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM records WHERE source_id = ?1",
            [&source],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok((id, false));
    }

    let date = workout.date.to_string();
    let same_day: i64 = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE date = ?1",
        [&date],
        |row| row.get(0),
    )?;
    let id = format!("{date}-{:03}", same_day + 1);

    conn.execute(
        "INSERT INTO records (id, source_id, date, workout_type, body, created_at, counted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            &id,
            source,
            date,
            workout.workout_type.as_str(),
            serde_json::to_string(workout)?,
            Timestamp::now().to_string(),
            counted,
        ],
    )?;
    Ok((id, true))
}

fn load_record(conn: &Connection, id: &str) -> Result<StoredWorkout> {
    let raw = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
            [id],
            raw_record,
        )
        .optional()?
        .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;
    parse_record(raw)
}

type RawRecord = (String, String, Option<String>, String);

fn raw_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn parse_record((id, created_at, deleted_at, body): RawRecord) -> Result<StoredWorkout> {
    let parse_ts = |s: &str| {
        s.parse::<Timestamp>()
            .map_err(|e| StorageError::Corrupt(format!("invalid timestamp {s:?}: {e}")))
    };
    Ok(StoredWorkout {
        created_at: parse_ts(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
        workout: serde_json::from_str(&body)?,
        id,
    })
}
