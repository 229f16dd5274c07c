//! Weekly split storage: per-week completion counts and the rotation cursor.
//!
//! Counts are keyed by the Monday of the workout's week. The rotation
//! cursor is the index of the rotation slot most recently filled; the next
//! suggestion is the first later slot whose type still has sessions
//! remaining this week.

use std::collections::BTreeMap;

use jiff::civil::Date;
use rusqlite::{Connection, OptionalExtension};

use crate::model::{WeeklySplitStatus, WorkoutType};

use super::{Result, Storage, StorageError, week_start};

const ROTATION_KEY: &str = "rotation_pos";

impl Storage {
    pub(super) fn weekly_split_status(&self) -> Result<WeeklySplitStatus> {
        let today = self.today();
        let week = week_start(today)?;
        let conn = self.open_db()?;

        let mut completed = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT workout_type, count FROM split_counts WHERE week_start = ?1")?;
        let rows = stmt.query_map([week.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        for row in rows {
            let (type_str, count) = row?;
            let workout_type = type_str
                .parse::<WorkoutType>()
                .map_err(StorageError::Corrupt)?;
            if count > 0 {
                completed.insert(workout_type, count);
            }
        }

        let targets = self.split.targets.clone();
        let remaining: BTreeMap<_, _> = targets
            .iter()
            .map(|(t, target)| {
                let done = completed.get(t).copied().unwrap_or(0);
                (*t, target.saturating_sub(done))
            })
            .collect();

        let cursor = read_cursor(&conn)?;
        let next_suggested = next_in_rotation(&self.split.rotation, cursor, |t| {
            remaining.get(&t).copied().unwrap_or(0)
        });
        let days_left_in_week = 7 - u32::from(today.weekday().to_monday_zero_offset().unsigned_abs());

        Ok(WeeklySplitStatus {
            week_start: week,
            completed,
            targets,
            remaining,
            next_suggested,
            days_left_in_week,
        })
    }

    /// Counts one more `workout_type` session this week.
    pub(super) fn increment_count(&self, workout_type: WorkoutType) -> Result<()> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let today = self.today();
        self.count_session(&tx, today, workout_type)?;
        tx.commit()?;
        Ok(())
    }

    /// Bumps the count for `date`'s week and moves the rotation cursor.
    pub(super) fn count_session(
        &self,
        conn: &Connection,
        date: Date,
        workout_type: WorkoutType,
    ) -> Result<()> {
        bump_count(conn, week_start(date)?, workout_type, 1)?;
        let cursor = read_cursor(conn)?;
        if let Some(pos) = advance_cursor(&self.split.rotation, cursor, workout_type) {
            conn.execute(
                "INSERT INTO split_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                rusqlite::params![ROTATION_KEY, pos.to_string()],
            )?;
        }
        Ok(())
    }
}

/// Adds `delta` to the (week, type) count, never going below zero.
pub(super) fn bump_count(
    conn: &Connection,
    week: Date,
    workout_type: WorkoutType,
    delta: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO split_counts (week_start, workout_type, count) VALUES (?1, ?2, MAX(?3, 0))
         ON CONFLICT (week_start, workout_type) DO UPDATE SET count = MAX(count + ?3, 0)",
        rusqlite::params![week.to_string(), workout_type.as_str(), delta],
    )?;
    Ok(())
}

fn read_cursor(conn: &Connection) -> Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM split_meta WHERE key = ?1",
            [ROTATION_KEY],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| StorageError::Corrupt(format!("invalid rotation cursor {v:?}: {e}")))
        })
        .transpose()
}

/// The slot filled by `workout_type`: its next occurrence after `cursor`.
/// `None` if the type isn't in the rotation.
fn advance_cursor(
    rotation: &[WorkoutType],
    cursor: Option<usize>,
    workout_type: WorkoutType,
) -> Option<usize> {
    let len = rotation.len();
    let start = cursor.map_or(0, |c| c + 1);
    (0..len)
        .map(|i| (start + i) % len)
        .find(|&i| rotation[i] == workout_type)
}

/// The first type after `cursor` with sessions remaining, or simply the
/// next slot when the week's targets are all met.
fn next_in_rotation(
    rotation: &[WorkoutType],
    cursor: Option<usize>,
    remaining: impl Fn(WorkoutType) -> u32,
) -> WorkoutType {
    let len = rotation.len();
    if len == 0 {
        return WorkoutType::Other;
    }
    let start = cursor.map_or(0, |c| c + 1);
    (0..len)
        .map(|i| rotation[(start + i) % len])
        .find(|&t| remaining(t) > 0)
        .unwrap_or(rotation[start % len])
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::config::SplitConfig;

    use WorkoutType::*;

    fn test_storage(today: Date) -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path(), SplitConfig::default())
            .unwrap()
            .with_today(today);
        (dir, storage)
    }

    #[test]
    fn fresh_week_has_full_targets() {
        // Monday.
        let (_dir, storage) = test_storage(date(2025, 6, 9));
        let status = storage.weekly_split_status().unwrap();

        assert_eq!(status.week_start, date(2025, 6, 9));
        assert_eq!(status.days_left_in_week, 7);
        assert_eq!(status.remaining_for(Legs), 2);
        assert_eq!(status.total_remaining(), 6);
        assert_eq!(status.next_suggested, Push);
    }

    #[test]
    fn sunday_has_one_day_left() {
        let (_dir, storage) = test_storage(date(2025, 6, 15));
        let status = storage.weekly_split_status().unwrap();
        assert_eq!(status.days_left_in_week, 1);
    }

    #[test]
    fn increment_advances_rotation_past_logged_type() {
        let (_dir, storage) = test_storage(date(2025, 6, 10));
        storage.increment_count(Push).unwrap();

        let status = storage.weekly_split_status().unwrap();
        assert_eq!(status.completed_for(Push), 1);
        assert_eq!(status.remaining_for(Push), 0);
        assert_eq!(status.next_suggested, Pull);
    }

    #[test]
    fn rotation_skips_types_already_done() {
        let (_dir, storage) = test_storage(date(2025, 6, 10));
        // Pull first, then Push: the cursor lands on slot 0 and the next
        // slot, Pull, is already done this week.
        storage.increment_count(Pull).unwrap();
        storage.increment_count(Push).unwrap();

        let status = storage.weekly_split_status().unwrap();
        assert_eq!(status.next_suggested, Legs);
    }

    #[test]
    fn counts_are_per_week() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path(), SplitConfig::default())
            .unwrap()
            .with_today(date(2025, 6, 10));
        storage.increment_count(Legs).unwrap();

        let next_week = Storage::new(dir.path(), SplitConfig::default())
            .unwrap()
            .with_today(date(2025, 6, 17));
        let status = next_week.weekly_split_status().unwrap();
        assert_eq!(status.completed_for(Legs), 0);
        assert_eq!(status.remaining_for(Legs), 2);
    }

    #[test]
    fn bump_count_never_goes_negative() {
        let (_dir, storage) = test_storage(date(2025, 6, 10));
        let conn = storage.open_db().unwrap();
        let week = date(2025, 6, 9);
        bump_count(&conn, week, Push, -1).unwrap();
        bump_count(&conn, week, Push, 1).unwrap();
        bump_count(&conn, week, Push, -3).unwrap();

        let status = storage.weekly_split_status().unwrap();
        assert_eq!(status.completed_for(Push), 0);
    }

    #[test]
    fn next_in_rotation_falls_back_when_all_done() {
        let rotation = [Push, Pull, Legs];
        assert_eq!(next_in_rotation(&rotation, Some(0), |_| 0), Pull);
        assert_eq!(next_in_rotation(&rotation, Some(2), |_| 0), Push);
        assert_eq!(next_in_rotation(&rotation, None, |t| u32::from(t == Legs)), Legs);
    }

    #[test]
    fn advance_cursor_finds_next_occurrence() {
        let rotation = SplitConfig::default().rotation;
        // Legs appears at 2 and 5.
        assert_eq!(advance_cursor(&rotation, None, Legs), Some(2));
        assert_eq!(advance_cursor(&rotation, Some(2), Legs), Some(5));
        assert_eq!(advance_cursor(&rotation, Some(5), Legs), Some(2));
        assert_eq!(advance_cursor(&rotation, Some(1), Other), None);
    }
}
