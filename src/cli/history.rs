//! Saved workout commands: list, show, note, delete, restore, trash,
//! purge, import, per-exercise history, and progression stats.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Subcommand;
use jiff::{Timestamp, ToSpan};
use serde::Serialize;

use crate::{
    model::Workout,
    stats::{ExerciseStats, exercise_stats},
    store::RecordStore,
};

use super::format::{format_record, format_record_line, format_sets, format_stats};

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved workouts, oldest first.
    List {
        /// Include deleted workouts.
        #[arg(long)]
        all: bool,
    },

    /// Show one workout in full.
    Show {
        /// Record ID, e.g. `2025-06-12-001`.
        id: String,
    },

    /// Replace a workout's notes.
    Note { id: String, text: String },

    /// Move a workout to the trash. Its week's split count goes down.
    Delete { id: String },

    /// Bring a workout back from the trash.
    Restore { id: String },

    /// List deleted workouts, most recently deleted first.
    Trash,

    /// Permanently remove workouts that have been in the trash too long.
    Purge {
        /// Keep workouts deleted within this many days.
        #[arg(long, default_value_t = 30)]
        older_than: u32,
    },

    /// Add a workout from a JSON file without counting it toward the split.
    ///
    /// Importing the same file twice stores it once.
    Import { path: PathBuf },

    /// Past performances of one exercise, newest first.
    Exercise {
        name: String,

        /// How many days back to look. 0 means all time.
        #[arg(long, default_value_t = 90)]
        days: u32,
    },

    /// Progression and personal record for one or more exercises.
    ///
    /// Several names print side by side for comparison.
    Stats {
        #[arg(required = true)]
        names: Vec<String>,

        /// How many days back to look. 0 means all time.
        #[arg(long, default_value_t = 180)]
        days: u32,
    },
}

pub(super) fn run(
    records: &dyn RecordStore,
    command: HistoryCommand,
    json: bool,
) -> Result<(), String> {
    match command {
        HistoryCommand::List { all } => {
            let list = records
                .list_records(all)
                .map_err(|e| format!("failed to list workouts: {e}"))?;
            if json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No workouts");
            }
            for record in &list {
                println!("{}", format_record_line(record));
            }
        }
        HistoryCommand::Show { id } => {
            let record = records.get_record(&id).map_err(|e| e.to_string())?;
            if json {
                return print_json(&record);
            }
            println!("{}", format_record(&record));
        }
        HistoryCommand::Note { id, text } => {
            records
                .update_notes(&id, &text)
                .map_err(|e| format!("failed to update notes: {e}"))?;
            eprintln!("Notes updated on {id}");
        }
        HistoryCommand::Delete { id } => {
            records
                .soft_delete(&id)
                .map_err(|e| format!("failed to delete workout: {e}"))?;
            eprintln!("Deleted {id}");
        }
        HistoryCommand::Restore { id } => {
            records
                .restore(&id)
                .map_err(|e| format!("failed to restore workout: {e}"))?;
            eprintln!("Restored {id}");
        }
        HistoryCommand::Trash => {
            let list = records
                .list_deleted()
                .map_err(|e| format!("failed to list deleted workouts: {e}"))?;
            if json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("Trash is empty");
            }
            for record in &list {
                println!("{}", format_record_line(record));
            }
        }
        HistoryCommand::Purge { older_than } => {
            let cutoff = Timestamp::now()
                .checked_sub((i64::from(older_than) * 24).hours())
                .map_err(|e| format!("invalid purge window: {e}"))?;
            let purged = records
                .purge_deleted(cutoff)
                .map_err(|e| format!("failed to purge deleted workouts: {e}"))?;
            if json {
                return print_json(&purged);
            }
            eprintln!("Purged {} workout(s)", purged.len());
        }
        HistoryCommand::Import { path } => {
            let workout = read_workout(&path)?;
            let id = records
                .add_record(&workout)
                .map_err(|e| format!("failed to import workout: {e}"))?;
            println!("{id}");
        }
        HistoryCommand::Exercise { name, days } => {
            let history = records
                .get_exercise_history(&name, days)
                .map_err(|e| format!("failed to read history: {e}"))?;
            if json {
                return print_json(&history);
            }
            if history.is_empty() {
                println!("No history for {name}");
            }
            for p in &history {
                println!("{}  {}: {}", p.date, p.entry.name, format_sets(&p.entry.sets));
            }
        }
        HistoryCommand::Stats { names, days } => {
            let stats = names
                .iter()
                .map(|name| -> Result<ExerciseStats, String> {
                    let history = records
                        .get_exercise_history(name, days)
                        .map_err(|e| format!("failed to read history: {e}"))?;
                    let name = history
                        .first()
                        .map_or(name.as_str(), |p| p.entry.name.as_str());
                    Ok(exercise_stats(name, &history))
                })
                .collect::<Result<Vec<ExerciseStats>, String>>()?;
            if json {
                return print_json(&stats);
            }
            let blocks: Vec<String> = stats.iter().map(format_stats).collect();
            println!("{}", blocks.join("\n\n"));
        }
    }
    Ok(())
}

/// Reads a workout from a JSON file. Sets are checked on the way in.
fn read_workout(path: &Path) -> Result<Workout, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("invalid workout in {}: {e}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| format!("failed to serialize output: {e}"))?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    const WORKOUT: &str = r#"{
        "sourceId": "6f1c2d3e-0000-4000-8000-000000000000",
        "date": "2025-06-10",
        "workoutType": "push",
        "exercises": [
            {"name": "Barbell Bench Press", "sets": [{"reps": 8, "weight": 135.0, "effort": EFFORT}]}
        ]
    }"#;

    fn write(dir: &TempDir, effort: &str) -> PathBuf {
        let path = dir.path().join("workout.json");
        fs::write(&path, WORKOUT.replace("EFFORT", effort)).unwrap();
        path
    }

    #[test]
    fn import_reads_a_valid_workout() {
        let dir = TempDir::new().unwrap();
        let workout = read_workout(&write(&dir, "8")).unwrap();
        assert_eq!(workout.exercises[0].sets[0].effort, Some(8));
    }

    #[test]
    fn import_rejects_out_of_range_sets() {
        let dir = TempDir::new().unwrap();
        let err = read_workout(&write(&dir, "14")).unwrap_err();
        assert!(err.contains("invalid workout"), "{err}");
        assert!(err.contains("effort rating must be between 1 and 10"), "{err}");
    }
}
