//! Local persistence for workouts, templates, the weekly split, and
//! in-flight workflow snapshots.
//!
//! Everything lives in one `SQLite` file under the data directory:
//!
//! ```text
//! <root>/liftlog.sqlite
//!   records       # Workouts, JSON bodies, soft-deletable
//!   split_counts  # Completed sessions per (week, type)
//!   split_meta    # Rotation position
//!   templates     # One canonical template per workout type
//!   sessions      # Live session snapshots, versioned
//!   log_states    # Retrospective log snapshots, versioned
//! ```

mod records;
mod snapshots;
mod split;
mod templates;

use std::{fs, io, path::PathBuf};

use jiff::{ToSpan, Zoned, civil::Date};
use log::debug;
use rusqlite::Connection;
use uuid::Uuid;

use crate::{catalog, config::SplitConfig};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("log not found: {0}")]
    LogNotFound(Uuid),

    #[error("session {0} is still open")]
    SessionOpen(Uuid),

    #[error("snapshot is stale: expected version {expected}, found {found}")]
    Stale { expected: u64, found: u64 },

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("date error: {0}")]
    Date(#[from] jiff::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const DB_FILE: &str = "liftlog.sqlite";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id           TEXT PRIMARY KEY,
        source_id    TEXT NOT NULL UNIQUE,
        date         TEXT NOT NULL,
        workout_type TEXT NOT NULL,
        body         TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        deleted_at   TEXT,
        counted      INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS records_date ON records (date);

    CREATE TABLE IF NOT EXISTS split_counts (
        week_start   TEXT NOT NULL,
        workout_type TEXT NOT NULL,
        count        INTEGER NOT NULL,
        PRIMARY KEY (week_start, workout_type)
    );

    CREATE TABLE IF NOT EXISTS split_meta (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS templates (
        workout_type TEXT PRIMARY KEY,
        body         TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id         TEXT PRIMARY KEY,
        open       INTEGER NOT NULL,
        version    INTEGER NOT NULL,
        state      TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS log_states (
        id         TEXT PRIMARY KEY,
        version    INTEGER NOT NULL,
        state      TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

/// `SQLite`-backed record and snapshot store.
pub struct Storage {
    root: PathBuf,
    split: SplitConfig,

    /// Pins "today" for week arithmetic. Uses the local date when unset.
    today: Option<Date>,
}

impl Storage {
    /// Opens the store under `root`, creating the directory, schema, and
    /// default templates as needed.
    pub fn new(root: impl Into<PathBuf>, split: SplitConfig) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let storage = Self {
            root,
            split,
            today: None,
        };
        let conn = storage.open_db()?;
        conn.execute_batch(SCHEMA)?;
        storage.seed_templates(&conn)?;
        Ok(storage)
    }

    /// Pins the current date. Week boundaries are computed from it.
    #[cfg(test)]
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    fn open_db(&self) -> Result<Connection> {
        Ok(Connection::open(self.root.join(DB_FILE))?)
    }

    fn today(&self) -> Date {
        self.today.unwrap_or_else(|| Zoned::now().date())
    }

    fn seed_templates(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM templates", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        for template in catalog::default_templates() {
            debug!("seeding template {}", template.id);
            templates::write_template(conn, &template)?;
        }
        Ok(())
    }
}

/// Monday of the week containing `date`.
fn week_start(date: Date) -> Result<Date> {
    let offset = date.weekday().to_monday_zero_offset();
    Ok(date.checked_sub(i64::from(offset).days())?)
}

fn parse_date(s: &str) -> Result<Date> {
    s.parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid date {s:?}: {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid id {s:?}: {e}")))
}
