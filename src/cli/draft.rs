//! Retrospective log commands: new, approve, edit, cancel, retry, show.

use std::io;

use clap::Subcommand;
use jiff::civil::Date;
use uuid::Uuid;

use crate::coach::{Coach, Command, Confirmation, Reply};

use super::resolve_ref;

#[derive(Debug, Subcommand)]
pub enum LogCommand {
    /// Parse workout notes into a draft. Prints the draft and its handle.
    New {
        /// Free-form notes, e.g. `bench 135x8x3, overhead 95x8x3`.
        /// Read from stdin when omitted.
        notes: Option<String>,

        /// Day the workout happened (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<Date>,
    },

    /// Approve the draft and save it.
    Approve {
        /// Draft handle: full UUID or unambiguous prefix.
        handle: String,
    },

    /// Re-parse the notes with a correction, e.g. `remove squat` or
    /// `bench 145x8x3`. The previous draft is discarded.
    Edit {
        /// Draft handle: full UUID or unambiguous prefix.
        handle: String,

        correction: String,
    },

    /// Discard the draft. Nothing is saved.
    Cancel {
        /// Draft handle: full UUID or unambiguous prefix.
        handle: String,
    },

    /// Retry a save that failed.
    Retry {
        /// Draft handle: full UUID or unambiguous prefix.
        handle: String,
    },

    /// Show a draft.
    Show {
        /// Draft handle: full UUID or unambiguous prefix.
        handle: String,
    },
}

pub(super) fn run(coach: &Coach<'_>, command: LogCommand) -> Result<Reply, String> {
    let request = match command {
        LogCommand::New { notes, date } => {
            let raw = match notes {
                Some(notes) => notes,
                None => io::read_to_string(io::stdin())
                    .map_err(|e| format!("failed to read notes from stdin: {e}"))?,
            };
            if raw.trim().is_empty() {
                return Err("no notes given".to_string());
            }
            Command::StartLog { raw, date }
        }
        LogCommand::Approve { handle } => Command::Confirm {
            handle: resolve_log(coach, &handle)?,
            confirmation: Confirmation::Approve,
        },
        LogCommand::Edit { handle, correction } => Command::Confirm {
            handle: resolve_log(coach, &handle)?,
            confirmation: Confirmation::Edit(correction),
        },
        LogCommand::Cancel { handle } => Command::Confirm {
            handle: resolve_log(coach, &handle)?,
            confirmation: Confirmation::Cancel,
        },
        LogCommand::Retry { handle } => Command::RetryLogSave {
            handle: resolve_log(coach, &handle)?,
        },
        LogCommand::Show { handle } => Command::ShowLog {
            handle: resolve_log(coach, &handle)?,
        },
    };

    coach.handle(request).map_err(|e| e.to_string())
}

fn resolve_log(coach: &Coach<'_>, reference: &str) -> Result<Uuid, String> {
    let handles = coach
        .logs()
        .map_err(|e| format!("failed to list drafts: {e}"))?;
    resolve_ref(reference, &handles, "draft")
}
