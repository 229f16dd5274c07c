//! CLI interface for liftlog.
//!
//! Every subcommand is non-interactive: arguments in, text out (or JSON
//! with `--json`). Workflows that wait on the user persist between calls,
//! so a draft or session is picked up again by reference.
//!
//! - `liftlog log new|approve|edit|cancel|retry|show`: log a finished workout.
//! - `liftlog session start|record|skip|exclude|finish|continue|cancel|show`:
//!   train along with a plan.
//! - `liftlog split`, `liftlog history ...`, `liftlog template show|import`.
//!
//! References take a full UUID or an unambiguous prefix. Session commands
//! default to the open session.

mod draft;
mod format;
mod history;
mod session;

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::{
    coach::{self, Coach, Reply},
    model::{TemplateDefinition, WorkoutType},
    store::RecordStore,
};

use self::{
    draft::LogCommand,
    format::{format_draft, format_session, format_split, format_template, short_id},
    history::HistoryCommand,
    session::SessionCommand,
};

/// liftlog: capture workouts, train to a plan.
#[derive(Debug, Parser)]
#[command(name = "liftlog", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Logging a finished workout
  1. liftlog log new 'bench 135x8x3, overhead 95x8x3'
     → prints the draft and its handle (e.g. a3b0fc12)
  2. liftlog log edit a3b 'overhead 100x8x3'
  3. liftlog log approve a3b

Training along with a plan
  1. liftlog session start --without barbell
  2. liftlog session record 'dumbbell bench press' --set 60x10 --set 60x10 --set 60x9
  3. liftlog session skip
  4. liftlog session finish";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log a finished workout from free-form notes.
    ///
    /// Notes are parsed into a draft that must be approved before
    /// anything is saved.
    Log {
        #[command(subcommand)]
        command: LogCommand,
    },

    /// Run a live session against the planned template.
    Session {
        /// Session ID: full UUID or unambiguous prefix. Defaults to the
        /// open session.
        #[arg(long = "session", global = true, value_name = "ID")]
        session_ref: Option<String>,

        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Show this week's split progress.
    Split {
        /// First count a session done outside liftlog toward this week.
        #[arg(long, value_enum)]
        count: Option<WorkoutTypeArg>,
    },

    /// Browse and curate saved workouts.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Inspect workout templates.
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// Show the template used to plan a workout type.
    Show {
        #[arg(value_enum)]
        workout_type: WorkoutTypeArg,
    },

    /// Replace the template for its workout type with one read from a JSON
    /// file.
    Import { path: PathBuf },
}

/// CLI-facing workout type, mapped to the domain `WorkoutType`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WorkoutTypeArg {
    Push,
    Pull,
    Legs,
    Upper,
    Lower,
    Other,
}

impl WorkoutTypeArg {
    fn to_domain(self) -> WorkoutType {
        match self {
            Self::Push => WorkoutType::Push,
            Self::Pull => WorkoutType::Pull,
            Self::Legs => WorkoutType::Legs,
            Self::Upper => WorkoutType::Upper,
            Self::Lower => WorkoutType::Lower,
            Self::Other => WorkoutType::Other,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(coach: &Coach<'_>, records: &dyn RecordStore) -> Result<(), String> {
    let cli = Cli::parse();

    let reply = match cli.command {
        Command::Log { command } => draft::run(coach, command)?,
        Command::Session {
            session_ref,
            command,
        } => session::run(coach, session_ref.as_deref(), command)?,
        Command::Split { count } => {
            if let Some(t) = count {
                records
                    .increment_weekly_count(t.to_domain())
                    .map_err(|e| format!("failed to count session: {e}"))?;
            }
            coach
                .handle(coach::Command::WeeklyStatus)
                .map_err(|e| format!("failed to read split: {e}"))?
        }
        Command::History { command } => return history::run(records, command, cli.json),
        Command::Template { command } => {
            return match command {
                TemplateCommand::Show { workout_type } => {
                    cmd_template(records, workout_type.to_domain(), cli.json)
                }
                TemplateCommand::Import { path } => cmd_template_import(records, &path),
            };
        }
    };

    print_reply(&reply, cli.json)
}

fn print_reply(reply: &Reply, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(reply)
            .map_err(|e| format!("failed to serialize reply: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    match reply {
        Reply::Log(state) => println!("{}", format_draft(state)),
        Reply::Session(state) => println!("{}", format_session(state)),
        Reply::Saved { record_id } => println!("Saved as {record_id}"),
        Reply::Split(status) => println!("{}", format_split(status)),
    }
    Ok(())
}

fn cmd_template(
    records: &dyn RecordStore,
    workout_type: WorkoutType,
    json: bool,
) -> Result<(), String> {
    let template = records
        .get_template(workout_type)
        .map_err(|e| format!("failed to load template: {e}"))?
        .ok_or_else(|| format!("no template for {workout_type}"))?;

    if json {
        let out = serde_json::to_string_pretty(&template)
            .map_err(|e| format!("failed to serialize template: {e}"))?;
        println!("{out}");
    } else {
        println!("{}", format_template(&template));
    }
    Ok(())
}

fn cmd_template_import(records: &dyn RecordStore, path: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let template: TemplateDefinition = serde_json::from_str(&contents)
        .map_err(|e| format!("invalid template in {}: {e}", path.display()))?;
    if template.exercises.is_empty() {
        return Err(format!("template '{}' has no exercises", template.id));
    }

    records
        .put_template(&template)
        .map_err(|e| format!("failed to store template: {e}"))?;
    eprintln!(
        "Stored template {} for {}",
        template.id, template.workout_type
    );
    Ok(())
}

/// Resolve a reference (full UUID or unambiguous prefix) against `ids`.
fn resolve_ref(reference: &str, ids: &[Uuid], kind: &str) -> Result<Uuid, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        return Ok(id);
    }

    let matches: Vec<Uuid> = ids
        .iter()
        .copied()
        .filter(|id| id.to_string().starts_with(reference))
        .collect();

    match matches.as_slice() {
        [] => Err(format!("no {kind} matching '{reference}'")),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|id| short_id(*id)).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {} {kind}s: {}",
                matches.len(),
                ids.join(", ")
            ))
        }
    }
}
