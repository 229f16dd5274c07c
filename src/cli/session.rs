//! Live session commands.

use clap::Subcommand;
use uuid::Uuid;

use crate::{
    coach::{Coach, Command, Reply},
    model::Set,
};

use super::{WorkoutTypeArg, resolve_ref};

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Plan and start a session. Prints the plan and the first suggestion.
    ///
    /// Without `--type`, the weekly split picks: a type that is falling
    /// behind its target first, otherwise the next in rotation.
    Start {
        /// Train this workout type instead of the suggested one.
        #[arg(long = "type", value_enum)]
        workout_type: Option<WorkoutTypeArg>,

        /// Equipment that isn't available today (e.g. `barbell`).
        /// Can be specified multiple times.
        #[arg(long)]
        without: Vec<String>,
    },

    /// Record a performed exercise.
    ///
    /// A different exercise than planned is logged as an addition and the
    /// planned one stays up next.
    Record {
        /// Exercise name, e.g. `bench` or `Dumbbell Row`.
        exercise: String,

        /// One set: `REPS`, `WEIGHTxREPS`, or `WEIGHTxREPS@RPE`.
        /// Repeat for each set.
        #[arg(long = "set", required = true)]
        sets: Vec<Set>,
    },

    /// Skip the planned exercise that is up next.
    Skip,

    /// Mark equipment unavailable and re-plan the remaining exercises.
    Exclude {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Save the session. Retries if a previous save failed.
    Finish,

    /// Keep training after the plan is complete, with bonus suggestions.
    Continue,

    /// Abandon the session. Nothing is saved.
    Cancel,

    /// Show the plan, what has been recorded, and what's next.
    Show,
}

pub(super) fn run(
    coach: &Coach<'_>,
    session_ref: Option<&str>,
    command: SessionCommand,
) -> Result<Reply, String> {
    let request = match command {
        SessionCommand::Start {
            workout_type,
            without,
        } => Command::StartSession {
            requested: workout_type.map(WorkoutTypeArg::to_domain),
            equipment_unavailable: without,
        },
        SessionCommand::Record { exercise, sets } => Command::RecordPerformed {
            session: resolve_session(coach, session_ref)?,
            exercise,
            sets,
        },
        SessionCommand::Skip => Command::SkipExercise {
            session: resolve_session(coach, session_ref)?,
        },
        SessionCommand::Exclude { items } => Command::ExcludeEquipment {
            session: resolve_session(coach, session_ref)?,
            items,
        },
        SessionCommand::Finish => Command::FinishSession {
            session: resolve_session(coach, session_ref)?,
        },
        SessionCommand::Continue => Command::ContinueSession {
            session: resolve_session(coach, session_ref)?,
        },
        SessionCommand::Cancel => Command::CancelSession {
            session: resolve_session(coach, session_ref)?,
        },
        SessionCommand::Show => Command::ShowSession {
            session: resolve_session(coach, session_ref)?,
        },
    };

    coach.handle(request).map_err(|e| e.to_string())
}

/// The referenced session, or the open one when no reference is given.
fn resolve_session(coach: &Coach<'_>, reference: Option<&str>) -> Result<Uuid, String> {
    match reference {
        Some(reference) => {
            let ids = coach
                .sessions()
                .map_err(|e| format!("failed to list sessions: {e}"))?;
            resolve_ref(reference, &ids, "session")
        }
        None => coach
            .open_session()
            .map_err(|e| format!("failed to find the open session: {e}"))?
            .ok_or_else(|| "no open session; start one with `liftlog session start`".to_string()),
    }
}
