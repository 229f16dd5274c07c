//! Workout-capture state machines.
//!
//! Each workflow is a pure transition: `(state, signal) → (state, effect)`.
//! Effects name the side effect the caller must perform next (extract,
//! suggest, save); its outcome comes back as another signal. Nothing here
//! touches storage, so a failed effect leaves the caller's persisted
//! snapshot exactly as it was.

mod log;
mod session;

pub use self::log::{LogEffect, LogSignal, step as step_log};
pub use self::session::{SessionContext, SessionEffect, SessionSignal, step as step_session};

/// A signal the current state does not accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {signal} while {state}")]
    InvalidSignal {
        state: &'static str,
        signal: &'static str,
    },

    #[error("nothing to save: no exercises recorded")]
    EmptyWorkout,

    #[error("already closed")]
    Closed,
}

pub type Result<T> = core::result::Result<T, TransitionError>;
