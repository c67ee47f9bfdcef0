use std::{fmt, str::FromStr};

use crate::Error;

/// Run mode of a [`Stepper`](crate::Stepper).
///
/// Exactly one state is active at a time. Transitions follow this table:
///
/// ```text
/// Stopped  --start_stepping / enter(Stepping)-->  Stepping
/// Stopped  --set_running / enter(Running)------>  Running
/// Running  --pause----------------------------->  Paused
/// Stepping --pause / steps exhausted----------->  Paused
/// Paused   --enter(Stepping) / enter(Running)-->  Stepping / Running
/// any      --stop------------------------------>  Stopped
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    /// Initial and terminal state. Step points return "abort".
    #[default]
    Stopped,
    /// The worker runs freely; only an explicit pause or the stop checker suspends it.
    Running,
    /// The worker runs until the configured number of matching step points has passed.
    Stepping,
    /// The worker is (or will be, at its next step point) blocked waiting for a command.
    Paused,
}

impl RunState {
    /// `true` for the states in which the worker makes progress.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::Stepping)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => write!(f, "stopped"),
            RunState::Running => write!(f, "running"),
            RunState::Stepping => write!(f, "stepping"),
            RunState::Paused => write!(f, "paused"),
        }
    }
}

impl FromStr for RunState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stopped" => Ok(RunState::Stopped),
            "running" => Ok(RunState::Running),
            "stepping" => Ok(RunState::Stepping),
            "paused" => Ok(RunState::Paused),
            _ => Err(Error::UnknownRunState(s.to_string())),
        }
    }
}
