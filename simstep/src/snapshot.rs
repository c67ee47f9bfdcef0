use std::sync::Arc;

use crate::{Grain, RunState};

/// Point-in-time view of a stepper's control state.
///
/// Obtained from [`Stepper::snapshot`](crate::Stepper::snapshot) or published
/// to a [`StateWatcher`](crate::StateWatcher) on every change. Because the
/// worker runs concurrently, the state may have moved on by the time you
/// read it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepperSnapshot<G: Grain> {
    /// Name from the stepper's [`Config`](crate::Config).
    pub name: Arc<str>,
    /// Current run mode.
    pub state: RunState,
    /// Grain counted while stepping.
    pub grain: G,
    /// Matching step points left before the stepper pauses.
    /// Only meaningful while `state` is [`RunState::Stepping`].
    pub steps_remaining: usize,
    /// Size of a stepping burst, used when stepping resumes.
    pub steps_per: usize,
    /// Incremented on every committed change of the control state.
    pub generation: u64,
}
