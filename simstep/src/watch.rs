use tokio::sync::watch::Receiver;

use crate::{Grain, Result, RunState, StepperSnapshot};

/// Async view of a stepper's state changes.
///
/// Obtained from [`Stepper::subscribe`](crate::Stepper::subscribe). Every
/// committed change (commands, pauses at step points) publishes a new
/// [`StepperSnapshot`]. Intermediate snapshots may be skipped when several
/// changes happen before the watcher looks; the latest one is always kept.
///
/// Watching never blocks the worker or the controllers.
///
/// # Example
///
/// ```rust,ignore
/// let mut watcher = stepper.subscribe();
/// stepper.start_stepping(Tick::Trial, 1);
///
/// // e.g. refresh a view once the worker has finished the trial
/// let snapshot = watcher.wait_for(RunState::Paused).await?;
/// println!("paused at generation {}", snapshot.generation);
/// ```
pub struct StateWatcher<G: Grain> {
    receiver: Receiver<StepperSnapshot<G>>,
}

impl<G: Grain> StateWatcher<G> {
    pub(crate) fn new(receiver: Receiver<StepperSnapshot<G>>) -> Self {
        Self { receiver }
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> StepperSnapshot<G> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, then return the latest snapshot.
    ///
    /// Fails with [`Error::StepperDropped`](crate::Error::StepperDropped)
    /// once every handle of the stepper is gone.
    pub async fn changed(&mut self) -> Result<StepperSnapshot<G>> {
        self.receiver.changed().await?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the stepper is in `state`. Returns immediately if it
    /// already is.
    pub async fn wait_for(&mut self, state: RunState) -> Result<StepperSnapshot<G>> {
        let snapshot = self
            .receiver
            .wait_for(|snapshot| snapshot.state == state)
            .await?;
        Ok(snapshot.clone())
    }
}
