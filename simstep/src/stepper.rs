use std::sync::{Arc, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    Config, Grain, RunState, StateWatcher, StepperSnapshot,
    callbacks::CallbackRegistry,
    internal::{ControlState, Signal},
};

/// Everything behind the control lock.
pub(crate) struct Guarded<G: Grain> {
    pub control: ControlState<G>,
    pub callbacks: CallbackRegistry<G>,
}

pub(crate) struct Shared<G: Grain> {
    pub name: Arc<str>,
    pub core: Signal<Guarded<G>>,
    publisher: watch::Sender<StepperSnapshot<G>>,
}

impl<G: Grain> Shared<G> {
    pub fn acquire(&self) -> MutexGuard<'_, Guarded<G>> {
        self.core.acquire()
    }

    /// Record a change of the control state: bump the generation, publish a
    /// snapshot and wake the worker. Must be called with the lock held.
    pub fn commit(&self, guarded: &mut Guarded<G>, from: RunState) {
        let control = &mut guarded.control;
        control.generation += 1;
        tracing::debug!(
            stepper = %self.name,
            %from,
            to = %control.run_state,
            grain = %control.grain.label(),
            steps_remaining = control.steps_remaining,
            generation = control.generation,
            "Run state committed"
        );
        self.publisher.send_replace(control.snapshot(&self.name));
        self.core.signal_all();
    }
}

/// Pause / resume / single-step coordinator for a background computation.
///
/// The worker thread calls [`step_point`](Stepper::step_point) at every place
/// it is willing to be suspended, passing the [`Grain`] of that place.
/// Controller threads issue commands: [`start_stepping`](Stepper::start_stepping),
/// [`set_running`](Stepper::set_running), [`pause`](Stepper::pause),
/// [`stop`](Stepper::stop) and friends. Commands never block: they update the
/// shared control state under a lock, wake the worker, and return.
///
/// `Stepper` is a cheap handle; clone it to hand one copy to the worker and
/// keep another on the controller side. Independent steppers can coexist.
///
/// # Example
///
/// ```rust
/// use simstep::{Config, RunState, Stepper};
///
/// const CYCLE: u8 = 0;
/// const TRIAL: u8 = 1;
///
/// let stepper = Stepper::new(CYCLE, Config::default());
/// stepper.start_stepping(TRIAL, 2);
///
/// assert!(!stepper.step_point(&CYCLE)); // other grain, not counted
/// assert!(!stepper.step_point(&TRIAL)); // 1 of 2
/// assert_eq!(stepper.state(), RunState::Stepping);
///
/// // The second trial exhausts the burst; a worker thread would now block
/// // here, so stop first to let this doc test return.
/// stepper.stop();
/// assert!(stepper.step_point(&TRIAL));
/// ```
pub struct Stepper<G: Grain> {
    pub(crate) shared: Arc<Shared<G>>,
}

impl<G: Grain> Clone for Stepper<G> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<G: Grain> Stepper<G> {
    /// Create a stopped stepper whose active grain is `grain`.
    pub fn new(grain: G, config: Config) -> Self {
        let control = ControlState::new(grain, config.default_steps);
        let (publisher, _) = watch::channel(control.snapshot(&config.name));
        let guarded = Guarded {
            control,
            callbacks: CallbackRegistry::default(),
        };
        Self {
            shared: Arc::new(Shared {
                name: config.name,
                core: Signal::new(guarded),
                publisher,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Step by `grain`: run until `n_steps` step points of that grain have
    /// passed, then pause.
    pub fn start_stepping(&self, grain: G, n_steps: usize) {
        let mut guarded = self.shared.acquire();
        guarded.control.pending_grain = Some(grain);
        let from = guarded.control.enter_stepping(n_steps);
        self.shared.commit(&mut guarded, from);
    }

    /// Run without automatic suspension.
    pub fn set_running(&self) {
        self.enter(RunState::Running, 0);
    }

    /// Enter `state` unconditionally.
    ///
    /// - `Stepping` resets the burst to `n_steps` and applies a grain set
    ///   with [`set_step_grain`](Stepper::set_step_grain) while active.
    /// - `Running` ignores `n_steps`.
    /// - `Paused` and `Stopped` behave like [`pause`](Stepper::pause) and
    ///   [`stop`](Stepper::stop).
    pub fn enter(&self, state: RunState, n_steps: usize) {
        let mut guarded = self.shared.acquire();
        let from = match state {
            RunState::Stepping => Some(guarded.control.enter_stepping(n_steps)),
            RunState::Running => Some(guarded.control.enter_running()),
            RunState::Paused => guarded.control.pause(),
            RunState::Stopped => guarded.control.stop(),
        };
        match from {
            Some(from) => self.shared.commit(&mut guarded, from),
            None => tracing::trace!(stepper = %self.shared.name, %state, "Already there, nothing to do"),
        }
    }

    /// From `Paused`, continue in the mode that was active before the pause.
    ///
    /// Stepping continues with a fresh burst of [`steps_per`](Stepper::steps_per)
    /// steps. Has no effect in any other state.
    pub fn resume(&self) {
        let mut guarded = self.shared.acquire();
        match guarded.control.resume() {
            Some(from) => self.shared.commit(&mut guarded, from),
            None => tracing::trace!(stepper = %self.shared.name, "Not paused, nothing to resume"),
        }
    }

    /// Ask the worker to block at its next step point.
    ///
    /// Only takes effect from `Running` or `Stepping`; pausing twice is the
    /// same as pausing once.
    pub fn pause(&self) {
        self.enter(RunState::Paused, 0);
    }

    /// Stop stepping. A worker blocked in a step point wakes up and is told
    /// to abort; every later step point aborts immediately. Idempotent.
    pub fn stop(&self) {
        self.enter(RunState::Stopped, 0);
    }

    /// Set the grain counted while stepping.
    ///
    /// Applies immediately while paused or stopped. While running or
    /// stepping it is kept aside and applied at the next stepping entry.
    pub fn set_step_grain(&self, grain: G) {
        let mut guarded = self.shared.acquire();
        if guarded.control.set_grain(grain) {
            let state = guarded.control.run_state;
            self.shared.commit(&mut guarded, state);
        }
    }

    /// Set the burst size used when stepping resumes.
    ///
    /// Deferred while running or stepping, like [`set_step_grain`](Stepper::set_step_grain).
    pub fn set_n_steps(&self, n_steps: usize) {
        let mut guarded = self.shared.acquire();
        if guarded.control.set_n_steps(n_steps) {
            let state = guarded.control.run_state;
            self.shared.commit(&mut guarded, state);
        }
    }

    /// Register the callback invoked on the worker thread, with the control
    /// lock held, each time the worker enters `Paused`.
    ///
    /// `context` is owned by the stepper from now on and handed back to the
    /// callback on every call. Replaces a previously registered notifier.
    ///
    /// The callback must be quick and must not call any method of this
    /// stepper: the lock is held, so doing so deadlocks.
    pub fn register_pause_notifier<C, F>(&self, callback: F, context: C)
    where
        C: Send + 'static,
        F: FnMut(&mut C) + Send + 'static,
    {
        let mut guarded = self.shared.acquire();
        if guarded.callbacks.has_pause_notifier() {
            tracing::debug!(stepper = %self.shared.name, "Replacing pause notifier");
        }
        guarded.callbacks.set_pause_notifier(callback, context);
    }

    /// Register the callback consulted at every step point, before any
    /// counting. Returning `true` pauses the worker right there.
    ///
    /// Same context and locking rules as
    /// [`register_pause_notifier`](Stepper::register_pause_notifier).
    pub fn register_stop_checker<C, F>(&self, callback: F, context: C)
    where
        C: Send + 'static,
        F: FnMut(&mut C, &G) -> bool + Send + 'static,
    {
        let mut guarded = self.shared.acquire();
        if guarded.callbacks.has_stop_checker() {
            tracing::debug!(stepper = %self.shared.name, "Replacing stop checker");
        }
        guarded.callbacks.set_stop_checker(callback, context);
    }

    pub fn clear_pause_notifier(&self) {
        self.shared.acquire().callbacks.clear_pause_notifier();
    }

    pub fn clear_stop_checker(&self) {
        self.shared.acquire().callbacks.clear_stop_checker();
    }

    pub fn state(&self) -> RunState {
        self.shared.acquire().control.run_state
    }

    /// The grain currently counted while stepping.
    pub fn grain(&self) -> G {
        self.shared.acquire().control.grain.clone()
    }

    pub fn steps_remaining(&self) -> usize {
        self.shared.acquire().control.steps_remaining
    }

    pub fn steps_per(&self) -> usize {
        self.shared.acquire().control.steps_per
    }

    /// `true` while running or stepping.
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn generation(&self) -> u64 {
        self.shared.acquire().control.generation
    }

    pub fn snapshot(&self) -> StepperSnapshot<G> {
        self.shared.acquire().control.snapshot(&self.shared.name)
    }

    /// Watch state changes from async code.
    pub fn subscribe(&self) -> StateWatcher<G> {
        StateWatcher::new(self.shared.publisher.subscribe())
    }

    /// Stop the stepper once `token` is cancelled.
    ///
    /// Deadlines and shutdown are layered this way, outside the stepper:
    ///
    /// ```rust,ignore
    /// let token = CancellationToken::new();
    /// tokio::spawn({
    ///     let stepper = stepper.clone();
    ///     let token = token.clone();
    ///     async move { stepper.stop_on_cancel(token).await }
    /// });
    /// tokio::time::sleep(deadline).await;
    /// token.cancel();
    /// ```
    pub async fn stop_on_cancel(&self, token: CancellationToken) {
        token.cancelled().await;
        tracing::debug!(stepper = %self.shared.name, "Cancellation requested, stopping");
        self.stop();
    }
}

impl<G: Grain + Default> Default for Stepper<G> {
    fn default() -> Self {
        Self::new(G::default(), Config::default())
    }
}
