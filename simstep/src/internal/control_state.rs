use std::sync::Arc;

use crate::{Grain, RunState, StepperSnapshot};

/// Run mode, grain and step counter shared by the worker and controllers.
///
/// Pure data plus the transition rules; locking and signalling live in
/// [`Signal`](super::Signal) and the stepper.
#[derive(Debug)]
pub(crate) struct ControlState<G: Grain> {
    pub run_state: RunState,
    pub grain: G,
    pub steps_remaining: usize,
    pub steps_per: usize,
    pub generation: u64,
    /// Mode re-entered by `resume`. Always `Running` or `Stepping`.
    pub last_active: RunState,
    /// Grain set while active, applied on the next stepping entry.
    pub pending_grain: Option<G>,
    /// Burst size set while active, applied on the next stepping entry.
    pub pending_steps: Option<usize>,
    /// Set on every transition into `Paused`, consumed by the pause notifier.
    notify_pending: bool,
}

impl<G: Grain> ControlState<G> {
    pub fn new(grain: G, steps_per: usize) -> Self {
        Self {
            run_state: RunState::Stopped,
            grain,
            steps_remaining: steps_per,
            steps_per,
            generation: 0,
            last_active: RunState::Running,
            pending_grain: None,
            pending_steps: None,
            notify_pending: false,
        }
    }

    /// Switch run mode and return the previous one.
    pub fn set_run_state(&mut self, to: RunState) -> RunState {
        let from = self.run_state;
        self.run_state = to;
        if to == RunState::Paused {
            if from != RunState::Paused {
                self.notify_pending = true;
            }
        } else {
            // A pause the worker never reached is not reported.
            self.notify_pending = false;
        }
        if to.is_active() {
            self.last_active = to;
        }
        from
    }

    pub fn enter_running(&mut self) -> RunState {
        self.set_run_state(RunState::Running)
    }

    pub fn enter_stepping(&mut self, n_steps: usize) -> RunState {
        if let Some(grain) = self.pending_grain.take() {
            self.grain = grain;
        }
        self.pending_steps = None;
        self.steps_per = n_steps;
        self.steps_remaining = n_steps.max(1);
        self.set_run_state(RunState::Stepping)
    }

    /// Re-enter the last active mode from `Paused`.
    ///
    /// Returns `None` when not paused.
    pub fn resume(&mut self) -> Option<RunState> {
        if self.run_state != RunState::Paused {
            return None;
        }
        let from = match self.last_active {
            RunState::Stepping => {
                let n_steps = self.pending_steps.unwrap_or(self.steps_per);
                self.enter_stepping(n_steps)
            }
            _ => self.enter_running(),
        };
        Some(from)
    }

    /// Returns `None` when there is nothing to pause.
    pub fn pause(&mut self) -> Option<RunState> {
        self.run_state
            .is_active()
            .then(|| self.set_run_state(RunState::Paused))
    }

    /// Returns `None` when already stopped.
    pub fn stop(&mut self) -> Option<RunState> {
        (self.run_state != RunState::Stopped).then(|| self.set_run_state(RunState::Stopped))
    }

    /// Pause from any state but `Stopped`, as if the step counter ran out.
    pub fn force_pause(&mut self) -> RunState {
        if self.run_state == RunState::Stepping {
            self.steps_remaining = 0;
        }
        self.set_run_state(RunState::Paused)
    }

    /// Returns `true` when applied now, `false` when deferred.
    pub fn set_grain(&mut self, grain: G) -> bool {
        if self.run_state.is_active() {
            self.pending_grain = Some(grain);
            return false;
        }
        self.grain = grain;
        self.pending_grain = None;
        true
    }

    /// Returns `true` when applied now, `false` when deferred.
    pub fn set_n_steps(&mut self, n_steps: usize) -> bool {
        if self.run_state.is_active() {
            self.pending_steps = Some(n_steps);
            return false;
        }
        self.steps_per = n_steps;
        self.steps_remaining = n_steps;
        self.pending_steps = None;
        true
    }

    /// Count a step point while stepping.
    ///
    /// Only a grain equal to the active one is counted. Returns `true` when
    /// the counter has just run out.
    pub fn count_step(&mut self, grain: &G) -> bool {
        debug_assert_eq!(self.run_state, RunState::Stepping);
        if *grain != self.grain {
            return false;
        }
        self.steps_remaining = self.steps_remaining.saturating_sub(1);
        self.steps_remaining == 0
    }

    /// Consume the pending pause notification, if any.
    pub fn take_notification(&mut self) -> bool {
        std::mem::take(&mut self.notify_pending)
    }

    pub fn snapshot(&self, name: &Arc<str>) -> StepperSnapshot<G> {
        StepperSnapshot {
            name: name.clone(),
            state: self.run_state,
            grain: self.grain.clone(),
            steps_remaining: self.steps_remaining,
            steps_per: self.steps_per,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stepping(grain: u8, n: usize) -> ControlState<u8> {
        let mut state = ControlState::new(0, 1);
        state.grain = grain;
        state.enter_stepping(n);
        state
    }

    #[test]
    fn test_new_is_stopped() {
        let state = ControlState::new(4u8, 3);
        assert_eq!(state.run_state, RunState::Stopped);
        assert_eq!(state.grain, 4);
        assert_eq!(state.steps_per, 3);
        assert_eq!(state.generation, 0);
    }

    #[test]
    fn test_count_only_matching_grain() {
        let mut state = stepping(1, 2);
        assert!(!state.count_step(&2));
        assert!(!state.count_step(&2));
        assert_eq!(state.steps_remaining, 2);
        assert!(!state.count_step(&1));
        assert_eq!(state.steps_remaining, 1);
        assert!(state.count_step(&1));
        assert_eq!(state.steps_remaining, 0);
    }

    #[test]
    fn test_zero_steps_behaves_as_one() {
        let mut state = stepping(1, 0);
        assert_eq!(state.steps_remaining, 1);
        assert!(state.count_step(&1));
        assert_eq!(state.steps_remaining, 0);
    }

    #[test]
    fn test_pause_only_from_active() {
        let mut state = ControlState::new(0u8, 1);
        assert_eq!(state.pause(), None);
        state.enter_running();
        assert_eq!(state.pause(), Some(RunState::Running));
        assert_eq!(state.pause(), None);
        assert_eq!(state.run_state, RunState::Paused);
    }

    #[test]
    fn test_notification_once_per_pause() {
        let mut state = ControlState::new(0u8, 1);
        state.enter_running();
        state.pause();
        assert!(state.take_notification());
        assert!(!state.take_notification());
        state.force_pause();
        assert!(!state.take_notification());
    }

    #[test]
    fn test_unreached_pause_is_not_reported() {
        let mut state = ControlState::new(0u8, 1);
        state.enter_running();
        state.pause();
        state.resume();
        assert!(!state.take_notification());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut state = ControlState::new(0u8, 1);
        assert_eq!(state.stop(), None);
        state.enter_running();
        assert_eq!(state.stop(), Some(RunState::Running));
        assert_eq!(state.stop(), None);
    }

    #[test]
    fn test_resume_reenters_last_mode() {
        let mut state = stepping(1, 3);
        state.pause();
        assert_eq!(state.resume(), Some(RunState::Paused));
        assert_eq!(state.run_state, RunState::Stepping);
        assert_eq!(state.steps_remaining, 3);

        state.enter_running();
        state.pause();
        state.resume();
        assert_eq!(state.run_state, RunState::Running);

        assert_eq!(state.resume(), None);
    }

    #[test]
    fn test_settings_deferred_while_active() {
        let mut state = stepping(1, 2);
        assert!(!state.set_grain(5));
        assert!(!state.set_n_steps(4));
        assert_eq!(state.grain, 1);
        assert_eq!(state.steps_remaining, 2);

        state.pause();
        state.resume();
        assert_eq!(state.grain, 5);
        assert_eq!(state.steps_per, 4);
        assert_eq!(state.steps_remaining, 4);
        assert_eq!(state.pending_grain, None);
        assert_eq!(state.pending_steps, None);
    }

    #[test]
    fn test_settings_immediate_while_paused() {
        let mut state = stepping(1, 2);
        state.pause();
        assert!(state.set_grain(9));
        assert!(state.set_n_steps(7));
        assert_eq!(state.grain, 9);
        assert_eq!(state.steps_per, 7);
        assert_eq!(state.steps_remaining, 7);
    }

    #[test]
    fn test_force_pause_zeroes_counter() {
        let mut state = stepping(1, 5);
        assert_eq!(state.force_pause(), RunState::Stepping);
        assert_eq!(state.steps_remaining, 0);
        assert_eq!(state.run_state, RunState::Paused);
    }
}
