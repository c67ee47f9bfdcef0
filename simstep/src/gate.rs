use crate::{Grain, RunState, Stepper};

impl<G: Grain> Stepper<G> {
    /// Candidate suspension point, called by the worker thread.
    ///
    /// `grain` identifies the kind of point being passed. Returns `true`
    /// when the worker should abandon its current unit of work (the stepper
    /// is stopped), `false` to carry on.
    ///
    /// Evaluation, all under the control lock:
    ///
    /// 1. Stopped: abort at once.
    /// 2. The stop checker, if any, is asked first; `true` pauses here.
    /// 3. Running continues. Stepping continues unless `grain` equals the
    ///    active grain and that was the last step of the burst, which pauses.
    /// 4. When pausing, the pause notifier runs (once per pause) and the
    ///    worker blocks until a controller moves the stepper out of `Paused`.
    ///
    /// Must only be called from the worker, never from a callback.
    pub fn step_point(&self, grain: &G) -> bool {
        let shared = &self.shared;
        let mut guarded = shared.acquire();

        let state = guarded.control.run_state;
        if state == RunState::Stopped {
            tracing::trace!(stepper = %shared.name, grain = %grain.label(), "Stopped, aborting");
            return true;
        }

        if guarded.callbacks.check_stop(grain, &shared.name) {
            if state != RunState::Paused {
                tracing::info!(stepper = %shared.name, grain = %grain.label(), "Stop checker requested a pause");
                let from = guarded.control.force_pause();
                shared.commit(&mut guarded, from);
            }
        } else {
            match state {
                RunState::Running => return false,
                RunState::Stepping => {
                    if !guarded.control.count_step(grain) {
                        tracing::trace!(
                            stepper = %shared.name,
                            grain = %grain.label(),
                            steps_remaining = guarded.control.steps_remaining,
                            "Step point passed"
                        );
                        return false;
                    }
                    let from = guarded.control.set_run_state(RunState::Paused);
                    shared.commit(&mut guarded, from);
                }
                RunState::Paused | RunState::Stopped => {}
            }
        }

        if guarded.control.take_notification() {
            guarded.callbacks.notify_pause(&shared.name);
        }

        let mut seen = guarded.control.generation;
        let mut woken = false;
        guarded = shared.core.wait_while(guarded, |guarded| {
            let generation = guarded.control.generation;
            if woken && generation == seen {
                tracing::trace!(stepper = %shared.name, generation, "Spurious wakeup");
            }
            woken = true;
            seen = generation;
            if guarded.control.run_state != RunState::Paused {
                return false;
            }
            // Resumed and paused again before this thread woke up.
            if guarded.control.take_notification() {
                guarded.callbacks.notify_pause(&shared.name);
            }
            true
        });

        let aborted = guarded.control.run_state == RunState::Stopped;
        tracing::trace!(stepper = %shared.name, state = %guarded.control.run_state, aborted, "Worker released");
        aborted
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use crate::{Config, RunState, Stepper};

    const CYCLE: u8 = 0;
    const TRIAL: u8 = 1;

    fn stepper() -> Stepper<u8> {
        Stepper::new(CYCLE, Config::default().with_name("gate"))
    }

    fn wait_for_state(stepper: &Stepper<u8>, state: RunState) {
        for _ in 0..500 {
            if stepper.state() == state {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("stepper never reached {state}");
    }

    #[test]
    fn test_stopped_aborts_without_blocking() {
        let stepper = stepper();
        assert!(stepper.step_point(&CYCLE));
        assert!(stepper.step_point(&TRIAL));
    }

    #[test]
    fn test_running_never_blocks_or_counts() {
        let stepper = stepper();
        stepper.set_running();
        for i in 0..1000u32 {
            assert!(!stepper.step_point(&((i % 3) as u8)));
        }
        assert_eq!(stepper.state(), RunState::Running);
    }

    #[test]
    fn test_other_grains_are_not_counted() {
        let stepper = stepper();
        stepper.start_stepping(TRIAL, 1);
        for _ in 0..100 {
            assert!(!stepper.step_point(&CYCLE));
        }
        assert_eq!(stepper.steps_remaining(), 1);
        assert_eq!(stepper.state(), RunState::Stepping);
    }

    #[test]
    fn test_last_step_pauses_and_blocks() {
        let stepper = stepper();
        stepper.start_stepping(CYCLE, 2);
        assert!(!stepper.step_point(&CYCLE));

        let worker = {
            let stepper = stepper.clone();
            thread::spawn(move || stepper.step_point(&CYCLE))
        };
        wait_for_state(&stepper, RunState::Paused);
        thread::sleep(Duration::from_millis(20));
        assert!(!worker.is_finished());

        stepper.enter(RunState::Stepping, 1);
        assert!(!worker.join().unwrap());
    }

    #[test]
    fn test_stop_checker_pauses_from_running() {
        let stepper = stepper();
        let checks = Arc::new(AtomicUsize::new(0));
        stepper.register_stop_checker(
            |checks: &mut Arc<AtomicUsize>, grain: &u8| {
                checks.fetch_add(1, Ordering::SeqCst);
                *grain == TRIAL
            },
            checks.clone(),
        );
        stepper.set_running();
        assert!(!stepper.step_point(&CYCLE));

        let worker = {
            let stepper = stepper.clone();
            thread::spawn(move || stepper.step_point(&TRIAL))
        };
        wait_for_state(&stepper, RunState::Paused);
        stepper.stop();
        assert!(worker.join().unwrap());
        assert_eq!(checks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_checker_not_consulted_when_stopped() {
        let stepper = stepper();
        let checks = Arc::new(AtomicUsize::new(0));
        stepper.register_stop_checker(
            |checks: &mut Arc<AtomicUsize>, _: &u8| {
                checks.fetch_add(1, Ordering::SeqCst);
                true
            },
            checks.clone(),
        );
        assert!(stepper.step_point(&CYCLE));
        assert_eq!(checks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_checker_pause_zeroes_counter() {
        let stepper = stepper();
        stepper.register_stop_checker(|_: &mut (), grain: &u8| *grain == TRIAL, ());
        stepper.start_stepping(CYCLE, 10);

        let worker = {
            let stepper = stepper.clone();
            thread::spawn(move || stepper.step_point(&TRIAL))
        };
        wait_for_state(&stepper, RunState::Paused);
        assert_eq!(stepper.steps_remaining(), 0);
        stepper.stop();
        assert!(worker.join().unwrap());
    }
}
