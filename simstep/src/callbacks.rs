use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::Grain;

type PauseNotifier = Box<dyn FnMut() + Send>;
type StopChecker<G> = Box<dyn FnMut(&G) -> bool + Send>;

/// Holds at most one pause notifier and one stop checker.
///
/// Each callback is registered together with a caller-owned context value.
/// The context is moved into a closure next to the callback, so the registry
/// never sees its type. Callbacks run on the worker thread with the control
/// lock held; they must not call back into the stepper.
///
/// A callback that panics is logged and unregistered. The panic does not
/// reach the worker and does not poison the control lock.
pub(crate) struct CallbackRegistry<G: Grain> {
    pause_notifier: Option<PauseNotifier>,
    stop_checker: Option<StopChecker<G>>,
}

impl<G: Grain> Default for CallbackRegistry<G> {
    fn default() -> Self {
        Self {
            pause_notifier: None,
            stop_checker: None,
        }
    }
}

impl<G: Grain> CallbackRegistry<G> {
    pub fn set_pause_notifier<C, F>(&mut self, mut callback: F, mut context: C)
    where
        C: Send + 'static,
        F: FnMut(&mut C) + Send + 'static,
    {
        self.pause_notifier = Some(Box::new(move || callback(&mut context)));
    }

    pub fn set_stop_checker<C, F>(&mut self, mut callback: F, mut context: C)
    where
        C: Send + 'static,
        F: FnMut(&mut C, &G) -> bool + Send + 'static,
    {
        self.stop_checker = Some(Box::new(move |grain: &G| callback(&mut context, grain)));
    }

    pub fn clear_pause_notifier(&mut self) {
        self.pause_notifier = None;
    }

    pub fn clear_stop_checker(&mut self) {
        self.stop_checker = None;
    }

    pub fn has_pause_notifier(&self) -> bool {
        self.pause_notifier.is_some()
    }

    pub fn has_stop_checker(&self) -> bool {
        self.stop_checker.is_some()
    }

    /// Run the pause notifier, if any.
    pub fn notify_pause(&mut self, stepper: &str) {
        let Some(notifier) = self.pause_notifier.as_mut() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| notifier())).is_err() {
            tracing::error!(stepper, "Pause notifier panicked, removing");
            self.pause_notifier = None;
        }
    }

    /// Ask the stop checker whether to pause at `grain`.
    ///
    /// `false` when no checker is registered or the checker panicked.
    pub fn check_stop(&mut self, grain: &G, stepper: &str) -> bool {
        let Some(checker) = self.stop_checker.as_mut() else {
            return false;
        };
        match catch_unwind(AssertUnwindSafe(|| checker(grain))) {
            Ok(stop) => stop,
            Err(_) => {
                tracing::error!(stepper, grain = %grain.label(), "Stop checker panicked, removing");
                self.stop_checker = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_is_noop() {
        let mut registry = CallbackRegistry::<u8>::default();
        registry.notify_pause("test");
        assert!(!registry.check_stop(&1, "test"));
    }

    #[test]
    fn test_context_passed_back() {
        let mut registry = CallbackRegistry::<u8>::default();
        let (tx, rx) = std::sync::mpsc::channel();
        registry.set_pause_notifier(
            |count: &mut u32| {
                *count += 1;
            },
            0u32,
        );
        registry.set_stop_checker(
            move |limit: &mut u8, grain: &u8| {
                tx.send(*grain).unwrap();
                *grain >= *limit
            },
            3u8,
        );

        registry.notify_pause("test");
        assert!(!registry.check_stop(&2, "test"));
        assert!(registry.check_stop(&3, "test"));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_registration_replaces_previous() {
        let mut registry = CallbackRegistry::<u8>::default();
        registry.set_stop_checker(|_: &mut (), _: &u8| true, ());
        registry.set_stop_checker(|_: &mut (), _: &u8| false, ());
        assert!(!registry.check_stop(&0, "test"));
    }

    #[test]
    fn test_clear() {
        let mut registry = CallbackRegistry::<u8>::default();
        registry.set_pause_notifier(|_: &mut ()| {}, ());
        registry.set_stop_checker(|_: &mut (), _: &u8| true, ());
        registry.clear_pause_notifier();
        registry.clear_stop_checker();
        assert!(!registry.has_pause_notifier());
        assert!(!registry.has_stop_checker());
    }

    #[test]
    fn test_panicking_callbacks_are_removed() {
        let mut registry = CallbackRegistry::<u8>::default();
        registry.set_pause_notifier(|_: &mut ()| panic!("notifier"), ());
        registry.set_stop_checker(|_: &mut (), _: &u8| panic!("checker"), ());

        registry.notify_pause("test");
        assert!(!registry.check_stop(&0, "test"));
        assert!(!registry.has_pause_notifier());
        assert!(!registry.has_stop_checker());
    }
}
