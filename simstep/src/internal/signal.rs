use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Mutual exclusion plus a wait/notify pair over a single value.
///
/// `acquire` returns an RAII guard (released on drop). `wait` must be given
/// that guard: the lock is released atomically while blocked and held again
/// on return, so a `signal_all` issued between the caller's check and its
/// wait cannot be lost. Wakeups may be spurious; callers re-check their
/// predicate in a loop, see [`Signal::wait_while`].
///
/// A poisoned lock is recovered instead of propagated. The guarded state is
/// only mutated by infallible transition code and caller callbacks are run
/// behind `catch_unwind`, so a poisoned lock still holds consistent state.
#[derive(Debug)]
pub(crate) struct Signal<S> {
    value: Mutex<S>,
    cond: Condvar,
}

impl<S> Signal<S> {
    pub fn new(value: S) -> Self {
        Self {
            value: Mutex::new(value),
            cond: Condvar::new(),
        }
    }

    pub fn acquire(&self) -> MutexGuard<'_, S> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until signalled (or spuriously woken). The lock must be held.
    pub fn wait<'a>(&self, guard: MutexGuard<'a, S>) -> MutexGuard<'a, S> {
        self.cond
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for as long as `condition` holds, re-checking on every wakeup.
    pub fn wait_while<'a, F>(&self, mut guard: MutexGuard<'a, S>, mut condition: F) -> MutexGuard<'a, S>
    where
        F: FnMut(&mut S) -> bool,
    {
        while condition(&mut *guard) {
            guard = self.wait(guard);
        }
        guard
    }

    /// Wake every thread blocked in [`Signal::wait`].
    pub fn signal_all(&self) {
        self.cond.notify_all();
    }
}
