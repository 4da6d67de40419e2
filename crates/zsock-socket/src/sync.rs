use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How long a suspension point may park the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    /// Check once, never park.
    Poll,
    /// Park until woken.
    Block,
    /// Park until woken or the deadline passes.
    Until(Instant),
}

impl Wait {
    /// `Block`, or a deadline `timeout` from now.
    pub(crate) fn with_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => Wait::Until(Instant::now() + timeout),
            None => Wait::Block,
        }
    }

    /// Park on `condvar`, returning the re-acquired guard, or `None` when
    /// this wait does not allow (further) parking.
    pub(crate) fn park<'a, T>(
        self,
        condvar: &Condvar,
        guard: MutexGuard<'a, T>,
    ) -> Option<MutexGuard<'a, T>> {
        match self {
            Wait::Poll => None,
            Wait::Block => Some(condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)),
            Wait::Until(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return None;
                }
                let (guard, _) = condvar
                    .wait_timeout(guard, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                Some(guard)
            }
        }
    }
}
