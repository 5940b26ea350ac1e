//! Single-slot request guard.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::SessionState;

/// Proof that the holder owns the session's only request slot.
///
/// Acquiring sets `request_in_flight`; dropping clears it, so every exit
/// path of an operation releases the slot.
#[derive(Debug)]
pub(crate) struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
}

impl<'a> InFlight<'a> {
    /// Takes the slot, or returns `None` if another operation holds it.
    pub(crate) fn acquire(state: &'a Mutex<SessionState>) -> Option<Self> {
        let mut guard = lock(state);
        if guard.request_in_flight {
            return None;
        }
        guard.request_in_flight = true;
        Some(Self { state })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).request_in_flight = false;
    }
}

/// Locks session state, recovering from a poisoned lock.
pub(crate) fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
