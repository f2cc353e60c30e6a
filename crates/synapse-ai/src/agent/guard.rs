//! RAII guards that keep a turn's side effects tidy on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use synapse_common::{MessageId, SessionError, SessionId};
use tracing::debug;

use crate::session::SessionStore;

use super::{lock, TurnState};

/// Holds the agent's busy flag for the duration of a turn.
///
/// Dropping the guard releases the flag and returns the turn state to
/// [`TurnState::Idle`], including when the turn future is cancelled.
pub(super) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a Mutex<TurnState>,
}

impl<'a> BusyGuard<'a> {
    /// Take the flag, or `None` if a turn is already running.
    pub(super) fn acquire(flag: &'a AtomicBool, state: &'a Mutex<TurnState>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag, state })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = TurnState::Idle;
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the `Thinking...` message of an in-flight turn.
///
/// A turn removes it explicitly with [`PlaceholderGuard::remove`]. If the
/// turn future is dropped first, the guard removes it on drop instead.
pub(super) struct PlaceholderGuard<'a> {
    store: &'a Mutex<SessionStore>,
    session: SessionId,
    message: MessageId,
    armed: bool,
}

impl<'a> PlaceholderGuard<'a> {
    pub(super) fn new(
        store: &'a Mutex<SessionStore>,
        session: SessionId,
        message: MessageId,
    ) -> Self {
        Self {
            store,
            session,
            message,
            armed: true,
        }
    }

    pub(super) fn remove(mut self) -> Result<(), SessionError> {
        self.armed = false;
        lock(self.store)
            .remove_message(&self.session, self.message)
            .map(|_| ())
    }
}

impl Drop for PlaceholderGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(Some(_)) = lock(self.store).remove_message(&self.session, self.message) {
            debug!(session = %self.session, "turn abandoned, placeholder removed");
        }
    }
}
