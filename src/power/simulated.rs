use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{ListenerId, PowerState, PowerStateListener, PowerStateSource};

struct Inner {
    state: PowerState,
    listeners: Vec<(ListenerId, PowerStateListener)>,
}

/// In-process power manager stand-in.
///
/// `set_state` updates the current state and calls every listener
/// synchronously on the caller's thread, in registration order.
pub struct SimulatedPowerSource {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for SimulatedPowerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedPowerSource")
            .field("state", &self.current_state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SimulatedPowerSource {
    pub fn new(initial: PowerState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: initial,
                listeners: Vec::new(),
            }),
        }
    }

    pub fn set_state(&self, state: PowerState) {
        // Listeners run outside the lock so they may call back into the source.
        let listeners: Vec<PowerStateListener> = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.state = state;
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        debug!("Power state -> {:?} ({} listeners)", state, listeners.len());
        for listener in listeners {
            listener(state);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl PowerStateSource for SimulatedPowerSource {
    fn register_listener(&self, listener: PowerStateListener) -> ListenerId {
        let id = ListenerId::new();
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .push((id, listener));
        id
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .retain(|(existing, _)| *existing != id);
    }

    fn current_state(&self) -> PowerState {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).state
    }
}
