use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::power::PowerState;

use super::controller::ControllerCore;

/// Serial execution context for a queued controller.
///
/// Power callbacks only enqueue; the worker applies them one at a time, in
/// arrival order, on whichever task runs it. The queue is unbounded, so a
/// slow worker delays transitions but never loses one.
///
/// `SessionController::init_session` is the exception: it applies the
/// initial power state on the caller's thread. That is still serialized
/// with the worker by the controller's transition lock, and any callback
/// queued meanwhile is applied after it.
pub struct SessionWorker {
    core: Arc<ControllerCore>,
    receiver: mpsc::UnboundedReceiver<PowerState>,
}

impl std::fmt::Debug for SessionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWorker")
            .field("queued", &self.receiver.len())
            .field("released", &self.core.is_released())
            .finish()
    }
}

impl SessionWorker {
    pub(crate) fn new(core: Arc<ControllerCore>, receiver: mpsc::UnboundedReceiver<PowerState>) -> Self {
        Self { core, receiver }
    }

    /// Applies everything queued right now without waiting for more.
    /// Returns how many power states were taken off the queue.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while !self.core.is_released() {
            let Ok(state) = self.receiver.try_recv() else {
                break;
            };
            self.core.on_power_state_changed(state);
            applied += 1;
        }
        applied
    }

    /// Runs until the controller is released or dropped.
    pub async fn run(mut self) {
        info!("Session worker started");
        let released = self.core.released_token();

        loop {
            tokio::select! {
                biased;
                () = released.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(state) => self.core.on_power_state_changed(state),
                    None => break,
                },
            }
        }

        debug!("Session worker dropping {} queued power states", self.receiver.len());
        info!("Session worker stopped");
    }
}
