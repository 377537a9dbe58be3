use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::power::{BootMetadataSource, ListenerId, PowerState, PowerStateListener, PowerStateSource};
use crate::time::{Clock, SystemClock};

use super::annotation::SessionAnnotation;
use super::callback::{CallbackRegistry, SessionControllerCallback};
use super::state::SessionState;
use super::worker::SessionWorker;

#[derive(Debug, Clone)]
struct ControllerState {
    session_id: i32,
    session_state: SessionState,
    changed_at_since_boot_millis: i64,
    changed_at_wall_millis: i64,
    boot_reason: String,
    boot_count: i32,
}

impl ControllerState {
    fn annotation(&self) -> SessionAnnotation {
        SessionAnnotation {
            session_id: self.session_id,
            session_state: self.session_state,
            changed_at_since_boot_millis: self.changed_at_since_boot_millis,
            changed_at_wall_millis: self.changed_at_wall_millis,
            boot_reason: self.boot_reason.clone(),
            boot_count: self.boot_count,
        }
    }
}

/// How power callbacks reach the transition path.
enum Dispatch {
    /// Apply on the thread that delivered the callback.
    Inline,
    /// Hand off to a `SessionWorker`.
    Queued(mpsc::UnboundedSender<PowerState>),
}

/// Shared by the controller handle, the power listener and the worker.
pub(crate) struct ControllerCore {
    power: Arc<dyn PowerStateSource>,
    boot: Arc<dyn BootMetadataSource>,
    clock: Arc<dyn Clock>,
    state: RwLock<ControllerState>,
    callbacks: CallbackRegistry,
    dispatch: Dispatch,
    /// Held for the whole transition, including listener fan-out.
    transition_lock: Mutex<()>,
    /// Thread running the current fan-out, if any. Only written under `transition_lock`.
    notifying: Mutex<Option<ThreadId>>,
    subscription: Mutex<Option<ListenerId>>,
    released: CancellationToken,
}

impl ControllerCore {
    pub(crate) fn on_power_state_changed(&self, power_state: PowerState) {
        match power_state.requested_session_state() {
            Some(requested) => self.request_transition(requested),
            None => debug!("Ignoring power state {:?}", power_state),
        }
    }

    pub(crate) fn released_token(&self) -> CancellationToken {
        self.released.clone()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }

    /// True when called from a listener of this controller.
    fn is_notifying_thread(&self) -> bool {
        *self.notifying.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }

    fn request_transition(&self, requested: SessionState) {
        let _serial = self.transition_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_released() {
            debug!("Controller released, dropping transition to {:?}", requested);
            return;
        }

        let annotation = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.session_state == requested {
                debug!("Session already in {:?}, suppressing", requested);
                return;
            }
            if requested == SessionState::EnterDrivingSession {
                state.session_id += 1;
            }
            state.session_state = requested;
            state.changed_at_since_boot_millis = self.clock.since_boot_millis();
            state.changed_at_wall_millis = self.clock.wall_millis();
            state.annotation()
        };

        info!(
            "Session {} -> {:?} at {}ms since boot",
            annotation.session_id, annotation.session_state, annotation.changed_at_since_boot_millis
        );
        *self.notifying.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        self.notify(&annotation);
        *self.notifying.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// A panicking listener is logged and skipped; the rest still see the transition.
    /// A listener releasing the controller ends the pass.
    fn notify(&self, annotation: &SessionAnnotation) {
        for (index, callback) in self.callbacks.snapshot().iter().enumerate() {
            if self.is_released() {
                debug!("Controller released mid-pass, skipping remaining listeners");
                break;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                callback.on_session_state_changed(annotation);
            }));
            if let Err(payload) = outcome {
                error!(
                    "Session listener #{} panicked on session {}: {}",
                    index,
                    annotation.session_id,
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    fn listener(self: &Arc<Self>) -> PowerStateListener {
        match &self.dispatch {
            Dispatch::Inline => {
                let core = Arc::downgrade(self);
                Arc::new(move |state: PowerState| {
                    if let Some(core) = core.upgrade() {
                        core.on_power_state_changed(state);
                    }
                })
            }
            Dispatch::Queued(sender) => {
                let sender = sender.clone();
                Arc::new(move |state: PowerState| {
                    if let Err(e) = sender.send(state) {
                        debug!("Session worker gone, dropping power state {:?}", e.0);
                    }
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Authoritative answer to "is the vehicle in a driving session".
///
/// Starts in `ExitDrivingSession`. `PowerState::On` enters a session (new
/// id), `PowerState::ShutdownPrepare` leaves it, every other power state is
/// ignored. Repeated requests for the current state are suppressed, so each
/// real transition is announced exactly once.
///
/// Dropping the controller releases it, including when the last handle is
/// dropped from inside one of its own listeners.
pub struct SessionController {
    core: Arc<ControllerCore>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("annotation", &self.session_annotation())
            .field("callbacks", &self.core.callbacks)
            .field("released", &self.is_released())
            .finish()
    }
}

impl SessionController {
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::default()
    }

    /// Reads boot metadata, subscribes to the power source and feeds the
    /// current power state through the regular transition path.
    ///
    /// Runs on the caller's thread even for a queued controller; the
    /// transition lock still orders it against the worker.
    ///
    /// Call once before live power callbacks are expected. A second call
    /// re-reads boot metadata and cannot start a second session for the
    /// same power state.
    pub fn init_session(&self) {
        if self.is_released() {
            warn!("init_session called on a released controller");
            return;
        }

        let boot_reason = self.core.boot.boot_reason();
        let boot_count = self.core.boot.boot_count();
        {
            let mut state = self.core.state.write().unwrap_or_else(PoisonError::into_inner);
            state.boot_reason = boot_reason;
            state.boot_count = boot_count;
        }

        self.subscribe();

        let current = self.core.power.current_state();
        info!("Session init: boot count {}, power state {:?}", boot_count, current);
        self.core.on_power_state_changed(current);
    }

    /// Transition entry point used by the power listener.
    pub fn on_power_state_changed(&self, state: PowerState) {
        self.core.on_power_state_changed(state);
    }

    pub fn session_annotation(&self) -> SessionAnnotation {
        self.core
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .annotation()
    }

    pub fn register_callback(&self, callback: Arc<dyn SessionControllerCallback>) {
        if self.core.callbacks.register(callback) {
            debug!("Session callback registered ({} total)", self.core.callbacks.len());
        }
    }

    pub fn unregister_callback<C>(&self, callback: &Arc<C>)
    where
        C: SessionControllerCallback + ?Sized,
    {
        if self.core.callbacks.unregister(callback) {
            debug!("Session callback unregistered ({} left)", self.core.callbacks.len());
        }
    }

    pub fn callback_count(&self) -> usize {
        self.core.callbacks.len()
    }

    /// Ends the power-source subscription. Idempotent.
    ///
    /// Waits for an in-flight transition to finish, so no listener hears
    /// from this controller once `release` returns. Called from inside one
    /// of its listeners it does not wait; the pass stops after that listener.
    pub fn release(&self) {
        if self.core.is_notifying_thread() {
            // The transition lock is held further up this stack.
            if self.core.is_released() {
                return;
            }
            self.core.released.cancel();
        } else {
            let _serial = self.core.transition_lock.lock().unwrap_or_else(PoisonError::into_inner);
            if self.core.is_released() {
                return;
            }
            self.core.released.cancel();
        }
        self.unsubscribe();
        info!("Session controller released");
    }

    pub fn is_released(&self) -> bool {
        self.core.is_released()
    }

    fn subscribe(&self) {
        if self.subscription().is_some() {
            return;
        }
        let id = self.core.power.register_listener(self.core.listener());
        let raced = {
            let mut subscription = self
                .core
                .subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if subscription.is_some() {
                true
            } else {
                *subscription = Some(id);
                false
            }
        };
        if raced {
            self.core.power.unregister_listener(id);
            return;
        }
        // release() may have run between the check above and now.
        if self.is_released() {
            self.unsubscribe();
        }
    }

    fn unsubscribe(&self) {
        let id = self
            .core
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = id {
            self.core.power.unregister_listener(id);
        }
    }

    fn subscription(&self) -> Option<ListenerId> {
        *self
            .core
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.release();
    }
}

/// Collects the collaborators a controller cannot live without.
pub struct SessionControllerBuilder {
    power: Option<Arc<dyn PowerStateSource>>,
    boot: Option<Arc<dyn BootMetadataSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for SessionControllerBuilder {
    fn default() -> Self {
        Self {
            power: None,
            boot: None,
            clock: None,
        }
    }
}

impl std::fmt::Debug for SessionControllerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionControllerBuilder")
            .field("has_power", &self.power.is_some())
            .field("has_boot", &self.boot.is_some())
            .field("has_clock", &self.clock.is_some())
            .finish()
    }
}

impl SessionControllerBuilder {
    pub fn power_source(mut self, power: Arc<dyn PowerStateSource>) -> Self {
        self.power = Some(power);
        self
    }

    pub fn boot_metadata(mut self, boot: Arc<dyn BootMetadataSource>) -> Self {
        self.boot = Some(boot);
        self
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Controller applying power callbacks on the delivering thread.
    ///
    /// # Errors
    /// `MissingPowerSource` or `MissingBootMetadata` when a collaborator is absent.
    pub fn build(self) -> Result<SessionController> {
        let core = self.into_core(Dispatch::Inline)?;
        Ok(SessionController { core: Arc::new(core) })
    }

    /// Controller whose power callbacks are queued for a `SessionWorker`.
    ///
    /// The queue is unbounded: a power transition is never dropped.
    ///
    /// # Errors
    /// As [`build`](Self::build).
    pub fn build_queued(self) -> Result<(SessionController, SessionWorker)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let core = Arc::new(self.into_core(Dispatch::Queued(tx))?);
        let worker = SessionWorker::new(core.clone(), rx);
        Ok((SessionController { core }, worker))
    }

    fn into_core(self, dispatch: Dispatch) -> Result<ControllerCore> {
        let power = self.power.ok_or(SessionError::MissingPowerSource)?;
        let boot = self.boot.ok_or(SessionError::MissingBootMetadata)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        Ok(ControllerCore {
            power,
            boot,
            clock,
            state: RwLock::new(ControllerState {
                session_id: 0,
                session_state: SessionState::ExitDrivingSession,
                changed_at_since_boot_millis: 0,
                changed_at_wall_millis: 0,
                boot_reason: String::new(),
                boot_count: 0,
            }),
            callbacks: CallbackRegistry::new(),
            dispatch,
            transition_lock: Mutex::new(()),
            notifying: Mutex::new(None),
            subscription: Mutex::new(None),
            released: CancellationToken::new(),
        })
    }
}
