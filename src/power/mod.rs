//! Power-state collaborators consumed by the session controller.
//!
//! The controller only depends on the narrow [`PowerStateSource`] and
//! [`BootMetadataSource`] contracts, never on a concrete power manager.

pub mod boot;
pub mod simulated;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::state::SessionState;

pub use boot::{BootMetadataSource, EnvBootMetadata, StaticBootMetadata};
pub use simulated::SimulatedPowerSource;

/// Power states reported by a car power manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    Invalid,
    WaitForVhal,
    SuspendEnter,
    SuspendExit,
    ShutdownEnter,
    /// Entering full-on operation.
    On,
    ShutdownPrepare,
    ShutdownCancelled,
    HibernationEnter,
    HibernationExit,
    PreShutdownPrepare,
    PostSuspendEnter,
    PostShutdownEnter,
    PostHibernationEnter,
}

impl PowerState {
    /// The session transition this power state asks for, if any.
    pub fn requested_session_state(self) -> Option<SessionState> {
        match self {
            PowerState::On => Some(SessionState::EnterDrivingSession),
            PowerState::ShutdownPrepare => Some(SessionState::ExitDrivingSession),
            _ => None,
        }
    }
}

/// Handle returned by [`PowerStateSource::register_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

pub type PowerStateListener = Arc<dyn Fn(PowerState) + Send + Sync>;

/// Something that knows the current power state and reports changes.
///
/// Implementations invoke every registered listener with the new state
/// whenever it changes. They may call from any thread.
pub trait PowerStateSource: Send + Sync {
    fn register_listener(&self, listener: PowerStateListener) -> ListenerId;
    /// Unknown ids are ignored.
    fn unregister_listener(&self, id: ListenerId);
    fn current_state(&self) -> PowerState;
}
