//! Driving-session state machine.
//!
//! A driving session spans from the power state entering full-on operation
//! to the power state entering shutdown-prepare. [`SessionController`] turns
//! power callbacks into session transitions and fans each one out, exactly
//! once, as a [`SessionAnnotation`] to the registered listeners.

pub mod annotation;
pub mod callback;
pub mod controller;
pub mod state;
pub mod worker;

pub use annotation::SessionAnnotation;
pub use callback::{CallbackRegistry, SessionControllerCallback};
pub use controller::{SessionController, SessionControllerBuilder};
pub use state::SessionState;
pub use worker::SessionWorker;
