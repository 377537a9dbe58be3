pub mod config;
pub mod error;
pub mod power;
pub mod session;
pub mod telemetry;
pub mod time;

// Re-export specific items if needed for convenient access
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use power::{PowerState, PowerStateSource};
pub use session::{SessionAnnotation, SessionController, SessionControllerCallback, SessionState};
pub use telemetry::{SessionHistory, SlidingWindow};
