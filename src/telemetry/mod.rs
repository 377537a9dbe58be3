//! Bounded session telemetry.
//!
//! Telemetry is a read-only consumer of session annotations. Nothing in the
//! session controller reads it back.

pub mod metrics;
pub mod recorder;
pub mod window;

pub use metrics::{compute_stats, SessionStats};
pub use recorder::SessionHistory;
pub use window::SlidingWindow;
