use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::metrics::{compute_stats, SessionStats};
use super::window::SlidingWindow;
use crate::error::Result;
use crate::session::{SessionAnnotation, SessionControllerCallback};

/// Session listener keeping the last N annotations.
#[derive(Debug)]
pub struct SessionHistory {
    window: Mutex<SlidingWindow<SessionAnnotation>>,
}

impl SessionHistory {
    /// # Errors
    /// `SessionError::InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            window: Mutex::new(SlidingWindow::new(capacity)?),
        })
    }

    pub fn record(&self, annotation: SessionAnnotation) {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(annotation);
    }

    /// Oldest first.
    pub fn annotations(&self) -> Vec<SessionAnnotation> {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SessionStats {
        // Delegate to pure functional metrics module
        compute_stats(&self.window.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SessionControllerCallback for SessionHistory {
    fn on_session_state_changed(&self, annotation: &SessionAnnotation) {
        debug!(
            "Recording session {} {:?}",
            annotation.session_id, annotation.session_state
        );
        self.record(annotation.clone());
    }
}
