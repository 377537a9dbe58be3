use serde::{Deserialize, Serialize};

use super::window::SlidingWindow;
use crate::session::{SessionAnnotation, SessionState};

/// Aggregates over the annotations currently held in a history window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub sessions_started: usize,
    pub sessions_ended: usize,
    pub latest_session_id: Option<i32>,
    pub currently_driving: bool,
    /// Enter/exit pairs of the same session, both still in the window.
    pub completed_sessions: usize,
    pub total_driving_millis: i64,
    pub avg_session_millis: f64,
}

/// Pure fold over the window, oldest annotation first.
pub fn compute_stats(window: &SlidingWindow<SessionAnnotation>) -> SessionStats {
    let mut stats = SessionStats {
        sessions_started: window.count(|a| a.session_state == SessionState::EnterDrivingSession),
        sessions_ended: window.count(|a| a.session_state == SessionState::ExitDrivingSession),
        latest_session_id: window.latest().map(|a| a.session_id),
        currently_driving: window.latest().is_some_and(|a| a.session_state.is_driving()),
        ..SessionStats::default()
    };

    // Pairing is per boot: since-boot timestamps from different boots are not comparable.
    let mut open: Option<&SessionAnnotation> = None;
    for annotation in window {
        match annotation.session_state {
            SessionState::EnterDrivingSession => open = Some(annotation),
            SessionState::ExitDrivingSession => {
                if let Some(enter) = open.take() {
                    if enter.session_id == annotation.session_id
                        && enter.boot_count == annotation.boot_count
                    {
                        stats.completed_sessions += 1;
                        stats.total_driving_millis += (annotation.changed_at_since_boot_millis
                            - enter.changed_at_since_boot_millis)
                            .max(0);
                    }
                }
            }
            SessionState::Default => {}
        }
    }

    if stats.completed_sessions > 0 {
        #[allow(clippy::cast_precision_loss)]
        {
            stats.avg_session_millis =
                stats.total_driving_millis as f64 / stats.completed_sessions as f64;
        }
    }

    stats
}
