use serde::{Deserialize, Serialize};

/// Driving-session state.
///
/// `Default` is only the pre-init value of a bare annotation; the controller
/// starts in `ExitDrivingSession` and never returns to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Default,
    ExitDrivingSession,
    EnterDrivingSession,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Default
    }
}

impl SessionState {
    /// Stable integer code for external record formats.
    pub fn code(self) -> i32 {
        match self {
            SessionState::Default => 0,
            SessionState::ExitDrivingSession => 1,
            SessionState::EnterDrivingSession => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SessionState::Default),
            1 => Some(SessionState::ExitDrivingSession),
            2 => Some(SessionState::EnterDrivingSession),
            _ => None,
        }
    }

    pub fn is_driving(self) -> bool {
        matches!(self, SessionState::EnterDrivingSession)
    }
}
