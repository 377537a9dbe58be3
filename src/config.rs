use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Runtime knobs for the session service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How many annotations `SessionHistory` keeps.
    pub history_capacity: usize,
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_filter: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    ///
    /// # Errors
    /// `SessionError::Config` if the file cannot be read or parsed, and
    /// `SessionError::InvalidArgument` if a value fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SessionError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: SessionConfig =
            serde_json::from_str(&content).map_err(|e| SessionError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `SessionError::InvalidArgument` for a zero history capacity.
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(SessionError::InvalidArgument(
                "history_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
