use std::env;

use tracing::warn;

pub const BOOT_REASON_VAR: &str = "DRIVE_SESSION_BOOT_REASON";
pub const BOOT_COUNT_VAR: &str = "DRIVE_SESSION_BOOT_COUNT";

/// Boot metadata read once per `init_session()`.
pub trait BootMetadataSource: Send + Sync {
    fn boot_reason(&self) -> String;
    fn boot_count(&self) -> i32;
}

/// Fixed values, mostly for tests and simulations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBootMetadata {
    pub reason: String,
    pub count: i32,
}

impl StaticBootMetadata {
    pub fn new(reason: impl Into<String>, count: i32) -> Self {
        Self {
            reason: reason.into(),
            count,
        }
    }
}

impl BootMetadataSource for StaticBootMetadata {
    fn boot_reason(&self) -> String {
        self.reason.clone()
    }

    fn boot_count(&self) -> i32 {
        self.count
    }
}

/// Reads `DRIVE_SESSION_BOOT_REASON` / `DRIVE_SESSION_BOOT_COUNT`.
/// Unset or unparsable values fall back to `"unknown"` and `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvBootMetadata;

impl BootMetadataSource for EnvBootMetadata {
    fn boot_reason(&self) -> String {
        env::var(BOOT_REASON_VAR).unwrap_or_else(|_| "unknown".to_string())
    }

    fn boot_count(&self) -> i32 {
        match env::var(BOOT_COUNT_VAR) {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
                warn!("Ignoring unparsable {}={:?}: {}", BOOT_COUNT_VAR, raw, e);
                0
            }),
            Err(_) => 0,
        }
    }
}
