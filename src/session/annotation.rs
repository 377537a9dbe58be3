use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::state::SessionState;

pub const KEY_SESSION_ID: &str = "session_id";
pub const KEY_SESSION_STATE: &str = "session_state";
pub const KEY_CHANGED_AT_SINCE_BOOT_MILLIS: &str = "changed_at_since_boot_millis";
pub const KEY_CHANGED_AT_WALL_MILLIS: &str = "changed_at_wall_millis";
pub const KEY_BOOT_REASON: &str = "boot_reason";
pub const KEY_BOOT_COUNT: &str = "boot_count";

/// Immutable snapshot of the session at its most recent transition.
///
/// Built fresh by the controller for every transition. Holds no reference
/// back into the controller, so listeners may keep it as long as they like.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionAnnotation {
    pub session_id: i32,
    pub session_state: SessionState,
    pub changed_at_since_boot_millis: i64,
    pub changed_at_wall_millis: i64,
    pub boot_reason: String,
    pub boot_count: i32,
}

impl SessionAnnotation {
    /// Named key/value view for external record writers.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(KEY_SESSION_ID.to_string(), json!(self.session_id));
        record.insert(KEY_SESSION_STATE.to_string(), json!(self.session_state.code()));
        record.insert(
            KEY_CHANGED_AT_SINCE_BOOT_MILLIS.to_string(),
            json!(self.changed_at_since_boot_millis),
        );
        record.insert(
            KEY_CHANGED_AT_WALL_MILLIS.to_string(),
            json!(self.changed_at_wall_millis),
        );
        record.insert(KEY_BOOT_REASON.to_string(), json!(self.boot_reason));
        record.insert(KEY_BOOT_COUNT.to_string(), json!(self.boot_count));
        record
    }
}
