use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use fieldtrail_core_types::ActorId;

/// Wire record for one changed field
///
/// `old_value`/`new_value` are already JSON-safe; both are `null` for a
/// redacted field. `truncated` lists which of the two value slots were cut to
/// the configured maximum length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingChangedEvent {
    pub event_name: String,
    pub table: String,
    pub setting: String,
    pub old_value: Value,
    pub new_value: Value,
    #[serde(default)]
    pub truncated: Vec<String>,
    pub user_id: ActorId,
    pub timestamp: DateTime<Utc>,
}

impl SettingChangedEvent {
    pub fn was_truncated(&self) -> bool {
        !self.truncated.is_empty()
    }
}
