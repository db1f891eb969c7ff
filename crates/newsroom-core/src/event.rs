use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event names pushed over the WebSocket fan-out. The front end matches on
/// these strings, so they are part of the wire contract.
pub const NEWS_CREATED: &str = "news_created";
pub const NEWS_UPDATED: &str = "news_updated";
pub const NEWS_DELETED: &str = "news_deleted";
pub const NEWS_SCHEDULED_PUBLISH: &str = "news_scheduled_publish";

/// Server → Client unsolicited push event.
/// Wire: `{ "event": "news_created", "data": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    pub data: Value,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            event: event.into(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    /// Serialize for the wire. An event frame built from valid JSON values
    /// cannot fail to serialize, so this never returns an error.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
