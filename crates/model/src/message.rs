use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Custom widget message, dispatched on its `method` field.
///
/// Known methods are handled by the owning view; unknown methods are a
/// named hook point and are reported at debug level, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMessage {
    pub method: String,
    #[serde(default)]
    pub content: Value,
}

impl CustomMessage {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            content: Value::Null,
        }
    }
}

/// Outbound widget event: browser-side activity (mouse gestures, picked
/// features, finished layer constructions) forwarded to the kernel.
///
/// The mirror of [`CustomMessage`]: views queue these and the host
/// drains them for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub event: String,
    #[serde(default)]
    pub content: Value,
}

impl EventMessage {
    pub fn new(event: impl Into<String>, content: Value) -> Self {
        Self {
            event: event.into(),
            content,
        }
    }
}
