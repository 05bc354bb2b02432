//! Request and response types for template messages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A template message addressed to one phone number.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateMessage {
    /// Recipient in international form without `+` (e.g., "84901234567").
    pub phone: String,
    /// Approved template ID.
    pub template_id: String,
    /// Values for the template's placeholders.
    pub template_data: Map<String, Value>,
    /// Caller-chosen ID echoed back in delivery callbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

impl TemplateMessage {
    /// Create a message for a phone number and template.
    pub fn new(phone: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            template_id: template_id.into(),
            ..Default::default()
        }
    }

    /// Set one template field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template_data.insert(key.into(), value.into());
        self
    }

    /// Replace all template fields.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.template_data = data;
        self
    }

    /// Set the tracking ID.
    pub fn with_tracking_id(mut self, tracking_id: impl Into<String>) -> Self {
        self.tracking_id = Some(tracking_id.into());
        self
    }
}

/// Raw API envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse {
    pub error: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<SentMessage>,
}

/// Details of an accepted message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentMessage {
    /// Provider-assigned message ID.
    #[serde(default)]
    pub msg_id: Option<String>,
    /// Send time as reported by the provider.
    #[serde(default)]
    pub sent_time: Option<String>,
}

/// Result of an accepted send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// Provider message, usually "Success".
    pub message: String,
    pub sent: SentMessage,
}
