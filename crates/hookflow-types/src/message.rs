//! Inbound channel messages and the canonical engine message.
//!
//! Channel providers (WhatsApp, Telegram, ...) parse their own webhook formats
//! into an [`IncomingMessage`]. The ingest layer turns that into one canonical
//! [`Message`] regardless of the originating channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{ChannelId, MessageId, TenantId};

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A configured messaging channel owned by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub tenant_id: TenantId,
    /// Channel kind (e.g. "whatsapp", "telegram").
    #[serde(rename = "type")]
    pub channel_type: String,
    pub name: String,
    /// Provider backing the channel (e.g. "twilio", "meta").
    pub provider: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Provider-normalized incoming message
// ---------------------------------------------------------------------------

/// A message as handed over by a channel provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub sender_id: String,
    /// The provider's own message id.
    #[serde(default)]
    pub message_id: String,
    /// Provider timestamp, kept verbatim.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub content: IncomingContent,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Free-form content of an incoming message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingContent {
    #[serde(rename = "type", default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Interactive payload (buttons, list replies), passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_content_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organization: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type", default)]
    pub attachment_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub caption: String,
}

// ---------------------------------------------------------------------------
// Canonical message
// ---------------------------------------------------------------------------

/// Lifecycle of a canonical message inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Processing,
    Processed,
    Failed,
}

/// The normalized representation of any inbound communication event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub tenant_id: TenantId,
    /// `None` for pure webhook triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    pub sender_id: String,
    pub content: MessageContent,
    /// Provenance: channel type/name/provider, original id, raw timestamp.
    #[serde(default)]
    pub context: Map<String, Value>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
    /// Non-empty URLs only: media URL first, then attachments in order.
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incoming_message_defaults() {
        let msg: IncomingMessage = serde_json::from_value(json!({
            "sender_id": "+15550001",
            "content": {"text": "hi"}
        }))
        .unwrap();
        assert_eq!(msg.content.content_type, "text");
        assert_eq!(msg.content.text, "hi");
        assert!(msg.content.attachments.is_empty());
        assert!(msg.metadata.is_empty());
    }

    #[test]
    fn test_attachment_type_field_name() {
        let att: Attachment = serde_json::from_value(json!({
            "type": "image", "url": "https://cdn/x.png", "size": 1024
        }))
        .unwrap();
        assert_eq!(att.attachment_type, "image");
        assert_eq!(att.size, 1024);
    }

    #[test]
    fn test_message_status_serde() {
        let json = serde_json::to_string(&MessageStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
