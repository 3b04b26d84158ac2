//! Event normalization.
//!
//! Two inbound shapes are handled here:
//! - webhook requests, which become an enriched payload map for the
//!   downstream [`TriggerHandler`](crate::trigger::TriggerHandler)
//! - provider-normalized channel messages, which become one canonical
//!   [`Message`]

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Map, Value, json};

use hookflow_types::id::{MessageId, TenantId, WorkflowId};
use hookflow_types::message::{Channel, IncomingMessage, Message, MessageContent, MessageStatus};

// ---------------------------------------------------------------------------
// Webhook shape
// ---------------------------------------------------------------------------

/// Transport-independent view of an inbound webhook request.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
    /// Query parameters flattened to one string per name.
    pub query: HashMap<String, String>,
    /// Header names lowercased; repeated headers joined with ", ".
    pub headers: HashMap<String, String>,
}

/// Parse a request body into a JSON object.
///
/// Empty, malformed or non-object bodies yield an empty map.
pub fn parse_body(body: &[u8]) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::debug!("webhook body is not a JSON object, using empty payload");
            Map::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "webhook body is not valid JSON, using empty payload");
            Map::new()
        }
    }
}

fn string_map(values: &HashMap<String, String>) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Build the payload handed to the trigger handler for a webhook.
///
/// Each name in `include_fields` that exists at the top level of the body is
/// copied to the payload root. The base keys are written last so a body
/// field can never shadow them.
pub fn build_webhook_payload(
    tenant_id: &TenantId,
    workflow_id: &WorkflowId,
    request: &WebhookRequest,
    include_fields: &[String],
) -> Map<String, Value> {
    let body = parse_body(&request.body);
    let mut payload = Map::new();

    for field in include_fields {
        if let Some(value) = body.get(field) {
            payload.insert(field.clone(), value.clone());
        }
    }

    payload.insert("body".to_string(), Value::Object(body));
    payload.insert("query".to_string(), string_map(&request.query));
    payload.insert("headers".to_string(), string_map(&request.headers));
    payload.insert("method".to_string(), Value::String(request.method.clone()));
    payload.insert("path".to_string(), Value::String(request.path.clone()));
    payload.insert("workflow_id".to_string(), Value::String(workflow_id.to_string()));
    payload.insert("tenant_id".to_string(), Value::String(tenant_id.to_string()));
    payload
}

// ---------------------------------------------------------------------------
// Channel shape
// ---------------------------------------------------------------------------

/// Turn a provider-normalized message into the canonical engine message.
pub fn normalize_channel_message(channel: &Channel, incoming: IncomingMessage) -> Message {
    let IncomingMessage {
        sender_id,
        message_id,
        timestamp,
        content,
        metadata,
    } = incoming;

    let mut content_metadata = content.metadata;
    let mut put_text = |key: &str, value: &str| {
        if !value.is_empty() {
            content_metadata.insert(key.to_string(), Value::String(value.to_string()));
        }
    };
    put_text("media_url", &content.media_url);
    put_text("caption", &content.caption);
    put_text("mime_type", &content.mime_type);
    put_text("filename", &content.filename);

    if let Some(location) = &content.location {
        content_metadata.insert(
            "location".to_string(),
            json!({
                "latitude": location.latitude,
                "longitude": location.longitude,
                "name": location.name,
                "address": location.address,
            }),
        );
    }
    if let Some(contact) = &content.contact {
        content_metadata.insert(
            "contact".to_string(),
            json!({
                "name": contact.name,
                "phone": contact.phone,
                "email": contact.email,
                "organization": contact.organization,
            }),
        );
    }
    if let Some(interactive) = content.interactive {
        if !interactive.is_null() {
            content_metadata.insert("interactive".to_string(), interactive);
        }
    }
    if !content.attachments.is_empty() {
        let details: Vec<Value> = content
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "type": a.attachment_type,
                    "url": a.url,
                    "mime_type": a.mime_type,
                    "filename": a.filename,
                    "size": a.size,
                    "caption": a.caption,
                })
            })
            .collect();
        content_metadata.insert("attachment_details".to_string(), Value::Array(details));
    }

    let attachments: Vec<String> = std::iter::once(content.media_url)
        .chain(content.attachments.into_iter().map(|a| a.url))
        .filter(|url| !url.is_empty())
        .collect();

    let mut context = metadata;
    context.insert("original_message_id".to_string(), Value::String(message_id));
    context.insert("channel_type".to_string(), Value::String(channel.channel_type.clone()));
    context.insert("channel_name".to_string(), Value::String(channel.name.clone()));
    context.insert("provider".to_string(), Value::String(channel.provider.clone()));
    context.insert("raw_timestamp".to_string(), Value::String(timestamp));

    let now = Utc::now();
    Message {
        id: MessageId::generate(),
        tenant_id: channel.tenant_id.clone(),
        channel_id: Some(channel.id.clone()),
        sender_id,
        content: MessageContent {
            content_type: content.content_type,
            text: content.text,
            attachments,
            metadata: content_metadata,
        },
        context,
        status: MessageStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}
