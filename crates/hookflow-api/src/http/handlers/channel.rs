//! Channel message intake.
//!
//! Channel providers post their already-parsed message here; the ingest
//! service normalizes it into the canonical message and dispatches it.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use hookflow_core::ingest::service::MessageAck;
use hookflow_types::id::{ChannelId, TenantId};
use hookflow_types::message::IncomingMessage;

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /api/v1/tenants/{tenant_id}/channels/{channel_id}/messages
pub async fn receive_message(
    State(state): State<AppState>,
    Path((tenant_id, channel_id)): Path<(String, String)>,
    Json(incoming): Json<IncomingMessage>,
) -> Result<(StatusCode, Json<MessageAck>), AppError> {
    let ack = state
        .ingest
        .accept_channel_message(&TenantId::from(tenant_id), &ChannelId::from(channel_id), incoming)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}
