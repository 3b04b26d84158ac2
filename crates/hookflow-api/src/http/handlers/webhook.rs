//! Webhook trigger endpoints.
//!
//! `POST` accepts a trigger and answers 202 as soon as the event is
//! dispatched. `GET` echoes a verification challenge without touching the
//! workflow. `POST .../test` runs the same checks and returns the payload
//! that would have been dispatched.

use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use serde_json::{Value, json};

use hookflow_core::ingest::credential::{API_KEY_HEADER, API_KEY_QUERY_PARAM, CredentialSources};
use hookflow_core::ingest::normalize::WebhookRequest;
use hookflow_core::ingest::service::WebhookAck;
use hookflow_types::id::{TenantId, WorkflowId};

use crate::http::error::AppError;
use crate::state::AppState;

/// Query keys accepted for the verification challenge.
const CHALLENGE_PARAMS: [&str; 2] = ["challenge", "hub.challenge"];

/// Flatten headers to one lowercased name each, joining repeats with ", ".
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flat
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn credential_sources(headers: &HeaderMap, query: &HashMap<String, String>) -> CredentialSources {
    CredentialSources {
        api_key_header: header(headers, API_KEY_HEADER),
        authorization: header(headers, "authorization"),
        query_api_key: query.get(API_KEY_QUERY_PARAM).cloned(),
    }
}

fn webhook_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: Bytes,
) -> WebhookRequest {
    WebhookRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        body: body.to_vec(),
        query,
        headers: flatten_headers(headers),
    }
}

/// POST /webhooks/{tenant_id}/{workflow_id} - Trigger a workflow.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path((tenant_id, workflow_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookAck>), AppError> {
    let tenant_id = TenantId::from(tenant_id);
    let workflow_id = WorkflowId::from(workflow_id);
    let credentials = credential_sources(&headers, &query);
    let request = webhook_request(&method, &uri, &headers, query, body);

    let ack = state
        .ingest
        .accept_webhook(&tenant_id, &workflow_id, &request, &credentials)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(ack)))
}

/// GET /webhooks/{tenant_id}/{workflow_id}?challenge=X - Echo a verification challenge.
pub async fn verify_webhook(
    Path((tenant_id, workflow_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<String, AppError> {
    let challenge = CHALLENGE_PARAMS
        .iter()
        .find_map(|key| query.get(*key))
        .ok_or_else(|| AppError::Validation("missing challenge parameter".to_string()))?;

    tracing::debug!(tenant_id = %tenant_id, workflow_id = %workflow_id, "webhook verification challenge");
    Ok(challenge.clone())
}

/// POST /webhooks/{tenant_id}/{workflow_id}/test - Dry run; nothing is dispatched.
pub async fn dry_run_webhook(
    State(state): State<AppState>,
    Path((tenant_id, workflow_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let tenant_id = TenantId::from(tenant_id);
    let workflow_id = WorkflowId::from(workflow_id);
    let credentials = credential_sources(&headers, &query);
    let request = webhook_request(&method, &uri, &headers, query, body);

    let payload = state
        .ingest
        .preview_webhook(&tenant_id, &workflow_id, &request, &credentials)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "workflow_id": workflow_id,
        "payload": payload,
    })))
}
