//! Application error type mapping to HTTP status codes.
//!
//! Error bodies are `{"error": "<message>", "code": "<CODE>"}`. An inactive
//! workflow is answered with exactly `{"error": "Workflow is not active"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use hookflow_types::error::{DispatchError, IngestError, RepositoryError, ToolError};
use hookflow_types::id::ExecutionId;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Inbound trigger and channel path.
    Ingest(IngestError),
    /// Tool management and execution.
    Tool(ToolError),
    /// A tool ran and failed; the execution record exists.
    Execution { execution_id: ExecutionId, error: ToolError },
    /// Malformed request.
    Validation(String),
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::Ingest(e)
    }
}

impl From<ToolError> for AppError {
    fn from(e: ToolError) -> Self {
        AppError::Tool(e)
    }
}

fn repository_status(e: &RepositoryError) -> (StatusCode, &'static str) {
    match e {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        RepositoryError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        RepositoryError::Connection | RepositoryError::Query(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    }
}

fn ingest_status(e: &IngestError) -> (StatusCode, &'static str) {
    match e {
        IngestError::WorkflowNotFound(_) => (StatusCode::NOT_FOUND, "WORKFLOW_NOT_FOUND"),
        IngestError::ChannelNotFound(_) => (StatusCode::NOT_FOUND, "CHANNEL_NOT_FOUND"),
        IngestError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        IngestError::WorkflowInactive => (StatusCode::FORBIDDEN, "WORKFLOW_INACTIVE"),
        IngestError::ChannelInactive => (StatusCode::FORBIDDEN, "CHANNEL_INACTIVE"),
        IngestError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        IngestError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        IngestError::Dispatch(DispatchError::ShuttingDown) => {
            (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN")
        }
        IngestError::Repository(e) => repository_status(e),
    }
}

fn tool_status(e: &ToolError) -> (StatusCode, &'static str) {
    match e {
        ToolError::NotFound(_) => (StatusCode::NOT_FOUND, "TOOL_NOT_FOUND"),
        ToolError::ExecutionNotFound(_) => (StatusCode::NOT_FOUND, "EXECUTION_NOT_FOUND"),
        ToolError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ToolError::Inactive(_) => (StatusCode::FORBIDDEN, "TOOL_INACTIVE"),
        ToolError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ToolError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, "INVALID_CONFIG"),
        ToolError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        ToolError::External(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_ERROR"),
        ToolError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXECUTION_ERROR"),
        ToolError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
        ToolError::Repository(e) => repository_status(e),
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ingest(e) => ingest_status(e).0,
            AppError::Tool(e) | AppError::Execution { error: e, .. } => tool_status(e).0,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Ingest(IngestError::WorkflowInactive) => {
                json!({"error": IngestError::WorkflowInactive.to_string()})
            }
            AppError::Ingest(e) => json!({"error": e.to_string(), "code": ingest_status(e).1}),
            AppError::Tool(e) => json!({"error": e.to_string(), "code": tool_status(e).1}),
            AppError::Execution { execution_id, error } => json!({
                "error": error.to_string(),
                "code": tool_status(error).1,
                "execution_id": execution_id,
            }),
            AppError::Validation(msg) => json!({"error": msg, "code": "VALIDATION_ERROR"}),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hookflow_types::id::ToolId;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_inactive_workflow_body_is_exact() {
        let response = AppError::from(IngestError::WorkflowInactive).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, json!({"error": "Workflow is not active"}));
    }

    #[tokio::test]
    async fn test_error_body_carries_code() {
        let response = AppError::from(IngestError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["error"], "invalid or missing API key");
    }

    #[test]
    fn test_tool_status_mapping() {
        let cases = [
            (ToolError::NotFound(ToolId::from("t")), StatusCode::NOT_FOUND),
            (ToolError::Inactive(ToolId::from("t")), StatusCode::FORBIDDEN),
            (ToolError::InvalidConfig("x".into()), StatusCode::BAD_REQUEST),
            (ToolError::Conflict("x".into()), StatusCode::CONFLICT),
            (ToolError::External("x".into()), StatusCode::BAD_GATEWAY),
            (ToolError::Timeout(Duration::from_secs(1)), StatusCode::GATEWAY_TIMEOUT),
            (ToolError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_shutting_down_is_unavailable() {
        let err = AppError::from(IngestError::Dispatch(DispatchError::ShuttingDown));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_execution_error_includes_execution_id() {
        let err = AppError::Execution {
            execution_id: ExecutionId::from("exec-1"),
            error: ToolError::External("HTTP 500: kaput".into()),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["execution_id"], "exec-1");
    }
}
