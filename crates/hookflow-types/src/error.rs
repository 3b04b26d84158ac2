use std::time::Duration;

use thiserror::Error;

use crate::id::{ChannelId, ExecutionId, ToolId, WorkflowId};

/// Errors from repository operations (used by trait definitions in hookflow-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised while validating a workflow definition.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid trigger config: {0}")]
    InvalidTriggerConfig(String),

    #[error("invalid workflow: {0}")]
    Invalid(String),
}

/// Errors from the detached dispatch boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatcher is draining and accepts no new work.
    #[error("dispatcher is shutting down")]
    ShuttingDown,
}

/// Errors on the inbound path (webhook and channel messages).
///
/// Everything here is decided synchronously, before any work is dispatched.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    /// Tenant mismatch or similar ownership failure.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("Workflow is not active")]
    WorkflowInactive,

    #[error("channel is not active")]
    ChannelInactive,

    /// Credential validation failed.
    #[error("invalid or missing API key")]
    Unauthorized,

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors related to tool management and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool {0} not found")]
    NotFound(ToolId),

    #[error("execution {0} not found")]
    ExecutionNotFound(ExecutionId),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("tool {0} is inactive")]
    Inactive(ToolId),

    /// Input failed the tool's declared schema, or a request was malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Config does not satisfy the rules of the tool's declared type.
    #[error("invalid tool config: {0}")]
    InvalidConfig(String),

    #[error("tool name '{0}' already exists")]
    Conflict(String),

    /// A downstream call (HTTP target, email provider) failed.
    #[error("external call failed: {0}")]
    External(String),

    /// Local execution failure (database driver, custom code).
    #[error("execution failed: {0}")]
    Internal(String),

    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_workflow_message() {
        assert_eq!(IngestError::WorkflowInactive.to_string(), "Workflow is not active");
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Conflict("send-report".to_string());
        assert_eq!(err.to_string(), "tool name 'send-report' already exists");

        let err = ToolError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_repository_error_converts_into_tool_error() {
        let err: ToolError = RepositoryError::NotFound.into();
        assert!(matches!(err, ToolError::Repository(RepositoryError::NotFound)));
    }
}
