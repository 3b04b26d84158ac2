//! Execution ledger port.
//!
//! The ledger stores [`ToolExecution`] records. Only the tool engine writes
//! to it; everything else reads.

use hookflow_types::error::RepositoryError;
use hookflow_types::id::{ExecutionId, TenantId, ToolId};
use hookflow_types::tool::{ToolExecution, ToolUsageStats};

pub trait ExecutionLedger: Send + Sync + 'static {
    /// Persist a freshly created (PENDING) execution.
    fn create_execution(
        &self,
        execution: &ToolExecution,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the mutable fields (status, output, error, timings).
    fn update_execution(
        &self,
        execution: &ToolExecution,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_execution(
        &self,
        tenant_id: &TenantId,
        id: &ExecutionId,
    ) -> impl std::future::Future<Output = Result<Option<ToolExecution>, RepositoryError>> + Send;

    /// Most recent first.
    fn list_executions(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ToolExecution>, RepositoryError>> + Send;

    /// Aggregate counts and average duration for one tool.
    fn usage_stats(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
    ) -> impl std::future::Future<Output = Result<ToolUsageStats, RepositoryError>> + Send;
}
