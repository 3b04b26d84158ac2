//! Workflow lookup port.

use hookflow_types::error::RepositoryError;
use hookflow_types::id::{TenantId, WorkflowId};
use hookflow_types::workflow::Workflow;

/// Repository trait for the workflow records the trigger path reads.
///
/// Workflow CRUD lives elsewhere; this port only needs lookup and an upsert
/// used by seeding and tests.
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait WorkflowRepository: Send + Sync {
    /// Find a workflow owned by `tenant_id`. `Ok(None)` if absent.
    fn find_workflow(
        &self,
        tenant_id: &TenantId,
        workflow_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<Workflow>, RepositoryError>> + Send;

    /// Insert or replace a workflow by ID.
    fn save_workflow(
        &self,
        workflow: &Workflow,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
