//! Tool repository trait definition.

use hookflow_types::error::RepositoryError;
use hookflow_types::id::{TenantId, ToolId};
use hookflow_types::tool::Tool;

/// Repository trait for tool persistence.
///
/// Implementations live in hookflow-infra (e.g., SqliteToolRepository).
pub trait ToolRepository: Send + Sync {
    /// Create a new tool. A duplicate name within the tenant is `Conflict`.
    fn create(
        &self,
        tool: &Tool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get(
        &self,
        tenant_id: &TenantId,
        id: &ToolId,
    ) -> impl std::future::Future<Output = Result<Option<Tool>, RepositoryError>> + Send;

    fn get_by_name(
        &self,
        tenant_id: &TenantId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Tool>, RepositoryError>> + Send;

    /// List a tenant's tools ordered by name.
    fn list(
        &self,
        tenant_id: &TenantId,
    ) -> impl std::future::Future<Output = Result<Vec<Tool>, RepositoryError>> + Send;

    fn update(
        &self,
        tool: &Tool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Permanently delete a tool. Returns `true` if it existed.
    fn delete(
        &self,
        tenant_id: &TenantId,
        id: &ToolId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
