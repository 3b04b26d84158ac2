//! Tool management service.
//!
//! Tenant-scoped CRUD for tools plus the guarded entry point for running
//! them. A tool of another tenant is reported as not found.

use serde_json::Value;

use hookflow_types::error::{RepositoryError, ToolError};
use hookflow_types::id::{ExecutionId, TenantId, ToolId};
use hookflow_types::tool::{CreateToolRequest, Tool, ToolConfig, ToolExecution, ToolUsageStats, UpdateToolRequest};

use crate::repository::execution::ExecutionLedger;
use crate::repository::tool::ToolRepository;

use super::engine::{ExecutionOutcome, ToolEngine, validate_config};

/// Upper bound for execution listings.
pub const MAX_EXECUTION_LIST_LIMIT: u32 = 500;

pub struct ToolService<T: ToolRepository, L: ExecutionLedger> {
    tools: T,
    engine: ToolEngine<L>,
}

impl<T: ToolRepository, L: ExecutionLedger> ToolService<T, L> {
    pub fn new(tools: T, engine: ToolEngine<L>) -> Self {
        Self { tools, engine }
    }

    pub fn engine(&self) -> &ToolEngine<L> {
        &self.engine
    }

    /// Create a tool after validating its name and config.
    pub async fn create_tool(&self, tenant_id: &TenantId, request: CreateToolRequest) -> Result<Tool, ToolError> {
        if tenant_id.is_empty() {
            return Err(ToolError::Validation("tenant_id is required".to_string()));
        }
        let mut request = request;
        request.name = request.name.trim().to_string();
        if request.name.is_empty() {
            return Err(ToolError::Validation("name cannot be empty".to_string()));
        }
        validate_config(request.tool_type, &request.config)?;
        self.ensure_name_free(tenant_id, &request.name, None).await?;

        let tool = Tool::new(tenant_id.clone(), request);
        self.tools.create(&tool).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => ToolError::Conflict(tool.name.clone()),
            other => other.into(),
        })?;

        tracing::info!(tenant_id = %tenant_id, tool_id = %tool.id, tool_type = %tool.tool_type, "tool created");
        Ok(tool)
    }

    pub async fn get_tool(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<Tool, ToolError> {
        self.tools
            .get(tenant_id, tool_id)
            .await?
            .ok_or_else(|| ToolError::NotFound(tool_id.clone()))
    }

    pub async fn list_tools(&self, tenant_id: &TenantId) -> Result<Vec<Tool>, ToolError> {
        Ok(self.tools.list(tenant_id).await?)
    }

    /// Update name, description and schemas.
    pub async fn update_tool(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        update: UpdateToolRequest,
    ) -> Result<Tool, ToolError> {
        let mut tool = self.get_tool(tenant_id, tool_id).await?;
        let mut update = update;
        if let Some(name) = update.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ToolError::Validation("name cannot be empty".to_string()));
            }
            if name != tool.name {
                self.ensure_name_free(tenant_id, &name, Some(tool_id)).await?;
            }
            update.name = Some(name);
        }
        tool.update_details(update);
        self.tools.update(&tool).await?;
        Ok(tool)
    }

    /// Replace the config. It must match the tool's declared type.
    pub async fn update_config(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        config: ToolConfig,
    ) -> Result<Tool, ToolError> {
        let mut tool = self.get_tool(tenant_id, tool_id).await?;
        validate_config(tool.tool_type, &config)?;
        tool.update_config(config);
        self.tools.update(&tool).await?;
        Ok(tool)
    }

    pub async fn activate_tool(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<Tool, ToolError> {
        let mut tool = self.get_tool(tenant_id, tool_id).await?;
        tool.activate();
        self.tools.update(&tool).await?;
        tracing::info!(tenant_id = %tenant_id, tool_id = %tool_id, "tool activated");
        Ok(tool)
    }

    pub async fn deactivate_tool(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<Tool, ToolError> {
        let mut tool = self.get_tool(tenant_id, tool_id).await?;
        tool.deactivate();
        self.tools.update(&tool).await?;
        tracing::info!(tenant_id = %tenant_id, tool_id = %tool_id, "tool deactivated");
        Ok(tool)
    }

    pub async fn delete_tool(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<(), ToolError> {
        if !self.tools.delete(tenant_id, tool_id).await? {
            return Err(ToolError::NotFound(tool_id.clone()));
        }
        tracing::info!(tenant_id = %tenant_id, tool_id = %tool_id, "tool deleted");
        Ok(())
    }

    /// Run a tool on behalf of a tenant.
    ///
    /// Inactive tools are rejected before any execution record exists.
    pub async fn execute_tool(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        input: Value,
    ) -> Result<ExecutionOutcome, ToolError> {
        let tool = self.get_tool(tenant_id, tool_id).await?;
        if !tool.is_active {
            return Err(ToolError::Inactive(tool.id));
        }
        self.engine.execute(&tool, input).await
    }

    pub async fn get_execution(
        &self,
        tenant_id: &TenantId,
        execution_id: &ExecutionId,
    ) -> Result<ToolExecution, ToolError> {
        self.engine
            .ledger()
            .get_execution(tenant_id, execution_id)
            .await?
            .ok_or_else(|| ToolError::ExecutionNotFound(execution_id.clone()))
    }

    /// Most recent executions of one tool, newest first.
    pub async fn list_executions(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        limit: u32,
    ) -> Result<Vec<ToolExecution>, ToolError> {
        self.get_tool(tenant_id, tool_id).await?;
        let limit = limit.clamp(1, MAX_EXECUTION_LIST_LIMIT);
        Ok(self.engine.ledger().list_executions(tenant_id, tool_id, limit).await?)
    }

    pub async fn usage_stats(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<ToolUsageStats, ToolError> {
        self.get_tool(tenant_id, tool_id).await?;
        Ok(self.engine.ledger().usage_stats(tenant_id, tool_id).await?)
    }

    async fn ensure_name_free(
        &self,
        tenant_id: &TenantId,
        name: &str,
        except: Option<&ToolId>,
    ) -> Result<(), ToolError> {
        match self.tools.get_by_name(tenant_id, name).await? {
            Some(existing) if Some(&existing.id) != except => Err(ToolError::Conflict(name.to_string())),
            _ => Ok(()),
        }
    }
}
