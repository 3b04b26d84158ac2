//! In-memory fakes shared by the tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use hookflow_types::error::{RepositoryError, ToolError};
use hookflow_types::id::{ExecutionId, TenantId, ToolId};
use hookflow_types::tool::{
    CustomToolConfig, DatabaseToolConfig, EmailToolConfig, HttpToolConfig, Tool, ToolExecution,
    ToolExecutionStatus, ToolUsageStats,
};

use crate::repository::execution::ExecutionLedger;
use crate::repository::tool::ToolRepository;

use super::backend::{BackendFuture, ToolBackend, ToolBackends};

#[derive(Default)]
pub struct MemTools(pub Mutex<HashMap<String, Tool>>);

impl ToolRepository for MemTools {
    async fn create(&self, tool: &Tool) -> Result<(), RepositoryError> {
        let mut tools = self.0.lock().unwrap();
        if tools
            .values()
            .any(|t| t.tenant_id == tool.tenant_id && t.name == tool.name)
        {
            return Err(RepositoryError::Conflict(tool.name.clone()));
        }
        tools.insert(tool.id.to_string(), tool.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: &TenantId, id: &ToolId) -> Result<Option<Tool>, RepositoryError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .get(id.as_str())
            .filter(|t| &t.tenant_id == tenant_id)
            .cloned())
    }

    async fn get_by_name(&self, tenant_id: &TenantId, name: &str) -> Result<Option<Tool>, RepositoryError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .values()
            .find(|t| &t.tenant_id == tenant_id && t.name == name)
            .cloned())
    }

    async fn list(&self, tenant_id: &TenantId) -> Result<Vec<Tool>, RepositoryError> {
        let mut tools: Vec<Tool> = self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|t| &t.tenant_id == tenant_id)
            .cloned()
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tools)
    }

    async fn update(&self, tool: &Tool) -> Result<(), RepositoryError> {
        let mut tools = self.0.lock().unwrap();
        if !tools.contains_key(tool.id.as_str()) {
            return Err(RepositoryError::NotFound);
        }
        tools.insert(tool.id.to_string(), tool.clone());
        Ok(())
    }

    async fn delete(&self, tenant_id: &TenantId, id: &ToolId) -> Result<bool, RepositoryError> {
        let mut tools = self.0.lock().unwrap();
        let owned = tools
            .get(id.as_str())
            .is_some_and(|t| &t.tenant_id == tenant_id);
        if owned {
            tools.remove(id.as_str());
        }
        Ok(owned)
    }
}

/// Ledger that also keeps every status it was asked to persist, in order.
#[derive(Default)]
pub struct MemLedger {
    pub records: Mutex<HashMap<String, ToolExecution>>,
    pub history: Mutex<Vec<ToolExecutionStatus>>,
}

impl ExecutionLedger for MemLedger {
    async fn create_execution(&self, execution: &ToolExecution) -> Result<(), RepositoryError> {
        self.history.lock().unwrap().push(execution.status);
        self.records
            .lock()
            .unwrap()
            .insert(execution.id.to_string(), execution.clone());
        Ok(())
    }

    async fn update_execution(&self, execution: &ToolExecution) -> Result<(), RepositoryError> {
        self.history.lock().unwrap().push(execution.status);
        self.records
            .lock()
            .unwrap()
            .insert(execution.id.to_string(), execution.clone());
        Ok(())
    }

    async fn get_execution(
        &self,
        tenant_id: &TenantId,
        id: &ExecutionId,
    ) -> Result<Option<ToolExecution>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(id.as_str())
            .filter(|e| &e.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_executions(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        limit: u32,
    ) -> Result<Vec<ToolExecution>, RepositoryError> {
        let mut list: Vec<ToolExecution> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|e| &e.tenant_id == tenant_id && &e.tool_id == tool_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        list.truncate(limit as usize);
        Ok(list)
    }

    async fn usage_stats(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<ToolUsageStats, RepositoryError> {
        let records = self.records.lock().unwrap();
        let mut stats = ToolUsageStats::default();
        let mut durations = Vec::new();
        for e in records
            .values()
            .filter(|e| &e.tenant_id == tenant_id && &e.tool_id == tool_id)
        {
            stats.total_executions += 1;
            match e.status {
                ToolExecutionStatus::Success => stats.successful_executions += 1,
                ToolExecutionStatus::Failed => stats.failed_executions += 1,
                _ => stats.in_progress_executions += 1,
            }
            if let Some(d) = e.duration_ms {
                durations.push(d as f64);
            }
        }
        if !durations.is_empty() {
            stats.average_duration_ms = Some(durations.iter().sum::<f64>() / durations.len() as f64);
        }
        Ok(stats)
    }
}

/// Backend scripted per test.
pub enum Scripted {
    /// Echo `{"backend": <name>, "input": <input>}`.
    Echo(&'static str),
    Fail(fn() -> ToolError),
    /// Never finishes within any sane budget.
    Hang,
}

impl<C: Send + Sync> ToolBackend<C> for Scripted {
    fn execute<'a>(&'a self, _config: &'a C, input: &'a Value, _budget: Duration) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            match self {
                Scripted::Echo(name) => Ok(json!({"backend": name, "input": input})),
                Scripted::Fail(make) => Err(make()),
                Scripted::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Value::Null)
                }
            }
        })
    }
}

/// Echo backends for every type, each tagged with its type name.
pub fn echo_backends() -> ToolBackends {
    ToolBackends {
        http: Arc::new(Scripted::Echo("http")) as Arc<dyn ToolBackend<HttpToolConfig>>,
        database: Arc::new(Scripted::Echo("database")) as Arc<dyn ToolBackend<DatabaseToolConfig>>,
        email: Arc::new(Scripted::Echo("email")) as Arc<dyn ToolBackend<EmailToolConfig>>,
        custom: Arc::new(Scripted::Echo("custom")) as Arc<dyn ToolBackend<CustomToolConfig>>,
    }
}
