//! SQLite workflow repository implementation.
//!
//! Only the fields the trigger path needs are stored. The trigger config is
//! kept as a JSON object and re-validated into its typed form on every load,
//! so a hand-edited row with a malformed config fails at lookup rather than
//! at credential check.

use serde_json::{Map, Value};
use sqlx::Row;

use hookflow_core::repository::workflow::WorkflowRepository;
use hookflow_types::error::RepositoryError;
use hookflow_types::id::{TenantId, WorkflowId};
use hookflow_types::workflow::{Trigger, Workflow};

use super::pool::DatabasePool;
use super::{format_datetime, from_json, parse_datetime, query_error, to_json};

/// SQLite-backed implementation of `WorkflowRepository`.
pub struct SqliteWorkflowRepository {
    pool: DatabasePool,
}

impl SqliteWorkflowRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct WorkflowRow {
    id: String,
    tenant_id: String,
    name: String,
    description: Option<String>,
    is_active: bool,
    trigger_type: String,
    trigger_config: String,
    created_at: String,
    updated_at: String,
}

impl WorkflowRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_active: row.try_get("is_active")?,
            trigger_type: row.try_get("trigger_type")?,
            trigger_config: row.try_get("trigger_config")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_workflow(self) -> Result<Workflow, RepositoryError> {
        let config: Map<String, Value> = from_json(&self.trigger_config, "trigger config")?;
        let trigger = Trigger::from_raw(&self.trigger_type, config)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Workflow {
            id: WorkflowId::from(self.id),
            tenant_id: TenantId::from(self.tenant_id),
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            trigger,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// WorkflowRepository impl
// ---------------------------------------------------------------------------

impl WorkflowRepository for SqliteWorkflowRepository {
    async fn find_workflow(
        &self,
        tenant_id: &TenantId,
        workflow_id: &WorkflowId,
    ) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ? AND tenant_id = ?")
            .bind(workflow_id.as_str())
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let r = WorkflowRow::from_row(&row).map_err(query_error)?;
                Ok(Some(r.into_workflow()?))
            }
            None => Ok(None),
        }
    }

    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), RepositoryError> {
        workflow
            .validate()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let trigger_config = to_json(&workflow.trigger.config)?;

        sqlx::query(
            r#"INSERT INTO workflows
               (id, tenant_id, name, description, is_active, trigger_type, trigger_config, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 is_active = excluded.is_active,
                 trigger_type = excluded.trigger_type,
                 trigger_config = excluded.trigger_config,
                 updated_at = excluded.updated_at
               WHERE workflows.tenant_id = excluded.tenant_id"#,
        )
        .bind(workflow.id.as_str())
        .bind(workflow.tenant_id.as_str())
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(workflow.is_active)
        .bind(workflow.trigger.trigger_type.to_string())
        .bind(&trigger_config)
        .bind(format_datetime(&workflow.created_at))
        .bind(format_datetime(&workflow.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_support::temp_pool;
    use hookflow_types::workflow::{TriggerConfig, TriggerType};

    fn workflow(tenant: &str) -> Workflow {
        Workflow::new(
            TenantId::from(tenant),
            "orders",
            Trigger::webhook(TriggerConfig {
                api_key: Some("secret".to_string()),
                include_fields: vec!["order_id".to_string()],
                ..Default::default()
            }),
        )
    }

    #[tokio::test]
    async fn test_save_and_find_workflow() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteWorkflowRepository::new(pool);
        let wf = workflow("t1");
        repo.save_workflow(&wf).await.unwrap();

        let found = repo.find_workflow(&wf.tenant_id, &wf.id).await.unwrap().unwrap();
        assert_eq!(found.name, "orders");
        assert_eq!(found.trigger.trigger_type, TriggerType::Webhook);
        assert_eq!(found.trigger.config.secret(), Some("secret"));
        assert_eq!(found.trigger.config.include_fields, vec!["order_id".to_string()]);
    }

    #[tokio::test]
    async fn test_find_is_tenant_scoped() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteWorkflowRepository::new(pool);
        let wf = workflow("t1");
        repo.save_workflow(&wf).await.unwrap();

        assert!(repo.find_workflow(&TenantId::from("t2"), &wf.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_updates_existing() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteWorkflowRepository::new(pool);
        let mut wf = workflow("t1");
        repo.save_workflow(&wf).await.unwrap();

        wf.is_active = false;
        repo.save_workflow(&wf).await.unwrap();
        let found = repo.find_workflow(&wf.tenant_id, &wf.id).await.unwrap().unwrap();
        assert!(!found.is_active);
    }

    #[tokio::test]
    async fn test_malformed_trigger_config_fails_on_load() {
        let (_dir, pool) = temp_pool().await;
        sqlx::query(
            "INSERT INTO workflows (id, tenant_id, name, is_active, trigger_type, trigger_config, created_at, updated_at)
             VALUES ('w1', 't1', 'bad', 1, 'webhook', '{\"api_key\": 42}', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool.writer)
        .await
        .unwrap();

        let repo = SqliteWorkflowRepository::new(pool);
        let err = repo
            .find_workflow(&TenantId::from("t1"), &WorkflowId::from("w1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }
}
