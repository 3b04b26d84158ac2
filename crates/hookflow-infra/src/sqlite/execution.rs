//! SQLite execution ledger.
//!
//! Implements `ExecutionLedger` from `hookflow-core`. Input and output
//! snapshots are stored as JSON text; usage statistics are aggregated in SQL.

use serde_json::Value;
use sqlx::Row;

use hookflow_core::repository::execution::ExecutionLedger;
use hookflow_types::error::RepositoryError;
use hookflow_types::id::{ExecutionId, TenantId, ToolId};
use hookflow_types::tool::{ToolExecution, ToolExecutionStatus, ToolUsageStats};

use super::pool::DatabasePool;
use super::{format_datetime, from_json, parse_datetime, query_error, to_json};

pub struct SqliteToolExecutionRepository {
    pool: DatabasePool,
}

impl SqliteToolExecutionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct ExecutionRow {
    id: String,
    tool_id: String,
    tenant_id: String,
    input: String,
    output: Option<String>,
    status: String,
    error: Option<String>,
    started_at: String,
    ended_at: Option<String>,
    duration_ms: Option<i64>,
}

impl ExecutionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tool_id: row.try_get("tool_id")?,
            tenant_id: row.try_get("tenant_id")?,
            input: row.try_get("input")?,
            output: row.try_get("output")?,
            status: row.try_get("status")?,
            error: row.try_get("error")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            duration_ms: row.try_get("duration_ms")?,
        })
    }

    fn into_execution(self) -> Result<ToolExecution, RepositoryError> {
        let status: ToolExecutionStatus = self.status.parse().map_err(RepositoryError::Query)?;
        let input: Value = from_json(&self.input, "execution input")?;
        let output = self
            .output
            .as_deref()
            .map(|s| from_json::<Value>(s, "execution output"))
            .transpose()?;
        let ended_at = self.ended_at.as_deref().map(parse_datetime).transpose()?;

        Ok(ToolExecution {
            id: ExecutionId::from(self.id),
            tool_id: ToolId::from(self.tool_id),
            tenant_id: TenantId::from(self.tenant_id),
            input,
            output,
            status,
            error: self.error,
            started_at: parse_datetime(&self.started_at)?,
            ended_at,
            duration_ms: self.duration_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// ExecutionLedger impl
// ---------------------------------------------------------------------------

impl ExecutionLedger for SqliteToolExecutionRepository {
    async fn create_execution(&self, execution: &ToolExecution) -> Result<(), RepositoryError> {
        let output = execution.output.as_ref().map(to_json).transpose()?;

        sqlx::query(
            r#"INSERT INTO tool_executions
               (id, tool_id, tenant_id, input, output, status, error, started_at, ended_at, duration_ms)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(execution.id.as_str())
        .bind(execution.tool_id.as_str())
        .bind(execution.tenant_id.as_str())
        .bind(to_json(&execution.input)?)
        .bind(&output)
        .bind(execution.status.to_string())
        .bind(&execution.error)
        .bind(format_datetime(&execution.started_at))
        .bind(execution.ended_at.as_ref().map(format_datetime))
        .bind(execution.duration_ms)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn update_execution(&self, execution: &ToolExecution) -> Result<(), RepositoryError> {
        let output = execution.output.as_ref().map(to_json).transpose()?;

        // A terminal row is never rewritten.
        let result = sqlx::query(
            r#"UPDATE tool_executions SET
                 output = ?, status = ?, error = ?, started_at = ?, ended_at = ?, duration_ms = ?
               WHERE id = ? AND tenant_id = ? AND status NOT IN ('SUCCESS', 'FAILED')"#,
        )
        .bind(&output)
        .bind(execution.status.to_string())
        .bind(&execution.error)
        .bind(format_datetime(&execution.started_at))
        .bind(execution.ended_at.as_ref().map(format_datetime))
        .bind(execution.duration_ms)
        .bind(execution.id.as_str())
        .bind(execution.tenant_id.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_execution(
        &self,
        tenant_id: &TenantId,
        id: &ExecutionId,
    ) -> Result<Option<ToolExecution>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM tool_executions WHERE id = ? AND tenant_id = ?")
            .bind(id.as_str())
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(ExecutionRow::from_row(&row).map_err(query_error)?.into_execution()?)),
            None => Ok(None),
        }
    }

    async fn list_executions(
        &self,
        tenant_id: &TenantId,
        tool_id: &ToolId,
        limit: u32,
    ) -> Result<Vec<ToolExecution>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM tool_executions WHERE tenant_id = ? AND tool_id = ? ORDER BY started_at DESC LIMIT ?",
        )
        .bind(tenant_id.as_str())
        .bind(tool_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| ExecutionRow::from_row(row).map_err(query_error)?.into_execution())
            .collect()
    }

    async fn usage_stats(&self, tenant_id: &TenantId, tool_id: &ToolId) -> Result<ToolUsageStats, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT
                 COUNT(*) AS total,
                 COALESCE(SUM(CASE WHEN status = 'SUCCESS' THEN 1 ELSE 0 END), 0) AS successful,
                 COALESCE(SUM(CASE WHEN status = 'FAILED' THEN 1 ELSE 0 END), 0) AS failed,
                 COALESCE(SUM(CASE WHEN status IN ('PENDING', 'RUNNING') THEN 1 ELSE 0 END), 0) AS in_progress,
                 AVG(CASE WHEN status IN ('SUCCESS', 'FAILED') THEN duration_ms END) AS avg_duration
               FROM tool_executions
               WHERE tenant_id = ? AND tool_id = ?"#,
        )
        .bind(tenant_id.as_str())
        .bind(tool_id.as_str())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        Ok(ToolUsageStats {
            total_executions: row.try_get("total").map_err(query_error)?,
            successful_executions: row.try_get("successful").map_err(query_error)?,
            failed_executions: row.try_get("failed").map_err(query_error)?,
            in_progress_executions: row.try_get("in_progress").map_err(query_error)?,
            average_duration_ms: row.try_get("avg_duration").map_err(query_error)?,
        })
    }
}
