//! SQLite tool repository implementation.
//!
//! The config variant is stored as tagged JSON; the `tool_type` column
//! duplicates its tag so listings can filter without parsing.

use serde_json::Value;
use sqlx::Row;

use hookflow_core::repository::tool::ToolRepository;
use hookflow_types::error::RepositoryError;
use hookflow_types::id::{TenantId, ToolId};
use hookflow_types::tool::{Tool, ToolConfig, ToolType};

use super::pool::DatabasePool;
use super::{format_datetime, from_json, parse_datetime, query_error, to_json};

pub struct SqliteToolRepository {
    pool: DatabasePool,
}

impl SqliteToolRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct ToolRow {
    id: String,
    tenant_id: String,
    name: String,
    description: String,
    tool_type: String,
    config: String,
    input_schema: String,
    output_schema: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl ToolRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            tool_type: row.try_get("tool_type")?,
            config: row.try_get("config")?,
            input_schema: row.try_get("input_schema")?,
            output_schema: row.try_get("output_schema")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_tool(self) -> Result<Tool, RepositoryError> {
        let tool_type: ToolType = self
            .tool_type
            .parse()
            .map_err(RepositoryError::Query)?;
        let config: ToolConfig = from_json(&self.config, "tool config")?;
        let input_schema: Value = from_json(&self.input_schema, "input schema")?;
        let output_schema: Value = from_json(&self.output_schema, "output schema")?;

        Ok(Tool {
            id: ToolId::from(self.id),
            tenant_id: TenantId::from(self.tenant_id),
            name: self.name,
            description: self.description,
            tool_type,
            config,
            input_schema,
            output_schema,
            is_active: self.is_active,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn rows_to_tools(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Tool>, RepositoryError> {
    rows.iter()
        .map(|row| ToolRow::from_row(row).map_err(query_error)?.into_tool())
        .collect()
}

fn write_error(e: sqlx::Error, name: &str) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict(name.to_string()),
        _ => query_error(e),
    }
}

// ---------------------------------------------------------------------------
// ToolRepository impl
// ---------------------------------------------------------------------------

impl ToolRepository for SqliteToolRepository {
    async fn create(&self, tool: &Tool) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO tools
               (id, tenant_id, name, description, tool_type, config, input_schema, output_schema,
                is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(tool.id.as_str())
        .bind(tool.tenant_id.as_str())
        .bind(&tool.name)
        .bind(&tool.description)
        .bind(tool.tool_type.to_string())
        .bind(to_json(&tool.config)?)
        .bind(to_json(&tool.input_schema)?)
        .bind(to_json(&tool.output_schema)?)
        .bind(tool.is_active)
        .bind(format_datetime(&tool.created_at))
        .bind(format_datetime(&tool.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, &tool.name))?;

        Ok(())
    }

    async fn get(&self, tenant_id: &TenantId, id: &ToolId) -> Result<Option<Tool>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM tools WHERE id = ? AND tenant_id = ?")
            .bind(id.as_str())
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(ToolRow::from_row(&row).map_err(query_error)?.into_tool()?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, tenant_id: &TenantId, name: &str) -> Result<Option<Tool>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM tools WHERE tenant_id = ? AND name = ?")
            .bind(tenant_id.as_str())
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(ToolRow::from_row(&row).map_err(query_error)?.into_tool()?)),
            None => Ok(None),
        }
    }

    async fn list(&self, tenant_id: &TenantId) -> Result<Vec<Tool>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM tools WHERE tenant_id = ? ORDER BY name ASC")
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows_to_tools(&rows)
    }

    async fn update(&self, tool: &Tool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE tools SET
                 name = ?, description = ?, config = ?, input_schema = ?, output_schema = ?,
                 is_active = ?, updated_at = ?
               WHERE id = ? AND tenant_id = ?"#,
        )
        .bind(&tool.name)
        .bind(&tool.description)
        .bind(to_json(&tool.config)?)
        .bind(to_json(&tool.input_schema)?)
        .bind(to_json(&tool.output_schema)?)
        .bind(tool.is_active)
        .bind(format_datetime(&tool.updated_at))
        .bind(tool.id.as_str())
        .bind(tool.tenant_id.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_error(e, &tool.name))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, tenant_id: &TenantId, id: &ToolId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tools WHERE id = ? AND tenant_id = ?")
            .bind(id.as_str())
            .bind(tenant_id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
