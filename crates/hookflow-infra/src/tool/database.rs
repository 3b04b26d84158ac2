//! DATABASE tool backend.
//!
//! Resolves the tool's connection identifier through the configured registry
//! (`[databases]` in `config.toml`), binds `:name` placeholders from the
//! input and returns the result rows as JSON objects. Pools are opened
//! lazily and cached per connection.

use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use hookflow_core::tool::backend::{BackendFuture, ToolBackend};
use hookflow_types::error::ToolError;
use hookflow_types::tool::DatabaseToolConfig;

const MAX_CONNECTIONS_PER_POOL: u32 = 4;

pub struct SqliteDatabaseBackend {
    /// Connection identifier -> SQLite URL.
    connections: HashMap<String, String>,
    pools: DashMap<String, SqlitePool>,
}

impl SqliteDatabaseBackend {
    pub fn new(connections: HashMap<String, String>) -> Self {
        Self {
            connections,
            pools: DashMap::new(),
        }
    }

    async fn pool(&self, connection: &str) -> Result<SqlitePool, ToolError> {
        if let Some(pool) = self.pools.get(connection) {
            return Ok(pool.clone());
        }

        let url = self
            .connections
            .get(connection)
            .ok_or_else(|| ToolError::InvalidConfig(format!("unknown connection '{connection}'")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS_PER_POOL)
            .connect(url)
            .await
            .map_err(|e| ToolError::Internal(format!("failed to open connection '{connection}': {e}")))?;

        tracing::debug!(connection, "opened DATABASE tool pool");
        // A concurrent opener may have won the race; keep whichever landed first.
        Ok(self.pools.entry(connection.to_string()).or_insert(pool).clone())
    }

    async fn run(&self, config: &DatabaseToolConfig, input: &Value) -> Result<Value, ToolError> {
        let (sql, names) = bind_named_params(&config.query);
        let pool = self.pool(&config.connection).await?;

        let mut query = sqlx::query(&sql);
        for name in &names {
            let value = input
                .get(name)
                .ok_or_else(|| ToolError::Validation(format!("missing query parameter '{name}'")))?;
            query = match value {
                Value::Null => query.bind(Option::<String>::None),
                Value::Bool(b) => query.bind(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => query.bind(i),
                    None => query.bind(n.as_f64().unwrap_or_default()),
                },
                Value::String(s) => query.bind(s.clone()),
                other => query.bind(other.to_string()),
            };
        }

        let rows = query
            .fetch_all(&pool)
            .await
            .map_err(|e| ToolError::Internal(format!("query failed: {e}")))?;

        Ok(Value::Array(rows.iter().map(row_to_json).collect()))
    }
}

impl ToolBackend<DatabaseToolConfig> for SqliteDatabaseBackend {
    fn execute<'a>(
        &'a self,
        config: &'a DatabaseToolConfig,
        input: &'a Value,
        budget: Duration,
    ) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            match tokio::time::timeout(budget, self.run(config, input)).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout(budget)),
            }
        })
    }
}

/// Rewrite `:name` placeholders to positional `?` parameters.
///
/// Returns the rewritten SQL and the parameter names in order of appearance.
/// Placeholders inside single-quoted literals and `::` casts are left alone.
pub fn bind_named_params(query: &str) -> (String, Vec<String>) {
    let mut sql = String::with_capacity(query.len());
    let mut names = Vec::new();
    let mut chars = query.chars().peekable();
    let mut in_literal = false;

    while let Some(c) = chars.next() {
        if c == '\'' {
            in_literal = !in_literal;
            sql.push(c);
            continue;
        }
        if in_literal || c != ':' {
            sql.push(c);
            continue;
        }
        if chars.peek() == Some(&':') {
            sql.push(c);
            if let Some(next) = chars.next() {
                sql.push(next);
            }
            continue;
        }
        if !chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') {
            sql.push(c);
            continue;
        }

        let mut name = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_alphanumeric() || n == '_' {
                name.push(n);
                chars.next();
            } else {
                break;
            }
        }
        names.push(name);
        sql.push('?');
    }

    (sql, names)
}

fn row_to_json(row: &SqliteRow) -> Value {
    let mut object = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), column_value(row, index));
    }
    Value::Object(object)
}

fn column_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).map(Value::from).unwrap_or(Value::Null),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(index).map(Value::from).unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
