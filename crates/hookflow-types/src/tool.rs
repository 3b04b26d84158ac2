//! Tool domain types.
//!
//! A [`Tool`] is a tenant-scoped, typed executable unit. Its [`ToolConfig`]
//! is a closed variant record: each [`ToolType`] owns only the fields it
//! needs. Each invocation produces one [`ToolExecution`] record that moves
//! `PENDING -> RUNNING -> SUCCESS | FAILED` exactly once.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{ExecutionId, TenantId, ToolId};

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// A declared, typed, executable unit a workflow can invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub config: ToolConfig,
    /// Declared input schema (JSON-Schema subset). `null` accepts anything.
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Build an active tool from a creation request.
    pub fn new(tenant_id: TenantId, request: CreateToolRequest) -> Self {
        let now = Utc::now();
        Self {
            id: ToolId::generate(),
            tenant_id,
            name: request.name,
            description: request.description,
            tool_type: request.tool_type,
            config: request.config,
            input_schema: request.input_schema,
            output_schema: request.output_schema,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Non-empty name and non-empty tenant. The type is always set.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.tenant_id.is_empty()
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn update_config(&mut self, config: ToolConfig) {
        self.config = config;
        self.updated_at = Utc::now();
    }

    /// Apply the non-`None` fields of an update request.
    pub fn update_details(&mut self, update: UpdateToolRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(schema) = update.input_schema {
            self.input_schema = schema;
        }
        if let Some(schema) = update.output_schema {
            self.output_schema = schema;
        }
        self.updated_at = Utc::now();
    }
}

/// Request to create a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateToolRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub config: ToolConfig,
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Value,
}

/// Partial update of a tool's descriptive fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateToolRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
    #[serde(default)]
    pub output_schema: Option<Value>,
}

/// The backend a tool executes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolType {
    Http,
    Database,
    Email,
    Custom,
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolType::Http => write!(f, "HTTP"),
            ToolType::Database => write!(f, "DATABASE"),
            ToolType::Email => write!(f, "EMAIL"),
            ToolType::Custom => write!(f, "CUSTOM"),
        }
    }
}

impl FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HTTP" => Ok(ToolType::Http),
            "DATABASE" => Ok(ToolType::Database),
            "EMAIL" => Ok(ToolType::Email),
            "CUSTOM" => Ok(ToolType::Custom),
            other => Err(format!("invalid tool type: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool configuration (closed variant record)
// ---------------------------------------------------------------------------

/// Per-type tool configuration.
///
/// Internally tagged by `type`:
/// ```json
/// { "type": "HTTP", "method": "GET", "url": "https://example.com", "timeout": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolConfig {
    Http(HttpToolConfig),
    Database(DatabaseToolConfig),
    Email(EmailToolConfig),
    Custom(CustomToolConfig),
}

impl ToolConfig {
    /// The tool type this config variant belongs to.
    pub fn tool_type(&self) -> ToolType {
        match self {
            ToolConfig::Http(_) => ToolType::Http,
            ToolConfig::Database(_) => ToolType::Database,
            ToolConfig::Email(_) => ToolType::Email,
            ToolConfig::Custom(_) => ToolType::Custom,
        }
    }
}

/// Make an HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpToolConfig {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Body template; `{{key}}` placeholders are rendered from the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Run a query against a named connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseToolConfig {
    /// Connection identifier resolved through the configured registry.
    pub connection: String,
    /// SQL with `:name` placeholders bound from the input.
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Render a template and send it through an email provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailToolConfig {
    pub provider: String,
    /// Fixed recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Name of the input field holding the recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_field: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub template: String,
    /// Static template variables; input values take precedence.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
}

/// Execute user code under a runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomToolConfig {
    /// Runtime identifier (`bash`, `python`, `node`).
    pub runtime: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tool execution record
// ---------------------------------------------------------------------------

/// Lifecycle of a tool execution. Strictly one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl ToolExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolExecutionStatus::Success | ToolExecutionStatus::Failed)
    }
}

impl fmt::Display for ToolExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolExecutionStatus::Pending => write!(f, "PENDING"),
            ToolExecutionStatus::Running => write!(f, "RUNNING"),
            ToolExecutionStatus::Success => write!(f, "SUCCESS"),
            ToolExecutionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for ToolExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ToolExecutionStatus::Pending),
            "RUNNING" => Ok(ToolExecutionStatus::Running),
            "SUCCESS" => Ok(ToolExecutionStatus::Success),
            "FAILED" => Ok(ToolExecutionStatus::Failed),
            other => Err(format!("invalid execution status: '{other}'")),
        }
    }
}

/// One record per invocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    pub id: ExecutionId,
    pub tool_id: ToolId,
    pub tenant_id: TenantId,
    /// Snapshot of the input as supplied.
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub status: ToolExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// `ended_at - started_at` in milliseconds, set with `ended_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

impl ToolExecution {
    /// Create a `PENDING` execution for the given tool.
    pub fn new(tool: &Tool, input: Value) -> Self {
        Self {
            id: ExecutionId::generate(),
            tool_id: tool.id.clone(),
            tenant_id: tool.tenant_id.clone(),
            input,
            output: None,
            status: ToolExecutionStatus::Pending,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
        }
    }

    /// Move `PENDING -> RUNNING` and restamp `started_at`.
    ///
    /// Returns `false` (and changes nothing) from any other state.
    pub fn start(&mut self) -> bool {
        if self.status != ToolExecutionStatus::Pending {
            return false;
        }
        self.status = ToolExecutionStatus::Running;
        self.started_at = Utc::now();
        true
    }

    /// Record success.
    ///
    /// Precondition: call exactly once, and only before `fail`. A call on a
    /// completed execution returns `false` and leaves the record untouched.
    pub fn complete(&mut self, output: Value) -> bool {
        if self.is_completed() {
            self.log_ignored_transition(ToolExecutionStatus::Success);
            return false;
        }
        self.output = Some(output);
        self.finish(ToolExecutionStatus::Success);
        true
    }

    /// Record failure. Same precondition as [`ToolExecution::complete`].
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_completed() {
            self.log_ignored_transition(ToolExecutionStatus::Failed);
            return false;
        }
        self.error = Some(error.into());
        self.finish(ToolExecutionStatus::Failed);
        true
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    fn log_ignored_transition(&self, requested: ToolExecutionStatus) {
        tracing::warn!(
            execution_id = %self.id,
            status = %self.status,
            requested = %requested,
            "execution already completed, ignoring transition"
        );
    }

    fn finish(&mut self, status: ToolExecutionStatus) {
        let ended_at = Utc::now();
        self.status = status;
        self.duration_ms = Some((ended_at - self.started_at).num_milliseconds().max(0));
        self.ended_at = Some(ended_at);
    }
}

/// Aggregate usage for one tool, derived from its execution records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUsageStats {
    pub total_executions: i64,
    pub successful_executions: i64,
    pub failed_executions: i64,
    /// PENDING or RUNNING.
    pub in_progress_executions: i64,
    /// Mean duration over completed executions; `None` when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_duration_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
