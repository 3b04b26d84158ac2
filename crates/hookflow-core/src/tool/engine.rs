//! The tool execution engine.
//!
//! `ToolEngine::execute` is the single entry point: it validates config and
//! input, creates a `PENDING` [`ToolExecution`], moves it to `RUNNING`, runs
//! exactly one backend selected by the config variant under a time budget,
//! and records exactly one terminal state. Every transition is persisted to
//! the [`ExecutionLedger`].
//!
//! Tenant ownership and the active flag are checked by the caller
//! ([`ToolService`](super::service::ToolService)), not here.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde_json::{Map, Value};

use hookflow_types::config::ToolsConfig;
use hookflow_types::error::ToolError;
use hookflow_types::tool::{Tool, ToolConfig, ToolExecution, ToolType};

use crate::repository::execution::ExecutionLedger;

use super::backend::ToolBackends;
use super::schema::validate_against_schema;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// HTTP methods an HTTP tool may use.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Runtimes a CUSTOM tool may declare.
pub const CUSTOM_RUNTIMES: &[&str] = &["bash", "python", "python3", "node"];

/// Extra time the engine allows a backend past its own budget before the
/// outer deadline fires.
const OUTER_DEADLINE_GRACE: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one invocation: the terminal record plus the typed error when
/// the execution failed.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub execution: ToolExecution,
    pub error: Option<ToolError>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into the output value or the execution error.
    pub fn into_result(self) -> Result<Value, ToolError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.execution.output.unwrap_or(Value::Null)),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ToolEngine<L: ExecutionLedger> {
    ledger: Arc<L>,
    backends: ToolBackends,
    budgets: ToolsConfig,
}

impl<L: ExecutionLedger> ToolEngine<L> {
    pub fn new(ledger: L, backends: ToolBackends, budgets: ToolsConfig) -> Self {
        Self {
            ledger: Arc::new(ledger),
            backends,
            budgets,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Check input against the tool's declared input schema.
    pub fn validate_input(&self, tool: &Tool, input: &Value) -> Result<(), ToolError> {
        validate_against_schema(&tool.input_schema, input).map_err(ToolError::Validation)
    }

    /// The time budget for one execution of this config.
    pub fn budget_for(&self, config: &ToolConfig) -> Duration {
        let secs = match config {
            ToolConfig::Http(http) => positive(http.timeout).unwrap_or(self.budgets.default_http_timeout_secs),
            ToolConfig::Database(db) => positive(db.timeout).unwrap_or(self.budgets.database_timeout_secs),
            ToolConfig::Email(_) => self.budgets.default_http_timeout_secs,
            ToolConfig::Custom(custom) => positive(custom.timeout_secs).unwrap_or(self.budgets.custom_timeout_secs),
        };
        Duration::from_secs(secs)
    }

    /// Execute a tool.
    ///
    /// Config and input errors are returned as `Err` before any record is
    /// created. Once the `PENDING` record exists, backend failures end up on
    /// the record and in [`ExecutionOutcome::error`]; `Err` is then only
    /// returned if the ledger cannot store the terminal state.
    pub async fn execute(&self, tool: &Tool, input: Value) -> Result<ExecutionOutcome, ToolError> {
        let input = if input.is_null() {
            Value::Object(Map::new())
        } else {
            input
        };

        validate_config(tool.tool_type, &tool.config)?;
        self.validate_input(tool, &input)?;

        let execution = ToolExecution::new(tool, input);
        self.ledger.create_execution(&execution).await?;

        // The run and its terminal write outlive a dropped caller.
        let run = ExecutionRun {
            ledger: Arc::clone(&self.ledger),
            backends: self.backends.clone(),
            config: tool.config.clone(),
            budget: self.budget_for(&tool.config),
            execution,
        };
        let execution_id = run.execution.id.clone();
        match tokio::spawn(run.drive()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(execution_id = %execution_id, error = %e, "execution task aborted");
                Err(ToolError::Internal(format!("execution task aborted: {e}")))
            }
        }
    }
}

/// Everything one execution needs after its `PENDING` record is stored.
struct ExecutionRun<L> {
    ledger: Arc<L>,
    backends: ToolBackends,
    config: ToolConfig,
    budget: Duration,
    execution: ToolExecution,
}

impl<L: ExecutionLedger> ExecutionRun<L> {
    async fn drive(self) -> Result<ExecutionOutcome, ToolError> {
        let ExecutionRun {
            ledger,
            backends,
            config,
            budget,
            mut execution,
        } = self;

        execution.start();
        if let Err(e) = ledger.update_execution(&execution).await {
            tracing::warn!(execution_id = %execution.id, error = %e, "failed to persist RUNNING state");
        }

        let started = Instant::now();
        let backend = AssertUnwindSafe(run_backend(&backends, &config, &execution.input, budget)).catch_unwind();
        let result = match tokio::time::timeout(budget + OUTER_DEADLINE_GRACE, backend).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ToolError::Internal("tool backend panicked".to_string())),
            Err(_) => Err(ToolError::Timeout(budget)),
        };

        let error = match result {
            Ok(output) => {
                execution.complete(output);
                None
            }
            Err(e) => {
                execution.fail(e.to_string());
                Some(e)
            }
        };

        if let Err(e) = ledger.update_execution(&execution).await {
            tracing::error!(execution_id = %execution.id, error = %e, "failed to persist terminal state");
            return Err(e.into());
        }

        tracing::info!(
            tenant_id = %execution.tenant_id,
            tool_id = %execution.tool_id,
            tool_type = %config.tool_type(),
            execution_id = %execution.id,
            status = %execution.status,
            duration_ms = started.elapsed().as_millis() as u64,
            "tool executed"
        );

        Ok(ExecutionOutcome { execution, error })
    }
}

async fn run_backend(
    backends: &ToolBackends,
    config: &ToolConfig,
    input: &Value,
    budget: Duration,
) -> Result<Value, ToolError> {
    match config {
        ToolConfig::Http(c) => backends.http.execute(c, input, budget).await,
        ToolConfig::Database(c) => backends.database.execute(c, input, budget).await,
        ToolConfig::Email(c) => backends.email.execute(c, input, budget).await,
        ToolConfig::Custom(c) => backends.custom.execute(c, input, budget).await,
    }
}

/// Check a config against the rules of the declared tool type.
pub fn validate_config(tool_type: ToolType, config: &ToolConfig) -> Result<(), ToolError> {
    if config.tool_type() != tool_type {
        return Err(ToolError::InvalidConfig(format!(
            "config is for {} but tool type is {tool_type}",
            config.tool_type()
        )));
    }

    match config {
        ToolConfig::Http(http) => {
            if http.url.trim().is_empty() || http.method.trim().is_empty() {
                return Err(invalid("HTTP tools require a url and a method"));
            }
            if !HTTP_METHODS.contains(&http.method.to_uppercase().as_str()) {
                return Err(invalid(format!("unsupported HTTP method '{}'", http.method)));
            }
            if !(http.url.starts_with("http://") || http.url.starts_with("https://")) {
                return Err(invalid("HTTP tool url must start with http:// or https://"));
            }
        }
        ToolConfig::Database(db) => {
            if db.query.trim().is_empty() || db.connection.trim().is_empty() {
                return Err(invalid("DATABASE tools require a query and a connection"));
            }
        }
        ToolConfig::Email(email) => {
            if email.provider.trim().is_empty() {
                return Err(invalid("EMAIL tools require a provider"));
            }
            let has_to = email.to.as_deref().is_some_and(|to| !to.trim().is_empty());
            let has_field = email.to_field.as_deref().is_some_and(|f| !f.trim().is_empty());
            if !has_to && !has_field {
                return Err(invalid("EMAIL tools require 'to' or 'to_field'"));
            }
        }
        ToolConfig::Custom(custom) => {
            if custom.runtime.trim().is_empty() || custom.code.trim().is_empty() {
                return Err(invalid("CUSTOM tools require a runtime and code"));
            }
            if !CUSTOM_RUNTIMES.contains(&custom.runtime.as_str()) {
                return Err(invalid(format!("unsupported runtime '{}'", custom.runtime)));
            }
        }
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> ToolError {
    ToolError::InvalidConfig(reason.into())
}

fn positive(secs: Option<u64>) -> Option<u64> {
    secs.filter(|s| *s > 0)
}
