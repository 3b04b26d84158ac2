//! Tool commands: list, stats, run.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::Value;

use hookflow_types::id::{TenantId, ToolId};
use hookflow_types::tool::ToolExecutionStatus;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum ToolCommand {
    /// List a tenant's tools.
    List {
        /// Tenant id.
        tenant: String,
    },

    /// Show execution statistics for a tool.
    Stats {
        /// Tenant id.
        tenant: String,
        /// Tool id.
        tool_id: String,
    },

    /// Execute a tool once and print the execution record.
    Run {
        /// Tenant id.
        tenant: String,
        /// Tool id.
        tool_id: String,
        /// Input as a JSON object.
        #[arg(long)]
        input: Option<String>,
    },
}

pub async fn handle(state: &AppState, action: ToolCommand, json: bool) -> Result<()> {
    match action {
        ToolCommand::List { tenant } => list(state, &TenantId::from(tenant), json).await,
        ToolCommand::Stats { tenant, tool_id } => {
            stats(state, &TenantId::from(tenant), &ToolId::from(tool_id), json).await
        }
        ToolCommand::Run { tenant, tool_id, input } => {
            run(state, &TenantId::from(tenant), &ToolId::from(tool_id), input.as_deref(), json).await
        }
    }
}

async fn list(state: &AppState, tenant: &TenantId, json: bool) -> Result<()> {
    let tools = state.tools.list_tools(tenant).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    if tools.is_empty() {
        println!("  No tools for tenant {}.", style(tenant).cyan());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);
    for tool in &tools {
        let status = if tool.is_active {
            Cell::new("● active").fg(Color::Green)
        } else {
            Cell::new("○ inactive").fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&tool.name).fg(Color::Cyan),
            Cell::new(tool.id.as_str()).fg(Color::DarkGrey),
            Cell::new(tool.tool_type.to_string()),
            status,
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn stats(state: &AppState, tenant: &TenantId, tool_id: &ToolId, json: bool) -> Result<()> {
    let tool = state.tools.get_tool(tenant, tool_id).await?;
    let stats = state.tools.usage_stats(tenant, tool_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Tool").dim(), style(&tool.name).cyan().bold());
    println!("  Total:       {}", style(stats.total_executions).bold());
    println!("  Successful:  {}", style(stats.successful_executions).green());
    println!("  Failed:      {}", style(stats.failed_executions).red());
    println!("  In progress: {}", stats.in_progress_executions);
    match stats.average_duration_ms {
        Some(avg) => println!("  Avg time:    {avg:.1} ms"),
        None => println!("  Avg time:    {}", style("n/a").dim()),
    }
    println!();
    Ok(())
}

async fn run(
    state: &AppState,
    tenant: &TenantId,
    tool_id: &ToolId,
    input: Option<&str>,
    json: bool,
) -> Result<()> {
    let input: Value = match input {
        Some(raw) => serde_json::from_str(raw).context("--input must be valid JSON")?,
        None => Value::Null,
    };

    let outcome = state.tools.execute_tool(tenant, tool_id, input).await?;
    let execution = &outcome.execution;

    if json {
        println!("{}", serde_json::to_string_pretty(execution)?);
    } else {
        let status = match execution.status {
            ToolExecutionStatus::Success => style(execution.status.to_string()).green(),
            _ => style(execution.status.to_string()).red(),
        };
        println!();
        println!("  Execution {} {}", style(&execution.id).dim(), status);
        if let Some(ms) = execution.duration_ms {
            println!("  Duration: {ms} ms");
        }
        if let Some(output) = &execution.output {
            println!("  Output:\n{}", serde_json::to_string_pretty(output)?);
        }
        if let Some(error) = &execution.error {
            println!("  Error: {}", style(error).red());
        }
        println!();
    }

    if let Some(error) = outcome.error {
        return Err(error.into());
    }
    Ok(())
}
