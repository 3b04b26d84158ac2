//! CLI command definitions for the `hookflow` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod tool;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Multi-tenant trigger ingestion and tool execution.
#[derive(Parser)]
#[command(name = "hookflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory holding config.toml and the database.
    #[arg(long, global = true, env = "HOOKFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Port to listen on (defaults to server.port from config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to server.host from config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Inspect and run tools.
    Tool {
        #[command(subcommand)]
        action: tool::ToolCommand,
    },
}

impl Cli {
    /// Default tracing directive for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "info,hookflow=debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_overrides() {
        let cli = Cli::try_parse_from(["hookflow", "serve", "--port", "9000", "--data-dir", "/tmp/hf"]).unwrap();
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(9000));
                assert!(host.is_none());
            }
            _ => panic!("expected serve"),
        }
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/hf")));
    }

    #[test]
    fn test_cli_parses_tool_run() {
        let cli = Cli::try_parse_from([
            "hookflow", "tool", "run", "t1", "tool-1", "--input", r#"{"n":1}"#, "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Tool {
                action: tool::ToolCommand::Run { tenant, tool_id, input },
            } => {
                assert_eq!(tenant, "t1");
                assert_eq!(tool_id, "tool-1");
                assert_eq!(input.as_deref(), Some(r#"{"n":1}"#));
            }
            _ => panic!("expected tool run"),
        }
    }

    #[test]
    fn test_verbosity_directive() {
        let cli = Cli::try_parse_from(["hookflow", "-vv", "tool", "list", "t1"]).unwrap();
        assert_eq!(cli.log_directive(), "trace");
    }
}
