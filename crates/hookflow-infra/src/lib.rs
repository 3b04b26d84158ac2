//! Infrastructure layer for Hookflow.
//!
//! Contains implementations of the ports defined in `hookflow-core`:
//! SQLite repositories and execution ledger, the HTTP, DATABASE and CUSTOM
//! tool backends, the HTTP email provider, and the `config.toml` loader.

pub mod config;
pub mod sqlite;
pub mod tool;
