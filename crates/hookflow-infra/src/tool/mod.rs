//! Tool backends.
//!
//! One adapter per tool type, wired together by [`build_backends`] from the
//! global configuration.

pub mod custom;
pub mod database;
pub mod email;
pub mod http;

use std::sync::Arc;

use hookflow_core::tool::backend::ToolBackends;
use hookflow_types::config::GlobalConfig;

use self::custom::ProcessCustomBackend;
use self::database::SqliteDatabaseBackend;
use self::email::build_email_backend;
use self::http::HttpToolBackend;

/// Build the production backend set.
///
/// HTTP tools and email providers share one connection-pooling client.
pub fn build_backends(config: &GlobalConfig) -> ToolBackends {
    let client = reqwest::Client::new();
    ToolBackends {
        http: Arc::new(HttpToolBackend::new(client.clone())),
        database: Arc::new(SqliteDatabaseBackend::new(config.databases.clone())),
        email: Arc::new(build_email_backend(&config.email, client)),
        custom: Arc::new(ProcessCustomBackend::new(config.tools.max_custom_output_bytes)),
    }
}
