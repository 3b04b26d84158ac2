//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over repository traits; AppState pins them to
//! the SQLite implementations.

use std::path::Path;
use std::sync::Arc;

use hookflow_core::ingest::dispatch::Dispatcher;
use hookflow_core::ingest::service::IngestService;
use hookflow_core::tool::backend::ToolBackends;
use hookflow_core::tool::engine::ToolEngine;
use hookflow_core::tool::service::ToolService;
use hookflow_core::trigger::{LoggingMessageProcessor, LoggingTriggerHandler};
use hookflow_infra::config::{database_url, load_global_config};
use hookflow_infra::sqlite::channel::SqliteChannelRepository;
use hookflow_infra::sqlite::execution::SqliteToolExecutionRepository;
use hookflow_infra::sqlite::pool::DatabasePool;
use hookflow_infra::sqlite::tool::SqliteToolRepository;
use hookflow_infra::sqlite::workflow::SqliteWorkflowRepository;
use hookflow_infra::tool::build_backends;
use hookflow_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteIngestService = IngestService<SqliteWorkflowRepository, SqliteChannelRepository>;

pub type ConcreteToolService = ToolService<SqliteToolRepository, SqliteToolExecutionRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<ConcreteIngestService>,
    pub tools: Arc<ConcreteToolService>,
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<GlobalConfig>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let config = load_global_config(data_dir).await;
        let db_pool = DatabasePool::new(&database_url(data_dir)).await?;
        let backends = build_backends(&config);

        Ok(Self::build(db_pool, config, backends))
    }

    /// Wire services over an open pool with the given tool backends.
    pub fn build(db_pool: DatabasePool, config: GlobalConfig, backends: ToolBackends) -> Self {
        let dispatcher = Arc::new(Dispatcher::new());

        let ingest = IngestService::new(
            SqliteWorkflowRepository::new(db_pool.clone()),
            SqliteChannelRepository::new(db_pool.clone()),
            Arc::clone(&dispatcher),
            Arc::new(LoggingTriggerHandler),
            Arc::new(LoggingMessageProcessor),
        );

        let engine = ToolEngine::new(
            SqliteToolExecutionRepository::new(db_pool.clone()),
            backends,
            config.tools.clone(),
        );
        let tools = ToolService::new(SqliteToolRepository::new(db_pool.clone()), engine);

        Self {
            ingest: Arc::new(ingest),
            tools: Arc::new(tools),
            dispatcher,
            config: Arc::new(config),
            db_pool,
        }
    }
}
