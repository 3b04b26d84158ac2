//! Axum router configuration with middleware.
//!
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let webhook_routes = Router::new()
        .route(
            "/{tenant_id}/{workflow_id}",
            post(handlers::webhook::receive_webhook).get(handlers::webhook::verify_webhook),
        )
        .route(
            "/{tenant_id}/{workflow_id}/test",
            post(handlers::webhook::dry_run_webhook),
        );

    let api_routes = Router::new()
        // Channel messages
        .route(
            "/tenants/{tenant_id}/channels/{channel_id}/messages",
            post(handlers::channel::receive_message),
        )
        // Tools
        .route(
            "/tenants/{tenant_id}/tools",
            post(handlers::tool::create_tool).get(handlers::tool::list_tools),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}",
            get(handlers::tool::get_tool)
                .patch(handlers::tool::update_tool)
                .delete(handlers::tool::delete_tool),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}/config",
            axum::routing::put(handlers::tool::update_tool_config),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}/activate",
            post(handlers::tool::activate_tool),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}/deactivate",
            post(handlers::tool::deactivate_tool),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}/execute",
            post(handlers::tool::execute_tool),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}/executions",
            get(handlers::tool::list_executions),
        )
        .route(
            "/tenants/{tenant_id}/tools/{tool_id}/stats",
            get(handlers::tool::tool_stats),
        )
        .route(
            "/tenants/{tenant_id}/executions/{execution_id}",
            get(handlers::tool::get_execution),
        );

    Router::new()
        .nest("/webhooks", webhook_routes)
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
