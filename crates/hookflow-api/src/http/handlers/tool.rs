//! Tool management and execution handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use hookflow_types::id::{ExecutionId, TenantId, ToolId};
use hookflow_types::tool::{CreateToolRequest, Tool, ToolConfig, ToolExecution, ToolUsageStats, UpdateToolRequest};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_EXECUTION_LIST_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ExecuteToolBody {
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Deserialize)]
pub struct ListExecutionsQuery {
    pub limit: Option<u32>,
}

fn ids(tenant_id: String, tool_id: String) -> (TenantId, ToolId) {
    (TenantId::from(tenant_id), ToolId::from(tool_id))
}

/// POST /api/v1/tenants/{tenant_id}/tools
pub async fn create_tool(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(request): Json<CreateToolRequest>,
) -> Result<ApiResponse<Tool>, AppError> {
    let start = Instant::now();
    let tool = state.tools.create_tool(&TenantId::from(tenant_id), request).await?;
    Ok(ApiResponse::success(tool, start).with_status(StatusCode::CREATED))
}

/// GET /api/v1/tenants/{tenant_id}/tools
pub async fn list_tools(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<ApiResponse<Vec<Tool>>, AppError> {
    let start = Instant::now();
    let tools = state.tools.list_tools(&TenantId::from(tenant_id)).await?;
    Ok(ApiResponse::success(tools, start))
}

/// GET /api/v1/tenants/{tenant_id}/tools/{tool_id}
pub async fn get_tool(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
) -> Result<ApiResponse<Tool>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let tool = state.tools.get_tool(&tenant_id, &tool_id).await?;
    Ok(ApiResponse::success(tool, start))
}

/// PATCH /api/v1/tenants/{tenant_id}/tools/{tool_id}
pub async fn update_tool(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
    Json(update): Json<UpdateToolRequest>,
) -> Result<ApiResponse<Tool>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let tool = state.tools.update_tool(&tenant_id, &tool_id, update).await?;
    Ok(ApiResponse::success(tool, start))
}

/// PUT /api/v1/tenants/{tenant_id}/tools/{tool_id}/config
pub async fn update_tool_config(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
    Json(config): Json<ToolConfig>,
) -> Result<ApiResponse<Tool>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let tool = state.tools.update_config(&tenant_id, &tool_id, config).await?;
    Ok(ApiResponse::success(tool, start))
}

/// POST /api/v1/tenants/{tenant_id}/tools/{tool_id}/activate
pub async fn activate_tool(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
) -> Result<ApiResponse<Tool>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let tool = state.tools.activate_tool(&tenant_id, &tool_id).await?;
    Ok(ApiResponse::success(tool, start))
}

/// POST /api/v1/tenants/{tenant_id}/tools/{tool_id}/deactivate
pub async fn deactivate_tool(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
) -> Result<ApiResponse<Tool>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let tool = state.tools.deactivate_tool(&tenant_id, &tool_id).await?;
    Ok(ApiResponse::success(tool, start))
}

/// DELETE /api/v1/tenants/{tenant_id}/tools/{tool_id}
pub async fn delete_tool(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    state.tools.delete_tool(&tenant_id, &tool_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tenants/{tenant_id}/tools/{tool_id}/execute
///
/// Runs synchronously and returns the terminal execution record. A failed
/// run maps its error kind to a status and carries the execution id.
pub async fn execute_tool(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
    Json(body): Json<ExecuteToolBody>,
) -> Result<ApiResponse<ToolExecution>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let outcome = state.tools.execute_tool(&tenant_id, &tool_id, body.input).await?;

    match outcome.error {
        None => Ok(ApiResponse::success(outcome.execution, start)),
        Some(error) => Err(AppError::Execution {
            execution_id: outcome.execution.id,
            error,
        }),
    }
}

/// GET /api/v1/tenants/{tenant_id}/tools/{tool_id}/executions?limit=N
pub async fn list_executions(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<ApiResponse<Vec<ToolExecution>>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let limit = query.limit.unwrap_or(DEFAULT_EXECUTION_LIST_LIMIT);
    let executions = state.tools.list_executions(&tenant_id, &tool_id, limit).await?;
    Ok(ApiResponse::success(executions, start))
}

/// GET /api/v1/tenants/{tenant_id}/tools/{tool_id}/stats
pub async fn tool_stats(
    State(state): State<AppState>,
    Path((tenant_id, tool_id)): Path<(String, String)>,
) -> Result<ApiResponse<ToolUsageStats>, AppError> {
    let start = Instant::now();
    let (tenant_id, tool_id) = ids(tenant_id, tool_id);
    let stats = state.tools.usage_stats(&tenant_id, &tool_id).await?;
    Ok(ApiResponse::success(stats, start))
}

/// GET /api/v1/tenants/{tenant_id}/executions/{execution_id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path((tenant_id, execution_id)): Path<(String, String)>,
) -> Result<ApiResponse<ToolExecution>, AppError> {
    let start = Instant::now();
    let execution = state
        .tools
        .get_execution(&TenantId::from(tenant_id), &ExecutionId::from(execution_id))
        .await?;
    Ok(ApiResponse::success(execution, start))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::http::handlers::test_support::{empty_request, json_request, send, test_state};
    use crate::state::AppState;

    fn bash_tool(name: &str, code: &str) -> Value {
        json!({
            "name": name,
            "type": "CUSTOM",
            "config": {"type": "CUSTOM", "runtime": "bash", "code": code},
            "input_schema": {
                "type": "object",
                "required": ["n"],
                "properties": {"n": {"type": "integer"}}
            }
        })
    }

    async fn create(state: &AppState, body: Value) -> Value {
        let (status, body) = send(state, json_request("POST", "/api/v1/tenants/t1/tools", body)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let (_dir, state) = test_state().await;
        let tool = create(&state, bash_tool("echo", "cat")).await;
        let id = tool["id"].as_str().unwrap().to_string();
        assert_eq!(tool["type"], "CUSTOM");
        assert_eq!(tool["is_active"], true);

        let (status, body) = send(&state, empty_request("GET", &format!("/api/v1/tenants/t1/tools/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "echo");
        assert!(body["meta"]["request_id"].is_string());

        let (_, body) = send(&state, empty_request("GET", "/api/v1/tenants/t1/tools")).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, _) = send(&state, empty_request("GET", &format!("/api/v1/tenants/t2/tools/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflict_and_bad_config() {
        let (_dir, state) = test_state().await;
        create(&state, bash_tool("echo", "cat")).await;

        let (status, body) = send(&state, json_request("POST", "/api/v1/tenants/t1/tools", bash_tool("echo", "cat"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let mismatched = json!({
            "name": "broken",
            "type": "HTTP",
            "config": {"type": "CUSTOM", "runtime": "bash", "code": "cat"}
        });
        let (status, body) = send(&state, json_request("POST", "/api/v1/tenants/t1/tools", mismatched)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_execute_records_success_and_stats() {
        let (_dir, state) = test_state().await;
        let tool = create(&state, bash_tool("echo", "cat")).await;
        let id = tool["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            json_request("POST", &format!("/api/v1/tenants/t1/tools/{id}/execute"), json!({"input": {"n": 3}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "SUCCESS");
        assert_eq!(body["data"]["output"], json!({"n": 3}));
        let execution_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            empty_request("GET", &format!("/api/v1/tenants/t1/executions/{execution_id}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "SUCCESS");

        let (_, body) = send(&state, empty_request("GET", &format!("/api/v1/tenants/t1/tools/{id}/executions"))).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = send(&state, empty_request("GET", &format!("/api/v1/tenants/t1/tools/{id}/stats"))).await;
        assert_eq!(body["data"]["total_executions"], 1);
        assert_eq!(body["data"]["successful_executions"], 1);
    }

    #[tokio::test]
    async fn test_execute_schema_violation_leaves_no_record() {
        let (_dir, state) = test_state().await;
        let tool = create(&state, bash_tool("echo", "cat")).await;
        let id = tool["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            json_request("POST", &format!("/api/v1/tenants/t1/tools/{id}/execute"), json!({"input": {"n": "three"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (_, body) = send(&state, empty_request("GET", &format!("/api/v1/tenants/t1/tools/{id}/stats"))).await;
        assert_eq!(body["data"]["total_executions"], 0);
    }

    #[tokio::test]
    async fn test_failed_execution_maps_status_and_keeps_record() {
        let (_dir, state) = test_state().await;
        let tool = create(&state, bash_tool("boom", "echo nope >&2; exit 2")).await;
        let id = tool["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            json_request("POST", &format!("/api/v1/tenants/t1/tools/{id}/execute"), json!({"input": {"n": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let execution_id = body["execution_id"].as_str().unwrap().to_string();

        let (_, body) = send(
            &state,
            empty_request("GET", &format!("/api/v1/tenants/t1/executions/{execution_id}")),
        )
        .await;
        assert_eq!(body["data"]["status"], "FAILED");
        assert!(body["data"]["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_inactive_tool_rejected_then_deleted() {
        let (_dir, state) = test_state().await;
        let tool = create(&state, bash_tool("echo", "cat")).await;
        let id = tool["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            empty_request("POST", &format!("/api/v1/tenants/t1/tools/{id}/deactivate")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_active"], false);

        let (status, body) = send(
            &state,
            json_request("POST", &format!("/api/v1/tenants/t1/tools/{id}/execute"), json!({"input": {"n": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "TOOL_INACTIVE");

        let (status, _) = send(&state, empty_request("DELETE", &format!("/api/v1/tenants/t1/tools/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, empty_request("DELETE", &format!("/api/v1/tenants/t1/tools/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_details_and_config() {
        let (_dir, state) = test_state().await;
        let tool = create(&state, bash_tool("echo", "cat")).await;
        let id = tool["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            json_request("PATCH", &format!("/api/v1/tenants/t1/tools/{id}"), json!({"description": "echoes input"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["description"], "echoes input");

        let (status, body) = send(
            &state,
            json_request(
                "PUT",
                &format!("/api/v1/tenants/t1/tools/{id}/config"),
                json!({"type": "CUSTOM", "runtime": "cobol", "code": "x"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_CONFIG");
    }
}
