//! REST surface of the protocol bridge
//!
//! Plain JSON over HTTP for clients that do not speak MCP. Tool calls go
//! through the same dispatcher as the MCP transports and return the same
//! `CallToolResult` envelope.

use crate::error::AppError;
use crate::models::JsonObject;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CallToolBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<JsonObject>,
}

/// GET /tools
pub async fn list_tools_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.dispatcher.catalogue().mcp_tools() }))
}

/// POST /call-tool
///
/// * `200 OK` with the result envelope, also when `isError` is true
/// * `400 Bad Request` when `name` is missing or empty
/// * `500 Internal Server Error` when the dispatch task dies
pub async fn call_tool_handler(
    State(state): State<AppState>,
    Json(body): Json<CallToolBody>,
) -> Result<impl IntoResponse, AppError> {
    let name = match body.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(AppError::BadRequest("Missing tool name".to_string())),
    };

    tracing::debug!(tool = %name, "REST tool call");

    let dispatcher = state.dispatcher.clone();
    let arguments = body.arguments;
    let result = tokio::spawn(async move { dispatcher.dispatch(&name, arguments).await })
        .await
        .map_err(|e| AppError::Internal(format!("dispatch task failed: {}", e)))?;

    Ok(Json(result.to_json()))
}

/// GET /health
///
/// Reports configuration only; no backend is contacted.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.dispatcher.registry();
    Json(json!({
        "status": "ok",
        "system": registry.system(),
        "instances": registry.names(),
    }))
}
