//! Streamable HTTP transport handler for MCP
//!
//! A single-shot alternative to the SSE session transport: each POST
//! carries one JSON-RPC message and the response is returned in the same
//! HTTP exchange.
//!
//! # URL Structure
//!
//! - `POST /mcp` - Send JSON-RPC request, receive JSON response
//!
//! CORS preflight is answered by the router-wide CORS layer.
//!
//! # Usage
//!
//! ```http
//! POST /mcp
//! Content-Type: application/json
//!
//! {"jsonrpc":"2.0","id":1,"method":"tools/list"}
//! ```
//!
//! Response:
//! ```http
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! {"jsonrpc":"2.0","id":1,"result":{"tools":[...]}}
//! ```

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::AppState;

/// POST /mcp - Streamable HTTP transport
///
/// # Returns
///
/// * `200 OK` with the JSON-RPC response
/// * `202 Accepted` with an empty body for notifications
/// * `400`/`415`/`422` from the `Json` extractor for bodies that are not JSON
pub async fn handle_streamable_http(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> Response {
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("<none>");
    tracing::debug!(method = %method, "Received HTTP transport request");

    match state.mcp_service.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
