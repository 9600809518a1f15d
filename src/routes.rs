//! HTTP routing
//!
//! One axum router carries all three surfaces: REST (`/tools`,
//! `/call-tool`, `/health`), single-shot MCP (`/mcp`) and the SSE session
//! transport (`/sse`, `/messages`).

use crate::handlers;
use crate::mcp::{self, SseEndpoint};
use crate::AppState;
use axum::{
    http::{header, HeaderName},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// CORS for every surface
///
/// Answers every preflight (`OPTIONS`) before routing. Authorization and
/// the MCP headers must be listed explicitly; they are not covered by a
/// wildcard.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CACHE_CONTROL,
            header::USER_AGENT,
            HeaderName::from_static("mcp-protocol-version"),
            HeaderName::from_static("mcp-session-id"),
        ])
        .max_age(Duration::from_secs(3600))
}

pub fn build_router(state: AppState, sse: &SseEndpoint) -> Router {
    let rest_routes = Router::new()
        .route("/tools", get(handlers::list_tools_handler))
        .route("/call-tool", post(handlers::call_tool_handler))
        .route("/health", get(handlers::health_handler));

    let http_routes = Router::new().route("/mcp", post(mcp::handle_streamable_http));

    Router::new()
        .merge(rest_routes)
        .merge(http_routes)
        .with_state(state)
        .merge(sse.router())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
