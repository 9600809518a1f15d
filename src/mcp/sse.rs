//! MCP over SSE
//!
//! Wraps rmcp's [`SseServer`]. `GET /sse` opens a session and announces
//! `/messages?sessionId=<id>` in its `endpoint` event; posts to that URL
//! are routed to the session with the matching id, so any number of
//! clients can be connected at once. Each session is served by a clone of
//! the same [`GatewayMcpService`].

use crate::mcp::service::GatewayMcpService;
use axum::Router as AxumRouter;
use rmcp::transport::sse_server::{SseServer, SseServerConfig};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGE_PATH: &str = "/messages";

const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// The streaming surface
///
/// * `router` - axum routes for [`SSE_PATH`] and [`MESSAGE_PATH`]
/// * `ct` - cancels every open session on shutdown
pub struct SseEndpoint {
    router: AxumRouter,
    ct: CancellationToken,
}

impl SseEndpoint {
    pub fn new(service: GatewayMcpService) -> Self {
        let ct = CancellationToken::new();

        // The bind address is unused: the router is merged into the main
        // server instead of being served on its own.
        let config = SseServerConfig {
            bind: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            sse_path: SSE_PATH.to_string(),
            post_path: MESSAGE_PATH.to_string(),
            ct: ct.clone(),
            sse_keep_alive: Some(KEEP_ALIVE),
        };

        let (sse_server, router) = SseServer::new(config);
        sse_server.with_service(move || service.clone());

        Self { router, ct }
    }

    pub fn router(&self) -> AxumRouter {
        self.router.clone()
    }

    /// Cancelling the token closes every open session
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ct.clone()
    }
}
