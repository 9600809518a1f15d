//! MCP ServerHandler implementation for the gateway
//!
//! [`GatewayMcpService`] answers `tools/list` from the catalogue and
//! `tools/call` through the shared [`Dispatcher`], both for SSE sessions
//! (as an rmcp [`ServerHandler`]) and for the single-shot `POST /mcp`
//! transport ([`GatewayMcpService::handle_request`]). Either way a tool
//! failure, including an unknown tool name, is an `isError` result and
//! never a JSON-RPC error.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  GatewayMcpService           │
//! │  - ServerHandler             │
//! │    (get_info, list_tools,    │
//! │     call_tool)               │
//! │  - handle_request()          │
//! └──────────────┬───────────────┘
//!                │
//!                └─> Dispatcher
//!                    ├─> Catalogue (tools/list)
//!                    └─> InstanceRegistry -> Backend (tools/call)
//! ```

use crate::error::McpServiceError;
use crate::models::JsonObject;
use crate::services::dispatcher::Dispatcher;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

#[derive(Clone)]
pub struct GatewayMcpService {
    dispatcher: Arc<Dispatcher>,
}

impl GatewayMcpService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Handles a single JSON-RPC message (single-shot HTTP transport)
    ///
    /// Returns `None` for notifications, which get no response.
    ///
    /// # Supported Methods
    ///
    /// * `initialize` - server info and capabilities
    /// * `ping` - empty result
    /// * `tools/list` - the catalogue
    /// * `tools/call` - one dispatch; tool failures stay inside the result
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let request_id = request.get("id").cloned();

        let method = match request.get("method").and_then(Value::as_str) {
            Some(method) => method,
            None => {
                let err = McpServiceError::InvalidRequest("Missing method field".to_string());
                return Some(error_response(request_id.unwrap_or(Value::Null), err));
            }
        };

        let Some(request_id) = request_id else {
            tracing::debug!(method = %method, "Ignoring JSON-RPC notification");
            return None;
        };

        let result = match method {
            "initialize" => {
                let info = self.get_info();
                Ok(json!({
                    "protocolVersion": info.protocol_version,
                    "capabilities": info.capabilities,
                    "serverInfo": info.server_info,
                    "instructions": info.instructions,
                }))
            }

            "ping" => Ok(json!({})),

            "tools/list" => Ok(json!({
                "tools": self.dispatcher.catalogue().mcp_tools(),
            })),

            "tools/call" => self.call_tool_params(request.get("params")).await,

            other => Err(McpServiceError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(res) => json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "result": res,
            }),
            Err(err) => error_response(request_id, err),
        })
    }

    async fn call_tool_params(&self, params: Option<&Value>) -> Result<Value, McpServiceError> {
        let params = params
            .and_then(Value::as_object)
            .ok_or_else(|| McpServiceError::InvalidParams("Missing params field".to_string()))?;

        let tool_name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpServiceError::InvalidParams("Missing tool name".to_string()))?;

        let arguments: Option<JsonObject> = match params.get("arguments") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                return Err(McpServiceError::InvalidParams(
                    "arguments must be an object".to_string(),
                ))
            }
        };

        let result = self.dispatcher.dispatch(tool_name, arguments).await;
        Ok(result.to_json())
    }
}

fn error_response(id: Value, err: McpServiceError) -> Value {
    let data: rmcp::ErrorData = err.into();
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": data.code.0,
            "message": data.message,
        },
    })
}

impl ServerHandler for GatewayMcpService {
    fn get_info(&self) -> ServerInfo {
        let registry = self.dispatcher.registry();
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: format!("toolgate-{}", registry.system()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(format!(
                "Tools for {} (instances: {}). Pass `instance` to pick one; the first is the default.",
                registry.system(),
                registry.names().join(", ")
            )),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        async { Ok(ListToolsResult::with_all_items(self.dispatcher.catalogue().mcp_tools())) }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let result = self.dispatcher.dispatch(&request.name, request.arguments).await;
            Ok(result.into_call_result())
        }
    }
}
