//! MCP protocol surfaces
//!
//! - [`InstanceRegistry`] - configured instances and their lazy clients
//! - [`GatewayMcpService`] - MCP handler over the shared dispatcher
//! - [`SseEndpoint`] - session based transport (`/sse`, `/messages`)
//! - [`handle_streamable_http`] - single-shot JSON-RPC over `POST /mcp`

pub mod http_transport;
pub mod registry;
pub mod service;
pub mod sse;

pub use http_transport::handle_streamable_http;
pub use registry::{InstanceHandle, InstanceRegistry, RegistryError, SharedRegistry};
pub use service::GatewayMcpService;
pub use sse::SseEndpoint;
