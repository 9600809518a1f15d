pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod plugins;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use crate::config::InstancesConfig;
use crate::error::ConfigError;
use crate::mcp::{GatewayMcpService, InstanceRegistry};
use crate::plugins::Plugin;
use crate::services::{Catalogue, Dispatcher};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub mcp_service: GatewayMcpService,
}

impl AppState {
    /// Assembles catalogue, registry and dispatcher for one plugin
    pub fn build(plugin: &Plugin, config: InstancesConfig) -> Result<Self, ConfigError> {
        let catalogue = Catalogue::new(plugin.tools().to_vec())?;
        let registry = InstanceRegistry::new(plugin, config)?;

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(catalogue), Arc::new(registry)));
        let mcp_service = GatewayMcpService::new(Arc::clone(&dispatcher));

        Ok(Self {
            dispatcher,
            mcp_service,
        })
    }
}
