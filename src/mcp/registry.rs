//! Instance registry
//!
//! Maps instance names to [`InstanceHandle`]s and decides which instance
//! serves a call that does not name one (the first configured instance).
//! The registry never talks to a backend: handles build their client on
//! first use and keep it for the lifetime of the process.

use crate::config::{InstanceConfig, InstancesConfig, Restriction};
use crate::plugins::{Backend, BackendError, Connector, Plugin};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{0}")]
    InstanceNotFound(String),

    #[error("No instances configured")]
    Empty,
}

/// One configured instance plus its lazily built backend client
pub struct InstanceHandle {
    config: InstanceConfig,
    restriction: Option<Restriction>,
    connector: Connector,
    client: OnceCell<Arc<dyn Backend>>,
}

impl InstanceHandle {
    fn new(config: InstanceConfig, connector: Connector) -> Self {
        Self {
            restriction: config.restriction(),
            config,
            connector,
            client: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    pub fn restriction(&self) -> Option<&Restriction> {
        self.restriction.as_ref()
    }

    /// Returns the backend client, building it on first use
    ///
    /// Concurrent first calls wait on the same initialization, so at most
    /// one client is ever built per instance. A failed build is not cached
    /// and the next call tries again.
    pub async fn client(&self) -> Result<Arc<dyn Backend>, BackendError> {
        let client = self
            .client
            .get_or_try_init(|| async {
                tracing::debug!(instance = %self.config.name, "Connecting backend client");
                (self.connector)(&self.config)
            })
            .await?;
        Ok(Arc::clone(client))
    }

    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }
}

/// Immutable registry of the configured instances
///
/// Built once at startup and shared behind an `Arc`; only the per-handle
/// client slots change afterwards.
pub struct InstanceRegistry {
    system: String,
    instances: Vec<Arc<InstanceHandle>>,
    by_name: HashMap<String, usize>,
}

pub type SharedRegistry = Arc<InstanceRegistry>;

impl InstanceRegistry {
    pub fn new(plugin: &Plugin, config: InstancesConfig) -> Result<Self, RegistryError> {
        if config.instances.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut instances = Vec::with_capacity(config.instances.len());
        let mut by_name = HashMap::new();
        for instance in config.instances {
            by_name.insert(instance.name.clone(), instances.len());
            instances.push(Arc::new(InstanceHandle::new(instance, plugin.connector())));
        }

        Ok(Self {
            system: plugin.name().to_string(),
            instances,
            by_name,
        })
    }

    /// Name of the system these instances belong to
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Looks up an instance by name, or the default when `name` is `None`
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<InstanceHandle>, RegistryError> {
        match name {
            Some(name) => self
                .by_name
                .get(name)
                .map(|&index| Arc::clone(&self.instances[index]))
                .ok_or_else(|| RegistryError::InstanceNotFound(name.to_string())),
            None => self
                .instances
                .first()
                .map(Arc::clone)
                .ok_or(RegistryError::Empty),
        }
    }

    /// Instance names in configuration order
    pub fn names(&self) -> Vec<String> {
        self.instances.iter().map(|i| i.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
