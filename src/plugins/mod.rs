//! Vendor plugins
//!
//! The gateway engine is generic; everything vendor specific is bundled in
//! a [`Plugin`] record:
//!
//! - the tool descriptors the vendor offers,
//! - a connector building a [`Backend`] client from one instance entry,
//! - the capability table, which is the `match` inside the backend's
//!   [`Backend::invoke`].
//!
//! One process serves exactly one plugin, picked by name with [`builtin`].

pub mod jenkins;
pub mod jira;
pub mod sonarqube;

use crate::config::InstanceConfig;
use crate::error::ConfigError;
use crate::models::{JsonObject, ToolDescriptor};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Failures of a vendor backend call
///
/// The dispatcher reports the `Display` text of these to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Tool '{0}' is not supported by this backend")]
    Unsupported(String),

    #[error("{0}")]
    Client(String),
}

/// Client for one configured instance of a vendor system
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Backend: Send + Sync {
    /// Base address this client talks to
    fn base_url(&self) -> &str;

    /// Runs the capability registered under `tool`
    async fn invoke(&self, tool: &str, arguments: &JsonObject) -> Result<Value, BackendError>;
}

/// Builds a backend client for an instance
pub type Connector =
    Arc<dyn Fn(&InstanceConfig) -> Result<Arc<dyn Backend>, BackendError> + Send + Sync>;

#[derive(Clone)]
pub struct Plugin {
    name: String,
    tools: Vec<ToolDescriptor>,
    connector: Connector,
}

impl Plugin {
    pub fn new<F>(name: &str, tools: Vec<ToolDescriptor>, connector: F) -> Self
    where
        F: Fn(&InstanceConfig) -> Result<Arc<dyn Backend>, BackendError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            tools,
            connector: Arc::new(connector),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn connector(&self) -> Connector {
        Arc::clone(&self.connector)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("tools", &self.tools.len())
            .finish()
    }
}

/// Names accepted by [`builtin`]
pub const BUILTIN_SYSTEMS: &[&str] = &["jenkins", "jira", "sonarqube"];

/// Looks up one of the shipped plugins
pub fn builtin(name: &str) -> Option<Plugin> {
    match name.trim().to_ascii_lowercase().as_str() {
        "jenkins" => Some(jenkins::plugin()),
        "jira" => Some(jira::plugin()),
        "sonarqube" | "sonar" => Some(sonarqube::plugin()),
        _ => None,
    }
}

/// Like [`builtin`], failing with a startup error for unknown names
pub fn for_system(name: &str) -> Result<Plugin, ConfigError> {
    builtin(name).ok_or_else(|| ConfigError::UnknownSystem {
        name: name.to_string(),
        expected: BUILTIN_SYSTEMS.join(", "),
    })
}

/// Target extractor: the `projectKey` argument
pub fn project_key_argument(arguments: &JsonObject) -> Option<String> {
    arguments
        .get("projectKey")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

static ISSUE_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)-[0-9]+$").expect("valid issue key pattern"));

/// Target extractor: the project part of an `issueKey` such as `ABC-123`
///
/// Anything that is not a plain issue key yields no target, which a
/// restricted instance denies.
pub fn issue_key_project(arguments: &JsonObject) -> Option<String> {
    let key = arguments.get("issueKey").and_then(Value::as_str)?;
    ISSUE_KEY_PATTERN
        .captures(key.trim())
        .map(|captures| captures[1].to_string())
}

/// Reads a required string argument
///
/// The dispatcher validates arguments before a backend sees them, so a
/// failure here means a descriptor and its capability disagree.
pub(crate) fn required_str<'a>(arguments: &'a JsonObject, name: &str) -> Result<&'a str, BackendError> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Client(format!("missing argument '{}'", name)))
}

pub(crate) fn optional_str<'a>(arguments: &'a JsonObject, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub(crate) fn optional_u64(arguments: &JsonObject, name: &str) -> Option<u64> {
    arguments.get(name).and_then(Value::as_u64)
}
