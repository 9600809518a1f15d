//! Instance configuration file
//!
//! The gateway serves one external system through any number of named
//! instances. They are described by a JSON document:
//!
//! ```json
//! {
//!   "instances": [
//!     { "name": "prod", "baseUrl": "https://jenkins.example.com",
//!       "username": "ci-bot", "apiToken": "..." },
//!     { "name": "jira", "baseUrl": "https://example.atlassian.net",
//!       "email": "bot@example.com", "apiToken": "...",
//!       "allowedProjectKey": "ABC" }
//!   ]
//! }
//! ```
//!
//! Loading is all-or-nothing: a single bad entry rejects the whole file.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancesConfig {
    pub instances: Vec<InstanceConfig>,
}

/// One named connection to a deployment of the external system
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    pub name: String,

    #[serde(alias = "node", alias = "url")]
    pub base_url: String,

    #[serde(default, alias = "email", alias = "user")]
    pub username: Option<String>,

    #[serde(alias = "token", alias = "password", alias = "appPassword")]
    api_token: String,

    #[serde(default)]
    pub allowed_project_key: Option<String>,

    /// Request timeout of the backend client, not of the gateway.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Authentication material derived from an instance entry
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, token: String },
    Bearer { token: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
            Credentials::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Instance-scoped policy narrowing which targets a call may touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    AllowedProjectKey(String),
}

impl Restriction {
    /// Project keys compare case-insensitively.
    pub fn permits(&self, target: &str) -> bool {
        match self {
            Restriction::AllowedProjectKey(key) => key.eq_ignore_ascii_case(target.trim()),
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::AllowedProjectKey(key) => write!(f, "allowed project '{}'", key),
        }
    }
}

impl InstanceConfig {
    pub fn credentials(&self) -> Credentials {
        match &self.username {
            Some(username) if !username.is_empty() => Credentials::Basic {
                username: username.clone(),
                token: self.api_token.clone(),
            },
            _ => Credentials::Bearer {
                token: self.api_token.clone(),
            },
        }
    }

    pub fn restriction(&self) -> Option<Restriction> {
        self.allowed_project_key
            .as_ref()
            .map(|key| Restriction::AllowedProjectKey(key.trim().to_string()))
    }
}

impl fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("allowed_project_key", &self.allowed_project_key)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl InstancesConfig {
    /// Parses and validates an in-memory document
    ///
    /// `source` names where the text came from and is repeated in every
    /// error message.
    pub fn from_json(source: &str, text: &str) -> Result<Self, ConfigError> {
        let config: InstancesConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse {
                path: source.to_string(),
                source: e,
            })?;

        config.validate().map_err(|message| ConfigError::Invalid {
            path: source.to_string(),
            message,
        })?;

        Ok(config)
    }

    /// Instance names in configuration order
    pub fn names(&self) -> Vec<&str> {
        self.instances.iter().map(|i| i.name.as_str()).collect()
    }

    fn validate(&self) -> Result<(), String> {
        if self.instances.is_empty() {
            return Err("at least one instance must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for (index, instance) in self.instances.iter().enumerate() {
            if instance.name.trim().is_empty() {
                return Err(format!("instances[{}].name must not be empty", index));
            }
            if !seen.insert(instance.name.as_str()) {
                return Err(format!(
                    "instances[{}].name: duplicate instance name '{}'",
                    index, instance.name
                ));
            }

            let url = reqwest::Url::parse(&instance.base_url).map_err(|e| {
                format!(
                    "instances[{}].baseUrl: '{}' is not a valid URL ({})",
                    index, instance.base_url, e
                )
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "instances[{}].baseUrl: unsupported scheme '{}'",
                    index,
                    url.scheme()
                ));
            }

            if instance.api_token.is_empty() {
                return Err(format!("instances[{}].apiToken must not be empty", index));
            }
            if let Some(key) = &instance.allowed_project_key {
                if key.trim().is_empty() {
                    return Err(format!(
                        "instances[{}].allowedProjectKey must not be empty",
                        index
                    ));
                }
            }
            if instance.timeout_secs == 0 {
                return Err(format!(
                    "instances[{}].timeoutSecs must be greater than zero",
                    index
                ));
            }
        }

        Ok(())
    }
}

/// Reads and validates the instance file at `path`
pub fn load_instances(path: impl AsRef<Path>) -> Result<InstancesConfig, ConfigError> {
    let path = path.as_ref();
    let source = path.display().to_string();

    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: source.clone(),
        source: e,
    })?;

    InstancesConfig::from_json(&source, &text)
}
