use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SYSTEM: &str = "jenkins";

/// Process settings read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    /// Which external system this process fronts (`jenkins`, `jira`, ...)
    pub system: String,
    /// `TOOLGATE_CONFIG`, when set
    pub config_override: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST")
            .unwrap_or_else(|_| DEFAULT_HOST.to_string())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidSetting {
                name: "HOST",
                message: e.to_string(),
            })?;

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidSetting {
                    name: "PORT",
                    message: format!("'{}': {}", value, e),
                })?,
            Err(_) => DEFAULT_PORT,
        };

        let system = env::var("TOOLGATE_SYSTEM")
            .map(|s| s.trim().to_ascii_lowercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM.to_string());

        let config_override = env::var("TOOLGATE_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Settings {
            host,
            port,
            system,
            config_override,
        })
    }

    /// Instance file for the resolved plugin name
    ///
    /// Aliases such as `sonar` resolve to the plugin's canonical name, so
    /// the default file is the same one the CLI reads.
    pub fn config_path(&self, plugin_name: &str) -> PathBuf {
        self.config_override
            .clone()
            .unwrap_or_else(|| default_config_path(plugin_name))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

/// `<system>-config.json` in the working directory
pub fn default_config_path(system: &str) -> PathBuf {
    PathBuf::from(format!("{}-config.json", system))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["HOST", "PORT", "TOOLGATE_SYSTEM", "TOOLGATE_CONFIG"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let settings = Settings::from_env().expect("defaults are valid");
        assert_eq!(settings.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(settings.system, "jenkins");
        assert_eq!(settings.config_path("jenkins"), PathBuf::from("jenkins-config.json"));
    }

    #[test]
    #[serial]
    fn test_config_path_follows_system() {
        clear_env();
        env::set_var("TOOLGATE_SYSTEM", "Jira");

        let settings = Settings::from_env().expect("valid settings");
        assert_eq!(settings.system, "jira");
        assert_eq!(settings.config_path("jira"), PathBuf::from("jira-config.json"));

        env::set_var("TOOLGATE_CONFIG", "/etc/toolgate/instances.json");
        let settings = Settings::from_env().expect("valid settings");
        assert_eq!(
            settings.config_path("jira"),
            PathBuf::from("/etc/toolgate/instances.json")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_system_alias_uses_canonical_config_file() {
        clear_env();
        env::set_var("TOOLGATE_SYSTEM", "sonar");

        let settings = Settings::from_env().expect("valid settings");
        let plugin = crate::plugins::for_system(&settings.system).expect("known system");
        assert_eq!(
            settings.config_path(plugin.name()),
            PathBuf::from("sonarqube-config.json")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_reported() {
        clear_env();
        env::set_var("PORT", "eighty");

        let err = Settings::from_env().unwrap_err();
        assert!(err.to_string().contains("PORT"));

        clear_env();
    }
}
