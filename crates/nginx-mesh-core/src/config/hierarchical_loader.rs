//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Adapter config file (~/.meshery/nginx-adapter.yaml, or an explicit path)
//! 3. Environment variables (MESHERY_SERVER, SERVICE_ADDR, NGINX_ADAPTER_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{normalize_server_address, RuntimeConfig};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Name of the adapter config file inside the config directory
const CONFIG_FILE_NAME: &str = "nginx-adapter.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,

    /// Explicit config file, replacing the one in `config_dir`
    config_file: Option<Utf8PathBuf>,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader rooted at ~/.meshery
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self {
            config_dir,
            config_file: None,
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir,
            config_file: None,
        }
    }

    /// Read the file layer from an explicit path; the file must exist
    pub fn with_config_file(mut self, path: Utf8PathBuf) -> Self {
        self.config_file = Some(path);
        self
    }

    /// Get the standard config directory (~/.meshery)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::invalid_config("Could not determine home directory"))?;

        let config_dir = Utf8PathBuf::from(home).join(".meshery");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        Ok(config_dir)
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                config = self.load_yaml_file::<RuntimeConfig>(path)?;
            }
            None => {
                let default_path = self.config_dir.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    config = self.load_yaml_file::<RuntimeConfig>(&default_path)?;
                }
            }
        }

        config = self.apply_env_overrides(config)?;
        config.server.meshery_address = normalize_server_address(&config.server.meshery_address);

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        let config: T = serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    ///
    /// Every section carries serde defaults, so a partial file only
    /// overrides the keys it names.
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        debug!("Loading adapter config from {}", path);
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("MESHERY_SERVER") {
            if !val.is_empty() {
                config.server.meshery_address = val;
            }
        }

        if let Ok(val) = env::var("SERVICE_ADDR") {
            if !val.is_empty() {
                config.server.service_address = val;
            }
        }

        if let Ok(val) = env::var("NGINX_ADAPTER_PORT") {
            config.server.port = val
                .parse()
                .map_err(|_| Error::invalid_config("NGINX_ADAPTER_PORT must be a valid port"))?;
        }

        if let Ok(val) = env::var("NGINX_ADAPTER_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("NGINX_ADAPTER_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("NGINX_ADAPTER_RELEASES_API_URL") {
            config.releases.api_url = val;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
