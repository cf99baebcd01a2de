//! System configuration.
//!
//! A [`Configuration`] lists the services and operations to create at boot
//! and where the multi-store keeps its data. Files are read with
//! [`Configuration::load_from_file`]; the format follows the extension.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::traits::ComponentConfig;
use crate::kernel::constants::{DEFAULT_RETRY_INTERVAL_MS, DEFAULT_ROOT_STORE};
use crate::kernel::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// A service to create at boot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfiguration {
    #[serde(flatten)]
    pub component: ComponentConfig,
    /// Delay between start attempts, in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// An operation to create at boot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationConfiguration {
    #[serde(flatten)]
    pub component: ComponentConfig,
}

/// Where the multi-store keeps its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfiguration {
    /// Directory holding the store databases. Stores stay in memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// Name of the root store
    #[serde(default = "default_root_store")]
    pub root_store: String,
}

impl Default for StoreConfiguration {
    fn default() -> Self {
        Self {
            base_dir: None,
            root_store: default_root_store(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub services: Vec<ServiceConfiguration>,
    #[serde(default)]
    pub operations: Vec<OperationConfiguration>,
    #[serde(default)]
    pub store: StoreConfiguration,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub custom_config: Value,
}

impl Configuration {
    /// Read a configuration file, picking the format from its extension.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| Error::Config {
            path: path.to_path_buf(),
            message: "unsupported configuration file extension".to_string(),
        })?;
        let data = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: format!("failed to read configuration file: {}", e),
        })?;
        Self::parse(&data, format).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse configuration text in the given format.
    pub fn parse(data: &str, format: ConfigFormat) -> std::result::Result<Self, String> {
        match format {
            ConfigFormat::Json => serde_json::from_str(data)
                .map_err(|e| format!("Failed to deserialize from JSON: {}", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data)
                .map_err(|e| format!("Failed to deserialize from YAML: {}", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::from_str(data).map_err(|e| format!("Failed to deserialize from TOML: {}", e))
            }
        }
    }

    /// Render the configuration in the given format.
    pub fn serialize(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| Error::Other(format!("Failed to serialize to JSON: {}", e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| Error::Other(format!("Failed to serialize to YAML: {}", e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::Other(format!("Failed to serialize to TOML: {}", e))),
        }
    }
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

fn default_root_store() -> String {
    DEFAULT_ROOT_STORE.to_string()
}
