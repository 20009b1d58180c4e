//! Credential loading and first-time setup.
//!
//! Values come from a TOML file with a `[shipstation]` table, then
//! `SHIPSTATION_*` environment variables override whatever the file set.
//! A missing file is fine as long as the environment supplies both
//! credentials; `publish_template` writes a starter file for operators.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::Credentials;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "shipstation.toml";
pub const CONFIG_PATH_ENV: &str = "SHIPSTATION_CONFIG";
pub const API_KEY_ENV: &str = "SHIPSTATION_API_KEY";
pub const API_SECRET_ENV: &str = "SHIPSTATION_API_SECRET";
pub const BASE_URL_ENV: &str = "SHIPSTATION_BASE_URL";

/// Written by `publish_template`.
pub const TEMPLATE: &str = r#"# ShipStation API credentials.
#
# Find them in ShipStation under Settings > Account > API Settings.
# SHIPSTATION_API_KEY and SHIPSTATION_API_SECRET override these values.

[shipstation]
api_key = ""
api_secret = ""

# Uncomment to target a different origin (for example a local mock server).
# base_url = "https://ssapi.shipstation.com"
"#;

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    shipstation: ShipStationConfig,
}

/// Raw configuration values. Either credential may still be unset here;
/// `credentials` is where absence becomes an error.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShipStationConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: Option<String>,
}

impl ShipStationConfig {
    /// Load from `path`, or from `$SHIPSTATION_CONFIG`, or from
    /// `shipstation.toml`, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        let config = Self::from_file(&path)?.with_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a config file. A file that does not exist yields empty values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, relying on environment");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded ShipStation config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.shipstation)
    }

    /// Replace values with whatever `lookup` returns for the `SHIPSTATION_*`
    /// variable names. Empty lookups are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());
        if let Some(api_key) = lookup(API_KEY_ENV) {
            self.api_key = Some(api_key);
        }
        if let Some(api_secret) = lookup(API_SECRET_ENV) {
            self.api_secret = Some(api_secret);
        }
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = Some(base_url);
        }
        self
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::from_parts(self.api_key.clone(), self.api_secret.clone())
    }
}

impl fmt::Debug for ShipStationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipStationConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Write `TEMPLATE` to `path`. Refuses to clobber an existing file unless
/// `force` is set.
pub fn publish_template(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::TemplateExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, TEMPLATE).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "published config template");
    Ok(())
}
