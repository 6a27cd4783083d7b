//! Configuration management for aarsync

pub mod schema;

pub use schema::{AndroidConfig, Config, GeneralConfig, ProjectConfig, ResolverConfig};

use crate::error::{AarsyncError, AarsyncResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the project-local configuration
pub const LOCAL_CONFIG_FILE: &str = ".aarsync.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aarsync")
            .join("config.toml")
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> AarsyncResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> AarsyncResult<Config> {
        let value = read_toml(path).await?;
        value.try_into().map_err(|e: toml::de::Error| AarsyncError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global configuration with a project-local file layered on top.
    ///
    /// Tables merge key by key; local scalars and arrays replace global ones.
    pub async fn load_merged(&self, local: Option<&Path>) -> AarsyncResult<Config> {
        let mut merged = if self.config_path.exists() {
            read_toml(&self.config_path).await?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        if let Some(local) = local {
            let overlay = read_toml(local).await?;
            merge_values(&mut merged, overlay);
        }

        let origin = local.unwrap_or(&self.config_path).to_path_buf();
        merged
            .try_into()
            .map_err(|e: toml::de::Error| AarsyncError::ConfigInvalid {
                path: origin,
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> AarsyncResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            AarsyncError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> AarsyncResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AarsyncError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_toml(path: &Path) -> AarsyncResult<toml::Value> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AarsyncError::io(format!("reading config from {}", path.display()), e))?;

    content
        .parse()
        .map_err(|e: toml::de::Error| AarsyncError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
