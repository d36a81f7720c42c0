use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AacError, Result};
use crate::lifecycle::APP_USER;
use crate::storage::PROJECT_DIR;

const CONFIG_FILE: &str = "config.yaml";

pub const ENV_DATABASE: &str = "AACNEO_DATABASE";
pub const ENV_HOST: &str = "AACNEO_HOST";
pub const ENV_PORT: &str = "AACNEO_PORT";

/// Address the analytics server listens on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Project configuration, read from `.aacneo/config.yaml`.
///
/// Missing keys take their defaults. A relative `database_path` is resolved
/// against the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AacConfig {
    pub database_path: PathBuf,
    pub manufacturing_collection: String,
    pub autoclave_collection: String,
    pub created_by: String,
    pub server: ServerConfig,
}

impl Default for AacConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(PROJECT_DIR).join("plant.db"),
            manufacturing_collection: "ManufacturingProcess".to_string(),
            autoclave_collection: "AutoclaveProcess".to_string(),
            created_by: APP_USER.to_string(),
            server: ServerConfig::default(),
        }
    }
}

impl AacConfig {
    pub fn path(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    /// Load the project config, then apply environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        let config = if path.exists() {
            serde_yaml::from_str(&fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        config.with_overrides(|key| env::var(key).ok())
    }

    /// Write the default config for a fresh project.
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let path = Self::path(root);
        fs::write(&path, serde_yaml::to_string(&Self::default())?)?;
        Ok(path)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DATABASE) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .map_err(|_| AacError::Config(format!("{} is not a valid port: {}", ENV_PORT, port)))?;
        }
        Ok(self)
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        if self.database_path.is_absolute() {
            self.database_path.clone()
        } else {
            root.join(&self.database_path)
        }
    }
}
