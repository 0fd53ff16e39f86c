use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use zone_inventory_storage::StorageConfig;

/// Environment variable naming the database
pub const DB_ENV: &str = "ZONE_INVENTORY_DB";

/// Used when nothing else names a database
pub const DEFAULT_DATABASE: &str = "inventory.db";

/// Where the database location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    File,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigSource::Cli => "--db",
            ConfigSource::Env => DB_ENV,
            ConfigSource::File => "config file",
            ConfigSource::Default => "default",
        };
        f.write_str(s)
    }
}

/// Resolved database location
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Plain path, `:memory:` or `sqlite://` URL
    pub location: String,
    pub source: ConfigSource,
}

/// Configuration file structure
#[derive(Debug, Deserialize)]
struct ConfigFile {
    database: Option<DatabaseSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    url: Option<String>,
    path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Load configuration with precedence: CLI > env > file > default
    pub fn load(config_path: Option<&PathBuf>, cli_db: Option<&str>) -> Result<Self> {
        if let Some(db) = cli_db {
            return Ok(Self::new(Self::expand_tilde(db), ConfigSource::Cli));
        }

        if let Some(db) = std::env::var(DB_ENV).ok().filter(|v| !v.is_empty()) {
            return Ok(Self::new(Self::expand_tilde(&db), ConfigSource::Env));
        }

        let file_config = Self::load_from_file(config_path)?;
        let from_file = file_config.and_then(|f| f.database).and_then(|d| {
            d.url
                .or_else(|| d.path.map(|p| p.to_string_lossy().into_owned()))
        });

        Ok(match from_file {
            Some(db) => Self::new(Self::expand_tilde(&db), ConfigSource::File),
            None => Self::new(DEFAULT_DATABASE.to_string(), ConfigSource::Default),
        })
    }

    fn new(location: String, source: ConfigSource) -> Self {
        Self { location, source }
    }

    /// Storage configuration for the resolved location
    pub fn storage_config(&self) -> Result<StorageConfig> {
        StorageConfig::from_url(&self.location)
            .with_context(|| format!("invalid database location {:?}", self.location))
    }

    fn load_from_file(path: Option<&PathBuf>) -> Result<Option<ConfigFile>> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => {
                let default = Self::default_config_path();
                if !default.exists() {
                    return Ok(None);
                }
                default
            }
        };

        if !config_path.exists() {
            if path.is_some() {
                // Explicitly specified path must exist
                return Err(anyhow!("Config file not found: {:?}", config_path));
            }
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {:?}", config_path))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse {:?}", config_path))?;
        Ok(Some(config))
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zone-inventory")
            .join("config.toml")
    }

    fn expand_tilde(location: &str) -> String {
        if let Some(stripped) = location.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped).to_string_lossy().into_owned();
            }
        }
        location.to_string()
    }
}
