//! Storage configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing storage configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Unsupported URL scheme
    #[error("Unsupported URL scheme: {0}. Supported schemes: sqlite")]
    UnsupportedScheme(String),

    /// URL without a database path
    #[error("Missing database path in {0}")]
    MissingPath(String),
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// SQLite backend
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type
    pub backend: BackendType,

    /// Database file path, or `:memory:`
    pub connection_string: String,
}

impl StorageConfig {
    /// Parse a database location into storage configuration
    ///
    /// Accepted forms:
    /// - `sqlite://:memory:` - In-memory SQLite
    /// - `sqlite:///abs/path/inventory.db` - File-based SQLite (absolute path)
    /// - `sqlite://relative/inventory.db` - File-based SQLite (relative path)
    /// - `inventory.db`, `/var/lib/inventory.db` - Plain paths are SQLite files
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if a URL cannot be parsed.
    /// Returns `ConfigError::UnsupportedScheme` if the URL scheme is not supported.
    /// Returns `ConfigError::MissingPath` if a URL names no database.
    pub fn from_url(location: &str) -> Result<Self, ConfigError> {
        if location == ":memory:" {
            return Ok(Self::sqlite_memory());
        }

        // Anything without a scheme separator is a plain file path
        let Some((scheme, rest)) = location.split_once("://") else {
            return Ok(Self::sqlite_file(location));
        };

        if scheme != "sqlite" {
            // Run the URL parser first so garbage input reports as InvalidUrl
            let parsed = url::Url::parse(location)?;
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        match rest {
            ":memory:" | "/:memory:" => Ok(Self::sqlite_memory()),
            "" | "/" => Err(ConfigError::MissingPath(location.to_string())),
            path => Ok(Self::sqlite_file(path)),
        }
    }

    /// In-memory SQLite configuration for testing
    #[must_use]
    pub fn sqlite_memory() -> Self {
        Self {
            backend: BackendType::Sqlite,
            connection_string: ":memory:".to_string(),
        }
    }

    /// File-based SQLite configuration
    #[must_use]
    pub fn sqlite_file(path: &str) -> Self {
        Self {
            backend: BackendType::Sqlite,
            connection_string: path.to_string(),
        }
    }

    /// Whether this configuration points at an in-memory database
    pub fn is_memory(&self) -> bool {
        self.connection_string == ":memory:"
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::sqlite_file("inventory.db")
    }
}
