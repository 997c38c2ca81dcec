//! Application configuration
//!
//! Parsed once at startup from CLI flags with environment-variable
//! fallbacks, then passed by reference to everything that needs it.

use std::net::SocketAddr;

use clap::Parser;
use url::Url;

use crate::errors::{Result, ShortenerError};

/// Which storage backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
    Database,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "urlshort", about = "URL shortener service")]
pub struct AppConfig {
    /// Address and port to run the server on
    #[arg(short = 'a', long = "address", env = "SERVER_ADDRESS", default_value = "127.0.0.1:8080")]
    pub server_address: String,

    /// Base URL used to render short links
    #[arg(short = 'b', long = "base-url", env = "BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Path of the append-only file storage; selects the file backend
    #[arg(short = 'f', long = "file-storage-path", env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// Database connection string; selects the database backend
    #[arg(short = 'd', long = "database-dsn", env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    /// Secret used to sign identity tokens; random when unset
    #[arg(long = "jwt-secret", env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
}

impl AppConfig {
    /// Parse configuration from process arguments and the environment.
    pub fn from_args() -> Result<Self> {
        let config = AppConfig::parse();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an explicit argument list (used in tests).
    pub fn try_from_iter<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = AppConfig::try_parse_from(args)
            .map_err(|e| ShortenerError::validation(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.server_address
            .parse::<SocketAddr>()
            .map_err(|_| {
                ShortenerError::validation(format!(
                    "invalid address and port to run server: {}",
                    self.server_address
                ))
            })?;

        let base = Url::parse(&self.base_url)
            .map_err(|_| ShortenerError::validation(format!("invalid base URL: {}", self.base_url)))?;
        if base.scheme() != "http" && base.scheme() != "https" || !base.has_host() {
            return Err(ShortenerError::validation(format!(
                "invalid base URL: {}",
                self.base_url
            )));
        }

        Ok(())
    }

    /// The backend implied by the provided connection parameters.
    ///
    /// A database DSN wins over a file path, matching how the service has
    /// always been deployed.
    pub fn storage_kind(&self) -> StorageKind {
        if self.database_dsn.as_deref().is_some_and(|s| !s.is_empty()) {
            StorageKind::Database
        } else if self.file_storage_path.as_deref().is_some_and(|s| !s.is_empty()) {
            StorageKind::File
        } else {
            StorageKind::Memory
        }
    }

    /// Render the public short URL for a short ID.
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), short_id)
    }
}
