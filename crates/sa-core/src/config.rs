//! Configuration types and loading
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! `SA__<SECTION>__<KEY>` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Attachment storage layout
    pub storage: StorageConfig,

    /// Upload limits enforced at intake
    pub uploads: UploadLimits,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub max_body_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base directory every stored path is relative to
    pub root: String,
    /// Permanent storage directory, relative to `root`
    pub uploads_dir: String,
    /// Staging directory for uploads not yet committed, relative to `root`
    pub staging_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadLimits {
    /// Per-file cap for the documents category
    pub max_document_size: u64,
    /// Per-file cap for photo and avatar slots
    pub max_photo_size: u64,
    /// Total files accepted in a single request
    pub max_files_per_request: usize,
    /// Documents accepted in a single request
    pub max_documents_per_request: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                request_timeout_seconds: 60,
                max_body_size_bytes: 110 * 1024 * 1024,
            },
            storage: StorageConfig {
                root: ".".to_string(),
                uploads_dir: "uploads".to_string(),
                staging_dir: "uploads/temp".to_string(),
            },
            uploads: UploadLimits::default(),
            logging: LoggingConfig {
                filter: None,
                json: false,
            },
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_document_size: 5 * 1024 * 1024, // 5MB
            max_photo_size: 2 * 1024 * 1024,    // 2MB
            max_files_per_request: 20,
            max_documents_per_request: 10,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config file error: {0}")]
    FileError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::FileError(err.to_string())
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let mut loaded: Self = builder
            .add_source(
                config::Environment::with_prefix("SA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.apply_platform_env()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Honour the conventional `HOST`/`PORT` variables set by hosting platforms
    fn apply_platform_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{}' is not a port number", port),
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let staging = Path::new(&self.storage.staging_dir);
        if !staging.starts_with(&self.storage.uploads_dir) {
            return Err(ConfigError::InvalidValue {
                key: "storage.staging_dir".to_string(),
                message: "must live under storage.uploads_dir".to_string(),
            });
        }
        if self.uploads.max_files_per_request == 0 {
            return Err(ConfigError::InvalidValue {
                key: "uploads.max_files_per_request".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Storage root as a path
    pub fn storage_root(&self) -> PathBuf {
        PathBuf::from(&self.storage.root)
    }

    /// Get the server address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::SocketAddr;
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(ip, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.staging_dir, "uploads/temp");
        assert_eq!(config.uploads.max_document_size, 5 * 1024 * 1024);
        assert_eq!(config.uploads.max_documents_per_request, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[storage]\nroot = \"/srv/school\"\n\n[uploads]\nmax_photo_size = 1024"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.storage.root, "/srv/school");
        assert_eq!(config.storage.uploads_dir, "uploads");
        assert_eq!(config.uploads.max_photo_size, 1024);
        assert_eq!(config.uploads.max_files_per_request, 20);
    }

    #[test]
    fn test_staging_must_be_under_uploads() {
        let mut config = AppConfig::default();
        config.storage.staging_dir = "tmp".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig::default();
        let addr = config.server_addr();
        assert_eq!(addr.port(), 5000);
    }
}
