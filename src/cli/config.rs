//! Layered server settings
//!
//! Built-in defaults, then `pkgshare.toml` (or the file passed with
//! `--config`), then `PKGSHARE_*` environment variables. Command-line flags
//! are applied on top by the serve command.

use crate::cli::error::{CliError, CliResult};
use clap::ValueEnum;
use config::{Config, Environment, File};
use pkgshare::http::auth::{AuthMiddleware, AuthMode, JwtService};
use pkgshare::{ServiceConfig, StorageKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pkgshare.toml";

/// SQLite database file inside the data directory
pub const DATABASE_FILE: &str = "registry.db";

/// Storage backend choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageChoice {
    Memory,
    Sqlite,
}

/// Server settings after all layers are merged
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    pub host: String,
    pub port: u16,
    pub storage: StorageChoice,
    pub data_dir: PathBuf,
    pub auth_mode: AuthMode,
}

/// `<platform data dir>/pkgshare`, or `./pkgshare-data` when unknown
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("pkgshare"))
        .unwrap_or_else(|| PathBuf::from("pkgshare-data"))
}

impl RegistrySettings {
    /// Load settings. An explicit `config_file` must exist; the default one is optional.
    pub fn load(config_file: Option<&Path>) -> CliResult<Self> {
        let data_dir = default_data_dir();
        let file = match config_file {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080_i64)?
            .set_default("storage", "sqlite")?
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("auth_mode", "plain")?
            .add_source(file)
            .add_source(Environment::with_prefix("PKGSHARE").try_parsing(true))
            .build()?
            .try_deserialize::<RegistrySettings>()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn service_config(&self) -> ServiceConfig {
        let storage = match self.storage {
            StorageChoice::Memory => StorageKind::Memory,
            StorageChoice::Sqlite => StorageKind::Sqlite {
                path: self.data_dir.join(DATABASE_FILE),
            },
        };
        ServiceConfig { storage }
    }

    /// Principal resolution for the configured auth mode
    pub fn auth_middleware(&self) -> CliResult<AuthMiddleware> {
        match self.auth_mode {
            AuthMode::Plain => Ok(AuthMiddleware::plain()),
            AuthMode::Jwt => {
                let jwt_service = JwtService::from_env()
                    .map_err(|e| CliError::Config(format!("JWT settings: {}", e)))?;
                Ok(AuthMiddleware::jwt(Arc::new(jwt_service)))
            }
        }
    }
}
