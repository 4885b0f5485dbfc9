//! Main registry service implementation

use crate::core::registry::PackageRegistry;
use crate::storage::{MemoryStorage, SqliteStorage, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// Volatile in-process storage (tests, local experiments)
    Memory,

    /// SQLite database file
    Sqlite { path: PathBuf },
}

/// Main service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Where packages and grants are kept
    pub storage: StorageKind,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::Memory,
        }
    }
}

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication required: {0}")]
    Unauthenticated(String),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

/// Package registry service
///
/// Owns the storage backend and hands out the [`PackageRegistry`] that
/// enforces access control on top of it.
pub struct RegistryService {
    packages: PackageRegistry,
    initialized: bool,
}

impl RegistryService {
    /// Create a new service instance
    pub async fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        crate::init_logging();

        info!("Initializing pkgshare service v{}", crate::VERSION);

        let storage: Arc<dyn StorageBackend> = match &config.storage {
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
            StorageKind::Sqlite { path } => Arc::new(SqliteStorage::new(path.clone())),
        };

        Ok(Self {
            packages: PackageRegistry::new(storage),
            initialized: false,
        })
    }

    /// Initialize the service
    pub async fn initialize(&mut self) -> Result<(), ServiceError> {
        if self.initialized {
            return Ok(());
        }

        info!("Initializing {} storage backend", self.storage_name());
        self.packages.storage().initialize().await?;

        self.initialized = true;
        info!("Service initialized");
        Ok(())
    }

    /// Name of the active storage backend
    pub fn storage_name(&self) -> &'static str {
        self.packages.storage().name()
    }

    /// Access-controlled package operations
    pub fn packages(&self) -> &PackageRegistry {
        &self.packages
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
