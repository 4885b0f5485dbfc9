//! # pkgshare
//!
//! A package registry service with per-package access control, plus the
//! documentation build orchestrator used by the project.
//!
//! ## Architecture
//!
//! - Packages are identified by `(owner, name)` and carry hash-keyed versions
//! - Owners share packages with other principals or with the `public` sentinel
//! - Reads by callers without access answer not-found, never forbidden
//! - Storage is pluggable (in-memory or SQLite)
//! - An axum HTTP API exposes push, read, share, unshare and access listing
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pkgshare::{PackageHash, PackageRef, Principal, RegistryService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut service = RegistryService::new(ServiceConfig::default()).await?;
//!     service.initialize().await?;
//!
//!     let owner = Principal::caller("test_user")?;
//!     let package = PackageRef::parse("test_user", "pkgtoshare")?;
//!     service
//!         .packages()
//!         .push(Some(&owner), &package, PackageHash::new("123")?, String::new())
//!         .await?;
//!
//!     service
//!         .packages()
//!         .grant(Some(&owner), &package, Principal::new("anotheruser")?)
//!         .await?;
//!
//!     let users = service.packages().list_access(Some(&owner), &package).await?;
//!     println!("Shared with {:?}", users);
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod gendocs;
pub mod http;
pub mod storage;

pub use core::access::{AccessDecision, Permission};
pub use core::package::{
    PackageHash, PackageName, PackageRecord, PackageRef, PackageVersion, PushOutcome,
};
pub use core::principal::{Principal, PUBLIC};
pub use core::registry::{PackageRegistry, PushResult};
pub use core::service::{RegistryService, ServiceConfig, ServiceError, StorageKind};
pub use storage::{MemoryStorage, SqliteStorage, StorageBackend};

/// Version of the service layer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the service layer (safe for testing)
pub fn init_logging() {
    init_logging_with_default("pkgshare=warn");
}

/// Initialize logging with a fallback filter used when `RUST_LOG` is unset
pub fn init_logging_with_default(default_filter: &str) {
    // Only initialize logging once
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

        // This will fail silently if already initialized
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
