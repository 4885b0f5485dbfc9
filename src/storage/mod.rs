//! Storage backend implementations

use crate::core::package::{PackageRecord, PackageRef, PackageVersion, PushOutcome};
use crate::core::principal::Principal;
use crate::core::service::ServiceError;
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

// Re-export main types
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Persistence for package records and their grants.
///
/// Backends do not check permissions; that is the job of
/// [`crate::core::registry::PackageRegistry`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn initialize(&self) -> Result<(), ServiceError>;

    async fn load(&self, package: &PackageRef) -> Result<Option<PackageRecord>, ServiceError>;

    /// All packages owned by `owner`, sorted by name
    async fn list_owned(&self, owner: &Principal) -> Result<Vec<PackageRecord>, ServiceError>;

    /// Store a version, creating the package on first push
    async fn push(
        &self,
        package: &PackageRef,
        version: &PackageVersion,
    ) -> Result<PushOutcome, ServiceError>;

    /// Returns false when the grant already existed
    async fn grant(&self, package: &PackageRef, principal: &Principal)
        -> Result<bool, ServiceError>;

    /// Returns false when there was nothing to revoke
    async fn revoke(
        &self,
        package: &PackageRef,
        principal: &Principal,
    ) -> Result<bool, ServiceError>;

    /// Remove a package with its versions and grants
    async fn delete(&self, package: &PackageRef) -> Result<bool, ServiceError>;

    fn name(&self) -> &'static str;
}
