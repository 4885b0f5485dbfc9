//! Access-controlled package operations

use crate::core::access::{self, AccessDecision, Permission};
use crate::core::package::{
    PackageHash, PackageRecord, PackageRef, PackageVersion, PushOutcome, MAX_DESCRIPTION_LEN,
};
use crate::core::principal::Principal;
use crate::core::service::ServiceError;
use crate::storage::StorageBackend;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of a successful push
#[derive(Debug, Clone)]
pub struct PushResult {
    pub outcome: PushOutcome,
    pub record: PackageRecord,
}

/// Package registry enforcing the sharing rules on top of a storage backend.
///
/// Mutations are serialized by a write gate so that the permission check and
/// the write it guards see the same state.
pub struct PackageRegistry {
    storage: Arc<dyn StorageBackend>,
    write_gate: Mutex<()>,
}

fn require_caller(caller: Option<&Principal>) -> Result<&Principal, ServiceError> {
    caller.ok_or_else(|| {
        ServiceError::Unauthenticated("An Authorization header is required".to_string())
    })
}

fn enforce(
    record: &PackageRecord,
    caller: Option<&Principal>,
    permission: Permission,
) -> Result<(), ServiceError> {
    match access::check(record, caller, permission) {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied => {
            debug!(
                "Denied {} on {} to {}",
                permission,
                record.package,
                caller.map(Principal::as_str).unwrap_or("<anonymous>")
            );
            Err(ServiceError::Forbidden(format!(
                "Insufficient permissions to {} {}",
                permission, record.package
            )))
        }
        AccessDecision::Hidden => {
            debug!(
                "Hid {} from {}",
                record.package,
                caller.map(Principal::as_str).unwrap_or("<anonymous>")
            );
            Err(ServiceError::PackageNotFound(record.package.to_string()))
        }
    }
}

impl PackageRegistry {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage,
            write_gate: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    async fn load_existing(&self, package: &PackageRef) -> Result<PackageRecord, ServiceError> {
        self.storage
            .load(package)
            .await?
            .ok_or_else(|| ServiceError::PackageNotFound(package.to_string()))
    }

    /// Push a version. The first push creates the package and must come from
    /// its owner; later pushes need the owner or an explicit grant.
    pub async fn push(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
        hash: PackageHash,
        description: String,
    ) -> Result<PushResult, ServiceError> {
        let caller = require_caller(caller)?;
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ServiceError::Validation(format!(
                "Description exceeds {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        let _gate = self.write_gate.lock().await;

        match self.storage.load(package).await? {
            Some(record) => enforce(&record, Some(caller), Permission::Write)?,
            None if caller == &package.owner => {}
            None => {
                debug!("Denied creating {} to {}", package, caller);
                return Err(ServiceError::Forbidden(format!(
                    "Only {} can create packages under {}",
                    package.owner, package.owner
                )));
            }
        }

        let version = PackageVersion::new(hash, description, caller.clone());
        let outcome = self.storage.push(package, &version).await?;
        info!(
            "{} pushed {}@{} ({})",
            caller,
            package,
            version.hash,
            outcome.as_str()
        );

        let record = self.load_existing(package).await?;
        Ok(PushResult { outcome, record })
    }

    /// Read a package visible to `caller`
    pub async fn get(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
    ) -> Result<PackageRecord, ServiceError> {
        let record = self.load_existing(package).await?;
        enforce(&record, caller, Permission::Read)?;
        Ok(record)
    }

    /// Read one version of a package visible to `caller`
    pub async fn get_version(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
        hash: &PackageHash,
    ) -> Result<(PackageRecord, PackageVersion), ServiceError> {
        let record = self.get(caller, package).await?;
        let version = record
            .version(hash)
            .cloned()
            .ok_or_else(|| ServiceError::PackageNotFound(format!("{}@{}", package, hash)))?;
        Ok((record, version))
    }

    /// Principals with access; always includes the owner
    pub async fn list_access(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
    ) -> Result<Vec<Principal>, ServiceError> {
        Ok(self.get(caller, package).await?.access_list())
    }

    /// Share a package. Idempotent; only the owner may share.
    pub async fn grant(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
        principal: Principal,
    ) -> Result<Vec<Principal>, ServiceError> {
        let caller = require_caller(caller)?;
        let _gate = self.write_gate.lock().await;

        let record = self.load_existing(package).await?;
        enforce(&record, Some(caller), Permission::Administer)?;

        if self.storage.grant(package, &principal).await? {
            info!("{} granted {} access to {}", caller, principal, package);
        }

        Ok(self.load_existing(package).await?.access_list())
    }

    /// Unshare a package. Succeeds whether or not a grant existed; the owner's
    /// own access can never be revoked.
    pub async fn revoke(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
        principal: Principal,
    ) -> Result<Vec<Principal>, ServiceError> {
        let caller = require_caller(caller)?;
        let _gate = self.write_gate.lock().await;

        let record = self.load_existing(package).await?;
        enforce(&record, Some(caller), Permission::Administer)?;

        if &principal == record.owner() {
            return Err(ServiceError::Forbidden(format!(
                "Cannot revoke the owner's access to {}",
                package
            )));
        }

        if self.storage.revoke(package, &principal).await? {
            info!("{} revoked {}'s access to {}", caller, principal, package);
        }

        Ok(self.load_existing(package).await?.access_list())
    }

    /// Delete a package with all versions and grants. Owner only.
    pub async fn delete(
        &self,
        caller: Option<&Principal>,
        package: &PackageRef,
    ) -> Result<PackageRecord, ServiceError> {
        let caller = require_caller(caller)?;
        let _gate = self.write_gate.lock().await;

        let record = self.load_existing(package).await?;
        enforce(&record, Some(caller), Permission::Administer)?;

        self.storage.delete(package).await?;
        info!("{} deleted {}", caller, package);
        Ok(record)
    }

    /// Packages owned by `owner` that `caller` can read
    pub async fn list_packages(
        &self,
        caller: Option<&Principal>,
        owner: &Principal,
    ) -> Result<Vec<PackageRecord>, ServiceError> {
        let records = self.storage.list_owned(owner).await?;
        Ok(records
            .into_iter()
            .filter(|record| access::can_read(record, caller))
            .collect())
    }
}
