//! In-memory storage backend

use crate::core::package::{PackageRecord, PackageRef, PackageVersion, PushOutcome};
use crate::core::principal::Principal;
use crate::core::service::ServiceError;
use crate::storage::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Volatile storage; everything is lost when the process exits
#[derive(Default)]
pub struct MemoryStorage {
    packages: RwLock<HashMap<PackageRef, PackageRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> Result<(), ServiceError> {
        debug!("Memory storage ready");
        Ok(())
    }

    async fn load(&self, package: &PackageRef) -> Result<Option<PackageRecord>, ServiceError> {
        Ok(self.packages.read().await.get(package).cloned())
    }

    async fn list_owned(&self, owner: &Principal) -> Result<Vec<PackageRecord>, ServiceError> {
        let packages = self.packages.read().await;
        let mut owned: Vec<PackageRecord> = packages
            .values()
            .filter(|record| record.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.package.name.cmp(&b.package.name));
        Ok(owned)
    }

    async fn push(
        &self,
        package: &PackageRef,
        version: &PackageVersion,
    ) -> Result<PushOutcome, ServiceError> {
        let mut packages = self.packages.write().await;
        match packages.get_mut(package) {
            Some(record) => Ok(record.apply_push(version.clone())),
            None => {
                packages.insert(
                    package.clone(),
                    PackageRecord::new(package.clone(), version.clone()),
                );
                Ok(PushOutcome::Created)
            }
        }
    }

    async fn grant(
        &self,
        package: &PackageRef,
        principal: &Principal,
    ) -> Result<bool, ServiceError> {
        let mut packages = self.packages.write().await;
        let record = packages
            .get_mut(package)
            .ok_or_else(|| ServiceError::PackageNotFound(package.to_string()))?;
        Ok(record.grant(principal.clone()))
    }

    async fn revoke(
        &self,
        package: &PackageRef,
        principal: &Principal,
    ) -> Result<bool, ServiceError> {
        let mut packages = self.packages.write().await;
        let record = packages
            .get_mut(package)
            .ok_or_else(|| ServiceError::PackageNotFound(package.to_string()))?;
        Ok(record.grants.remove(principal))
    }

    async fn delete(&self, package: &PackageRef) -> Result<bool, ServiceError> {
        Ok(self.packages.write().await.remove(package).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
