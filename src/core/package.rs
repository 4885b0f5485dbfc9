//! Package identity, versions and the stored package record

use crate::core::principal::{Principal, NAME_RE};
use crate::core::service::ServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum length of a version description
pub const MAX_DESCRIPTION_LEN: usize = 4096;

/// Maximum length of a content hash
pub const MAX_HASH_LEN: usize = 128;

/// A package name within an owner's namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    pub fn new(name: impl Into<String>) -> Result<Self, ServiceError> {
        let name = name.into();
        if !NAME_RE.is_match(&name) {
            return Err(ServiceError::Validation(format!(
                "Invalid package name '{}' (alphanumeric, '_', '-', '.'; max 64 characters)",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PackageName {
    type Error = ServiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        PackageName::new(s)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> String {
        name.0
    }
}

/// Content identifier of a single package version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageHash(String);

impl PackageHash {
    pub fn new(hash: impl Into<String>) -> Result<Self, ServiceError> {
        let hash = hash.into();
        if hash.is_empty() || hash.len() > MAX_HASH_LEN {
            return Err(ServiceError::Validation(format!(
                "Package hash must be 1-{} characters",
                MAX_HASH_LEN
            )));
        }
        if !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ServiceError::Validation(
                "Package hash must be alphanumeric".to_string(),
            ));
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PackageHash {
    type Error = ServiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        PackageHash::new(s)
    }
}

impl From<PackageHash> for String {
    fn from(hash: PackageHash) -> String {
        hash.0
    }
}

/// Fully qualified package identifier: `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub owner: Principal,
    pub name: PackageName,
}

impl PackageRef {
    /// Parse and validate an `(owner, name)` pair
    pub fn parse(owner: &str, name: &str) -> Result<Self, ServiceError> {
        let owner = Principal::new(owner)?;
        if owner.is_public() {
            return Err(ServiceError::Validation(
                "The public principal cannot own packages".to_string(),
            ));
        }
        Ok(Self {
            owner,
            name: PackageName::new(name)?,
        })
    }
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One pushed version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub hash: PackageHash,
    pub description: String,
    pub pushed_by: Principal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PackageVersion {
    pub fn new(hash: PackageHash, description: String, pushed_by: Principal) -> Self {
        let now = Utc::now();
        Self {
            hash,
            description,
            pushed_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What a push did to the stored package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// First push; the package now exists
    Created,
    /// A hash not seen before was added
    NewVersion,
    /// An existing hash was pushed again
    Updated,
}

impl PushOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushOutcome::Created => "created",
            PushOutcome::NewVersion => "new_version",
            PushOutcome::Updated => "updated",
        }
    }
}

/// Everything stored about a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub package: PackageRef,
    pub created_at: DateTime<Utc>,
    /// Ordered by most recent push; the last entry is the latest version
    pub versions: Vec<PackageVersion>,
    /// Explicit grants. Never contains the owner.
    pub grants: BTreeSet<Principal>,
}

impl PackageRecord {
    pub fn new(package: PackageRef, first: PackageVersion) -> Self {
        Self {
            package,
            created_at: first.created_at,
            versions: vec![first],
            grants: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Principal {
        &self.package.owner
    }

    pub fn latest(&self) -> Option<&PackageVersion> {
        self.versions.last()
    }

    pub fn version(&self, hash: &PackageHash) -> Option<&PackageVersion> {
        self.versions.iter().find(|v| &v.hash == hash)
    }

    pub fn is_public(&self) -> bool {
        self.grants.iter().any(Principal::is_public)
    }

    /// Principals with access: the owner plus every explicit grant, sorted
    pub fn access_list(&self) -> Vec<Principal> {
        let mut users: BTreeSet<Principal> = self.grants.clone();
        users.insert(self.package.owner.clone());
        users.into_iter().collect()
    }

    /// Record a push. Re-pushing a known hash refreshes it and makes it the latest.
    pub fn apply_push(&mut self, version: PackageVersion) -> PushOutcome {
        match self.versions.iter().position(|v| v.hash == version.hash) {
            Some(index) => {
                let mut existing = self.versions.remove(index);
                existing.description = version.description;
                existing.pushed_by = version.pushed_by;
                existing.updated_at = version.updated_at;
                self.versions.push(existing);
                PushOutcome::Updated
            }
            None => {
                self.versions.push(version);
                PushOutcome::NewVersion
            }
        }
    }

    /// Add a grant. Granting to the owner is a no-op.
    pub fn grant(&mut self, principal: Principal) -> bool {
        if &principal == self.owner() {
            return false;
        }
        self.grants.insert(principal)
    }
}
