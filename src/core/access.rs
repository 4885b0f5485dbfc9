//! Per-package access control
//!
//! Decides what a caller may do with a package. Denials are split into two
//! kinds so the registry never confirms that a package exists to someone who
//! cannot read it:
//!
//! - [`AccessDecision::Hidden`]: the caller cannot see the package (reported as not-found)
//! - [`AccessDecision::Denied`]: the caller can see it but lacks the permission (forbidden)

use crate::core::package::PackageRecord;
use crate::core::principal::Principal;

/// Operations guarded by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read the package, its versions, log and access list
    Read,
    /// Push a new version
    Write,
    /// Grant, revoke, delete
    Administer,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Administer => "administer",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
    Hidden,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

/// Whether `caller` can see the package at all
pub fn can_read(record: &PackageRecord, caller: Option<&Principal>) -> bool {
    if record.is_public() {
        return true;
    }
    match caller {
        Some(caller) => caller == record.owner() || record.grants.contains(caller),
        None => false,
    }
}

/// Whether `caller` may push to the package. A public grant only confers read.
pub fn can_write(record: &PackageRecord, caller: Option<&Principal>) -> bool {
    match caller {
        Some(caller) if caller.is_public() => false,
        Some(caller) => caller == record.owner() || record.grants.contains(caller),
        None => false,
    }
}

pub fn is_owner(record: &PackageRecord, caller: Option<&Principal>) -> bool {
    caller.is_some_and(|caller| caller == record.owner())
}

/// Evaluate `permission` for `caller` against `record`.
///
/// Writes are answered with [`AccessDecision::Denied`] even when the caller
/// cannot read the package: a push names the package explicitly, and a
/// forbidden push must not silently create a package in someone else's
/// namespace.
pub fn check(
    record: &PackageRecord,
    caller: Option<&Principal>,
    permission: Permission,
) -> AccessDecision {
    let allowed = match permission {
        Permission::Read => can_read(record, caller),
        Permission::Write => can_write(record, caller),
        Permission::Administer => is_owner(record, caller),
    };

    if allowed {
        AccessDecision::Allowed
    } else if permission == Permission::Write || can_read(record, caller) {
        AccessDecision::Denied
    } else {
        AccessDecision::Hidden
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::package::{PackageHash, PackageRef, PackageVersion};

    fn principal(name: &str) -> Principal {
        Principal::new(name).unwrap()
    }

    fn record() -> PackageRecord {
        PackageRecord::new(
            PackageRef::parse("test_user", "pkgtoshare").unwrap(),
            PackageVersion::new(
                PackageHash::new("123").unwrap(),
                String::new(),
                principal("test_user"),
            ),
        )
    }

    #[test]
    fn test_owner_has_every_permission() {
        let record = record();
        let owner = principal("test_user");
        for permission in [Permission::Read, Permission::Write, Permission::Administer] {
            assert_eq!(
                check(&record, Some(&owner), permission),
                AccessDecision::Allowed
            );
        }
    }

    #[test]
    fn test_private_package_is_hidden_from_strangers() {
        let record = record();
        let stranger = principal("notanotheruser");
        assert_eq!(
            check(&record, Some(&stranger), Permission::Read),
            AccessDecision::Hidden
        );
        assert_eq!(
            check(&record, None, Permission::Administer),
            AccessDecision::Hidden
        );
        assert_eq!(
            check(&record, Some(&stranger), Permission::Write),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_grantee_can_read_and_write_but_not_administer() {
        let mut record = record();
        let grantee = principal("anotheruser");
        record.grant(grantee.clone());

        assert!(check(&record, Some(&grantee), Permission::Read).is_allowed());
        assert!(check(&record, Some(&grantee), Permission::Write).is_allowed());
        assert_eq!(
            check(&record, Some(&grantee), Permission::Administer),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_public_grant_confers_read_only() {
        let mut record = record();
        record.grant(Principal::public());
        let other = principal("anotheruser");

        assert!(check(&record, Some(&other), Permission::Read).is_allowed());
        assert!(check(&record, None, Permission::Read).is_allowed());
        assert_eq!(
            check(&record, Some(&other), Permission::Write),
            AccessDecision::Denied
        );
        assert_eq!(
            check(&record, Some(&Principal::public()), Permission::Write),
            AccessDecision::Denied
        );
        assert_eq!(
            check(&record, Some(&other), Permission::Administer),
            AccessDecision::Denied
        );
    }
}
