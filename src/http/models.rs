//! Request and response models for the HTTP API

use crate::core::package::{PackageRecord, PackageVersion};
use crate::core::principal::Principal;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[allow(clippy::expect_used)]
static HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("hash pattern is valid"));

/// Package push request
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct PushRequest {
    #[validate(
        length(min = 1, max = 128, message = "hash must be 1-128 characters"),
        regex(path = *HASH_RE, message = "hash must be alphanumeric")
    )]
    pub hash: String,

    #[serde(default)]
    #[validate(length(max = 4096, message = "description is too long"))]
    pub description: String,
}

/// Version summary embedded in package responses
#[derive(Debug, Serialize, Clone)]
pub struct VersionResponse {
    pub hash: String,
    pub description: String,
    pub pushed_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&PackageVersion> for VersionResponse {
    fn from(version: &PackageVersion) -> Self {
        Self {
            hash: version.hash.to_string(),
            description: version.description.clone(),
            pushed_by: version.pushed_by.to_string(),
            created_at: version.created_at.to_rfc3339(),
            updated_at: version.updated_at.to_rfc3339(),
        }
    }
}

/// Package view; `hash` and `description` describe the latest version
#[derive(Debug, Serialize, Clone)]
pub struct PackageResponse {
    pub owner: String,
    pub name: String,
    pub hash: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub is_public: bool,
    pub versions: Vec<String>,
}

impl From<&PackageRecord> for PackageResponse {
    fn from(record: &PackageRecord) -> Self {
        let latest = record.latest();
        Self {
            owner: record.package.owner.to_string(),
            name: record.package.name.to_string(),
            hash: latest.map(|v| v.hash.to_string()),
            description: latest.map(|v| v.description.clone()),
            created_by: record.owner().to_string(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: latest.map(|v| v.updated_at.to_rfc3339()),
            is_public: record.is_public(),
            versions: record.versions.iter().map(|v| v.hash.to_string()).collect(),
        }
    }
}

/// Push response
#[derive(Debug, Serialize, Clone)]
pub struct PushResponse {
    pub outcome: String,
    #[serde(flatten)]
    pub package: PackageResponse,
}

/// Single version of a package
#[derive(Debug, Serialize, Clone)]
pub struct PackageVersionResponse {
    pub owner: String,
    pub name: String,
    #[serde(flatten)]
    pub version: VersionResponse,
}

/// Access list: `{"users": [...]}`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessListResponse {
    pub users: Vec<String>,
}

impl AccessListResponse {
    pub fn new(users: Vec<Principal>) -> Self {
        Self {
            users: users.into_iter().map(Principal::into_string).collect(),
        }
    }
}

/// Push log response
#[derive(Debug, Serialize, Clone)]
pub struct LogResponse {
    pub logs: Vec<VersionResponse>,
}

/// Package summary in owner listings
#[derive(Debug, Serialize, Clone)]
pub struct PackageSummary {
    pub name: String,
    pub is_public: bool,
}

/// Owner listing response
#[derive(Debug, Serialize, Clone)]
pub struct PackageListResponse {
    pub packages: Vec<PackageSummary>,
}

/// Delete response
#[derive(Debug, Serialize, Clone)]
pub struct DeleteResponse {
    pub deleted: String,
    pub versions: usize,
}

/// Status response
#[derive(Debug, Serialize, Clone)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub auth_mode: String,
    pub storage: String,
    pub uptime_seconds: u64,
}

/// JWT token request (for local development)
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

/// JWT token response
#[derive(Debug, Serialize, Clone)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub principal: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // principal
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_push_request_validation() {
        let ok: PushRequest = serde_json::from_str(r#"{"hash": "123", "description": ""}"#).unwrap();
        assert!(ok.validate().is_ok());

        let missing_description: PushRequest = serde_json::from_str(r#"{"hash": "abc"}"#).unwrap();
        assert!(missing_description.validate().is_ok());

        let bad: PushRequest = serde_json::from_str(r#"{"hash": "not a hash"}"#).unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("hash"));

        let empty: PushRequest = serde_json::from_str(r#"{"hash": ""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_access_list_shape() {
        let response = AccessListResponse::new(vec![
            Principal::new("anotheruser").unwrap(),
            Principal::new("test_user").unwrap(),
        ]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"users": ["anotheruser", "test_user"]}));
    }
}
