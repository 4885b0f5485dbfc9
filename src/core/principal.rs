//! Principals: the identities that own packages and receive grants

use crate::core::service::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Reserved principal that stands for "everyone"
pub const PUBLIC: &str = "public";

/// Shared grammar for principal and package names
pub(crate) static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,63}$").expect("name pattern is valid")
});

/// An identity as named by the `Authorization` header, or the public sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal(String);

impl Principal {
    /// Create a new Principal with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ServiceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Principal cannot be empty".to_string(),
            ));
        }
        if !NAME_RE.is_match(&name) {
            return Err(ServiceError::Validation(format!(
                "Invalid principal '{}' (alphanumeric, '_', '-', '.'; max 64 characters)",
                name
            )));
        }
        Ok(Self(name))
    }

    /// The public sentinel
    pub fn public() -> Self {
        Self(PUBLIC.to_string())
    }

    pub fn is_public(&self) -> bool {
        self.0 == PUBLIC
    }

    /// Parse a principal that is acting as a caller.
    ///
    /// The public sentinel can be granted access but never authenticates.
    pub fn caller(name: impl Into<String>) -> Result<Self, ServiceError> {
        let principal = Self::new(name)?;
        if principal.is_public() {
            return Err(ServiceError::Unauthenticated(format!(
                "'{}' is a reserved principal",
                PUBLIC
            )));
        }
        Ok(principal)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = ServiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Principal::new(s)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> String {
        principal.0
    }
}

impl serde::Serialize for Principal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Principal::new(s).map_err(serde::de::Error::custom)
    }
}
