//! Caller authentication

pub mod jwt;
pub mod middleware;

pub use crate::http::models::Claims;
/// Re-export commonly used auth types
pub use jwt::JwtService;
pub use middleware::{AuthContext, AuthMiddleware};

use serde::{Deserialize, Serialize};

/// How the `Authorization` header is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// The header value is the principal name
    #[default]
    Plain,
    /// `Bearer <jwt>` whose `sub` claim is the principal
    Jwt,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Plain => "plain",
            AuthMode::Jwt => "jwt",
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(AuthMode::Plain),
            "jwt" => Ok(AuthMode::Jwt),
            _ => Err(format!("Invalid auth mode: {} (expected plain or jwt)", s)),
        }
    }
}
