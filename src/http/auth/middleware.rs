//! Axum middleware resolving the calling principal

use crate::core::principal::Principal;
use crate::http::auth::{jwt::JwtService, AuthMode};
use crate::http::errors::HttpError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Resolves the `Authorization` header to a principal
#[derive(Clone)]
pub struct AuthMiddleware {
    mode: AuthMode,
    jwt_service: Option<Arc<JwtService>>,
}

impl AuthMiddleware {
    /// The header value names the principal directly
    pub fn plain() -> Self {
        Self {
            mode: AuthMode::Plain,
            jwt_service: None,
        }
    }

    /// The header carries a bearer token whose subject is the principal
    pub fn jwt(jwt_service: Arc<JwtService>) -> Self {
        Self {
            mode: AuthMode::Jwt,
            jwt_service: Some(jwt_service),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn jwt_service(&self) -> Option<&Arc<JwtService>> {
        self.jwt_service.as_ref()
    }

    /// Extract the raw credential from request headers. A header that is
    /// present but not visible ASCII is rejected rather than ignored.
    pub fn extract_credential(&self, headers: &HeaderMap) -> Result<Option<String>, HttpError> {
        let authorization = header_str(headers, header::AUTHORIZATION.as_str())?;

        match self.mode {
            AuthMode::Plain => Ok(authorization.map(|value| value.trim().to_string())),
            AuthMode::Jwt => {
                if let Some(auth_str) = authorization.map(str::trim) {
                    return Ok(Some(
                        auth_str
                            .strip_prefix("Bearer ")
                            .unwrap_or(auth_str)
                            .trim()
                            .to_string(),
                    ));
                }

                // Try X-API-Key header as fallback
                Ok(header_str(headers, "x-api-key")?.map(|key| key.trim().to_string()))
            }
        }
    }

    /// Authenticate request headers. No credential means an anonymous caller.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, HttpError> {
        let Some(credential) = self.extract_credential(headers)? else {
            return Ok(AuthContext::anonymous());
        };

        if credential.is_empty() {
            return Err(HttpError::Unauthorized(
                "Empty Authorization header".to_string(),
            ));
        }

        let name = match (&self.mode, &self.jwt_service) {
            (AuthMode::Plain, _) => credential,
            (AuthMode::Jwt, Some(jwt_service)) => jwt_service.validate_token(&credential)?.sub,
            (AuthMode::Jwt, None) => {
                return Err(HttpError::InternalServerError(
                    "JWT authentication is not configured".to_string(),
                ))
            }
        };

        let principal = Principal::caller(name)
            .map_err(|e| HttpError::Unauthorized(format!("Invalid principal: {}", e)))?;
        Ok(AuthContext::authenticated(principal))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, HttpError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| HttpError::Unauthorized(format!("Malformed {} header", name)))
        })
        .transpose()
}

/// Check if a route skips principal resolution
fn is_public_route(method: &Method, path: &str) -> bool {
    matches!(
        (method, path),
        (&Method::POST, "/auth/token") | (&Method::GET, "/api/status")
    )
}

/// Axum middleware attaching an [`AuthContext`] to every request
pub async fn auth_middleware(
    State(auth): State<Arc<AuthMiddleware>>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_public_route(req.method(), req.uri().path()) {
        req.extensions_mut().insert(AuthContext::anonymous());
        return next.run(req).await;
    }

    match auth.authenticate(req.headers()) {
        Ok(context) => {
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(err) => {
            debug!("Rejected {} {}: {}", req.method(), req.uri().path(), err);
            err.into_response()
        }
    }
}

/// Authentication state for request context
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub principal: Option<Principal>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    /// The calling principal, if any
    pub fn caller(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_plain_mode() {
        let auth = AuthMiddleware::plain();

        let context = auth.authenticate(&headers("test_user")).unwrap();
        assert_eq!(context.caller().unwrap().as_str(), "test_user");

        assert!(auth.authenticate(&HeaderMap::new()).unwrap().caller().is_none());
        assert!(matches!(
            auth.authenticate(&headers("public")),
            Err(HttpError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.authenticate(&headers("two words")),
            Err(HttpError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.authenticate(&headers("   ")),
            Err(HttpError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_jwt_mode() {
        let jwt_service = Arc::new(JwtService::new("secret", "pkgshare", 60));
        let auth = AuthMiddleware::jwt(jwt_service.clone());
        let token = jwt_service.generate_token("anotheruser").unwrap().token;

        let context = auth
            .authenticate(&headers(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(context.caller().unwrap().as_str(), "anotheruser");

        let mut api_key = HeaderMap::new();
        api_key.insert("x-api-key", HeaderValue::from_str(&token).unwrap());
        assert!(auth.authenticate(&api_key).unwrap().caller().is_some());

        assert!(matches!(
            auth.authenticate(&headers("Bearer invalid-token")),
            Err(HttpError::Unauthorized(_))
        ));
        // A bare principal name is not a token
        assert!(auth.authenticate(&headers("anotheruser")).is_err());

        let mut bad_key = HeaderMap::new();
        bad_key.insert("x-api-key", HeaderValue::from_bytes(b"t\xe9st").unwrap());
        assert!(matches!(
            auth.authenticate(&bad_key),
            Err(HttpError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_unreadable_header_is_rejected() {
        let auth = AuthMiddleware::plain();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"t\xe9st").unwrap(),
        );
        assert!(matches!(
            auth.authenticate(&headers),
            Err(HttpError::Unauthorized(_))
        ));
    }
}
