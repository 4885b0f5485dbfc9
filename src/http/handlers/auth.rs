//! Authentication endpoint handlers

use crate::core::principal::Principal;
use crate::http::errors::{HttpError, HttpResult};
use crate::http::handlers::AppState;
use crate::http::models::*;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;
use validator::Validate;

/// POST /auth/token - Issue a bearer token (jwt auth mode only)
pub async fn generate_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> HttpResult<Json<TokenResponse>> {
    let Some(jwt_service) = state.auth.jwt_service() else {
        return Err(HttpError::NotFound(
            "Token issuance requires the jwt auth mode".to_string(),
        ));
    };

    let Json(request) = body.map_err(|rejection| HttpError::BadRequest(rejection.body_text()))?;
    request.validate().map_err(HttpError::from_validation)?;

    let principal = Principal::caller(request.username)?;
    let response = jwt_service.generate_token(principal.as_str())?;
    info!("Issued token for {}", principal);

    Ok(Json(response))
}
