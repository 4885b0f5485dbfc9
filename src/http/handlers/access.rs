//! Sharing endpoint handlers

use crate::core::package::PackageRef;
use crate::core::principal::Principal;
use crate::http::auth::AuthContext;
use crate::http::errors::HttpResult;
use crate::http::handlers::AppState;
use crate::http::models::AccessListResponse;
use axum::{
    extract::{Path, State},
    Extension, Json,
};

/// GET /api/access/:owner/:pkg/ - Principals with access
pub async fn list_access(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg)): Path<(String, String)>,
) -> HttpResult<Json<AccessListResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let users = state
        .service
        .packages()
        .list_access(auth.caller(), &package)
        .await?;
    Ok(Json(AccessListResponse::new(users)))
}

/// PUT /api/access/:owner/:pkg/:principal - Share a package
pub async fn grant_access(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg, principal)): Path<(String, String, String)>,
) -> HttpResult<Json<AccessListResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let principal = Principal::new(principal)?;

    let users = state
        .service
        .packages()
        .grant(auth.caller(), &package, principal)
        .await?;
    Ok(Json(AccessListResponse::new(users)))
}

/// DELETE /api/access/:owner/:pkg/:principal - Unshare a package
pub async fn revoke_access(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg, principal)): Path<(String, String, String)>,
) -> HttpResult<Json<AccessListResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let principal = Principal::new(principal)?;

    let users = state
        .service
        .packages()
        .revoke(auth.caller(), &package, principal)
        .await?;
    Ok(Json(AccessListResponse::new(users)))
}
