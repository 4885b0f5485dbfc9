//! Package push, read, log, listing and delete handlers

use crate::core::package::{PackageHash, PackageRef};
use crate::core::principal::Principal;
use crate::http::auth::AuthContext;
use crate::http::errors::{HttpError, HttpResult};
use crate::http::handlers::AppState;
use crate::http::models::*;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use validator::Validate;

/// PUT /api/package/:owner/:pkg - Push a version
pub async fn push_package(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg)): Path<(String, String)>,
    body: Result<Json<PushRequest>, JsonRejection>,
) -> HttpResult<Json<PushResponse>> {
    let caller = auth.caller().ok_or_else(|| {
        HttpError::Unauthorized("An Authorization header is required".to_string())
    })?;
    let Json(request) = body.map_err(|rejection| HttpError::BadRequest(rejection.body_text()))?;
    request.validate().map_err(HttpError::from_validation)?;

    let package = PackageRef::parse(&owner, &pkg)?;
    let hash = PackageHash::new(request.hash)?;

    let result = state
        .service
        .packages()
        .push(Some(caller), &package, hash, request.description)
        .await?;

    Ok(Json(PushResponse {
        outcome: result.outcome.as_str().to_string(),
        package: PackageResponse::from(&result.record),
    }))
}

/// GET /api/package/:owner/:pkg - Read the latest version
pub async fn get_package(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg)): Path<(String, String)>,
) -> HttpResult<Json<PackageResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let record = state.service.packages().get(auth.caller(), &package).await?;
    Ok(Json(PackageResponse::from(&record)))
}

/// GET /api/package/:owner/:pkg/:hash - Read one version
pub async fn get_package_version(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg, hash)): Path<(String, String, String)>,
) -> HttpResult<Json<PackageVersionResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let hash = PackageHash::new(hash)?;

    let (record, version) = state
        .service
        .packages()
        .get_version(auth.caller(), &package, &hash)
        .await?;

    Ok(Json(PackageVersionResponse {
        owner: record.package.owner.to_string(),
        name: record.package.name.to_string(),
        version: VersionResponse::from(&version),
    }))
}

/// GET /api/log/:owner/:pkg/ - Push log in push order
pub async fn get_log(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg)): Path<(String, String)>,
) -> HttpResult<Json<LogResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let record = state.service.packages().get(auth.caller(), &package).await?;

    Ok(Json(LogResponse {
        logs: record.versions.iter().map(VersionResponse::from).collect(),
    }))
}

/// GET /api/package/:owner/ - Packages of an owner visible to the caller
pub async fn list_packages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(owner): Path<String>,
) -> HttpResult<Json<PackageListResponse>> {
    let owner = Principal::new(owner)?;
    if owner.is_public() {
        return Ok(Json(PackageListResponse { packages: vec![] }));
    }

    let records = state
        .service
        .packages()
        .list_packages(auth.caller(), &owner)
        .await?;

    Ok(Json(PackageListResponse {
        packages: records
            .iter()
            .map(|record| PackageSummary {
                name: record.package.name.to_string(),
                is_public: record.is_public(),
            })
            .collect(),
    }))
}

/// DELETE /api/package/:owner/:pkg - Delete a package (owner only)
pub async fn delete_package(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((owner, pkg)): Path<(String, String)>,
) -> HttpResult<Json<DeleteResponse>> {
    let package = PackageRef::parse(&owner, &pkg)?;
    let record = state
        .service
        .packages()
        .delete(auth.caller(), &package)
        .await?;

    Ok(Json(DeleteResponse {
        deleted: package.to_string(),
        versions: record.versions.len(),
    }))
}
