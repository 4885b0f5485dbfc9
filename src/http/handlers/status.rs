//! Status endpoint handler

use crate::core::service::RegistryService;
use crate::http::auth::AuthMiddleware;
use crate::http::models::StatusResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::SystemTime;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RegistryService>,
    pub auth: Arc<AuthMiddleware>,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(service: Arc<RegistryService>, auth: AuthMiddleware) -> Self {
        Self {
            service,
            auth: Arc::new(auth),
            start_time: SystemTime::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_secs()
    }
}

/// GET /api/status - Service status endpoint
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
        version: crate::VERSION.to_string(),
        auth_mode: state.auth.mode().to_string(),
        storage: state.service.storage_name().to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
