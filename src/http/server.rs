//! Axum HTTP server implementation

use crate::core::service::RegistryService;
use crate::http::auth::{middleware::auth_middleware, AuthMiddleware};
use crate::http::handlers::{access, auth, package, status, AppState};
use axum::{
    http::Method,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the API router over the given state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Packages
        .route("/api/package/:owner/", get(package::list_packages))
        .route(
            "/api/package/:owner/:pkg",
            put(package::push_package)
                .get(package::get_package)
                .delete(package::delete_package),
        )
        .route(
            "/api/package/:owner/:pkg/:hash",
            get(package::get_package_version),
        )
        .route("/api/log/:owner/:pkg/", get(package::get_log))
        .route("/api/log/:owner/:pkg", get(package::get_log))
        // Sharing
        .route("/api/access/:owner/:pkg/", get(access::list_access))
        .route("/api/access/:owner/:pkg", get(access::list_access))
        .route(
            "/api/access/:owner/:pkg/:principal",
            put(access::grant_access).delete(access::revoke_access),
        )
        // Auth and status
        .route("/auth/token", post(auth::generate_token))
        .route("/api/status", get(status::status))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
                    .allow_headers(Any)
                    .allow_origin(Any),
            ),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Package registry HTTP server
pub struct RegistryServer {
    service: Arc<RegistryService>,
    auth: AuthMiddleware,
    addr: SocketAddr,
}

impl RegistryServer {
    /// Create a new server instance
    pub fn new(
        service: Arc<RegistryService>,
        auth: AuthMiddleware,
        host: &str,
        port: u16,
    ) -> Result<Self, String> {
        let addr = Self::parse_address(host, port)?;
        Ok(Self {
            service,
            auth,
            addr,
        })
    }

    /// Parse and normalize host:port into a SocketAddr
    fn parse_address(host: &str, port: u16) -> Result<SocketAddr, String> {
        let normalized_host = Self::normalize_host(host);

        // IPv6 addresses need brackets
        let addr_str = if normalized_host.contains(':') {
            format!("[{}]:{}", normalized_host, port)
        } else {
            format!("{}:{}", normalized_host, port)
        };

        addr_str.parse().map_err(|_| {
            format!(
                "Unable to parse address '{}'. Use IP addresses like '127.0.0.1', '0.0.0.0', '::1', or 'localhost'",
                addr_str
            )
        })
    }

    /// Normalize hostnames for SocketAddr compatibility
    fn normalize_host(host: &str) -> String {
        match host {
            "localhost" => "127.0.0.1".to_string(),
            "::1" | "[::1]" => "::1".to_string(),
            "::" | "[::]" => "::".to_string(),
            _ => host.to_string(),
        }
    }

    /// Build the router for this server
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.service.clone(), self.auth.clone()))
    }

    /// Start the server and run until Ctrl-C
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        info!(
            "Starting pkgshare HTTP server on {} (auth: {}, storage: {})",
            self.addr,
            self.auth.mode(),
            self.service.storage_name()
        );

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let actual_addr = listener.local_addr()?;
        info!("Server bound to {}", actual_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }

    /// Get server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
