//! Serve command implementation

use crate::cli::config::{RegistrySettings, StorageChoice};
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::messages;
use clap::Args;
use pkgshare::http::auth::AuthMode;
use pkgshare::http::RegistryServer;
use pkgshare::RegistryService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Serve the package registry via HTTP API
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host to bind the server to
    #[arg(long, help = "Host to bind the server to [default: 127.0.0.1]")]
    pub host: Option<String>,

    /// Port to bind the server to
    #[arg(long, help = "Port to bind the server to [default: 8080]")]
    pub port: Option<u16>,

    /// Storage backend
    #[arg(long, value_enum, help = "Storage backend [default: sqlite]")]
    pub storage: Option<StorageChoice>,

    /// Data directory for the SQLite database
    #[arg(long, help = "Directory holding the registry database")]
    pub data_dir: Option<PathBuf>,

    /// How the Authorization header is interpreted
    #[arg(long, help = "Auth mode: plain or jwt [default: plain]")]
    pub auth_mode: Option<AuthMode>,

    /// Settings file (defaults to ./pkgshare.toml when present)
    #[arg(long, help = "Path to a pkgshare.toml settings file")]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    /// Merge command-line flags over the layered settings
    pub fn settings(&self) -> CliResult<RegistrySettings> {
        let mut settings = RegistrySettings::load(self.config.as_deref())?;
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(storage) = self.storage {
            settings.storage = storage;
        }
        if let Some(data_dir) = &self.data_dir {
            settings.data_dir = data_dir.clone();
        }
        if let Some(auth_mode) = self.auth_mode {
            settings.auth_mode = auth_mode;
        }
        Ok(settings)
    }
}

pub async fn execute_serve(args: ServeArgs) -> CliResult<()> {
    let settings = args.settings()?;
    let auth = settings.auth_middleware()?;

    let mut service = RegistryService::new(settings.service_config()).await?;
    service.initialize().await?;

    let server = RegistryServer::new(Arc::new(service), auth, &settings.host, settings.port)
        .map_err(CliError::Config)?;

    info!(
        "Starting pkgshare HTTP server on {}:{}",
        settings.host, settings.port
    );
    println!("{}", messages::info("pkgshare HTTP server starting..."));
    println!("  Listening on: http://{}", server.addr());
    println!("  Storage:      {:?}", settings.storage);
    println!("  Auth mode:    {}", settings.auth_mode);

    // Blocks until Ctrl-C
    server
        .serve()
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    println!("{}", messages::ok("Server stopped"));
    Ok(())
}
