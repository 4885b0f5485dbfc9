//! Command modules for CLI

pub mod gendocs;
pub mod serve;
pub mod version;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
#[command(about = "pkgshare commands")]
pub enum Commands {
    /// Run the package registry HTTP server
    #[command(about = "Serve the package registry over HTTP")]
    Serve(serve::ServeArgs),

    /// Build the API documentation
    #[command(
        about = "Build the API documentation (runs the generator scripts, then pydocmd)"
    )]
    Gendocs(gendocs::GendocsArgs),

    /// Show version information
    #[command(about = "Show version information")]
    Version(version::VersionArgs),
}
