//! Main CLI application structure

use clap::Parser;

use crate::cli::commands::{gendocs, serve, version, Commands};
use crate::cli::error::CliResult;

/// pkgshare CLI - Package registry server and docs tooling
#[derive(Debug, Parser)]
#[command(name = "pkgshare")]
#[command(version = pkgshare::VERSION)]
#[command(about = "pkgshare - package registry with per-package sharing")]
#[command(long_about = "pkgshare serves a package registry in which owners push \
                         hash-addressed versions and share packages with other \
                         principals or with everyone.\n\n\
                         Examples:\n\
                           pkgshare serve --port 8080 --storage sqlite\n\
                           pkgshare serve --auth-mode jwt\n\
                           pkgshare gendocs --docs-dir gendocs")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> CliResult<()> {
        pkgshare::init_logging_with_default(if self.verbose {
            "pkgshare=debug"
        } else {
            "pkgshare=warn"
        });

        match self.command {
            Commands::Serve(args) => serve::execute_serve(args).await,
            Commands::Gendocs(args) => gendocs::execute_gendocs(args).await,
            Commands::Version(args) => version::execute_version(args).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::config::StorageChoice;
    use pkgshare::http::auth::AuthMode;

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "pkgshare",
            "-v",
            "serve",
            "--port",
            "9000",
            "--storage",
            "memory",
            "--auth-mode",
            "jwt",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Serve(args) = cli.command else {
            unreachable!("parsed serve");
        };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.storage, Some(StorageChoice::Memory));
        assert_eq!(args.auth_mode, Some(AuthMode::Jwt));
        assert!(args.host.is_none());
    }

    #[test]
    fn test_rejects_unknown_auth_mode() {
        assert!(Cli::try_parse_from(["pkgshare", "serve", "--auth-mode", "oauth"]).is_err());
    }

    #[tokio::test]
    async fn test_version_command() {
        let cli = Cli::try_parse_from(["pkgshare", "version"]).unwrap();
        assert!(cli.execute().await.is_ok());
    }
}
