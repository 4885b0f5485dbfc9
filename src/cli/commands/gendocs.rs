//! Gendocs command implementation

use crate::cli::error::CliResult;
use crate::cli::utils::messages;
use clap::Args;
use pkgshare::gendocs::config::{DEFAULT_EXPECTED_SUFFIX, DEFAULT_REPO_URL, DEFAULT_REV};
use pkgshare::gendocs::{
    DocsBuilder, GendocsConfig, GendocsOutcome, InquireConfirmer, SystemRunner,
};
use std::path::PathBuf;

/// Build the API documentation with pydocmd
#[derive(Debug, Args)]
pub struct GendocsArgs {
    /// Directory holding the generator scripts and pydocmd.yml
    #[arg(long, default_value = ".", help = "Docs directory")]
    pub docs_dir: PathBuf,

    /// Python interpreter running pip and pydocmd
    #[arg(long, default_value = "python3", help = "Python interpreter")]
    pub python: String,

    /// Install pydoc-markdown without asking
    #[arg(short, long, help = "Install pydoc-markdown without asking")]
    pub yes: bool,

    #[arg(long, default_value = DEFAULT_EXPECTED_SUFFIX, help = "Required pydoc-markdown version suffix")]
    pub expected_suffix: String,

    #[arg(long, default_value = DEFAULT_REPO_URL, help = "Git repository of the patched pydoc-markdown")]
    pub repo_url: String,

    #[arg(long, default_value = DEFAULT_REV, help = "Git revision of the patched pydoc-markdown")]
    pub rev: String,

    /// Arguments passed to pydocmd (default: build)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl From<GendocsArgs> for GendocsConfig {
    fn from(args: GendocsArgs) -> Self {
        GendocsConfig {
            docs_dir: args.docs_dir,
            python: args.python,
            assume_yes: args.yes,
            expected_suffix: args.expected_suffix,
            repo_url: args.repo_url,
            rev: args.rev,
            pydocmd_args: args.args,
        }
    }
}

pub async fn execute_gendocs(args: GendocsArgs) -> CliResult<()> {
    let builder = DocsBuilder::new(args.into(), SystemRunner, InquireConfirmer);
    let mut stdout = std::io::stdout();

    match builder.run(&mut stdout).await? {
        GendocsOutcome::Completed(_) => println!("{}", messages::ok("Documentation built")),
        GendocsOutcome::Declined | GendocsOutcome::RerunRequired => {}
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::cli::commands::Commands;
    use clap::Parser;

    #[test]
    fn test_trailing_args_pass_through() {
        let cli = Cli::try_parse_from([
            "pkgshare",
            "gendocs",
            "--docs-dir",
            "gendocs",
            "--yes",
            "serve",
            "--dev-addr",
            "0.0.0.0:8000",
        ])
        .unwrap();

        let Commands::Gendocs(args) = cli.command else {
            unreachable!("parsed gendocs");
        };
        let config = GendocsConfig::from(args);
        assert!(config.assume_yes);
        assert_eq!(config.docs_dir, PathBuf::from("gendocs"));
        assert_eq!(config.pydocmd_args, ["serve", "--dev-addr", "0.0.0.0:8000"]);
        assert_eq!(config.expected_suffix, "-quilt3");
    }
}
