//! Version command implementation

use crate::cli::error::CliResult;
use clap::Args;

/// Display pkgshare version
#[derive(Debug, Args)]
pub struct VersionArgs {}

pub async fn execute_version(_args: VersionArgs) -> CliResult<()> {
    println!("pkgshare {}", pkgshare::VERSION);
    Ok(())
}
