//! Documentation build orchestrator
//!
//! Runs the docs generator scripts, makes sure the patched `pydoc-markdown`
//! is installed (asking before replacing another version), then runs
//! `pydocmd` and reports where the output went. Every step runs in order and
//! any failing command aborts the build.

pub mod config;
pub mod prompt;
pub mod runner;

pub use config::{GendocsConfig, PydocmdConfig};
pub use prompt::{Confirmer, InquireConfirmer};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};

use config::DisplayDir;
use std::io::Write;
use tracing::{debug, info};

/// Generator scripts run before pydocmd, in order
pub const GENERATOR_SCRIPTS: [&str; 2] = ["./gen_cli_api_reference.sh", "./gen_walkthrough.sh"];

const PYDOC_MARKDOWN: &str = "pydoc-markdown";

/// Orchestrator errors
#[derive(Debug, thiserror::Error)]
pub enum GendocsError {
    #[error("Command `{0}` failed")]
    CommandFailed(String),

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a build ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GendocsOutcome {
    /// Docs were generated
    Completed(PydocmdConfig),
    /// The user declined installing pydoc-markdown
    Declined,
    /// pydoc-markdown still has the wrong version after installing
    RerunRequired,
}

/// Sequential documentation build
pub struct DocsBuilder<R, C> {
    config: GendocsConfig,
    runner: R,
    confirmer: C,
}

impl<R: CommandRunner, C: Confirmer> DocsBuilder<R, C> {
    pub fn new(config: GendocsConfig, runner: R, confirmer: C) -> Self {
        Self {
            config,
            runner,
            confirmer,
        }
    }

    pub fn config(&self) -> &GendocsConfig {
        &self.config
    }

    /// Run the whole build, writing progress to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<GendocsOutcome, GendocsError> {
        self.run_generators().await?;

        if !self.ensure_pydoc_markdown(out).await? {
            writeln!(out, "exiting..")?;
            return Ok(GendocsOutcome::Declined);
        }

        let version = self.installed_version().await?;
        if !version.ends_with(&self.config.expected_suffix) {
            writeln!(out, "Please re-run this script to continue")?;
            return Ok(GendocsOutcome::RerunRequired);
        }

        self.run_pydocmd(out).await?;

        let report = PydocmdConfig::load(&self.config.docs_dir)?;
        writeln!(out, "Generated HTML in {}", DisplayDir(&report.site_dir))?;
        writeln!(out, "Generated markdown in {}", DisplayDir(&report.gens_dir))?;
        Ok(GendocsOutcome::Completed(report))
    }

    async fn run_generators(&self) -> Result<(), GendocsError> {
        for script in GENERATOR_SCRIPTS {
            self.run_checked(Invocation::new(script, Vec::<String>::new()))
                .await?;
        }
        Ok(())
    }

    /// Installed pydoc-markdown version, empty when not installed
    pub async fn installed_version(&self) -> Result<String, GendocsError> {
        let output = self
            .runner
            .capture(
                &self.pip(["show", PYDOC_MARKDOWN]),
                &self.config.docs_dir,
            )
            .await?;
        if !output.success {
            return Ok(String::new());
        }
        Ok(parse_pip_show_version(&output.stdout).unwrap_or_default())
    }

    /// Returns false when the user declines the install
    async fn ensure_pydoc_markdown<W: Write>(&self, out: &mut W) -> Result<bool, GendocsError> {
        let version = self.installed_version().await?;
        debug!("Installed {} version: {:?}", PYDOC_MARKDOWN, version);
        if version.ends_with(&self.config.expected_suffix) {
            return Ok(true);
        }

        writeln!(out)?;
        writeln!(out, "Using '{}':", self.config.python)?;
        if !version.is_empty() {
            writeln!(
                out,
                "This will uninstall the existing version of {} ({}) first.",
                PYDOC_MARKDOWN, version
            )?;
        }
        out.flush()?;

        let accepted = self.config.assume_yes
            || self
                .confirmer
                .confirm("Install quilt-specific pydoc-markdown? (y/n)")?;
        if !accepted {
            return Ok(false);
        }

        if !version.is_empty() {
            self.run_checked(self.pip(["uninstall", "-y", PYDOC_MARKDOWN]))
                .await?;
        }

        let requirement = self.config.install_requirement();
        writeln!(out, "Installing {}", requirement)?;
        out.flush()?;
        self.run_checked(self.pip(["install", requirement.as_str()])).await?;
        info!("Installed {}", requirement);
        Ok(true)
    }

    async fn run_pydocmd<W: Write>(&self, out: &mut W) -> Result<(), GendocsError> {
        let mut args = vec!["-m".to_string(), "pydocmd".to_string()];
        if self.config.pydocmd_args.is_empty() {
            writeln!(out, "Using standard args for mkdocs.")?;
            args.push("build".to_string());
        } else {
            writeln!(out, "Using custom args for mkdocs.")?;
            args.extend(self.config.pydocmd_args.iter().cloned());
        }

        writeln!(out)?;
        writeln!(out, "Starting pydocmd...")?;
        out.flush()?;
        self.run_checked(Invocation::new(self.config.python.clone(), args))
            .await?;
        writeln!(out, "...finished pydocmd")?;
        Ok(())
    }

    fn pip<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Invocation {
        let mut all = vec!["-m", "pip"];
        all.extend(args);
        Invocation::new(self.config.python.clone(), all)
    }

    async fn run_checked(&self, invocation: Invocation) -> Result<(), GendocsError> {
        if self.runner.run(&invocation, &self.config.docs_dir).await? {
            Ok(())
        } else {
            Err(GendocsError::CommandFailed(invocation.to_string()))
        }
    }
}

/// Extract the `Version:` field from `pip show` output
pub fn parse_pip_show_version(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.strip_prefix("Version:")
            .map(|version| version.trim().to_string())
    })
}
