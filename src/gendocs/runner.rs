//! External command execution

use crate::gendocs::GendocsError;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
}

/// Runs external commands from a working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio; returns whether the command exited successfully
    async fn run(&self, invocation: &Invocation, cwd: &Path) -> Result<bool, GendocsError>;

    /// Run with stdout captured
    async fn capture(
        &self,
        invocation: &Invocation,
        cwd: &Path,
    ) -> Result<CommandOutput, GendocsError>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation, cwd: &Path) -> Command {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(cwd);
        command
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation, cwd: &Path) -> Result<bool, GendocsError> {
        debug!("Running `{}` in {}", invocation, cwd.display());
        let status = Self::command(invocation, cwd)
            .status()
            .await
            .map_err(|source| GendocsError::Spawn {
                command: invocation.to_string(),
                source,
            })?;
        Ok(status.success())
    }

    async fn capture(
        &self,
        invocation: &Invocation,
        cwd: &Path,
    ) -> Result<CommandOutput, GendocsError> {
        debug!("Capturing `{}` in {}", invocation, cwd.display());
        let output = Self::command(invocation, cwd)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| GendocsError::Spawn {
                command: invocation.to_string(),
                source,
            })?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_runner() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = SystemRunner;

        assert!(runner
            .run(&Invocation::new("true", Vec::<String>::new()), dir.path())
            .await
            .unwrap());
        assert!(!runner
            .run(&Invocation::new("false", Vec::<String>::new()), dir.path())
            .await
            .unwrap());

        let output = runner
            .capture(&Invocation::new("echo", ["hello"]), dir.path())
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");

        let missing = runner
            .run(
                &Invocation::new("./does-not-exist.sh", Vec::<String>::new()),
                dir.path(),
            )
            .await;
        assert!(matches!(missing, Err(GendocsError::Spawn { .. })));
    }

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::new("python3", ["-m", "pydocmd", "build"]);
        assert_eq!(invocation.to_string(), "python3 -m pydocmd build");
    }
}
