//! Orchestrator options and the `pydocmd.yml` report

use crate::gendocs::GendocsError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXPECTED_SUFFIX: &str = "-quilt3";
pub const DEFAULT_REPO_URL: &str = "https://github.com/quiltdata/pydoc-markdown.git";
pub const DEFAULT_REV: &str = "quilt";
pub const PYDOCMD_CONFIG_FILE: &str = "pydocmd.yml";

/// Options for a documentation build
#[derive(Debug, Clone)]
pub struct GendocsConfig {
    /// Directory holding the generator scripts and `pydocmd.yml`
    pub docs_dir: PathBuf,
    /// Python interpreter used for pip and pydocmd
    pub python: String,
    /// Skip the install prompt
    pub assume_yes: bool,
    /// Version suffix identifying the patched pydoc-markdown
    pub expected_suffix: String,
    pub repo_url: String,
    pub rev: String,
    /// Arguments for pydocmd; empty means `build`
    pub pydocmd_args: Vec<String>,
}

impl Default for GendocsConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("."),
            python: "python3".to_string(),
            assume_yes: false,
            expected_suffix: DEFAULT_EXPECTED_SUFFIX.to_string(),
            repo_url: DEFAULT_REPO_URL.to_string(),
            rev: DEFAULT_REV.to_string(),
            pydocmd_args: Vec::new(),
        }
    }
}

impl GendocsConfig {
    /// pip requirement for the patched pydoc-markdown
    pub fn install_requirement(&self) -> String {
        format!("git+{}@{}", self.repo_url, self.rev)
    }
}

/// Output locations declared in `pydocmd.yml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PydocmdConfig {
    #[serde(default)]
    pub site_dir: Option<String>,
    #[serde(default)]
    pub gens_dir: Option<String>,
}

impl PydocmdConfig {
    pub fn load(docs_dir: &Path) -> Result<Self, GendocsError> {
        let path = docs_dir.join(PYDOCMD_CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            GendocsError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| GendocsError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document is a null value
        let value: Option<Self> = serde_yaml::from_str(content)?;
        Ok(value.unwrap_or_default())
    }
}

/// Quotes a configured directory, or `None` when absent
pub struct DisplayDir<'a>(pub &'a Option<String>);

impl fmt::Display for DisplayDir<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dir) => write!(f, "'{}'", dir),
            None => write!(f, "None"),
        }
    }
}
