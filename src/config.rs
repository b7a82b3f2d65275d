use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::WaymarkError;
use crate::waymark_config::{CONFIG_FILE, WaymarkToml};

/// Default data root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "brains";

pub const BRAIN_FILE: &str = "brain.json";
pub const CHECKPOINTS_DIR: &str = "checkpoints";
pub const LOCK_FILE: &str = ".lock";

const MAX_PROJECT_NAME_LEN: usize = 64;

/// Runtime configuration for one data root.
///
/// Bridges `waymark.toml` with the environment and CLI, and owns the
/// on-disk layout: every path the stores touch is derived here.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub lock_timeout: Duration,
    pub summary_max_len: usize,
    pub history_limit: usize,
    pub remote: String,
    pub branch: Option<String>,
    pub push: bool,
    pub verbose: bool,
    toml: WaymarkToml,
}

impl Config {
    /// Build a config for `root`, reading `<root>/waymark.toml` when present.
    ///
    /// The root does not have to exist yet; `waymark init` creates it.
    pub fn new(root: PathBuf, verbose: bool) -> Result<Self> {
        let toml = WaymarkToml::load_or_default(&root)?;
        Ok(Self::from_toml(root, toml, verbose))
    }

    /// Resolve the root from CLI → `WAYMARK_ROOT` → `./brains`.
    pub fn resolve_root(cli_root: Option<PathBuf>, cwd: &Path) -> PathBuf {
        let root = cli_root
            .or_else(|| std::env::var_os("WAYMARK_ROOT").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
        if root.is_absolute() {
            root
        } else {
            cwd.join(root)
        }
    }

    pub fn from_toml(root: PathBuf, toml: WaymarkToml, verbose: bool) -> Self {
        Self {
            lock_timeout: Duration::from_millis(toml.lock_timeout_ms()),
            summary_max_len: toml.commit.summary_max_len,
            history_limit: toml.status.history_limit,
            remote: toml.commit.remote.clone(),
            branch: toml.commit.branch.clone(),
            push: toml.commit.push,
            verbose,
            root,
            toml,
        }
    }

    pub fn toml(&self) -> &WaymarkToml {
        &self.toml
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    pub fn brain_file(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(BRAIN_FILE)
    }

    pub fn checkpoints_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(CHECKPOINTS_DIR)
    }

    pub fn checkpoint_file(&self, project: &str, sequence_number: u64) -> PathBuf {
        self.checkpoints_dir(project)
            .join(checkpoint_file_name(sequence_number))
    }

    pub fn lock_file(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(LOCK_FILE)
    }

    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data root: {}", self.root.display()))
    }
}

/// File name of a finalized checkpoint; zero-padded so lexical order matches.
pub fn checkpoint_file_name(sequence_number: u64) -> String {
    format!("checkpoint-{:06}.yaml", sequence_number)
}

/// Parse the sequence number back out of a checkpoint file name.
///
/// Only the canonical spelling of a number from 1 up counts:
/// `checkpoint-1.yaml` or `checkpoint-+00001.yaml` are not checkpoint files.
pub fn parse_checkpoint_file_name(name: &str) -> Option<u64> {
    let sequence_number: u64 = name
        .strip_prefix("checkpoint-")?
        .strip_suffix(".yaml")?
        .parse()
        .ok()?;
    (sequence_number > 0 && checkpoint_file_name(sequence_number) == name)
        .then_some(sequence_number)
}

/// Project names are path components; keep them to a safe alphabet.
pub fn validate_project_name(name: &str) -> Result<(), WaymarkError> {
    if name.is_empty() {
        return Err(WaymarkError::Validation(
            "project_name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_PROJECT_NAME_LEN {
        return Err(WaymarkError::Validation(format!(
            "project_name '{}' is longer than {} characters",
            name, MAX_PROJECT_NAME_LEN
        )));
    }
    if name.starts_with('.') {
        return Err(WaymarkError::Validation(format!(
            "project_name '{}' must not start with '.'",
            name
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(WaymarkError::Validation(format!(
            "project_name '{}' contains invalid character '{}'",
            name, bad
        )));
    }
    Ok(())
}
