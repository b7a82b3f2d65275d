//! Settings file for a waymark data root.
//!
//! Reads `<root>/waymark.toml`. Every key is optional; a missing file means
//! all defaults. Layering is file → environment → CLI, with the runtime
//! merge done in [`crate::config::Config`].
//!
//! # Configuration File Format
//!
//! ```toml
//! [storage]
//! lock_timeout_ms = 5000
//!
//! [commit]
//! summary_max_len = 72
//! remote = "origin"
//! branch = "main"
//! push = false
//!
//! [status]
//! history_limit = 5
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the settings file inside the data root.
pub const CONFIG_FILE: &str = "waymark.toml";

/// Storage and locking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// How long a mutating operation waits for the project lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Commit message and publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSection {
    /// Maximum length of the summary line, ellipsis included
    #[serde(default = "default_summary_max_len")]
    pub summary_max_len: usize,
    /// Remote to push to
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Branch to push; the current branch when unset
    #[serde(default)]
    pub branch: Option<String>,
    /// Push after every commit
    #[serde(default)]
    pub push: bool,
}

fn default_summary_max_len() -> usize {
    72
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for CommitSection {
    fn default() -> Self {
        Self {
            summary_max_len: default_summary_max_len(),
            remote: default_remote(),
            branch: None,
            push: false,
        }
    }
}

/// Read-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSection {
    /// Number of checkpoints returned by `history`
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    5
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// The complete waymark.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaymarkToml {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub commit: CommitSection,
    #[serde(default)]
    pub status: StatusSection,
}

impl WaymarkToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse waymark.toml")
    }

    /// Load `<root>/waymark.toml`, or defaults when the file is absent.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize waymark.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Lock timeout, with `WAYMARK_LOCK_TIMEOUT_MS` overriding the file.
    pub fn lock_timeout_ms(&self) -> u64 {
        std::env::var("WAYMARK_LOCK_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.storage.lock_timeout_ms)
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.storage.lock_timeout_ms == 0 {
            warnings.push(
                "lock_timeout_ms is 0: every contended operation will fail with Busy".to_string(),
            );
        }
        if self.commit.summary_max_len < 8 {
            warnings.push(format!(
                "summary_max_len {} is too small: should be at least 8",
                self.commit.summary_max_len
            ));
        }
        if self.commit.remote.trim().is_empty() {
            warnings.push("remote is empty: push will fail".to_string());
        }
        if let Some(branch) = &self.commit.branch
            && branch.trim().is_empty()
        {
            warnings.push("branch is set but empty".to_string());
        }

        warnings
    }
}
