//! `waymark init`: prepare a data root.
//!
//! ```text
//! <root>/
//! └── waymark.toml     # default settings, never overwritten
//! ```
//!
//! Projects are added later by `waymark create`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::waymark_config::{CONFIG_FILE, WaymarkToml};

/// Result of initializing a data root.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the data root
    pub root: PathBuf,
    /// Whether the root was newly created (false if it already existed)
    pub created: bool,
    /// Whether a default waymark.toml was written
    pub wrote_config: bool,
}

/// Create the data root and a default `waymark.toml` if missing.
///
/// Safe to run repeatedly: existing settings and projects are left alone.
pub fn init_root(root: &Path) -> Result<InitResult> {
    let created = !root.exists();
    std::fs::create_dir_all(root)
        .with_context(|| format!("Failed to create data root: {}", root.display()))?;

    let config_path = root.join(CONFIG_FILE);
    let wrote_config = if config_path.exists() {
        false
    } else {
        WaymarkToml::default().save(&config_path)?;
        true
    };

    Ok(InitResult {
        root: root.to_path_buf(),
        created,
        wrote_config,
    })
}

/// Check if a data root has been initialized.
pub fn is_initialized(root: &Path) -> bool {
    root.join(CONFIG_FILE).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_root_creates_root_and_config() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("brains");
        let result = init_root(&root).unwrap();

        assert!(result.created);
        assert!(result.wrote_config);
        assert_eq!(result.root, root);
        assert!(is_initialized(&root));

        let toml = WaymarkToml::load(&root.join(CONFIG_FILE)).unwrap();
        assert_eq!(toml.commit.summary_max_len, 72);
    }

    #[test]
    fn test_init_root_twice_keeps_existing_config() {
        let dir = tempdir().unwrap();
        init_root(dir.path()).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[commit]\npush = true\n").unwrap();

        let again = init_root(dir.path()).unwrap();
        assert!(!again.created);
        assert!(!again.wrote_config);
        let content = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "[commit]\npush = true\n");
    }

    #[test]
    fn test_is_initialized_false_for_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(!is_initialized(dir.path()));
    }
}
