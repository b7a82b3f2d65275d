use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

use super::Checkpoint;
use crate::config::{Config, parse_checkpoint_file_name, validate_project_name};
use crate::errors::{Result, WaymarkError};
use crate::util::write_temp_sibling;

/// Write-once storage for finalized checkpoints, one YAML file per
/// `(project, sequence_number)`.
///
/// There is deliberately no update or delete. Every read re-verifies the
/// record (status, project, number and content hash).
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    config: Config,
}

impl CheckpointStore {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn path(&self, project: &str, sequence_number: u64) -> PathBuf {
        self.config.checkpoint_file(project, sequence_number)
    }

    /// Sequence numbers present on disk, ascending. Names only; no content
    /// is read.
    pub fn sequence_numbers(&self, project: &str) -> Result<Vec<u64>> {
        validate_project_name(project)?;
        if !self.config.project_dir(project).is_dir() {
            return Err(WaymarkError::NotFound {
                project: project.to_string(),
            });
        }

        let dir = self.config.checkpoints_dir(project);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/checkpoint-*.yaml",
            glob::Pattern::escape(&dir.to_string_lossy())
        );
        let entries = glob::glob(&pattern).map_err(|e| {
            WaymarkError::Other(anyhow::anyhow!("Invalid checkpoint glob pattern: {}", e))
        })?;

        let mut numbers = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                WaymarkError::io(path, e.into_error())
            })?;
            if let Some(n) = path
                .file_name()
                .and_then(|name| parse_checkpoint_file_name(&name.to_string_lossy()))
            {
                numbers.push(n);
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Highest finalized sequence number, 0 when none exist.
    pub fn highest_sequence(&self, project: &str) -> Result<u64> {
        Ok(self
            .sequence_numbers(project)?
            .last()
            .copied()
            .unwrap_or(0))
    }

    /// All finalized checkpoints, ordered by sequence number.
    pub fn list_finalized(&self, project: &str) -> Result<Vec<Checkpoint>> {
        self.sequence_numbers(project)?
            .into_iter()
            .map(|n| self.read(project, n))
            .collect()
    }

    pub fn latest(&self, project: &str) -> Result<Option<Checkpoint>> {
        match self.sequence_numbers(project)?.last() {
            Some(&n) => self.read(project, n).map(Some),
            None => Ok(None),
        }
    }

    pub fn get(&self, project: &str, sequence_number: u64) -> Result<Checkpoint> {
        validate_project_name(project)?;
        if !self.config.project_dir(project).is_dir() {
            return Err(WaymarkError::NotFound {
                project: project.to_string(),
            });
        }
        self.read(project, sequence_number)
    }

    fn read(&self, project: &str, sequence_number: u64) -> Result<Checkpoint> {
        let path = self.path(project, sequence_number);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WaymarkError::CheckpointNotFound {
                    project: project.to_string(),
                    sequence_number,
                });
            }
            Err(e) => return Err(WaymarkError::io(&path, e)),
        };

        let checkpoint: Checkpoint = serde_yaml::from_str(&content).map_err(|e| {
            WaymarkError::Validation(format!(
                "invalid checkpoint file {}: {}",
                path.display(),
                e
            ))
        })?;
        checkpoint.verify_persisted(project, sequence_number)?;

        debug!(project, sequence_number, "read checkpoint");
        Ok(checkpoint)
    }

    /// Write a finalized checkpoint under its sequence number.
    ///
    /// The file appears atomically and is never overwritten: if the number
    /// is already taken the call fails with `SequenceConflict` and nothing
    /// on disk changes. Returns the path of the new file.
    pub fn persist(&self, project: &str, checkpoint: &Checkpoint) -> Result<PathBuf> {
        validate_project_name(project)?;
        let sequence_number = checkpoint.sequence_number().ok_or(WaymarkError::NotFinalized)?;
        if !checkpoint.is_finalized() {
            return Err(WaymarkError::NotFinalized);
        }
        checkpoint.verify_persisted(project, sequence_number)?;

        if !self.config.project_dir(project).is_dir() {
            return Err(WaymarkError::NotFound {
                project: project.to_string(),
            });
        }
        let dir = self.config.checkpoints_dir(project);
        fs::create_dir_all(&dir).map_err(|e| WaymarkError::io(&dir, e))?;

        let yaml = serde_yaml::to_string(checkpoint).map_err(|e| {
            WaymarkError::Other(anyhow::anyhow!("Failed to serialize checkpoint: {}", e))
        })?;

        let path = self.path(project, sequence_number);
        let tmp =
            write_temp_sibling(&path, yaml.as_bytes()).map_err(|e| WaymarkError::io(&path, e))?;
        let linked = fs::hard_link(&tmp, &path);
        fs::remove_file(&tmp).ok();

        match linked {
            Ok(()) => {
                info!(project, sequence_number, "persisted checkpoint");
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(WaymarkError::SequenceConflict {
                project: project.to_string(),
                sequence_number,
            }),
            Err(e) => Err(WaymarkError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waymark_config::WaymarkToml;
    use chrono::Utc;
    use tempfile::tempdir;

    fn setup() -> (CheckpointStore, Config, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = Config::from_toml(dir.path().to_path_buf(), WaymarkToml::default(), false);
        fs::create_dir_all(config.project_dir("demo")).unwrap();
        (CheckpointStore::new(&config), config, dir)
    }

    fn finalized(seq: u64, next: &str) -> Checkpoint {
        let mut draft = Checkpoint::draft("demo");
        draft.push_work(&format!("work {}", seq)).unwrap();
        draft.push_next_step(next).unwrap();
        draft.to_finalized(seq, Utc::now()).unwrap()
    }

    #[test]
    fn test_empty_project_has_no_checkpoints() {
        let (store, _config, _dir) = setup();
        assert!(store.list_finalized("demo").unwrap().is_empty());
        assert!(store.latest("demo").unwrap().is_none());
        assert_eq!(store.highest_sequence("demo").unwrap(), 0);
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let (store, _config, _dir) = setup();
        assert!(matches!(
            store.list_finalized("ghost"),
            Err(WaymarkError::NotFound { .. })
        ));
        assert!(matches!(
            store.get("ghost", 1),
            Err(WaymarkError::NotFound { .. })
        ));
    }

    #[test]
    fn test_persist_and_read_back_identical() {
        let (store, _config, _dir) = setup();
        let cp = finalized(1, "Add tests");
        let path = store.persist("demo", &cp).unwrap();
        assert!(path.ends_with("checkpoints/checkpoint-000001.yaml"));

        let back = store.get("demo", 1).unwrap();
        assert_eq!(back, cp);
        assert_eq!(store.latest("demo").unwrap(), Some(cp));
    }

    #[test]
    fn test_persist_same_number_is_sequence_conflict() {
        let (store, _config, _dir) = setup();
        let first = finalized(1, "first");
        store.persist("demo", &first).unwrap();

        let err = store.persist("demo", &finalized(1, "second")).unwrap_err();
        assert!(matches!(
            err,
            WaymarkError::SequenceConflict { sequence_number: 1, .. }
        ));
        assert_eq!(store.get("demo", 1).unwrap(), first);
    }

    #[test]
    fn test_persist_rejects_draft() {
        let (store, _config, _dir) = setup();
        let draft = Checkpoint::draft("demo");
        assert!(matches!(
            store.persist("demo", &draft),
            Err(WaymarkError::NotFinalized)
        ));
    }

    #[test]
    fn test_persist_rejects_foreign_project() {
        let (store, config, _dir) = setup();
        fs::create_dir_all(config.project_dir("other")).unwrap();
        assert!(matches!(
            store.persist("other", &finalized(1, "x")),
            Err(WaymarkError::Validation(_))
        ));
    }

    #[test]
    fn test_list_sorted_numerically() {
        let (store, config, _dir) = setup();
        for seq in [2, 10, 1, 3] {
            store.persist("demo", &finalized(seq, "next")).unwrap();
        }
        // stray files are ignored, including non-canonical spellings of a number
        let dir = config.checkpoints_dir("demo");
        fs::write(dir.join("notes.yaml"), "x").unwrap();
        fs::copy(dir.join("checkpoint-000001.yaml"), dir.join("checkpoint-1.yaml")).unwrap();
        fs::copy(dir.join("checkpoint-000010.yaml"), dir.join("checkpoint-11.yaml")).unwrap();

        let seqs: Vec<u64> = store
            .list_finalized("demo")
            .unwrap()
            .iter()
            .filter_map(|c| c.sequence_number())
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 10]);
        assert_eq!(store.sequence_numbers("demo").unwrap(), vec![1, 2, 3, 10]);
        assert_eq!(store.highest_sequence("demo").unwrap(), 10);
    }

    #[test]
    fn test_missing_checkpoint_is_checkpoint_not_found() {
        let (store, _config, _dir) = setup();
        assert!(matches!(
            store.get("demo", 4),
            Err(WaymarkError::CheckpointNotFound { sequence_number: 4, .. })
        ));
    }

    #[test]
    fn test_tampered_file_is_rejected() {
        let (store, _config, _dir) = setup();
        let path = store.persist("demo", &finalized(1, "Add tests")).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("Add tests", "Skip tests")).unwrap();

        let err = store.get("demo", 1).unwrap_err();
        assert!(err.to_string().contains("content hash mismatch"));
    }

    #[test]
    fn test_renamed_file_is_rejected() {
        let (store, _config, _dir) = setup();
        let path = store.persist("demo", &finalized(1, "x")).unwrap();
        fs::rename(&path, store.path("demo", 2)).unwrap();
        assert!(matches!(
            store.list_finalized("demo"),
            Err(WaymarkError::Validation(_))
        ));
    }

    #[test]
    fn test_persist_leaves_no_temp_files() {
        let (store, config, _dir) = setup();
        store.persist("demo", &finalized(1, "x")).unwrap();
        let _ = store.persist("demo", &finalized(1, "y"));
        let names: Vec<String> = fs::read_dir(config.checkpoints_dir("demo"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["checkpoint-000001.yaml".to_string()]);
    }
}
