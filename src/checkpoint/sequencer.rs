use chrono::Utc;
use tracing::{debug, info};

use super::{Checkpoint, CheckpointStore, ProjectLock};
use crate::brain::BrainStore;
use crate::config::{Config, validate_project_name};
use crate::errors::{Result, WaymarkError};

/// Drives a checkpoint from `Draft` to `Finalized`.
///
/// Drafts live only in memory. The only transitions are `Draft -> Finalized`
/// ([`finalize`](Self::finalize)) and `Draft -> discarded`
/// ([`discard`](Self::discard)); a finalized record is never reopened.
#[derive(Debug, Clone)]
pub struct CheckpointSequencer {
    config: Config,
    store: CheckpointStore,
    brains: BrainStore,
}

impl CheckpointSequencer {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            store: CheckpointStore::new(config),
            brains: BrainStore::new(config),
        }
    }

    /// Start an empty draft for an existing project.
    pub fn open_draft(&self, project: &str) -> Result<Checkpoint> {
        validate_project_name(project)?;
        if !self.brains.exists(project) {
            return Err(WaymarkError::NotFound {
                project: project.to_string(),
            });
        }
        debug!(project, "opened checkpoint draft");
        Ok(Checkpoint::draft(project))
    }

    pub fn append_work(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        ensure_draft(draft)?;
        draft.push_work(text)
    }

    pub fn append_decision(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        ensure_draft(draft)?;
        draft.push_decision(text)
    }

    pub fn append_next_step(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        ensure_draft(draft)?;
        draft.push_next_step(text)
    }

    pub fn set_next_goal(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        ensure_draft(draft)?;
        draft.set_next_goal(text)
    }

    /// Check a draft could be finalized, without touching disk.
    pub fn validate_draft(&self, draft: &Checkpoint) -> Result<()> {
        check_ready(draft)
    }

    /// Abandon a draft. Nothing was persisted, so nothing is left behind.
    pub fn discard(&self, draft: Checkpoint) {
        debug!(project = draft.project(), "discarded checkpoint draft");
    }

    /// Finalize a draft under the project lock.
    ///
    /// Assigns `highest + 1`, stamps `created_at`, hashes and persists. On
    /// success the draft is replaced by the finalized record, so finalizing
    /// it again fails with `AlreadyFinalized`. On any failure the draft is
    /// unchanged and no file is written. A `SequenceConflict` is returned as
    /// is; the caller retries, which recomputes the number.
    pub fn finalize(&self, draft: &mut Checkpoint) -> Result<Checkpoint> {
        check_ready(draft)?;

        let project = draft.project().to_string();
        if !self.config.project_dir(&project).is_dir() {
            return Err(WaymarkError::NotFound { project });
        }

        let lock = ProjectLock::acquire(
            &self.config.lock_file(&project),
            &project,
            self.config.lock_timeout,
        )?;
        self.finalize_held(draft, &lock)
    }

    /// Finalize while the caller already holds the project lock.
    pub(crate) fn finalize_held(
        &self,
        draft: &mut Checkpoint,
        lock: &ProjectLock,
    ) -> Result<Checkpoint> {
        check_ready(draft)?;
        let project = draft.project();
        if lock.project() != project {
            return Err(WaymarkError::Validation(format!(
                "lock for project '{}' cannot finalize a checkpoint of '{}'",
                lock.project(),
                project
            )));
        }

        let sequence_number = self.store.highest_sequence(project)? + 1;
        let finalized = draft.to_finalized(sequence_number, Utc::now())?;
        self.store.persist(project, &finalized)?;

        info!(project, sequence_number, "finalized checkpoint");
        *draft = finalized.clone();
        Ok(finalized)
    }
}

fn ensure_draft(checkpoint: &Checkpoint) -> Result<()> {
    if checkpoint.is_finalized() {
        return Err(WaymarkError::AlreadyFinalized {
            sequence_number: checkpoint.sequence_number().unwrap_or_default(),
        });
    }
    Ok(())
}

fn check_ready(draft: &Checkpoint) -> Result<()> {
    ensure_draft(draft)?;
    if draft.is_empty() {
        return Err(WaymarkError::EmptyCheckpoint);
    }
    if draft.next_steps().is_empty() {
        return Err(WaymarkError::MissingNextSteps);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ProjectBrain;
    use crate::waymark_config::WaymarkToml;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn setup() -> (CheckpointSequencer, Config, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = Config::from_toml(dir.path().to_path_buf(), WaymarkToml::default(), false);
        config.lock_timeout = Duration::from_secs(10);
        fs::create_dir_all(config.project_dir("demo")).unwrap();
        BrainStore::new(&config)
            .save("demo", &ProjectBrain::new("demo", vec!["Ship v1".into()]))
            .unwrap();
        (CheckpointSequencer::new(&config), config, dir)
    }

    fn ready_draft(seq: &CheckpointSequencer) -> Checkpoint {
        let mut draft = seq.open_draft("demo").unwrap();
        seq.append_work(&mut draft, "Wrote parser").unwrap();
        seq.append_decision(&mut draft, "Use recursive descent").unwrap();
        seq.append_next_step(&mut draft, "Add tests").unwrap();
        seq.append_next_step(&mut draft, "Write docs").unwrap();
        draft
    }

    #[test]
    fn test_open_draft_unknown_project() {
        let (seq, _config, _dir) = setup();
        assert!(matches!(
            seq.open_draft("ghost"),
            Err(WaymarkError::NotFound { .. })
        ));
        assert!(matches!(
            seq.open_draft("bad name"),
            Err(WaymarkError::Validation(_))
        ));
    }

    #[test]
    fn test_first_finalize_is_number_one() {
        let (seq, config, _dir) = setup();
        let mut draft = ready_draft(&seq);
        let finalized = seq.finalize(&mut draft).unwrap();

        assert_eq!(finalized.sequence_number(), Some(1));
        assert!(finalized.created_at().is_some());
        assert_eq!(draft, finalized);
        assert!(config.checkpoint_file("demo", 1).is_file());
    }

    #[test]
    fn test_numbers_increase_without_gaps() {
        let (seq, _config, _dir) = setup();
        for expected in 1..=4 {
            let mut draft = ready_draft(&seq);
            assert_eq!(
                seq.finalize(&mut draft).unwrap().sequence_number(),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_refinalize_is_already_finalized() {
        let (seq, _config, _dir) = setup();
        let mut draft = ready_draft(&seq);
        seq.finalize(&mut draft).unwrap();

        assert!(matches!(
            seq.finalize(&mut draft),
            Err(WaymarkError::AlreadyFinalized { sequence_number: 1 })
        ));
        assert!(matches!(
            seq.append_work(&mut draft, "sneaky edit"),
            Err(WaymarkError::AlreadyFinalized { .. })
        ));
        assert_eq!(draft.work_completed(), ["Wrote parser"]);
    }

    #[test]
    fn test_empty_draft_is_empty_checkpoint() {
        let (seq, config, _dir) = setup();
        let mut draft = seq.open_draft("demo").unwrap();
        assert!(matches!(
            seq.finalize(&mut draft),
            Err(WaymarkError::EmptyCheckpoint)
        ));
        assert!(!config.checkpoints_dir("demo").exists());
    }

    #[test]
    fn test_missing_next_steps_regardless_of_content() {
        let (seq, _config, _dir) = setup();
        let mut draft = seq.open_draft("demo").unwrap();
        seq.append_work(&mut draft, "Wrote parser").unwrap();
        seq.append_decision(&mut draft, "Use recursive descent").unwrap();

        let before = draft.clone();
        assert!(matches!(
            seq.finalize(&mut draft),
            Err(WaymarkError::MissingNextSteps)
        ));
        assert_eq!(draft, before);
    }

    #[test]
    fn test_busy_when_lock_held() {
        let (seq, mut config, _dir) = setup();
        config.lock_timeout = Duration::from_millis(50);
        let impatient = CheckpointSequencer::new(&config);

        let _held =
            ProjectLock::acquire(&config.lock_file("demo"), "demo", Duration::ZERO).unwrap();
        let mut draft = ready_draft(&seq);
        let err = impatient.finalize(&mut draft).unwrap_err();
        assert!(matches!(err, WaymarkError::Busy { .. }));
        assert!(err.is_retryable());
        assert!(!draft.is_finalized());
    }

    #[test]
    fn test_finalize_counts_records_written_by_others() {
        let (seq, config, _dir) = setup();
        let store = CheckpointStore::new(&config);
        let lock = ProjectLock::acquire(&config.lock_file("demo"), "demo", Duration::ZERO).unwrap();

        // a writer that bypassed the lock already took number 1
        let other = ready_draft(&seq).to_finalized(1, Utc::now()).unwrap();
        store.persist("demo", &other).unwrap();

        let mut draft = ready_draft(&seq);
        let finalized = seq.finalize_held(&mut draft, &lock).unwrap();
        assert_eq!(finalized.sequence_number(), Some(2));
    }

    #[test]
    fn test_finalize_held_rejects_foreign_lock() {
        let (seq, config, _dir) = setup();
        let lock =
            ProjectLock::acquire(&config.lock_file("demo"), "other", Duration::ZERO).unwrap();
        let mut draft = ready_draft(&seq);
        assert!(matches!(
            seq.finalize_held(&mut draft, &lock),
            Err(WaymarkError::Validation(_))
        ));
    }

    #[test]
    fn test_discard_leaves_no_trace() {
        let (seq, config, _dir) = setup();
        let draft = ready_draft(&seq);
        seq.discard(draft);
        assert!(!config.checkpoints_dir("demo").exists());
        assert_eq!(CheckpointStore::new(&config).highest_sequence("demo").unwrap(), 0);
    }

    #[test]
    fn test_concurrent_finalize_assigns_distinct_numbers() {
        let (seq, config, _dir) = setup();
        let seq = Arc::new(seq);
        let writers = 8;

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || {
                    let mut draft = seq.open_draft("demo").unwrap();
                    seq.append_work(&mut draft, &format!("writer {}", i)).unwrap();
                    seq.append_next_step(&mut draft, "continue").unwrap();
                    seq.finalize(&mut draft).unwrap().sequence_number().unwrap()
                })
            })
            .collect();

        let numbers: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(numbers, (1..=writers).collect::<HashSet<u64>>());

        let listed: Vec<u64> = CheckpointStore::new(&config)
            .list_finalized("demo")
            .unwrap()
            .iter()
            .filter_map(|c| c.sequence_number())
            .collect();
        assert_eq!(listed, (1..=writers).collect::<Vec<u64>>());
    }
}
