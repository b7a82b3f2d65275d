//! Caller-facing facade over the stores, the sequencer and the read side.
//!
//! Every operation takes the project name explicitly; there is no notion of
//! a selected or active project. Front ends (the CLI here) call only into
//! [`Orchestrator`].

use std::fs;
use std::io::ErrorKind;
use tracing::{info, warn};

use crate::brain::{BrainStore, ProjectBrain};
use crate::checkpoint::{
    Checkpoint, CheckpointSeed, CheckpointSequencer, CheckpointStore, ProjectLock,
};
use crate::commit::{CommitMessage, CommitMessageBuilder, PublishOptions, PublishOutcome};
use crate::config::{Config, validate_project_name};
use crate::errors::{Result, WaymarkError};
use crate::status::{HistoryEntry, ProjectStatus, StatusResolver};
use crate::tracker::VersionControlGateway;

#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: Config,
    brains: BrainStore,
    checkpoints: CheckpointStore,
    sequencer: CheckpointSequencer,
    resolver: StatusResolver,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            brains: BrainStore::new(&config),
            checkpoints: CheckpointStore::new(&config),
            sequencer: CheckpointSequencer::new(&config),
            resolver: StatusResolver::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names of the projects under the root that have a Brain, sorted.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.config.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WaymarkError::io(&self.config.root, e)),
        };

        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WaymarkError::io(&self.config.root, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_project_name(&name).is_ok() && self.brains.exists(&name) {
                projects.push(name);
            }
        }
        projects.sort();
        Ok(projects)
    }

    /// Bootstrap a project from an initial Brain and the seed of checkpoint #1.
    ///
    /// Everything is validated before the project directory is created. The
    /// seed is finalized through the normal sequencer rules, so it needs at
    /// least one next step. If any later step fails the directory is removed
    /// again and the project does not exist.
    pub fn create_project(
        &self,
        name: &str,
        brain: &ProjectBrain,
        seed: &CheckpointSeed,
    ) -> Result<Checkpoint> {
        validate_project_name(name)?;
        if brain.project_name != name {
            return Err(WaymarkError::Validation(format!(
                "project name mismatch: creating '{}' but the brain names '{}'",
                name, brain.project_name
            )));
        }
        brain.validate()?;
        if let Some(seed_project) = &seed.project
            && seed_project != name
        {
            return Err(WaymarkError::Validation(format!(
                "project name mismatch: creating '{}' but the initial checkpoint names '{}'",
                name, seed_project
            )));
        }

        let mut draft = Checkpoint::draft(name);
        for work in &seed.work_completed {
            self.sequencer.append_work(&mut draft, work)?;
        }
        for decision in &seed.key_decisions {
            self.sequencer.append_decision(&mut draft, decision)?;
        }
        for step in &seed.next_steps {
            self.sequencer.append_next_step(&mut draft, step)?;
        }
        if let Some(goal) = seed.effective_next_goal() {
            self.sequencer.set_next_goal(&mut draft, goal)?;
        }
        self.sequencer.validate_draft(&draft)?;

        self.config.ensure_root()?;
        let project_dir = self.config.project_dir(name);
        match fs::create_dir(&project_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(WaymarkError::ProjectExists {
                    project: name.to_string(),
                });
            }
            Err(e) => return Err(WaymarkError::io(&project_dir, e)),
        }

        let created = (|| -> Result<Checkpoint> {
            let lock = ProjectLock::acquire(
                &self.config.lock_file(name),
                name,
                self.config.lock_timeout,
            )?;
            self.brains.save(name, brain)?;
            self.sequencer.finalize_held(&mut draft, &lock)
        })();

        match created {
            Ok(checkpoint) => {
                info!(project = name, "created project");
                Ok(checkpoint)
            }
            Err(e) => {
                warn!(
                    project = name,
                    "project creation failed, removing {}",
                    project_dir.display()
                );
                fs::remove_dir_all(&project_dir).ok();
                Err(e)
            }
        }
    }

    pub fn load_brain(&self, project: &str) -> Result<ProjectBrain> {
        self.brains.load(project)
    }

    /// Load, modify and rewrite the Brain as a whole under the project lock.
    ///
    /// `project_name` cannot be changed. Returns the Brain as stored.
    pub fn update_brain<F>(&self, project: &str, update: F) -> Result<ProjectBrain>
    where
        F: FnOnce(&mut ProjectBrain) -> Result<()>,
    {
        validate_project_name(project)?;
        if !self.config.project_dir(project).is_dir() {
            return Err(WaymarkError::NotFound {
                project: project.to_string(),
            });
        }

        let _lock = ProjectLock::acquire(
            &self.config.lock_file(project),
            project,
            self.config.lock_timeout,
        )?;
        let mut brain = self.brains.load(project)?;
        update(&mut brain)?;
        if brain.project_name != project {
            return Err(WaymarkError::Validation(
                "project_name cannot be changed".to_string(),
            ));
        }
        self.brains.save(project, &brain)
    }

    pub fn open_draft(&self, project: &str) -> Result<Checkpoint> {
        self.sequencer.open_draft(project)
    }

    pub fn append_work(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        self.sequencer.append_work(draft, text)
    }

    pub fn append_decision(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        self.sequencer.append_decision(draft, text)
    }

    pub fn append_next_step(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        self.sequencer.append_next_step(draft, text)
    }

    pub fn set_next_goal(&self, draft: &mut Checkpoint, text: &str) -> Result<()> {
        self.sequencer.set_next_goal(draft, text)
    }

    pub fn finalize(&self, draft: &mut Checkpoint) -> Result<Checkpoint> {
        self.sequencer.finalize(draft)
    }

    pub fn discard(&self, draft: Checkpoint) {
        self.sequencer.discard(draft)
    }

    pub fn status(&self, project: &str) -> Result<ProjectStatus> {
        self.resolver.resolve(project)
    }

    /// Truncated history; `limit` defaults to `[status] history_limit`.
    pub fn history(&self, project: &str, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        self.resolver
            .history(project, limit.unwrap_or(self.config.history_limit))
    }

    /// A finalized checkpoint by number, or the latest one.
    pub fn checkpoint(&self, project: &str, sequence_number: Option<u64>) -> Result<Checkpoint> {
        match sequence_number {
            Some(n) => self.checkpoints.get(project, n),
            None => self.checkpoints.latest(project)?.ok_or_else(|| {
                WaymarkError::Validation(format!("project '{}' has no checkpoints yet", project))
            }),
        }
    }

    pub fn list_checkpoints(&self, project: &str) -> Result<Vec<Checkpoint>> {
        self.checkpoints.list_finalized(project)
    }

    pub fn commit_message(&self, checkpoint: &Checkpoint) -> Result<CommitMessage> {
        CommitMessageBuilder::new(self.config.summary_max_len).build(checkpoint)
    }

    pub fn publish<G>(
        &self,
        gateway: &mut G,
        checkpoint: &Checkpoint,
        options: &PublishOptions,
    ) -> Result<PublishOutcome>
    where
        G: VersionControlGateway + ?Sized,
    {
        crate::commit::publish(&self.config, gateway, checkpoint, options)
    }
}
