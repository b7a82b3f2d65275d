//! Read-side reductions over a project's Brain and checkpoint log.
//!
//! Nothing here writes to disk; status and history are recomputed from the
//! stored records on every call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::brain::BrainStore;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::Config;
use crate::errors::{Result, WaymarkError};
use crate::util::single_line;

/// Shown in place of the next task before the first checkpoint exists.
pub const NO_CHECKPOINTS_YET: &str = "no checkpoints yet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "task")]
pub enum NextTask {
    Task(String),
    NoCheckpointsYet,
}

impl NextTask {
    pub fn as_task(&self) -> Option<&str> {
        match self {
            NextTask::Task(task) => Some(task),
            NextTask::NoCheckpointsYet => None,
        }
    }
}

impl fmt::Display for NextTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextTask::Task(task) => write!(f, "{}", task),
            NextTask::NoCheckpointsYet => write!(f, "{}", NO_CHECKPOINTS_YET),
        }
    }
}

/// Current status of a project: Brain joined with its latest checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStatus {
    pub project: String,
    pub primary_goal: String,
    pub immediate_next_task: NextTask,
    pub pending_steps: Vec<String>,
    pub next_goal: Option<String>,
    pub latest_sequence: Option<u64>,
    pub objectives: Vec<String>,
}

/// One line of truncated history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub sequence_number: u64,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub next_task: Option<String>,
}

impl HistoryEntry {
    fn from_checkpoint(checkpoint: &Checkpoint) -> Option<Self> {
        Some(Self {
            sequence_number: checkpoint.sequence_number()?,
            created_at: checkpoint.created_at()?,
            summary: checkpoint
                .work_completed()
                .first()
                .map(|w| single_line(w))
                .unwrap_or_default(),
            next_task: checkpoint.immediate_next_task().map(str::to_string),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StatusResolver {
    brains: BrainStore,
    checkpoints: CheckpointStore,
}

impl StatusResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            brains: BrainStore::new(config),
            checkpoints: CheckpointStore::new(config),
        }
    }

    /// Primary goal from the Brain, next task and pending steps from the
    /// latest finalized checkpoint.
    pub fn resolve(&self, project: &str) -> Result<ProjectStatus> {
        let brain = self.brains.load(project)?;
        let primary_goal = brain
            .primary_goal()
            .ok_or_else(|| WaymarkError::NoObjectives {
                project: project.to_string(),
            })?
            .to_string();

        let latest = self.checkpoints.latest(project)?;
        let status = match latest {
            Some(checkpoint) => ProjectStatus {
                project: project.to_string(),
                primary_goal,
                immediate_next_task: checkpoint
                    .immediate_next_task()
                    .map(|t| NextTask::Task(t.to_string()))
                    .unwrap_or(NextTask::NoCheckpointsYet),
                pending_steps: checkpoint.pending_steps().to_vec(),
                next_goal: checkpoint.next_goal().map(str::to_string),
                latest_sequence: checkpoint.sequence_number(),
                objectives: brain.objectives.clone(),
            },
            None => ProjectStatus {
                project: project.to_string(),
                primary_goal,
                immediate_next_task: NextTask::NoCheckpointsYet,
                pending_steps: Vec::new(),
                next_goal: None,
                latest_sequence: None,
                objectives: brain.objectives.clone(),
            },
        };
        Ok(status)
    }

    /// The last `limit` checkpoints, oldest first.
    pub fn history(&self, project: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let numbers = self.checkpoints.sequence_numbers(project)?;
        let skip = numbers.len().saturating_sub(limit);

        numbers[skip..]
            .iter()
            .map(|&n| {
                let checkpoint = self.checkpoints.get(project, n)?;
                HistoryEntry::from_checkpoint(&checkpoint).ok_or_else(|| {
                    WaymarkError::Validation(format!("checkpoint #{} is incomplete", n))
                })
            })
            .collect()
    }
}
