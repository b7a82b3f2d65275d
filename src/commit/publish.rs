use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::{CommitMessage, CommitMessageBuilder};
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::Config;
use crate::errors::{Result, WaymarkError};
use crate::tracker::{CommitId, VersionControlGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub push: bool,
    pub remote: String,
    /// Branch to push; the gateway's current branch when `None`
    pub branch: Option<String>,
}

impl PublishOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            push: config.push,
            remote: config.remote.clone(),
            branch: config.branch.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub commit_id: CommitId,
    pub message: CommitMessage,
    pub staged: Vec<PathBuf>,
    pub pushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_to: Option<String>,
}

/// Commit a finalized checkpoint (and the Brain) through `gateway`.
///
/// Stages exactly `brain.json` and the checkpoint's own file, commits with
/// the derived message and optionally pushes. The checkpoint must match its
/// stored record. Gateway failures are returned verbatim; nothing is retried.
pub fn publish<G>(
    config: &Config,
    gateway: &mut G,
    checkpoint: &Checkpoint,
    options: &PublishOptions,
) -> Result<PublishOutcome>
where
    G: VersionControlGateway + ?Sized,
{
    let message = CommitMessageBuilder::new(config.summary_max_len).build(checkpoint)?;
    let sequence_number = checkpoint.sequence_number().ok_or(WaymarkError::NotFinalized)?;
    let project = checkpoint.project();

    let stored = CheckpointStore::new(config).get(project, sequence_number)?;
    if stored != *checkpoint {
        return Err(WaymarkError::Validation(format!(
            "checkpoint #{} differs from the stored record",
            sequence_number
        )));
    }

    let staged = vec![
        config.brain_file(project),
        config.checkpoint_file(project, sequence_number),
    ];
    gateway.stage(&staged)?;
    let commit_id = gateway.commit(&message)?;
    info!(project, sequence_number, commit = %commit_id, "committed checkpoint");

    let mut pushed_to = None;
    if options.push {
        let branch = match &options.branch {
            Some(branch) => branch.clone(),
            None => gateway.current_branch()?.ok_or_else(|| {
                WaymarkError::VersionControl("cannot push: HEAD is not on a branch".to_string())
            })?,
        };
        gateway.push(&options.remote, &branch)?;
        pushed_to = Some(format!("{}/{}", options.remote, branch));
    }

    Ok(PublishOutcome {
        commit_id,
        message,
        staged,
        pushed: pushed_to.is_some(),
        pushed_to,
    })
}
