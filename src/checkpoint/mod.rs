//! Checkpoints: immutable, sequence-numbered records of finished work sessions.
//!
//! A [`Checkpoint`] starts as an in-memory `Draft` handed out by the
//! [`CheckpointSequencer`]. Finalizing assigns the next sequence number,
//! stamps `created_at`, freezes a content hash and persists it through the
//! [`CheckpointStore`]. Fields are private so a finalized record cannot be
//! edited through the public API.

pub mod lock;
pub mod sequencer;
pub mod store;

pub use lock::ProjectLock;
pub use sequencer::CheckpointSequencer;
pub use store::CheckpointStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{Result, WaymarkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointStatus {
    Draft,
    Finalized,
}

impl std::fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointStatus::Draft => write!(f, "draft"),
            CheckpointStatus::Finalized => write!(f, "finalized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequence_number: Option<u64>,
    status: CheckpointStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    work_completed: Vec<String>,
    #[serde(default)]
    key_decisions: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
}

/// The hashed subset of a checkpoint, in a fixed field order.
#[derive(Serialize)]
struct HashInput<'a> {
    project: &'a str,
    sequence_number: Option<u64>,
    created_at: Option<&'a DateTime<Utc>>,
    work_completed: &'a [String],
    key_decisions: &'a [String],
    next_steps: &'a [String],
    next_goal: Option<&'a str>,
}

impl Checkpoint {
    pub(crate) fn draft(project: &str) -> Self {
        Self {
            project: project.to_string(),
            sequence_number: None,
            status: CheckpointStatus::Draft,
            created_at: None,
            work_completed: Vec::new(),
            key_decisions: Vec::new(),
            next_steps: Vec::new(),
            next_goal: None,
            content_hash: None,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Assigned at finalize time; `None` while a draft.
    pub fn sequence_number(&self) -> Option<u64> {
        self.sequence_number
    }

    pub fn status(&self) -> CheckpointStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.status == CheckpointStatus::Finalized
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn work_completed(&self) -> &[String] {
        &self.work_completed
    }

    pub fn key_decisions(&self) -> &[String] {
        &self.key_decisions
    }

    pub fn next_steps(&self) -> &[String] {
        &self.next_steps
    }

    pub fn next_goal(&self) -> Option<&str> {
        self.next_goal.as_deref()
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    /// First next step: the immediate task for the following session.
    pub fn immediate_next_task(&self) -> Option<&str> {
        self.next_steps.first().map(String::as_str)
    }

    /// Next steps after the immediate one.
    pub fn pending_steps(&self) -> &[String] {
        self.next_steps.get(1..).unwrap_or_default()
    }

    /// True when no work, decision or next step has been recorded.
    pub fn is_empty(&self) -> bool {
        self.work_completed.is_empty()
            && self.key_decisions.is_empty()
            && self.next_steps.is_empty()
    }

    pub(crate) fn push_work(&mut self, text: &str) -> Result<()> {
        let entry = clean_entry("work_completed", text)?;
        self.work_completed.push(entry);
        Ok(())
    }

    pub(crate) fn push_decision(&mut self, text: &str) -> Result<()> {
        let entry = clean_entry("key_decisions", text)?;
        self.key_decisions.push(entry);
        Ok(())
    }

    pub(crate) fn push_next_step(&mut self, text: &str) -> Result<()> {
        let entry = clean_entry("next_steps", text)?;
        self.next_steps.push(entry);
        Ok(())
    }

    pub(crate) fn set_next_goal(&mut self, text: &str) -> Result<()> {
        self.next_goal = Some(clean_entry("next_goal", text)?);
        Ok(())
    }

    /// Copy of this draft as finalized record number `sequence_number`.
    pub(crate) fn to_finalized(
        &self,
        sequence_number: u64,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut finalized = self.clone();
        finalized.status = CheckpointStatus::Finalized;
        finalized.sequence_number = Some(sequence_number);
        finalized.created_at = Some(created_at);
        finalized.content_hash = Some(finalized.compute_hash()?);
        Ok(finalized)
    }

    /// SHA-256 over the canonical JSON of the content fields.
    pub fn compute_hash(&self) -> Result<String> {
        let input = HashInput {
            project: &self.project,
            sequence_number: self.sequence_number,
            created_at: self.created_at.as_ref(),
            work_completed: &self.work_completed,
            key_decisions: &self.key_decisions,
            next_steps: &self.next_steps,
            next_goal: self.next_goal.as_deref(),
        };
        let canonical = serde_json::to_vec(&input).map_err(|e| {
            WaymarkError::Other(anyhow::anyhow!("Failed to encode checkpoint for hashing: {}", e))
        })?;
        Ok(format!("{:x}", Sha256::digest(&canonical)))
    }

    /// Check a record read back from disk is a complete, untampered
    /// finalized checkpoint of `project` numbered `expected_sequence`.
    pub(crate) fn verify_persisted(&self, project: &str, expected_sequence: u64) -> Result<()> {
        if self.status != CheckpointStatus::Finalized {
            return Err(WaymarkError::Validation(format!(
                "checkpoint #{} is stored with status '{}'",
                expected_sequence, self.status
            )));
        }
        if self.project != project {
            return Err(WaymarkError::Validation(format!(
                "checkpoint #{} belongs to project '{}', not '{}'",
                expected_sequence, self.project, project
            )));
        }
        if self.sequence_number != Some(expected_sequence) {
            return Err(WaymarkError::Validation(format!(
                "checkpoint file #{} records sequence number {:?}",
                expected_sequence, self.sequence_number
            )));
        }
        if self.created_at.is_none() {
            return Err(WaymarkError::Validation(format!(
                "checkpoint #{} has no created_at",
                expected_sequence
            )));
        }
        match self.content_hash.as_deref() {
            Some(stored) if stored == self.compute_hash()? => Ok(()),
            Some(_) => Err(WaymarkError::Validation(format!(
                "checkpoint #{} content hash mismatch",
                expected_sequence
            ))),
            None => Err(WaymarkError::Validation(format!(
                "checkpoint #{} has no content_hash",
                expected_sequence
            ))),
        }
    }
}

fn clean_entry(field: &str, text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(WaymarkError::Validation(format!(
            "{} entry must not be blank",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Initial checkpoint content supplied when a project is created.
///
/// Accepts the spellings found in AI-authored design documents:
/// `summary` for `work_completed` (a single string or a list), `decisions`
/// for `key_decisions`, and `context.next_goal` for `next_goal`. Keys such
/// as `timestamp` or `type` are ignored; the sequencer stamps its own.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckpointSeed {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default, alias = "summary", deserialize_with = "string_or_list")]
    pub work_completed: Vec<String>,
    #[serde(default, alias = "decisions", deserialize_with = "string_or_list")]
    pub key_decisions: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub next_goal: Option<String>,
    #[serde(default)]
    context: Option<SeedContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct SeedContext {
    #[serde(default)]
    next_goal: Option<String>,
}

impl CheckpointSeed {
    pub fn new(
        work_completed: Vec<String>,
        key_decisions: Vec<String>,
        next_steps: Vec<String>,
    ) -> Self {
        Self {
            work_completed,
            key_decisions,
            next_steps,
            ..Self::default()
        }
    }

    /// `next_goal`, falling back to `context.next_goal`.
    pub fn effective_next_goal(&self) -> Option<&str> {
        self.next_goal
            .as_deref()
            .or_else(|| self.context.as_ref().and_then(|c| c.next_goal.as_deref()))
            .filter(|g| !g.trim().is_empty())
    }
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}
