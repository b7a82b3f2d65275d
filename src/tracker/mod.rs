//! Version-control collaborator.
//!
//! The core decides what to commit and with which message; an
//! implementation of [`VersionControlGateway`] carries it out. Failures come
//! back as `WaymarkError::VersionControl` with the underlying message
//! verbatim, and nothing here retries.

pub mod git;

pub use git::GitGateway;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::commit::CommitMessage;
use crate::errors::Result;

/// Identifier of a created commit (a full SHA for git).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait VersionControlGateway {
    /// Stage exactly these files. Never a wildcard.
    fn stage(&mut self, paths: &[PathBuf]) -> Result<()>;

    fn commit(&mut self, message: &CommitMessage) -> Result<CommitId>;

    fn push(&mut self, remote: &str, branch: &str) -> Result<()>;

    /// Branch HEAD points at, if the gateway can tell.
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
