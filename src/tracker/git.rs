use git2::{Cred, CredentialType, PushOptions, RemoteCallbacks, Repository, Signature};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{CommitId, VersionControlGateway};
use crate::commit::CommitMessage;
use crate::errors::{Result, WaymarkError};

const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// [`VersionControlGateway`] backed by libgit2.
///
/// A commit contains exactly the paths passed to `stage` since the last
/// commit. Changes the user staged elsewhere make `commit` fail instead of
/// riding along.
pub struct GitGateway {
    repo: Repository,
    staged: Vec<PathBuf>,
}

fn vc_error(e: git2::Error) -> WaymarkError {
    WaymarkError::VersionControl(e.message().to_string())
}

impl GitGateway {
    /// Open the repository enclosing `path` (searching parent directories).
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(vc_error)?;
        debug!(path = %path.display(), "opened git repository");
        Ok(Self {
            repo,
            staged: Vec::new(),
        })
    }

    pub fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| WaymarkError::VersionControl("repository has no work tree".to_string()))
    }

    /// HEAD commit, `None` on an unborn branch.
    fn head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
    }

    /// Current HEAD SHA, `None` on an unborn branch.
    pub fn head_sha(&self) -> Option<String> {
        self.head_commit().map(|c| c.id().to_string())
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Signature::now("waymark", "waymark@localhost").map_err(vc_error),
        }
    }

    /// Path of `path` relative to the work tree.
    fn relative_to_workdir(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self.workdir()?;
        let workdir = workdir
            .canonicalize()
            .map_err(|e| WaymarkError::io(workdir, e))?;
        let absolute = path.canonicalize().map_err(|e| WaymarkError::io(path, e))?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                WaymarkError::VersionControl(format!(
                    "{} is outside the repository work tree {}",
                    path.display(),
                    workdir.display()
                ))
            })
    }

    /// Index entries that differ from HEAD but were not passed to `stage`.
    fn staged_outside(&self, index: &git2::Index) -> Result<Vec<String>> {
        let head_tree = match self.head_commit() {
            Some(commit) => Some(commit.tree().map_err(vc_error)?),
            None => None,
        };
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(index), None)
            .map_err(vc_error)?;

        let mut foreign = Vec::new();
        for delta in diff.deltas() {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(path) = path
                && !self.staged.iter().any(|staged| staged == path)
            {
                foreign.push(path.display().to_string());
            }
        }
        Ok(foreign)
    }
}

impl VersionControlGateway for GitGateway {
    fn stage(&mut self, paths: &[PathBuf]) -> Result<()> {
        let relative = paths
            .iter()
            .map(|p| self.relative_to_workdir(p))
            .collect::<Result<Vec<_>>>()?;

        let mut index = self.repo.index().map_err(vc_error)?;
        index.read(false).map_err(vc_error)?;
        for path in &relative {
            index.add_path(path).map_err(vc_error)?;
        }
        index.write().map_err(vc_error)?;

        debug!(count = relative.len(), "staged files");
        for path in relative {
            if !self.staged.contains(&path) {
                self.staged.push(path);
            }
        }
        Ok(())
    }

    fn commit(&mut self, message: &CommitMessage) -> Result<CommitId> {
        let mut index = self.repo.index().map_err(vc_error)?;
        // pick up entries other tools wrote since the index was loaded
        index.read(false).map_err(vc_error)?;
        let foreign = self.staged_outside(&index)?;
        if !foreign.is_empty() {
            return Err(WaymarkError::VersionControl(format!(
                "index has staged changes outside the checkpoint paths: {}",
                foreign.join(", ")
            )));
        }

        let tree_id = index.write_tree().map_err(vc_error)?;
        let tree = self.repo.find_tree(tree_id).map_err(vc_error)?;
        let sig = self.signature()?;
        let text = message.full_text();

        // Handle unborn branch (new repo with no commits yet)
        let commit_id = if let Some(parent) = self.head_commit() {
            if parent.tree_id() == tree_id {
                return Err(WaymarkError::VersionControl(
                    "nothing to commit: staged tree matches HEAD".to_string(),
                ));
            }
            self.repo
                .commit(Some("HEAD"), &sig, &sig, &text, &tree, &[&parent])
                .map_err(vc_error)?
        } else {
            self.repo
                .commit(Some("HEAD"), &sig, &sig, &text, &tree, &[])
                .map_err(vc_error)?
        };

        self.staged.clear();
        info!(commit = %commit_id, summary = %message.summary, "created commit");
        Ok(CommitId(commit_id.to_string()))
    }

    fn push(&mut self, remote: &str, branch: &str) -> Result<()> {
        let mut remote_handle = self.repo.find_remote(remote).map_err(vc_error)?;
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        let git_config = self.repo.config().ok();

        let mut rejection: Option<String> = None;
        {
            let mut attempts = 0;
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|url, username_from_url, allowed| {
                attempts += 1;
                if attempts > MAX_CREDENTIAL_ATTEMPTS {
                    return Err(git2::Error::from_str("authentication failed"));
                }
                if allowed.contains(CredentialType::SSH_KEY)
                    && let Some(user) = username_from_url
                {
                    return Cred::ssh_key_from_agent(user);
                }
                if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
                    && let Some(config) = &git_config
                {
                    return Cred::credential_helper(config, url, username_from_url);
                }
                Cred::default()
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejection = Some(format!("{}: {}", refname, status));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote_handle
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(vc_error)?;
        }

        if let Some(reason) = rejection {
            return Err(WaymarkError::VersionControl(format!(
                "push to {} rejected: {}",
                remote, reason
            )));
        }

        info!(remote, branch, "pushed");
        Ok(())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = self.repo.find_reference("HEAD").map_err(vc_error)?;
        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(str::to_string))
    }
}
