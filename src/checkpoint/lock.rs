use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::{Result, WaymarkError};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive advisory lock on one project's `.lock` file.
///
/// Held across sequence assignment and persistence so two writers never
/// observe the same highest sequence number. Released on drop, which covers
/// every exit path including early `?` returns.
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
    path: PathBuf,
    project: String,
}

impl ProjectLock {
    /// Acquire the lock, polling until `timeout` elapses.
    ///
    /// Fails with `Busy` when another holder keeps the lock past the timeout.
    /// A zero timeout makes a single attempt.
    pub fn acquire(path: &Path, project: &str, timeout: Duration) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| WaymarkError::io(path, e))?;

        let started = Instant::now();
        let mut contended = false;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!(
                        project,
                        waited_ms = started.elapsed().as_millis() as u64,
                        "acquired project lock"
                    );
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                        project: project.to_string(),
                    });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if !contended {
                        warn!(project, "project lock is held by another writer, waiting");
                        contended = true;
                    }
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        return Err(WaymarkError::Busy {
                            project: project.to_string(),
                            waited_ms: elapsed.as_millis() as u64,
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
                }
                Err(e) => return Err(WaymarkError::io(path, e)),
            }
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(project = %self.project, "failed to release project lock: {}", e);
        } else {
            debug!(project = %self.project, "released project lock");
        }
    }
}
