use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::ProjectBrain;
use crate::config::{Config, validate_project_name};
use crate::errors::{Result, WaymarkError};
use crate::util::write_temp_sibling;

/// Loads and persists the single Brain document of each project.
///
/// Writes are whole-document and atomic: the new content is fsynced to a
/// temporary sibling and renamed over `brain.json`, so readers see either
/// the old or the new document. `created_at` is carried over from the
/// stored document and `updated_at` is stamped here, never by the caller.
#[derive(Debug, Clone)]
pub struct BrainStore {
    config: Config,
}

impl BrainStore {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn path(&self, project: &str) -> PathBuf {
        self.config.brain_file(project)
    }

    pub fn exists(&self, project: &str) -> bool {
        validate_project_name(project).is_ok() && self.path(project).is_file()
    }

    pub fn load(&self, project: &str) -> Result<ProjectBrain> {
        validate_project_name(project)?;
        let path = self.path(project);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WaymarkError::NotFound {
                    project: project.to_string(),
                });
            }
            Err(e) => return Err(WaymarkError::io(&path, e)),
        };

        let brain = ProjectBrain::from_json(&content)?;
        if brain.project_name != project {
            return Err(WaymarkError::Validation(format!(
                "brain at {} belongs to project '{}', not '{}'",
                path.display(),
                brain.project_name,
                project
            )));
        }

        debug!(project, version = brain.version, "loaded project brain");
        Ok(brain)
    }

    /// Validate and atomically replace the project's Brain.
    ///
    /// Returns the document as written, with timestamps stamped. The project
    /// directory must already exist.
    pub fn save(&self, project: &str, brain: &ProjectBrain) -> Result<ProjectBrain> {
        validate_project_name(project)?;
        brain.validate()?;
        if brain.project_name != project {
            return Err(WaymarkError::Validation(format!(
                "project_name '{}' does not match project '{}'",
                brain.project_name, project
            )));
        }

        let project_dir = self.config.project_dir(project);
        if !project_dir.is_dir() {
            return Err(WaymarkError::NotFound {
                project: project.to_string(),
            });
        }

        let mut stamped = brain.clone();
        let now = Utc::now();
        stamped.created_at = match self.load(project) {
            Ok(existing) => existing.created_at,
            Err(WaymarkError::NotFound { .. }) => now,
            Err(e) => return Err(e),
        };
        stamped.updated_at = now;

        let mut json = serde_json::to_string_pretty(&stamped)
            .map_err(|e| WaymarkError::Other(anyhow::anyhow!("Failed to serialize brain: {}", e)))?;
        json.push('\n');

        let path = self.path(project);
        let tmp =
            write_temp_sibling(&path, json.as_bytes()).map_err(|e| WaymarkError::io(&path, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            fs::remove_file(&tmp).ok();
            return Err(WaymarkError::io(&path, e));
        }

        info!(project, "saved project brain");
        Ok(stamped)
    }
}
