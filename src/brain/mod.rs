//! The Project Brain: one long-lived summary document per project.
//!
//! This module provides:
//! - `ProjectBrain`, the schema-versioned document (objectives, constants)
//! - `BrainStore`, which loads, validates and atomically rewrites it

pub mod store;

pub use store::BrainStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::config::validate_project_name;
use crate::errors::{Result, WaymarkError};

/// Schema version written by this build.
pub const CURRENT_BRAIN_VERSION: u32 = 1;

/// Schema versions this build can read and write.
pub const SUPPORTED_BRAIN_VERSIONS: &[u32] = &[1];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBrain {
    /// Project identifier; fixed once the project exists
    #[serde(alias = "project")]
    pub project_name: String,
    /// Schema version. Accepts `1`, `"1"`, `"v1"` or `"v1.0"` on input
    #[serde(
        default = "default_version",
        deserialize_with = "deserialize_version"
    )]
    pub version: u32,
    /// Long-lived goals; the first one is the primary goal
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Free-form facts agreed for the project
    #[serde(default)]
    pub architectural_constants: BTreeMap<String, serde_json::Value>,
    /// Strategic importance of the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Stamped by [`BrainStore::save`] on every write
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Keys this schema does not model, kept so rewrites do not drop them
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_version() -> u32 {
    CURRENT_BRAIN_VERSION
}

fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVersion {
        Number(u32),
        Text(String),
    }

    match RawVersion::deserialize(deserializer)? {
        RawVersion::Number(n) => Ok(n),
        RawVersion::Text(s) => {
            let digits = s.trim().trim_start_matches(['v', 'V']);
            let major = digits.split('.').next().unwrap_or_default();
            major.parse::<u32>().map_err(|_| {
                serde::de::Error::custom(format!("invalid brain version '{}'", s))
            })
        }
    }
}

impl ProjectBrain {
    pub fn new(project_name: &str, objectives: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            project_name: project_name.to_string(),
            version: CURRENT_BRAIN_VERSION,
            objectives,
            architectural_constants: BTreeMap::new(),
            priority: None,
            created_at: now,
            updated_at: now,
            extra: BTreeMap::new(),
        }
    }

    /// First objective, if any.
    pub fn primary_goal(&self) -> Option<&str> {
        self.objectives.first().map(String::as_str)
    }

    /// Check the document is complete and written in a supported schema.
    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(WaymarkError::Validation(
                "brain is missing project_name".to_string(),
            ));
        }
        validate_project_name(&self.project_name)?;

        if !SUPPORTED_BRAIN_VERSIONS.contains(&self.version) {
            return Err(WaymarkError::Validation(format!(
                "unsupported brain version {} (supported: {:?})",
                self.version, SUPPORTED_BRAIN_VERSIONS
            )));
        }

        if let Some(idx) = self.objectives.iter().position(|o| o.trim().is_empty()) {
            return Err(WaymarkError::Validation(format!(
                "objective #{} is blank",
                idx + 1
            )));
        }

        if self.architectural_constants.keys().any(|k| k.trim().is_empty()) {
            return Err(WaymarkError::Validation(
                "architectural constant with an empty name".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse a brain document from JSON text, mapping decode failures to
    /// `Validation` errors.
    pub fn from_json(text: &str) -> Result<Self> {
        let brain: ProjectBrain = serde_json::from_str(text)
            .map_err(|e| WaymarkError::Validation(format!("invalid brain document: {}", e)))?;
        brain.validate()?;
        Ok(brain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_brain_is_valid() {
        let brain = ProjectBrain::new("demo", vec!["Ship v1".to_string()]);
        assert!(brain.validate().is_ok());
        assert_eq!(brain.version, CURRENT_BRAIN_VERSION);
        assert_eq!(brain.primary_goal(), Some("Ship v1"));
    }

    #[test]
    fn test_from_json_accepts_project_alias_and_text_version() {
        let brain = ProjectBrain::from_json(
            r#"{"project": "demo", "version": "v1.0",
                "objectives": ["Ship v1"], "priority": "high"}"#,
        )
        .unwrap();
        assert_eq!(brain.project_name, "demo");
        assert_eq!(brain.version, 1);
        assert_eq!(brain.priority.as_deref(), Some("high"));
    }

    #[test]
    fn test_from_json_missing_version_defaults_to_current() {
        let brain = ProjectBrain::from_json(r#"{"project_name": "demo"}"#).unwrap();
        assert_eq!(brain.version, CURRENT_BRAIN_VERSION);
        assert!(brain.objectives.is_empty());
    }

    #[test]
    fn test_from_json_missing_project_name_is_validation_error() {
        let err = ProjectBrain::from_json(r#"{"version": 1, "objectives": []}"#).unwrap_err();
        assert!(matches!(err, WaymarkError::Validation(_)));
        assert!(err.to_string().contains("project_name"));
    }

    #[test]
    fn test_from_json_unsupported_version_rejected() {
        let err = ProjectBrain::from_json(r#"{"project_name": "demo", "version": 9}"#).unwrap_err();
        assert!(matches!(err, WaymarkError::Validation(_)));
        assert!(err.to_string().contains("unsupported brain version 9"));
    }

    #[test]
    fn test_from_json_garbage_version_rejected() {
        let raw = r#"{"project_name": "demo", "version": "latest"}"#;
        let err = ProjectBrain::from_json(raw).unwrap_err();
        assert!(matches!(err, WaymarkError::Validation(_)));
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let brain = ProjectBrain::from_json(
            r#"{"project_name": "demo", "tech_stack": {"lang": "rust"}, "owner": "ops"}"#,
        )
        .unwrap();
        assert_eq!(brain.extra.len(), 2);

        let json = serde_json::to_string(&brain).unwrap();
        let back = ProjectBrain::from_json(&json).unwrap();
        assert_eq!(back, brain);
        assert_eq!(back.extra["owner"], serde_json::json!("ops"));
    }

    #[test]
    fn test_blank_objective_rejected() {
        let brain = ProjectBrain::new("demo", vec!["Ship".to_string(), "  ".to_string()]);
        let err = brain.validate().unwrap_err();
        assert!(err.to_string().contains("objective #2"));
    }

    #[test]
    fn test_invalid_project_name_rejected() {
        let brain = ProjectBrain::new("../etc", vec![]);
        assert!(matches!(
            brain.validate().unwrap_err(),
            WaymarkError::Validation(_)
        ));
    }
}
