//! Design-document ingestion for `waymark create --design-file`.
//!
//! A design document is free text (typically pasted AI output) carrying a
//! fenced ```json block with the initial Brain, followed by a fenced ```yaml
//! block with the seed for checkpoint #1.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::brain::ProjectBrain;
use crate::checkpoint::CheckpointSeed;
use crate::errors::{Result, WaymarkError};
use crate::util::extract_json_object;

// Compile regexes once using LazyLock
static JSON_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").unwrap());

static YAML_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```ya?ml\s*(.*?)\s*```").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct DesignDocument {
    pub brain: ProjectBrain,
    pub seed: CheckpointSeed,
}

/// Extract and validate the Brain and checkpoint seed from `text`.
///
/// Falls back to the first balanced `{...}` object when no ```json fence is
/// present. The YAML block is searched only after the JSON. A `project` key
/// in the seed must name the same project as the Brain.
pub fn parse_design(text: &str) -> Result<DesignDocument> {
    if text.trim().is_empty() {
        return Err(WaymarkError::Validation(
            "design document is empty".to_string(),
        ));
    }

    let (raw_json, json_end) = match JSON_BLOCK_REGEX.captures(text) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| m.end()).unwrap_or_default();
            let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            (body.to_string(), whole)
        }
        None => {
            let object = extract_json_object(text).ok_or_else(|| {
                WaymarkError::Validation(
                    "design document has no ```json block with the project brain".to_string(),
                )
            })?;
            let end = text.find(&object).map(|i| i + object.len()).unwrap_or_default();
            debug!("no fenced json block, using first balanced object");
            (object, end)
        }
    };

    let brain = ProjectBrain::from_json(&raw_json)?;

    let raw_yaml = YAML_BLOCK_REGEX
        .captures(&text[json_end..])
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            WaymarkError::Validation(
                "design document has no ```yaml block with the initial checkpoint".to_string(),
            )
        })?;

    let seed: CheckpointSeed = serde_yaml::from_str(raw_yaml).map_err(|e| {
        WaymarkError::Validation(format!("invalid initial checkpoint yaml: {}", e))
    })?;

    if let Some(seed_project) = &seed.project
        && seed_project != &brain.project_name
    {
        return Err(WaymarkError::Validation(format!(
            "initial checkpoint names project '{}' but the brain is '{}'",
            seed_project, brain.project_name
        )));
    }

    Ok(DesignDocument { brain, seed })
}
