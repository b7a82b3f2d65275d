//! Commit messages derived from finalized checkpoints.
//!
//! The message is a pure function of the checkpoint content: no clock, no
//! randomness, so rebuilding it always yields the same bytes.

pub mod publish;

pub use publish::{PublishOptions, PublishOutcome, publish};

use serde::Serialize;
use std::fmt;

use crate::checkpoint::Checkpoint;
use crate::errors::{Result, WaymarkError};
use crate::util::{single_line, truncate_with_ellipsis};

/// Default summary line limit, ellipsis included.
pub const DEFAULT_SUMMARY_MAX_LEN: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    pub summary: String,
    pub body: String,
}

impl CommitMessage {
    /// Summary line, blank line, body.
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            format!("{}\n", self.summary)
        } else {
            format!("{}\n\n{}\n", self.summary, self.body)
        }
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}

#[derive(Debug, Clone)]
pub struct CommitMessageBuilder {
    summary_max_len: usize,
}

impl Default for CommitMessageBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_MAX_LEN)
    }
}

impl CommitMessageBuilder {
    pub fn new(summary_max_len: usize) -> Self {
        Self { summary_max_len }
    }

    /// Build the message for a finalized checkpoint.
    ///
    /// Format:
    ///
    /// ```text
    /// <first work item, one line, truncated>
    ///
    /// Work completed:
    /// - ...
    ///
    /// Key decisions:
    /// - ...
    ///
    /// Checkpoint: <project> #<n>
    /// ```
    ///
    /// Empty groups are omitted. `next_steps` never appear.
    pub fn build(&self, checkpoint: &Checkpoint) -> Result<CommitMessage> {
        if !checkpoint.is_finalized() {
            return Err(WaymarkError::NotFinalized);
        }
        let sequence_number = checkpoint.sequence_number().ok_or(WaymarkError::NotFinalized)?;

        let summary = match checkpoint.work_completed().first() {
            Some(first) => truncate_with_ellipsis(&single_line(first), self.summary_max_len),
            None => format!("Checkpoint #{}", sequence_number),
        };

        let mut sections = Vec::new();
        if let Some(group) = bullet_group("Work completed:", checkpoint.work_completed()) {
            sections.push(group);
        }
        if let Some(group) = bullet_group("Key decisions:", checkpoint.key_decisions()) {
            sections.push(group);
        }
        sections.push(format!(
            "Checkpoint: {} #{}",
            checkpoint.project(),
            sequence_number
        ));

        Ok(CommitMessage {
            summary,
            body: sections.join("\n\n"),
        })
    }
}

fn bullet_group(heading: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let mut group = heading.to_string();
    for item in items {
        group.push_str("\n- ");
        group.push_str(&single_line(item));
    }
    Some(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn checkpoint(work: &[&str], decisions: &[&str], steps: &[&str]) -> Checkpoint {
        let mut draft = Checkpoint::draft("demo");
        for w in work {
            draft.push_work(w).unwrap();
        }
        for d in decisions {
            draft.push_decision(d).unwrap();
        }
        for s in steps {
            draft.push_next_step(s).unwrap();
        }
        draft
            .to_finalized(1, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
            .unwrap()
    }

    #[test]
    fn test_scenario_message() {
        let cp = checkpoint(
            &["Wrote parser"],
            &["Use recursive descent"],
            &["Add tests", "Write docs"],
        );
        let msg = CommitMessageBuilder::default().build(&cp).unwrap();

        assert_eq!(msg.summary, "Wrote parser");
        assert_eq!(
            msg.body,
            concat!(
                "Work completed:\n- Wrote parser\n\n",
                "Key decisions:\n- Use recursive descent\n\n",
                "Checkpoint: demo #1"
            )
        );
        assert!(!msg.full_text().contains("Add tests"));
        assert!(!msg.full_text().contains("Write docs"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let cp = checkpoint(&["a", "b"], &["c"], &["d"]);
        let builder = CommitMessageBuilder::default();
        assert_eq!(
            builder.build(&cp).unwrap().full_text(),
            builder.build(&cp).unwrap().full_text()
        );
    }

    #[test]
    fn test_draft_is_not_finalized() {
        let mut draft = Checkpoint::draft("demo");
        draft.push_work("x").unwrap();
        draft.push_next_step("y").unwrap();
        assert!(matches!(
            CommitMessageBuilder::default().build(&draft),
            Err(WaymarkError::NotFinalized)
        ));
    }

    #[test]
    fn test_long_summary_truncated() {
        let long = "x".repeat(100);
        let cp = checkpoint(&[long.as_str()], &[], &["next"]);
        let msg = CommitMessageBuilder::new(72).build(&cp).unwrap();
        assert_eq!(msg.summary.chars().count(), 72);
        assert!(msg.summary.ends_with("..."));
        // the body keeps the full entry
        assert!(msg.body.contains(&long));
    }

    #[test]
    fn test_multiline_work_collapsed_in_summary() {
        let cp = checkpoint(&["Wrote parser\nand lexer"], &[], &["next"]);
        let msg = CommitMessageBuilder::default().build(&cp).unwrap();
        assert_eq!(msg.summary, "Wrote parser and lexer");
    }

    #[test]
    fn test_no_work_uses_sequence_summary() {
        let cp = checkpoint(&[], &["Pick sqlite"], &["next"]);
        let msg = CommitMessageBuilder::default().build(&cp).unwrap();
        assert_eq!(msg.summary, "Checkpoint #1");
        assert!(!msg.body.contains("Work completed:"));
        assert!(msg.body.starts_with("Key decisions:"));
    }

    #[test]
    fn test_full_text_layout() {
        let msg = CommitMessage {
            summary: "s".into(),
            body: "b".into(),
        };
        assert_eq!(msg.full_text(), "s\n\nb\n");
        assert_eq!(msg.to_string(), "s\n\nb\n");
    }
}
