//! Core data model: comment records, metadata and issue information.
//!
//! A [`CommentRecord`] is rebuilt from scratch on every scan. Its identity is
//! the `(file, line)` pair, which is what the state store and the view use to
//! reconcile records across rescans.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Key/value metadata parsed from the bracketed block of an annotation.
///
/// Keys are unique. A sorted map keeps the persisted JSON stable between
/// saves.
pub type Metadata = BTreeMap<String, String>;

/// Prefix of the issue-link marker appended to annotated lines.
pub const ISSUE_MARKER_PREFIX: &str = "[GH-#";

/// A tagged comment found in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    /// Workspace-relative path, always `/`-separated.
    pub file: String,
    /// 1-indexed line number.
    pub line: u32,
    /// Trimmed source line at scan time.
    pub text: String,
    /// Description captured by the pattern's first group.
    pub message: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Tracker issue number, once one has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
}

impl CommentRecord {
    /// Create a record without metadata or issue link.
    pub fn new(
        file: impl Into<String>,
        line: u32,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            text: text.into(),
            message: message.into(),
            metadata: Metadata::new(),
            issue_number: None,
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach an issue number.
    #[must_use]
    pub fn with_issue_number(mut self, number: u64) -> Self {
        self.issue_number = Some(number);
        self
    }

    /// Whether this record sits at the given identity.
    pub fn is_at(&self, file: &str, line: u32) -> bool {
        self.file == file && self.line == line
    }

    /// Whether the scanned text carries an issue-link marker.
    pub fn has_marker(&self) -> bool {
        parse_issue_marker(&self.text).is_some()
    }
}

/// Result of a successful remote issue creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInfo {
    pub number: u64,
    /// API resource URL.
    pub url: String,
    /// Human-facing link.
    pub html_url: String,
}

fn marker_regex() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r"\[GH-#(\d+)\]").ok())
        .as_ref()
}

/// Format the marker for an issue number, e.g. `[GH-#42]`.
pub fn format_issue_marker(number: u64) -> String {
    format!("{ISSUE_MARKER_PREFIX}{number}]")
}

/// Extract the issue number from the first `[GH-#<digits>]` marker on a line.
///
/// Zero and out-of-range numbers are treated as no marker.
pub fn parse_issue_marker(line: &str) -> Option<u64> {
    marker_regex()?
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

/// Remove every trailing issue marker (and the whitespace before it).
pub fn strip_trailing_markers(line: &str) -> &str {
    let mut rest = line.trim_end();
    loop {
        let Some(start) = rest.rfind(ISSUE_MARKER_PREFIX) else {
            return rest;
        };
        let tail = &rest[start..];
        let is_marker = tail.len() > ISSUE_MARKER_PREFIX.len() + 1
            && tail.ends_with(']')
            && tail[ISSUE_MARKER_PREFIX.len()..tail.len() - 1]
                .bytes()
                .all(|b| b.is_ascii_digit());
        if !is_marker {
            return rest;
        }
        rest = rest[..start].trim_end();
    }
}
