//! Issue tracker integration.
//!
//! The scanner and state store never call out to the network. Creating an
//! issue goes through an [`IssueTracker`], which receives everything it needs
//! (repository, credentials) at construction time.

pub mod github;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CommentRecord, IssueInfo};

pub use github::{GitHubSettings, GitHubTracker};

/// Maximum issue title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Failures reported by an issue tracker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Repository or credentials missing
    #[error("Issue tracker is not configured (missing: {})", missing.join(", "))]
    NotConfigured { missing: Vec<String> },

    /// Credentials rejected by the remote
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Any other remote failure
    #[error("Issue tracker error: {message}")]
    Remote { message: String },
}

impl TrackerError {
    /// Create a not-configured error
    pub fn not_configured(missing: Vec<String>) -> Self {
        Self::NotConfigured { missing }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a generic remote error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Credentials must be replaced before retrying.
    pub fn requires_reconfigure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Repository or credentials were never provided.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    /// Generic remote failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

/// Remote issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create an issue for a comment.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotConfigured`] when settings are missing,
    /// [`TrackerError::Authentication`] when credentials are rejected,
    /// [`TrackerError::Remote`] otherwise.
    async fn create_issue(&self, comment: &CommentRecord) -> Result<IssueInfo, TrackerError>;

    /// Link to the file and line on the current branch.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotConfigured`] when the repository is unknown.
    async fn remote_url(&self, file: &str, line: u32) -> Result<String, TrackerError>;

    /// Link to the file and line pinned to the current commit.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotConfigured`] when the repository is unknown.
    async fn permalink(&self, file: &str, line: u32) -> Result<String, TrackerError>;

    /// Names of the settings that still have to be provided.
    async fn missing_settings(&self) -> Vec<String>;

    /// Whether issues can be created at all.
    async fn is_configured(&self) -> bool {
        self.missing_settings().await.is_empty()
    }
}

/// Title, body and labels for a new issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

impl IssueDraft {
    /// Build the draft for a comment.
    ///
    /// Each metadata entry becomes a `key:value` label.
    pub fn from_comment(comment: &CommentRecord) -> Self {
        let title: String = comment.message.chars().take(MAX_TITLE_CHARS).collect();
        let labels = comment
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        let body = format!(
            "**File:** `{file}`\n**Line:** {line}\n\n**Original comment:**\n```\n{text}\n```\n\n**Description:**\n{message}\n\n---\n_Created automatically by comment-to-issue_",
            file = comment.file,
            line = comment.line,
            text = comment.text,
            message = comment.message,
        );
        Self {
            title,
            body,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;

    #[test]
    fn test_draft_from_comment() {
        let mut meta = Metadata::new();
        meta.insert("sev".into(), "alta".into());
        meta.insert("area".into(), "auth".into());
        let comment = CommentRecord::new(
            "src/user.ts",
            12,
            "// ERROR: validate email [sev:alta; area:auth]",
            "validate email",
        )
        .with_metadata(meta);

        let draft = IssueDraft::from_comment(&comment);
        assert_eq!(draft.title, "validate email");
        assert_eq!(draft.labels, vec!["area:auth", "sev:alta"]);
        assert!(draft.body.contains("**File:** `src/user.ts`"));
        assert!(draft.body.contains("**Line:** 12"));
        assert!(draft
            .body
            .contains("```\n// ERROR: validate email [sev:alta; area:auth]\n```"));
        assert!(draft.body.contains("**Description:**\nvalidate email"));
    }

    #[test]
    fn test_draft_title_is_truncated() {
        let message = "é".repeat(150);
        let comment = CommentRecord::new("a.ts", 1, "t", message);
        let draft = IssueDraft::from_comment(&comment);
        assert_eq!(draft.title.chars().count(), MAX_TITLE_CHARS);
        assert!(draft.labels.is_empty());
    }

    #[test]
    fn test_tracker_error_classification() {
        let auth = TrackerError::authentication("bad token");
        assert!(auth.requires_reconfigure());
        assert!(!auth.is_remote());

        let missing = TrackerError::not_configured(vec!["owner".into(), "token".into()]);
        assert!(missing.is_not_configured());
        assert!(!missing.requires_reconfigure());
        assert_eq!(
            missing.to_string(),
            "Issue tracker is not configured (missing: owner, token)"
        );

        let remote = TrackerError::remote("502 Bad Gateway");
        assert!(remote.is_remote());
        assert!(remote.to_string().contains("502 Bad Gateway"));
    }
}
