//! Mock implementations of the service traits.
//!
//! These mocks provide controllable test doubles for the file system, the
//! issue tracker and git, enabling deterministic unit tests.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::git::GitOperations;
use crate::model::{CommentRecord, IssueInfo};
use crate::source::{FileFilter, FileSource};
use crate::tracker::{IssueTracker, TrackerError};

/// In-memory file source.
///
/// # Example
///
/// ```rust,ignore
/// let source = MockFileSource::new()
///     .with_file("src/a.ts", "// ERROR: fix me")
///     .with_unreadable("src/locked.ts");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockFileSource {
    files: BTreeMap<String, String>,
    unreadable: HashSet<String>,
    list_error: Option<String>,
}

impl MockFileSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable file.
    #[must_use]
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Add a file that is listed but fails to read.
    #[must_use]
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.files.insert(path.to_string(), String::new());
        self.unreadable.insert(path.to_string());
        self
    }

    /// Make enumeration itself fail.
    #[must_use]
    pub fn with_list_error(mut self, error: &str) -> Self {
        self.list_error = Some(error.to_string());
        self
    }
}

#[async_trait]
impl FileSource for MockFileSource {
    async fn list_files(&self, filter: &FileFilter) -> Result<Vec<String>> {
        if let Some(error) = &self.list_error {
            bail!("{error}");
        }
        // BTreeMap keys are already sorted
        Ok(self
            .files
            .keys()
            .filter(|path| filter.is_match(path))
            .cloned()
            .collect())
    }

    async fn read_text(&self, file: &str) -> Result<String> {
        if self.unreadable.contains(file) {
            bail!("permission denied: {file}");
        }
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| anyhow!("file not found: {file}"))
    }
}

/// Scriptable issue tracker.
///
/// Each `create_issue` call pops the next scripted result; when the script is
/// exhausted, issues are numbered from `next_number`. Calls are recorded.
///
/// # Example
///
/// ```rust,ignore
/// let tracker = MockIssueTracker::new()
///     .with_result(Err(TrackerError::remote("503")))
///     .with_next_number(42);
/// ```
#[derive(Debug)]
pub struct MockIssueTracker {
    configured: bool,
    script: Mutex<VecDeque<Result<IssueInfo, TrackerError>>>,
    next_number: AtomicU32,
    calls: Mutex<Vec<CommentRecord>>,
}

impl Default for MockIssueTracker {
    fn default() -> Self {
        Self {
            configured: true,
            script: Mutex::new(VecDeque::new()),
            next_number: AtomicU32::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockIssueTracker {
    /// Create a configured tracker numbering issues from 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report missing settings on every call.
    #[must_use]
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Queue the result of the next `create_issue` call.
    #[must_use]
    pub fn with_result(self, result: Result<IssueInfo, TrackerError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(result);
        }
        self
    }

    /// Number given to the next unscripted issue.
    #[must_use]
    pub fn with_next_number(self, number: u32) -> Self {
        self.next_number.store(number, Ordering::SeqCst);
        self
    }

    /// Comments passed to `create_issue`, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<CommentRecord> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of `create_issue` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn not_configured() -> TrackerError {
        TrackerError::not_configured(vec!["github.owner".into(), "token".into()])
    }
}

#[async_trait]
impl IssueTracker for MockIssueTracker {
    async fn create_issue(&self, comment: &CommentRecord) -> Result<IssueInfo, TrackerError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(comment.clone());
        }
        if !self.configured {
            return Err(Self::not_configured());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| {
            let number = u64::from(self.next_number.fetch_add(1, Ordering::SeqCst));
            Ok(IssueInfo {
                number,
                url: format!("https://api.example.test/issues/{number}"),
                html_url: format!("https://example.test/issues/{number}"),
            })
        })
    }

    async fn remote_url(&self, file: &str, line: u32) -> Result<String, TrackerError> {
        if !self.configured {
            return Err(Self::not_configured());
        }
        Ok(format!("https://example.test/blob/main/{file}#L{line}"))
    }

    async fn permalink(&self, file: &str, line: u32) -> Result<String, TrackerError> {
        if !self.configured {
            return Err(Self::not_configured());
        }
        Ok(format!("https://example.test/blob/0000000/{file}#L{line}"))
    }

    async fn missing_settings(&self) -> Vec<String> {
        if self.configured {
            Vec::new()
        } else {
            vec!["github.owner".into(), "token".into()]
        }
    }
}

/// Mock implementation of git operations.
///
/// # Example
///
/// ```rust,ignore
/// let git = MockGitOperations::new()
///     .with_branch("develop")
///     .with_commit_hash("abc123");
/// ```
#[derive(Debug, Clone)]
pub struct MockGitOperations {
    commit_hash: String,
    branch: String,
    fails: bool,
}

impl Default for MockGitOperations {
    fn default() -> Self {
        Self {
            commit_hash: String::new(),
            branch: "main".to_string(),
            fails: false,
        }
    }
}

impl MockGitOperations {
    /// Create a new mock with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the commit hash to return.
    #[must_use]
    pub fn with_commit_hash(mut self, hash: &str) -> Self {
        self.commit_hash = hash.to_string();
        self
    }

    /// Set the current branch name.
    #[must_use]
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    /// Make every query fail, as outside a repository.
    #[must_use]
    pub fn with_failure(mut self) -> Self {
        self.fails = true;
        self
    }
}

impl GitOperations for MockGitOperations {
    fn get_commit_hash(&self) -> Result<String> {
        if self.fails {
            bail!("not a git repository");
        }
        Ok(self.commit_hash.clone())
    }

    fn get_branch(&self) -> Result<String> {
        if self.fails {
            bail!("not a git repository");
        }
        Ok(self.branch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_file_source_filters_and_sorts() {
        let source = MockFileSource::new()
            .with_file("z.ts", "")
            .with_file("a.ts", "")
            .with_file("notes.md", "");
        let files = source.list_files(&FileFilter::default()).await.unwrap();
        assert_eq!(files, vec!["a.ts", "z.ts"]);
        assert!(source.read_text("missing.ts").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_tracker_script_then_numbering() {
        let tracker = MockIssueTracker::new()
            .with_result(Err(TrackerError::remote("503")))
            .with_next_number(7);
        let comment = CommentRecord::new("a.ts", 1, "// ERROR: x", "x");

        assert!(tracker.create_issue(&comment).await.is_err());
        assert_eq!(tracker.create_issue(&comment).await.unwrap().number, 7);
        assert_eq!(tracker.create_issue(&comment).await.unwrap().number, 8);
        assert_eq!(tracker.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_tracker_unconfigured() {
        let tracker = MockIssueTracker::new().unconfigured();
        assert!(!tracker.is_configured().await);
        let err = tracker.remote_url("a.ts", 1).await.unwrap_err();
        assert!(err.is_not_configured());
    }

    #[test]
    fn test_mock_git_failure() {
        let git = MockGitOperations::new().with_failure();
        assert!(git.get_branch().is_err());
        assert!(git.get_commit_hash().is_err());
    }
}
