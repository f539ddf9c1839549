//! Workspace orchestration.
//!
//! Ties the pieces together the way a user drives them: a scan refreshes the
//! persisted state and the tree; creating an issue talks to the tracker,
//! writes the marker into the source, and records the number in both the tree
//! and the state file.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ProjectConfig;
use crate::error::{CommentToIssueError, Result};
use crate::model::{CommentRecord, IssueInfo};
use crate::scanner::{ScanPattern, ScanReport, WorkspaceScanner};
use crate::source::{FileFilter, FileSource};
use crate::store::{reconcile, StateStore};
use crate::tracker::{IssueTracker, TrackerError};
use crate::view::CommentTree;
use crate::writeback::{insert_issue_marker, read_line, WriteBackOutcome};

/// What happened to the marker after an issue was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerWrite {
    Written(WriteBackOutcome),
    /// The issue exists and is recorded in state, but the source line was not
    /// updated.
    Failed(String),
}

/// Result of [`Workspace::create_issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub info: IssueInfo,
    pub record: CommentRecord,
    pub marker: MarkerWrite,
}

/// One annotated workspace: configuration, persisted state and the tree.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: ProjectConfig,
    pattern: ScanPattern,
    filter: FileFilter,
    store: StateStore,
    tree: CommentTree,
}

impl Workspace {
    /// Open a workspace rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn open(root: impl AsRef<Path>, config: ProjectConfig) -> Result<Self> {
        config.validate()?;
        let root = root.as_ref().to_path_buf();
        let tree = CommentTree::new().with_case_insensitive_sort(config.view.case_insensitive);
        Ok(Self {
            pattern: config.scan_pattern()?,
            filter: config.file_filter()?,
            store: StateStore::new(&root),
            root,
            config,
            tree,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    /// Show the last saved state without scanning.
    pub fn load_persisted(&mut self) -> &CommentTree {
        self.tree.set_comments(self.store.load());
        &self.tree
    }

    /// Scan, recover issue numbers from state, save, and refresh the tree.
    ///
    /// # Errors
    ///
    /// Fails when enumeration fails or the state cannot be saved. A failed
    /// enumeration leaves state and tree untouched.
    pub async fn scan<S: FileSource + ?Sized>(&mut self, source: &S) -> Result<ScanReport> {
        let mut report = WorkspaceScanner::new(source, self.pattern.clone(), self.filter.clone())
            .with_concurrency(self.config.concurrency)
            .scan()
            .await?;

        let persisted = self.store.load();
        report.records = reconcile(std::mem::take(&mut report.records), &persisted);
        self.store.save(&report.records)?;
        self.tree.set_comments(report.records.clone());
        Ok(report)
    }

    /// Find the record at `(file, line)` in the tree, then in saved state.
    pub fn find(&self, file: &str, line: u32) -> Option<CommentRecord> {
        self.tree
            .find(file, line)
            .cloned()
            .or_else(|| self.store.load().into_iter().find(|r| r.is_at(file, line)))
    }

    /// Create a tracker issue for the comment at `(file, line)`.
    ///
    /// The source line must still read as it did when scanned; otherwise no
    /// issue is created. A write-back failure after that does not fail the
    /// call: the issue already exists, so its number is still recorded and the
    /// failure is reported in [`CreatedIssue::marker`].
    ///
    /// # Errors
    ///
    /// [`CommentToIssueError::CommentNotFound`] for an unknown identity,
    /// [`CommentToIssueError::AlreadyLinked`] when linked and not forced,
    /// [`CommentToIssueError::StaleComment`] when the line was edited,
    /// [`CommentToIssueError::Tracker`] when the tracker is not configured or
    /// rejects the request, and a state error if saving fails.
    pub async fn create_issue<T: IssueTracker + ?Sized>(
        &mut self,
        tracker: &T,
        file: &str,
        line: u32,
        force: bool,
    ) -> Result<CreatedIssue> {
        let record = self
            .find(file, line)
            .ok_or_else(|| CommentToIssueError::CommentNotFound {
                file: file.to_string(),
                line,
            })?;

        if let (Some(number), false) = (record.issue_number, force) {
            return Err(CommentToIssueError::AlreadyLinked {
                file: file.to_string(),
                line,
                number,
            });
        }

        let missing = tracker.missing_settings().await;
        if !missing.is_empty() {
            return Err(TrackerError::not_configured(missing).into());
        }

        let current = read_line(&self.root, file, line).ok();
        if current.as_deref() != Some(record.text.as_str()) {
            warn!(file, line, "comment changed since the last scan");
            return Err(CommentToIssueError::StaleComment {
                file: file.to_string(),
                line,
            });
        }

        let info = tracker.create_issue(&record).await?;
        info!(file, line, number = info.number, "created issue");

        let written = insert_issue_marker(
            &self.root,
            file,
            line,
            info.number,
            Some(&record.text),
        );
        let marker = match written {
            Ok(outcome) => MarkerWrite::Written(outcome),
            Err(e) => {
                warn!(file, line, error = %e, "issue created but marker not written");
                MarkerWrite::Failed(e.to_string())
            }
        };

        self.tree.update_comment(file, line, info.number);

        let mut linked = CommentRecord {
            issue_number: Some(info.number),
            ..record
        };
        if let MarkerWrite::Written(WriteBackOutcome::Inserted { text }) = &marker {
            // keep state in step with the file so a later marker removal is seen
            linked.text = text.clone();
            let comments = replace_record(self.tree.comments(), &linked);
            self.tree.set_comments(comments);
        }

        self.store.record_issue(&linked, info.number)?;

        Ok(CreatedIssue {
            info,
            record: linked,
            marker,
        })
    }
}

fn replace_record(records: &[CommentRecord], replacement: &CommentRecord) -> Vec<CommentRecord> {
    records
        .iter()
        .map(|r| {
            if r.is_at(&replacement.file, replacement.line) {
                replacement.clone()
            } else {
                r.clone()
            }
        })
        .collect()
}
