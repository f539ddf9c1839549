//! comment-to-issue - annotated comments to tracker issues
//!
//! Finds comments such as `// ERROR: validate email [sev:alta; area:auth]` in a
//! workspace, persists them, shows them grouped by file, and links each one to
//! a GitHub issue through a `[GH-#n]` marker on the comment line.
//!
//! # Architecture
//!
//! - [`scanner`] - Metadata parser, line/file/workspace scanners
//! - [`source`] - File enumeration behind the [`source::FileSource`] trait
//! - [`store`] - Persisted state, issue-number merge and reconciliation
//! - [`view`] - Two-level tree of files and comments
//! - [`tracker`] - Issue tracker trait and the GitHub implementation
//! - [`writeback`] - Marker insertion into source files
//! - [`workflow`] - [`workflow::Workspace`], the scan and create-issue flows
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Mocks and fixtures
//!
//! # Example
//!
//! ```rust,ignore
//! use comment_to_issue::{FsFileSource, ProjectConfig, Workspace};
//!
//! let config = ProjectConfig::load(root)?;
//! let mut workspace = Workspace::open(root, config)?;
//! let report = workspace.scan(&FsFileSource::new(root)).await?;
//! for file in workspace.tree().file_nodes() {
//!     println!("{}", file.label());
//! }
//! ```

pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod scanner;
pub mod source;
pub mod store;
pub mod testing;
pub mod tracker;
pub mod view;
pub mod workflow;
pub mod writeback;

// Re-export commonly used types
pub use error::{CommentToIssueError, Result};

pub use config::ProjectConfig;
pub use model::{CommentRecord, IssueInfo, Metadata};
pub use scanner::{parse_metadata, scan_content, ScanPattern, ScanReport, WorkspaceScanner};
pub use source::{FileFilter, FileSource, FsFileSource};
pub use store::{merge_issue_number, reconcile, StateStore};
pub use tracker::{GitHubSettings, GitHubTracker, IssueDraft, IssueTracker, TrackerError};
pub use view::{CommentNode, CommentTree, FileNode, TreeNode};
pub use workflow::{CreatedIssue, MarkerWrite, Workspace};
pub use writeback::{insert_issue_marker, read_line, WriteBackOutcome};

pub use testing::{MockFileSource, MockGitOperations, MockIssueTracker};
