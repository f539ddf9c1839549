//! Annotation scanning.
//!
//! - [`metadata`] - parses `key:value; key:value` blocks
//! - [`pattern`] - applies the configured pattern to a single line
//! - [`file`] - scans one file's text into [`CommentRecord`](crate::model::CommentRecord)s
//! - [`workspace`] - fans out over every candidate file

pub mod file;
pub mod metadata;
pub mod pattern;
pub mod workspace;

pub use file::{scan_content, scan_file, try_scan_file};
pub use metadata::parse_metadata;
pub use pattern::{LineMatch, ScanPattern, DEFAULT_PATTERN};
pub use workspace::{ScanReport, WorkspaceScanner, DEFAULT_CONCURRENCY};
