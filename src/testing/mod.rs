//! Testing infrastructure for comment-to-issue.
//!
//! Mocks for the file source, issue tracker and git seams, plus temporary
//! workspace fixtures (test-only).
//!
//! # Example
//!
//! ```rust,ignore
//! use comment_to_issue::testing::{MockFileSource, MockIssueTracker};
//!
//! let source = MockFileSource::new().with_file("a.ts", "// ERROR: x");
//! let tracker = MockIssueTracker::new().with_next_number(42);
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod mocks;

#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
