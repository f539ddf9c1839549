//! Workspace scanner: enumerates candidate files and scans each one.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::file::try_scan_file;
use super::pattern::ScanPattern;
use crate::error::{CommentToIssueError, Result};
use crate::model::CommentRecord;
use crate::source::{FileFilter, FileSource};

/// Default number of file reads kept in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Outcome of a full workspace scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// All records, grouped by file in enumeration order, ascending line
    /// order within a file.
    pub records: Vec<CommentRecord>,
    /// Number of candidate files.
    pub files_scanned: usize,
    /// Files that could not be read and contributed nothing.
    pub failed_files: Vec<String>,
}

/// Scans every candidate file of a workspace.
pub struct WorkspaceScanner<'a, S: FileSource + ?Sized> {
    source: &'a S,
    pattern: ScanPattern,
    filter: FileFilter,
    concurrency: usize,
}

impl<'a, S: FileSource + ?Sized> WorkspaceScanner<'a, S> {
    /// Create a scanner with the default concurrency.
    pub fn new(source: &'a S, pattern: ScanPattern, filter: FileFilter) -> Self {
        Self {
            source,
            pattern,
            filter,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set how many files are read at once. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Scan the workspace.
    ///
    /// Per-file failures are logged and recorded in the report; they never
    /// abort the scan.
    ///
    /// # Errors
    ///
    /// Returns [`CommentToIssueError::Scan`] only when the file list itself
    /// cannot be produced.
    pub async fn scan(&self) -> Result<ScanReport> {
        let files = self
            .source
            .list_files(&self.filter)
            .await
            .map_err(|e| CommentToIssueError::scan(e.to_string()))?;

        let pattern = &self.pattern;
        // buffered() yields in input order, keeping the output deterministic
        let results: Vec<(String, anyhow::Result<Vec<CommentRecord>>)> = stream::iter(files)
            .map(|file| async move {
                let result = try_scan_file(self.source, &file, pattern).await;
                (file, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = ScanReport {
            files_scanned: results.len(),
            ..ScanReport::default()
        };
        for (file, result) in results {
            match result {
                Ok(records) => report.records.extend(records),
                Err(e) => {
                    warn!(file = %file, error = %e, "skipping file");
                    report.failed_files.push(file);
                }
            }
        }

        info!(
            files = report.files_scanned,
            failed = report.failed_files.len(),
            comments = report.records.len(),
            "workspace scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DEFAULT_PATTERN;
    use crate::testing::MockFileSource;

    fn scanner(source: &MockFileSource) -> WorkspaceScanner<'_, MockFileSource> {
        WorkspaceScanner::new(
            source,
            ScanPattern::new(DEFAULT_PATTERN).unwrap(),
            FileFilter::default(),
        )
    }

    fn sample_source() -> MockFileSource {
        MockFileSource::new()
            .with_file("src/b.ts", "// ERROR: b1\nx\n// ERROR: b2 [sev:baja]\n")
            .with_file("src/a.ts", "// ERROR: a1\n")
            .with_file("README.md", "// ERROR: not scanned\n")
            .with_file("node_modules/x/i.js", "// ERROR: vendored\n")
    }

    #[tokio::test]
    async fn test_scan_concatenates_candidate_files() {
        let source = sample_source();
        let report = scanner(&source).scan().await.unwrap();

        assert_eq!(report.files_scanned, 2);
        assert!(report.failed_files.is_empty());
        let ids: Vec<(&str, u32)> = report
            .records
            .iter()
            .map(|r| (r.file.as_str(), r.line))
            .collect();
        assert_eq!(ids, vec![("src/a.ts", 1), ("src/b.ts", 1), ("src/b.ts", 3)]);
    }

    #[tokio::test]
    async fn test_scan_isolates_failing_files() {
        let source = sample_source().with_unreadable("src/c.ts");
        let report = scanner(&source).scan().await.unwrap();

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.failed_files, vec!["src/c.ts".to_string()]);
        assert_eq!(report.records.len(), 3);
    }

    #[tokio::test]
    async fn test_rescan_is_identical() {
        let source = sample_source();
        let scanner = scanner(&source).with_concurrency(3);
        let first = scanner.scan().await.unwrap();
        let second = scanner.scan().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_output() {
        let source = sample_source();
        let serial = scanner(&source).with_concurrency(1).scan().await.unwrap();
        let wide = scanner(&source).with_concurrency(16).scan().await.unwrap();
        assert_eq!(serial, wide);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_an_error() {
        let source = MockFileSource::new().with_list_error("permission denied");
        let err = scanner(&source).scan().await.unwrap_err();
        assert!(matches!(err, CommentToIssueError::Scan { .. }));
    }
}
