//! File scanner: turns one file's text into comment records.

use tracing::{debug, warn};

use super::pattern::ScanPattern;
use crate::model::CommentRecord;
use crate::source::FileSource;

/// Scan already-loaded file content.
///
/// Lines are split on `\n` with an optional preceding `\r`; a final line
/// terminator does not produce an extra empty line. Records come back in
/// ascending line order.
pub fn scan_content(file: &str, content: &str, pattern: &ScanPattern) -> Vec<CommentRecord> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let found = pattern.scan_line(line)?;
            let line_number = u32::try_from(index + 1).ok()?;
            let text = line.strip_suffix('\r').unwrap_or(line).trim();
            Some(CommentRecord {
                file: file.to_string(),
                line: line_number,
                text: text.to_string(),
                message: found.message,
                metadata: found.metadata,
                issue_number: found.issue_number,
            })
        })
        .collect()
}

/// Read and scan one file through `source`.
///
/// # Errors
///
/// Returns the read failure so callers can count it.
pub async fn try_scan_file<S>(
    source: &S,
    file: &str,
    pattern: &ScanPattern,
) -> anyhow::Result<Vec<CommentRecord>>
where
    S: FileSource + ?Sized,
{
    let content = source.read_text(file).await?;
    let records = scan_content(file, &content, pattern);
    debug!(file, found = records.len(), "scanned file");
    Ok(records)
}

/// Read and scan one file, swallowing failures.
///
/// An unreadable or binary file yields no records; the failure is logged.
pub async fn scan_file<S>(source: &S, file: &str, pattern: &ScanPattern) -> Vec<CommentRecord>
where
    S: FileSource + ?Sized,
{
    match try_scan_file(source, file, pattern).await {
        Ok(records) => records,
        Err(e) => {
            warn!(file, error = %e, "skipping file");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DEFAULT_PATTERN;
    use crate::testing::MockFileSource;

    fn pattern() -> ScanPattern {
        ScanPattern::new(DEFAULT_PATTERN).unwrap()
    }

    #[test]
    fn test_scan_content_line_numbers_and_text() {
        let content = "fn main() {}\n    // ERROR: first [sev:alta]\n\n// ERROR: second\n";
        let records = scan_content("src/main.rs", content, &pattern());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file, "src/main.rs");
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].text, "// ERROR: first [sev:alta]");
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].line, 4);
        assert!(records[1].metadata.is_empty());
    }

    #[test]
    fn test_scan_content_crlf() {
        let content = "a\r\n// ERROR: one [k:v]\r\nb\r\n// ERROR: two\r\n";
        let records = scan_content("a.ts", content, &pattern());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].text, "// ERROR: one [k:v]");
        assert_eq!(records[0].metadata.get("k").map(String::as_str), Some("v"));
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].message, "two");
    }

    #[test]
    fn test_scan_content_is_idempotent() {
        let content = "// ERROR: x [a:b]\nlet y = 2;\n// ERROR: z [GH-#4]\n";
        let p = pattern();
        assert_eq!(scan_content("f.js", content, &p), scan_content("f.js", content, &p));
    }

    #[test]
    fn test_scan_content_empty() {
        assert!(scan_content("f.js", "", &pattern()).is_empty());
    }

    #[test]
    fn test_end_to_end_marker_lines() {
        let mut lines = vec!["// filler"; 9];
        lines[4] = "// ERROR: fix auth [sev:alta; area:auth]";
        lines[8] = "// ERROR: fix auth [sev:alta; area:auth] [GH-#42]";
        let content = lines.join("\n");

        let records = scan_content("src/auth.ts", &content, &pattern());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 5);
        assert_eq!(records[0].issue_number, None);
        assert_eq!(records[1].line, 9);
        assert_eq!(records[1].issue_number, Some(42));
        assert_eq!(records[0].metadata, records[1].metadata);
    }

    #[tokio::test]
    async fn test_scan_file_swallows_read_failure() {
        let source = MockFileSource::new()
            .with_file("ok.ts", "// ERROR: fine")
            .with_unreadable("bad.ts");

        assert_eq!(scan_file(&source, "ok.ts", &pattern()).await.len(), 1);
        assert!(scan_file(&source, "bad.ts", &pattern()).await.is_empty());
        assert!(scan_file(&source, "missing.ts", &pattern()).await.is_empty());
        assert!(try_scan_file(&source, "bad.ts", &pattern()).await.is_err());
    }
}
