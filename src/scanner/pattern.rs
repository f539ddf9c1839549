//! Line scanner: one compiled pattern applied to one line at a time.
//!
//! The pattern must have exactly two capture groups. Group 1 is the message,
//! group 2 the optional metadata block interior. Matching is stateless:
//! `Regex::captures` always starts at the beginning of the haystack, so a
//! compiled pattern can be shared across lines, files and rescans.

use regex::Regex;

use super::metadata::parse_metadata;
use crate::error::{CommentToIssueError, Result};
use crate::model::{parse_issue_marker, strip_trailing_markers, Metadata};

/// Pattern matching `// ERROR: message [key:value; ...]`.
pub const DEFAULT_PATTERN: &str = r"//\s*ERROR:\s*(.+?)(?:\[(.+?)\])?$";

/// Number of capture groups a scan pattern must define.
const REQUIRED_GROUPS: usize = 2;

/// A raw match produced for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// Trimmed message from group 1.
    pub message: String,
    /// Parsed group 2, empty when the line has no metadata block.
    pub metadata: Metadata,
    /// Number from an existing `[GH-#n]` marker on the line.
    pub issue_number: Option<u64>,
}

/// A validated, compiled annotation pattern.
#[derive(Debug, Clone)]
pub struct ScanPattern {
    regex: Regex,
}

impl ScanPattern {
    /// Compile and validate a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CommentToIssueError::InvalidPattern`] if the pattern does not
    /// compile or does not define exactly two capture groups.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| CommentToIssueError::invalid_pattern(pattern, e.to_string()))?;

        // captures_len counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != REQUIRED_GROUPS {
            return Err(CommentToIssueError::invalid_pattern(
                pattern,
                format!("expected {REQUIRED_GROUPS} capture groups, found {groups}"),
            ));
        }

        Ok(Self { regex })
    }

    /// The pattern source text.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Apply the pattern to one line.
    ///
    /// A trailing `\r` is ignored. Trailing `[GH-#n]` markers are removed
    /// before the pattern runs so they never leak into the message or the
    /// metadata; the marker itself is read from the full line.
    pub fn scan_line(&self, line: &str) -> Option<LineMatch> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let candidate = strip_trailing_markers(line);

        let caps = self.regex.captures(candidate)?;
        let message = caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let metadata = parse_metadata(caps.get(2).map(|m| m.as_str()));

        Some(LineMatch {
            message,
            metadata,
            issue_number: parse_issue_marker(line),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pattern() -> ScanPattern {
        ScanPattern::new(DEFAULT_PATTERN).unwrap()
    }

    #[test]
    fn test_default_pattern_with_metadata() {
        let pattern = default_pattern();
        let m = pattern
            .scan_line("    // ERROR: fix auth [sev:alta; area:auth]")
            .unwrap();
        assert_eq!(m.message, "fix auth");
        assert_eq!(m.metadata.get("sev").map(String::as_str), Some("alta"));
        assert_eq!(m.metadata.get("area").map(String::as_str), Some("auth"));
        assert_eq!(m.issue_number, None);
    }

    #[test]
    fn test_default_pattern_without_metadata() {
        let pattern = default_pattern();
        let m = pattern.scan_line("// ERROR: add rate limiting").unwrap();
        assert_eq!(m.message, "add rate limiting");
        assert!(m.metadata.is_empty());
    }

    #[test]
    fn test_non_matching_lines() {
        let pattern = default_pattern();
        assert!(pattern.scan_line("let x = 1;").is_none());
        assert!(pattern.scan_line("// TODO: later").is_none());
        assert!(pattern.scan_line("").is_none());
        assert!(pattern.scan_line("// ERROR:").is_none());
    }

    #[test]
    fn test_issue_marker_is_read_and_kept_out_of_metadata() {
        let pattern = default_pattern();
        let m = pattern
            .scan_line("// ERROR: fix auth [sev:alta; area:auth] [GH-#42]")
            .unwrap();
        assert_eq!(m.issue_number, Some(42));
        assert_eq!(m.message, "fix auth");
        assert_eq!(m.metadata.get("area").map(String::as_str), Some("auth"));
        assert_eq!(m.metadata.len(), 2);
    }

    #[test]
    fn test_marker_without_metadata() {
        let pattern = default_pattern();
        let m = pattern.scan_line("// ERROR: cache this [GH-#7]").unwrap();
        assert_eq!(m.message, "cache this");
        assert!(m.metadata.is_empty());
        assert_eq!(m.issue_number, Some(7));
    }

    #[test]
    fn test_carriage_return_is_ignored() {
        let pattern = default_pattern();
        let m = pattern.scan_line("// ERROR: windows line [sev:low]\r").unwrap();
        assert_eq!(m.message, "windows line");
        assert_eq!(m.metadata.get("sev").map(String::as_str), Some("low"));
    }

    #[test]
    fn test_repeated_scans_are_identical() {
        let pattern = default_pattern();
        let line = "// ERROR: same [a:b]";
        let first = pattern.scan_line(line);
        let second = pattern.scan_line(line);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = ScanPattern::new(r"#\s*FIXME\((.+?)\)\s*(?:\{(.+)\})?$").unwrap();
        let m = pattern.scan_line("# FIXME(flaky test) {owner:ana}").unwrap();
        assert_eq!(m.message, "flaky test");
        assert_eq!(m.metadata.get("owner").map(String::as_str), Some("ana"));
    }

    #[test]
    fn test_rejects_wrong_group_count() {
        let err = ScanPattern::new(r"ERROR: (.+)").unwrap_err();
        assert!(matches!(err, CommentToIssueError::InvalidPattern { .. }));
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_rejects_invalid_regex() {
        let err = ScanPattern::new(r"ERROR: (.+").unwrap_err();
        assert!(matches!(err, CommentToIssueError::InvalidPattern { .. }));
    }

    #[test]
    fn test_default_pattern_source() {
        assert_eq!(default_pattern().as_str(), DEFAULT_PATTERN);
    }
}
