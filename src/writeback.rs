//! Writes `[GH-#n]` markers back into source files.
//!
//! The marker is appended to the end of the annotated line. A line that
//! already carries a marker is left alone. Line endings are preserved and the
//! file is replaced atomically.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{CommentToIssueError, Result};
use crate::model::{format_issue_marker, ISSUE_MARKER_PREFIX};

/// What happened to the target line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBackOutcome {
    /// The marker was appended. `text` is the new line, trimmed the way a
    /// scan records it.
    Inserted { text: String },
    /// The line already had a marker; the file was not touched.
    AlreadyMarked,
}

/// Append the marker for `issue_number` to line `line` of `file`.
///
/// When `expected_text` is given, the trimmed line must still equal it, which
/// guards against edits made since the scan.
///
/// # Errors
///
/// Returns [`CommentToIssueError::WriteBack`] if the file cannot be read or
/// written, the line does not exist, or the line no longer matches.
pub fn insert_issue_marker(
    root: &Path,
    file: &str,
    line: u32,
    issue_number: u64,
    expected_text: Option<&str>,
) -> Result<WriteBackOutcome> {
    let path = root.join(file);
    let fail = |message: String| CommentToIssueError::write_back(file, line, message);

    let content = fs::read_to_string(&path).map_err(|e| fail(e.to_string()))?;
    let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
    let index = line_index(&lines, line).map_err(fail)?;
    let (body, ending) = split_line_ending(lines[index]);

    if let Some(expected) = expected_text {
        if body.trim() != expected {
            return Err(fail("line changed since the last scan".to_string()));
        }
    }

    if body.contains(ISSUE_MARKER_PREFIX) {
        debug!(file, line, "issue marker already present");
        return Ok(WriteBackOutcome::AlreadyMarked);
    }

    let marked = format!("{body} {}", format_issue_marker(issue_number));
    let updated = format!("{marked}{ending}");
    lines[index] = &updated;
    let new_content: String = lines.concat();

    write_atomic(&path, &new_content).map_err(|e| fail(e.to_string()))?;
    info!(file, line, issue_number, "wrote issue marker");
    Ok(WriteBackOutcome::Inserted {
        text: marked.trim().to_string(),
    })
}

/// Read line `line` of `file`, trimmed the way a scan records it.
///
/// # Errors
///
/// Returns [`CommentToIssueError::WriteBack`] if the file cannot be read or
/// the line does not exist.
pub fn read_line(root: &Path, file: &str, line: u32) -> Result<String> {
    let fail = |message: String| CommentToIssueError::write_back(file, line, message);

    let content = fs::read_to_string(root.join(file)).map_err(|e| fail(e.to_string()))?;
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let index = line_index(&lines, line).map_err(fail)?;
    Ok(split_line_ending(lines[index]).0.trim().to_string())
}

fn line_index(lines: &[&str], line: u32) -> std::result::Result<usize, String> {
    usize::try_from(line)
        .ok()
        .and_then(|l| l.checked_sub(1))
        .filter(|i| *i < lines.len())
        .ok_or_else(|| format!("file has {} lines", lines.len()))
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.c2i.tmp"));

    let mut tmp = File::create(&tmp_path)?;
    tmp.write_all(content.as_bytes())?;
    tmp.sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(&tmp_path, metadata.permissions())?;
    }
    fs::rename(&tmp_path, path)
}
