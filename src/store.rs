//! Persisted comment state.
//!
//! The full record list lives in `.comment-to-issue.json` at the workspace
//! root. Writes go to a temporary file which is then renamed over the state
//! file, so readers only ever see a complete document. A missing or corrupt
//! state file reads as an empty list.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{CommentToIssueError, Result};
use crate::model::CommentRecord;

/// State file name at the workspace root.
pub const STATE_FILE: &str = ".comment-to-issue.json";

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Lock file suffix serializing concurrent writers.
const LOCK_SUFFIX: &str = ".lock";

/// Reads and writes the persisted record list.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Create a store for the given workspace root.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the path to the state file.
    #[must_use]
    pub fn state_file_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Returns the path to the temporary state file.
    #[must_use]
    pub fn tmp_file_path(&self) -> PathBuf {
        self.dir.join(format!("{STATE_FILE}{TMP_SUFFIX}"))
    }

    /// Returns the path to the lock file.
    #[must_use]
    pub fn lock_file_path(&self) -> PathBuf {
        self.dir.join(format!("{STATE_FILE}{LOCK_SUFFIX}"))
    }

    /// Checks if a state file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.state_file_path().exists()
    }

    /// Replace the persisted state with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`CommentToIssueError::StateSave`] if the directory, lock,
    /// temporary file or rename fails.
    pub fn save(&self, records: &[CommentRecord]) -> Result<()> {
        self.write_atomic(records)
            .map_err(|e| CommentToIssueError::StateSave {
                path: self.state_file_path(),
                message: e.to_string(),
            })?;
        debug!(count = records.len(), "saved comment state");
        Ok(())
    }

    fn write_atomic(&self, records: &[CommentRecord]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let lock_file = File::create(self.lock_file_path())?;
        FileExt::lock_exclusive(&lock_file)?;

        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.tmp_file_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, self.state_file_path())?;
        FileExt::unlock(&lock_file)?;
        Ok(())
    }

    /// Load the last saved list.
    ///
    /// Absence and parse failures both yield an empty list; a corrupt file is
    /// left in place and overwritten by the next save.
    #[must_use]
    pub fn load(&self) -> Vec<CommentRecord> {
        let path = self.state_file_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read state file {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Corrupted state file at {}: {}. Treating as empty.",
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Load, link `record`'s identity to `issue_number`, and save.
    ///
    /// A persisted record at the same identity takes the number and
    /// `record.text`; otherwise `record` is appended with the number set.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn record_issue(
        &self,
        record: &CommentRecord,
        issue_number: u64,
    ) -> Result<Vec<CommentRecord>> {
        let mut updated =
            merge_issue_number(&self.load(), &record.file, record.line, issue_number);
        match updated
            .iter_mut()
            .find(|r| r.is_at(&record.file, record.line))
        {
            Some(existing) => existing.text = record.text.clone(),
            None => updated.push(record.clone().with_issue_number(issue_number)),
        }
        self.save(&updated)?;
        Ok(updated)
    }
}

/// Set `issue_number` on every record at `(file, line)`.
///
/// Pure: the input is untouched and every other record is copied as is.
/// Matching is by identity, so it applies equally to loaded and freshly
/// scanned lists. An absent identity yields an equal list.
pub fn merge_issue_number(
    records: &[CommentRecord],
    file: &str,
    line: u32,
    issue_number: u64,
) -> Vec<CommentRecord> {
    records
        .iter()
        .map(|record| {
            if record.is_at(file, line) {
                CommentRecord {
                    issue_number: Some(issue_number),
                    ..record.clone()
                }
            } else {
                record.clone()
            }
        })
        .collect()
}

/// Recover issue numbers for a fresh scan from persisted state.
///
/// A marker on the scanned line always wins. Without one, the persisted
/// number for the same identity is carried over when the persisted line had
/// no marker either, since the link only ever lived in state. Edits to the
/// message keep the link. A persisted line that had a marker which is now
/// gone has had it removed on purpose, so the number is dropped.
pub fn reconcile(fresh: Vec<CommentRecord>, persisted: &[CommentRecord]) -> Vec<CommentRecord> {
    let known: HashMap<(&str, u32), &CommentRecord> = persisted
        .iter()
        .map(|r| ((r.file.as_str(), r.line), r))
        .collect();

    fresh
        .into_iter()
        .map(|mut record| {
            if record.issue_number.is_none() {
                let recovered = known
                    .get(&(record.file.as_str(), record.line))
                    .filter(|prev| !prev.has_marker())
                    .and_then(|prev| prev.issue_number);
                if recovered.is_some() {
                    record.issue_number = recovered;
                }
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use tempfile::TempDir;

    fn test_store() -> (StateStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = StateStore::new(temp_dir.path());
        (store, temp_dir)
    }

    fn sample() -> Vec<CommentRecord> {
        let mut meta = Metadata::new();
        meta.insert("sev".into(), "alta".into());
        meta.insert("area".into(), "auth".into());
        vec![
            CommentRecord::new(
                "src/a.ts",
                5,
                "// ERROR: fix auth [sev:alta; area:auth]",
                "fix auth",
            )
            .with_metadata(meta.clone()),
            CommentRecord::new(
                "src/a.ts",
                9,
                "// ERROR: fix auth [sev:alta; area:auth] [GH-#42]",
                "fix auth",
            )
            .with_metadata(meta)
            .with_issue_number(42),
            CommentRecord::new("src/b.ts", 1, "// ERROR: other", "other"),
        ]
    }

    #[test]
    fn test_load_returns_empty_when_missing() {
        let (store, _temp) = test_store();
        assert!(!store.exists());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (store, _temp) = test_store();
        let records = sample();

        store.save(&records).expect("save should succeed");
        assert!(store.exists());
        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_saved_json_omits_absent_issue_number() {
        let (store, _temp) = test_store();
        store.save(&sample()).expect("save");

        let json = fs::read_to_string(store.state_file_path()).unwrap();
        assert_eq!(json.matches("issueNumber").count(), 1);
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_atomic_write_leaves_no_tmp_file() {
        let (store, _temp) = test_store();
        store.save(&sample()).expect("save");
        assert!(!store.tmp_file_path().exists());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let (store, _temp) = test_store();
        store.save(&sample()).expect("first save");
        store.save(&[]).expect("second save");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupted_file_reads_as_empty() {
        let (store, _temp) = test_store();
        fs::write(store.state_file_path(), "not valid json {{{").unwrap();
        assert!(store.load().is_empty());

        store.save(&sample()).expect("save over corrupt file");
        assert_eq!(store.load().len(), 3);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("deep").join("nested");
        let store = StateStore::new(&nested);
        store.save(&sample()).expect("save");
        assert!(nested.join(STATE_FILE).exists());
    }

    #[test]
    fn test_merge_changes_exactly_one_record() {
        let records = sample();
        let merged = merge_issue_number(&records, "src/a.ts", 5, 77);

        assert_eq!(merged.len(), records.len());
        assert_eq!(merged[0].issue_number, Some(77));
        assert_eq!(
            CommentRecord {
                issue_number: None,
                ..merged[0].clone()
            },
            records[0]
        );
        assert_eq!(merged[1], records[1]);
        assert_eq!(merged[2], records[2]);
        assert_eq!(records[0].issue_number, None);
    }

    #[test]
    fn test_merge_absent_identity_is_noop() {
        let records = sample();
        assert_eq!(merge_issue_number(&records, "src/a.ts", 6, 1), records);
        assert_eq!(merge_issue_number(&records, "src/c.ts", 5, 1), records);
        assert!(merge_issue_number(&[], "src/a.ts", 5, 1).is_empty());
    }

    #[test]
    fn test_merge_applies_to_structurally_new_records() {
        let loaded = sample();
        let rescanned: Vec<CommentRecord> = loaded.iter().cloned().collect();
        assert_eq!(
            merge_issue_number(&rescanned, "src/b.ts", 1, 3),
            merge_issue_number(&loaded, "src/b.ts", 1, 3)
        );
    }

    #[test]
    fn test_record_issue_updates_persisted_state() {
        let (store, _temp) = test_store();
        store.save(&sample()).expect("save");

        let linked = CommentRecord::new("src/b.ts", 1, "// ERROR: other [GH-#8]", "other");
        let updated = store.record_issue(&linked, 8).expect("record");
        assert_eq!(updated.len(), 3);
        assert_eq!(updated[2].issue_number, Some(8));
        assert_eq!(updated[2].text, "// ERROR: other [GH-#8]");
        assert_eq!(store.load(), updated);
    }

    #[test]
    fn test_record_issue_appends_unknown_identity() {
        let (store, _temp) = test_store();
        store.save(&sample()).expect("save");

        let record = CommentRecord::new("src/c.ts", 2, "// ERROR: new", "new");
        let updated = store.record_issue(&record, 11).expect("record");
        assert_eq!(updated.len(), 4);
        assert_eq!(updated[3], record.with_issue_number(11));
        assert_eq!(store.load(), updated);
    }

    #[test]
    fn test_reconcile_recovers_state_only_link() {
        let persisted =
            vec![CommentRecord::new("a.ts", 3, "// ERROR: x", "x").with_issue_number(5)];
        let fresh = vec![CommentRecord::new("a.ts", 3, "// ERROR: x", "x")];

        let merged = reconcile(fresh, &persisted);
        assert_eq!(merged[0].issue_number, Some(5));
    }

    #[test]
    fn test_reconcile_clears_when_marker_removed() {
        let persisted = vec![
            CommentRecord::new("a.ts", 3, "// ERROR: x [GH-#5]", "x").with_issue_number(5),
        ];
        let fresh = vec![CommentRecord::new("a.ts", 3, "// ERROR: x", "x")];

        let merged = reconcile(fresh, &persisted);
        assert_eq!(merged[0].issue_number, None);
    }

    #[test]
    fn test_reconcile_marker_wins() {
        let persisted =
            vec![CommentRecord::new("a.ts", 3, "// ERROR: x", "x").with_issue_number(5)];
        let fresh =
            vec![CommentRecord::new("a.ts", 3, "// ERROR: x [GH-#9]", "x").with_issue_number(9)];

        assert_eq!(reconcile(fresh, &persisted)[0].issue_number, Some(9));
    }

    #[test]
    fn test_reconcile_keeps_link_when_message_reworded() {
        let persisted = vec![
            CommentRecord::new("a.ts", 3, "// ERROR: fix login", "fix login").with_issue_number(5),
        ];
        let fresh = vec![CommentRecord::new(
            "a.ts",
            3,
            "// ERROR: fix login flow",
            "fix login flow",
        )];

        let merged = reconcile(fresh, &persisted);
        assert_eq!(merged[0].issue_number, Some(5));
        assert_eq!(merged[0].message, "fix login flow");
    }

    #[test]
    fn test_reconcile_drops_vanished_records() {
        let persisted = sample();
        let fresh = vec![CommentRecord::new("src/b.ts", 1, "// ERROR: other", "other")];

        let merged = reconcile(fresh, &persisted);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].file, "src/b.ts");
    }
}
