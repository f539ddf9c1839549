//! File enumeration and reading.
//!
//! The scanner never touches the file system directly. It goes through a
//! [`FileSource`], so tests can feed it in-memory files and a host editor
//! can plug in its own document store.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{CommentToIssueError, Result};

/// Default include glob: common source extensions.
pub const DEFAULT_INCLUDE: &str = "**/*.{ts,js,tsx,jsx,py,java,cs,cpp,c,go,rb,php,rs}";

/// Default exclude glob: dependency and build directories.
pub const DEFAULT_EXCLUDE: &str = "**/{node_modules,target,vendor,.git}/**";

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Include/exclude glob pair applied to workspace-relative paths.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    /// Build a filter from an include and an exclude glob.
    ///
    /// An empty exclude glob excludes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CommentToIssueError::InvalidConfig`] when either glob fails to
    /// compile.
    pub fn new(include: &str, exclude: &str) -> Result<Self> {
        Ok(Self {
            include: build_set("include", include)?,
            exclude: build_set("exclude", exclude)?,
        })
    }

    /// Whether a `/`-separated relative path passes the filter.
    pub fn is_match(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(DEFAULT_INCLUDE, DEFAULT_EXCLUDE).unwrap_or_else(|_| Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        })
    }
}

fn build_set(field: &str, glob: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    if !glob.trim().is_empty() {
        let glob = Glob::new(glob.trim())
            .map_err(|e| CommentToIssueError::invalid_config(field, e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CommentToIssueError::invalid_config(field, e.to_string()))
}

/// File-enumeration service consumed by the workspace scanner.
///
/// Identities are workspace-relative, `/`-separated paths.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// List candidate files accepted by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be enumerated at all.
    async fn list_files(&self, filter: &FileFilter) -> anyhow::Result<Vec<String>>;

    /// Read one file as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not text.
    async fn read_text(&self, file: &str) -> anyhow::Result<String>;
}

/// [`FileSource`] backed by the local file system.
#[derive(Debug, Clone)]
pub struct FsFileSource {
    root: PathBuf,
    respect_gitignore: bool,
}

impl FsFileSource {
    /// Create a source rooted at the workspace directory.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            respect_gitignore: true,
        }
    }

    /// Toggle `.gitignore` handling during enumeration.
    #[must_use]
    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(root: &Path, respect_gitignore: bool) -> Vec<PathBuf> {
        if respect_gitignore {
            ignore::WalkBuilder::new(root)
                .hidden(false)
                .git_ignore(true)
                .require_git(false)
                .filter_entry(|e| e.file_name() != ".git")
                .build()
                .filter_map(|e| {
                    e.map_err(|err| warn!(error = %err, "skipping unreadable path"))
                        .ok()
                })
                .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
                .map(|e| e.into_path())
                .collect()
        } else {
            WalkDir::new(root)
                .into_iter()
                .filter_entry(|e| e.file_name() != ".git")
                .filter_map(|e| {
                    e.map_err(|err| warn!(error = %err, "skipping unreadable path"))
                        .ok()
                })
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect()
        }
    }
}

/// Convert a path under `root` into a `/`-separated relative identity.
pub fn relative_identity(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[async_trait]
impl FileSource for FsFileSource {
    async fn list_files(&self, filter: &FileFilter) -> anyhow::Result<Vec<String>> {
        if !self.root.is_dir() {
            bail!("workspace root is not a directory: {}", self.root.display());
        }

        let root = self.root.clone();
        let respect_gitignore = self.respect_gitignore;
        let paths = tokio::task::spawn_blocking(move || Self::walk(&root, respect_gitignore))
            .await
            .context("file enumeration task failed")?;

        let mut files: Vec<String> = paths
            .iter()
            .filter_map(|p| relative_identity(&self.root, p))
            .filter(|rel| filter.is_match(rel))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn read_text(&self, file: &str) -> anyhow::Result<String> {
        let path = self.root.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
        if sniff.contains(&0) {
            bail!("binary file skipped: {}", path.display());
        }

        String::from_utf8(bytes).with_context(|| format!("not valid UTF-8: {}", path.display()))
    }
}
