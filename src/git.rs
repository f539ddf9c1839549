//! Git lookups used to build links to the remote repository.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Branch used when the current branch cannot be determined.
pub const FALLBACK_REF: &str = "main";

/// Abstraction for the git queries remote links need.
pub trait GitOperations: Send + Sync {
    /// Get the current HEAD commit hash.
    ///
    /// # Errors
    ///
    /// Returns an error if git is not available or not in a repository.
    fn get_commit_hash(&self) -> Result<String>;

    /// Get the current branch name.
    ///
    /// # Errors
    ///
    /// Returns an error if not in a git repository or HEAD is detached.
    fn get_branch(&self) -> Result<String>;
}

/// Branch name, or [`FALLBACK_REF`] when unavailable.
pub fn branch_or_fallback(git: &dyn GitOperations) -> String {
    git.get_branch()
        .ok()
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| FALLBACK_REF.to_string())
}

/// Commit hash, or [`FALLBACK_REF`] when unavailable.
pub fn commit_or_fallback(git: &dyn GitOperations) -> String {
    git.get_commit_hash()
        .ok()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| FALLBACK_REF.to_string())
}

/// Git operations backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct RealGitOperations {
    project_dir: PathBuf,
}

impl RealGitOperations {
    /// Create a new git operations instance for the given directory.
    #[must_use]
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
        }
    }

    fn run(&self, args: &[&str], what: &str) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.project_dir)
            .output()
            .with_context(|| format!("Failed to {what}"))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )
        }
    }
}

impl GitOperations for RealGitOperations {
    fn get_commit_hash(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"], "run git rev-parse")
    }

    fn get_branch(&self) -> Result<String> {
        self.run(&["branch", "--show-current"], "get current branch")
    }
}
