//! Configuration management for comment-to-issue.
//!
//! Settings are read from `.comment-to-issue.toml` at the workspace root. A
//! missing file means defaults. The GitHub token is never stored here; it is
//! supplied by the caller (CLI flag or `GITHUB_TOKEN`) when the tracker is
//! built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CommentToIssueError, Result};
use crate::scanner::{ScanPattern, DEFAULT_CONCURRENCY, DEFAULT_PATTERN};
use crate::source::{FileFilter, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use crate::tracker::github::{GitHubSettings, DEFAULT_API_URL};

/// Configuration file name at the workspace root.
pub const CONFIG_FILE: &str = ".comment-to-issue.toml";

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_include() -> String {
    DEFAULT_INCLUDE.to_string()
}

fn default_exclude() -> String {
    DEFAULT_EXCLUDE.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_true() -> bool {
    true
}

/// Workspace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Line pattern with exactly two capture groups (message, metadata).
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Glob of files to scan.
    #[serde(default = "default_include")]
    pub include: String,

    /// Glob of files to skip.
    #[serde(default = "default_exclude")]
    pub exclude: String,

    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Files read at once during a scan.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub github: GitHubConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            include: default_include(),
            exclude: default_exclude(),
            respect_gitignore: true,
            concurrency: DEFAULT_CONCURRENCY,
            view: ViewConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Sort file nodes ignoring case.
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Remote repository identity. Credentials are not part of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            api_url: default_api_url(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a project directory
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file exists but cannot be read or
    /// parsed.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::config_path(project_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            CommentToIssueError::config_with_path(format!("failed to read: {e}"), path.clone())
        })?;
        toml::from_str(&content).map_err(|e| {
            CommentToIssueError::config_with_path(format!("failed to parse: {e}"), path)
        })
    }

    /// Get the config file path for a project
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE)
    }

    /// Compile the scan pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CommentToIssueError::InvalidPattern`] for a bad pattern.
    pub fn scan_pattern(&self) -> Result<ScanPattern> {
        ScanPattern::new(&self.pattern)
    }

    /// Compile the include/exclude globs.
    ///
    /// # Errors
    ///
    /// Returns [`CommentToIssueError::InvalidConfig`] for a bad glob.
    pub fn file_filter(&self) -> Result<FileFilter> {
        FileFilter::new(&self.include, &self.exclude)
    }

    /// Check every setting that can be checked offline.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.scan_pattern()?;
        self.file_filter()?;
        if self.concurrency == 0 {
            return Err(CommentToIssueError::invalid_config(
                "concurrency",
                "must be at least 1",
            ));
        }
        let api_url = &self.github.api_url;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(CommentToIssueError::invalid_config(
                "github.api_url",
                "must be an http(s) URL",
            ));
        }
        Ok(())
    }

    /// Tracker settings with an explicitly supplied token.
    pub fn github_settings(&self, token: Option<String>) -> GitHubSettings {
        GitHubSettings {
            owner: self.github.owner.clone(),
            repo: self.github.repo.clone(),
            token,
            api_url: self.github.api_url.clone(),
        }
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CommentToIssueError::config(e.to_string()))
    }

    /// Write the default configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file exists and `force` is false, or on write failure.
    pub fn write_default(project_dir: &Path, force: bool) -> Result<PathBuf> {
        let path = Self::config_path(project_dir);
        if path.exists() && !force {
            return Err(CommentToIssueError::config_with_path(
                "configuration file already exists (use --force to overwrite)",
                path,
            ));
        }
        std::fs::write(&path, Self::default().to_toml()?)?;
        Ok(path)
    }
}
