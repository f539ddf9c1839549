//! Custom error types for comment-to-issue.
//!
//! Scanning and state failures are mostly recovered where they happen and
//! only logged. What reaches this type is what a caller has to act on: bad
//! configuration, a failed enumeration, a write-back that could not be
//! applied, or a tracker failure.

use std::path::PathBuf;
use thiserror::Error;

use crate::tracker::TrackerError;

/// Main error type for comment-to-issue operations
#[derive(Error, Debug)]
pub enum CommentToIssueError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Scan pattern rejected
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // =========================================================================
    // Scan and State Errors
    // =========================================================================
    /// Workspace enumeration failed
    #[error("Scan failed: {message}")]
    Scan { message: String },

    /// State file could not be written
    #[error("Failed to save state to {path}: {message}")]
    StateSave { path: PathBuf, message: String },

    /// No record at the requested identity
    #[error("No comment found at {file}:{line}")]
    CommentNotFound { file: String, line: u32 },

    /// Source line no longer matches the scanned record
    #[error("Comment at {file}:{line} changed since the last scan")]
    StaleComment { file: String, line: u32 },

    /// Record already linked to an issue
    #[error("Comment at {file}:{line} is already linked to issue #{number}")]
    AlreadyLinked { file: String, line: u32, number: u64 },

    // =========================================================================
    // Write-back Errors
    // =========================================================================
    /// Marker could not be written into the source file
    #[error("Failed to write issue marker to {file}:{line}: {message}")]
    WriteBack {
        file: String,
        line: u32,
        message: String,
    },

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// Issue tracker failure
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML error wrapper
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommentToIssueError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a scan error
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Create a write-back error
    pub fn write_back(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::WriteBack {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Scan { .. } | Self::StateSave { .. } | Self::WriteBack { .. } => true,
            Self::Tracker(e) => e.is_remote(),
            _ => false,
        }
    }

    /// Check if the user must fix credentials or settings first
    pub fn requires_reconfigure(&self) -> bool {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } | Self::InvalidPattern { .. } => {
                true
            }
            Self::Tracker(e) => e.requires_reconfigure() || e.is_not_configured(),
            _ => false,
        }
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } | Self::InvalidPattern { .. } => 7,
            Self::Tracker(TrackerError::NotConfigured { .. }) => 3,
            Self::Tracker(TrackerError::Authentication { .. }) => 4,
            Self::Tracker(TrackerError::Remote { .. }) => 5,
            Self::CommentNotFound { .. }
            | Self::StaleComment { .. }
            | Self::AlreadyLinked { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for comment-to-issue results
pub type Result<T> = std::result::Result<T, CommentToIssueError>;
