//! GitHub issue tracker over the REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{IssueDraft, IssueTracker, TrackerError};
use crate::git::{branch_or_fallback, commit_or_fallback, GitOperations};
use crate::model::{CommentRecord, IssueInfo};

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Web host used for file links.
const WEB_URL: &str = "https://github.com";

const USER_AGENT: &str = concat!("comment-to-issue/", env!("CARGO_PKG_VERSION"));

/// Repository identity and credentials, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    pub api_url: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl GitHubSettings {
    /// Names of the settings that are missing or blank.
    pub fn missing(&self) -> Vec<String> {
        [
            ("github.owner", &self.owner),
            ("github.repo", &self.repo),
            ("token", &self.token),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name.to_string())
        .collect()
    }

    fn repository(&self) -> Result<(&str, &str), TrackerError> {
        match (self.owner.as_deref(), self.repo.as_deref()) {
            (Some(owner), Some(repo)) if !owner.trim().is_empty() && !repo.trim().is_empty() => {
                Ok((owner, repo))
            }
            _ => {
                let missing = self
                    .missing()
                    .into_iter()
                    .filter(|m| m != "token")
                    .collect();
                Err(TrackerError::not_configured(missing))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CreateIssueResponse {
    number: u64,
    url: String,
    html_url: String,
}

/// Map a non-success response onto the tracker error taxonomy.
pub fn classify_failure(status: StatusCode, body: &str) -> TrackerError {
    if status == StatusCode::UNAUTHORIZED {
        TrackerError::authentication(format!("GitHub rejected the token ({status}): {body}"))
    } else {
        TrackerError::remote(format!("GitHub API error: {status} - {body}"))
    }
}

/// GitHub implementation of [`IssueTracker`].
#[derive(Clone)]
pub struct GitHubTracker {
    settings: GitHubSettings,
    client: Client,
    git: Arc<dyn GitOperations>,
}

impl GitHubTracker {
    /// Create a tracker from explicit settings and a git backend.
    pub fn new(settings: GitHubSettings, git: Arc<dyn GitOperations>) -> Self {
        Self {
            settings,
            client: Client::new(),
            git,
        }
    }

    /// The settings this tracker was built with.
    pub fn settings(&self) -> &GitHubSettings {
        &self.settings
    }

    fn blob_url(&self, reference: &str, file: &str, line: u32) -> Result<String, TrackerError> {
        let (owner, repo) = self.settings.repository()?;
        Ok(format!("{WEB_URL}/{owner}/{repo}/blob/{reference}/{file}#L{line}"))
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn create_issue(&self, comment: &CommentRecord) -> Result<IssueInfo, TrackerError> {
        let missing = self.settings.missing();
        if !missing.is_empty() {
            return Err(TrackerError::not_configured(missing));
        }
        let (owner, repo) = self.settings.repository()?;
        let token = self.settings.token.as_deref().unwrap_or_default();

        let draft = IssueDraft::from_comment(comment);
        let url = format!(
            "{}/repos/{owner}/{repo}/issues",
            self.settings.api_url.trim_end_matches('/')
        );
        info!(
            "Creating issue in {}/{} for {}:{}",
            owner, repo, comment.file, comment.line
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&CreateIssueRequest {
                title: &draft.title,
                body: &draft.body,
                labels: &draft.labels,
            })
            .send()
            .await
            .map_err(|e| TrackerError::remote(format!("Failed to send issue request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("GitHub API error: {} - {}", status, body);
            return Err(classify_failure(status, &body));
        }

        let created: CreateIssueResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::remote(format!("Failed to parse issue response: {e}")))?;
        info!("Created issue #{}", created.number);

        Ok(IssueInfo {
            number: created.number,
            url: created.url,
            html_url: created.html_url,
        })
    }

    async fn remote_url(&self, file: &str, line: u32) -> Result<String, TrackerError> {
        self.settings.repository()?;
        let branch = branch_or_fallback(self.git.as_ref());
        self.blob_url(&branch, file, line)
    }

    async fn permalink(&self, file: &str, line: u32) -> Result<String, TrackerError> {
        self.settings.repository()?;
        let commit = commit_or_fallback(self.git.as_ref());
        self.blob_url(&commit, file, line)
    }

    async fn missing_settings(&self) -> Vec<String> {
        self.settings.missing()
    }
}
