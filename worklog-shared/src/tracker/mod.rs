/// Read-only issue-tracker client
///
/// Developers may link a submitted task to an issue assigned to them in the
/// external tracker. This client consumes two endpoints of a Jira-style REST
/// API, "open issues assigned to an email, paginated" and "does this email
/// exist as a tracker user", and nothing else. Results are never cached;
/// every lookup hits the tracker.

use serde::{Deserialize, Serialize};

/// Error type for tracker lookups
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Tracker answered with a non-success status
    #[error("Tracker returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// Transport-level failure
    #[error("Tracker request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Tracker endpoint and credentials
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Base URL of the tracker (e.g., "https://company.atlassian.net")
    pub base_url: String,

    /// Account email the API token belongs to
    pub api_user: String,

    /// API token for basic auth
    pub api_token: String,
}

/// One open issue assigned to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Issue key (e.g., "PROJ-142")
    pub key: String,

    /// One-line summary
    pub summary: String,

    /// Workflow status name as the tracker reports it
    pub status: String,

    /// Browse URL for the issue
    pub url: String,
}

/// A page of issues plus the total match count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total: i64,
    #[serde(default)]
    issues: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    key: String,
    fields: SearchFields,
}

#[derive(Debug, Deserialize)]
struct SearchFields {
    summary: String,
    status: SearchStatus,
}

#[derive(Debug, Deserialize)]
struct SearchStatus {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserSearchEntry {
    #[serde(rename = "emailAddress", default)]
    email_address: Option<String>,
}

/// Client for the external tracker
#[derive(Debug, Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    config: TrackerConfig,
}

impl TrackerClient {
    /// Creates a client with the given tracker configuration
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Lists open issues assigned to an email, paginated by offset/page size
    pub async fn list_open_issues(
        &self,
        email: &str,
        offset: i64,
        page_size: i64,
    ) -> Result<IssuePage, TrackerError> {
        let jql = format!(
            "assignee = \"{}\" AND statusCategory != Done ORDER BY updated DESC",
            email.replace('"', "")
        );

        let url = format!("{}/rest/api/2/search", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_user, Some(&self.config.api_token))
            .query(&[
                ("jql", jql.as_str()),
                ("startAt", &offset.to_string()),
                ("maxResults", &page_size.to_string()),
                ("fields", "summary,status"),
            ])
            .send()
            .await?;

        let body: SearchResponse = Self::read_json(response).await?;

        let issues = body
            .issues
            .into_iter()
            .map(|issue| Issue {
                url: format!("{}/browse/{}", self.config.base_url, issue.key),
                key: issue.key,
                summary: issue.fields.summary,
                status: issue.fields.status.name,
            })
            .collect();

        Ok(IssuePage {
            issues,
            total: body.total,
        })
    }

    /// Checks whether an email resolves to a tracker user
    pub async fn email_exists(&self, email: &str) -> Result<bool, TrackerError> {
        let url = format!("{}/rest/api/2/user/search", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_user, Some(&self.config.api_token))
            .query(&[("query", email)])
            .send()
            .await?;

        let users: Vec<UserSearchEntry> = Self::read_json(response).await?;

        Ok(users
            .iter()
            .any(|u| u.email_address.as_deref() == Some(email)))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TrackerError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::BadStatus { status, body });
        }

        Ok(response.json().await?)
    }
}
