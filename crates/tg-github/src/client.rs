//! Issue fetching over the GitHub REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::Deserialize;
use tg_core::{FetchError, Issue, IssueRef, IssueState};
use tg_graph::IssueFetcher;
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub api_base: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: format!("task-graph/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GitHubConfig {
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("access token is not a valid header value")]
    InvalidToken(#[from] InvalidHeaderValue),
    #[error("cannot build http client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    title: String,
    state: IssueState,
    #[serde(default)]
    body: Option<String>,
}

impl From<IssuePayload> for Issue {
    fn from(payload: IssuePayload) -> Self {
        Self::new(payload.title, payload.state, payload.body.unwrap_or_default())
    }
}

/// Decode the JSON body of `GET /repos/{owner}/{repo}/issues/{number}`.
pub fn decode_issue(json: &str) -> Result<Issue, serde_json::Error> {
    serde_json::from_str::<IssuePayload>(json).map(Issue::from)
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// A client that authorizes every request with `token`.
    pub fn new(token: &str, config: GitHubConfig) -> Result<Self, ClientError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))?;
        authorization.set_sensitive(true);
        let mut headers = base_headers();
        headers.insert(AUTHORIZATION, authorization);
        Self::with_headers(headers, config)
    }

    fn with_headers(headers: HeaderMap, config: GitHubConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn issue_url(&self, reference: &IssueRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.config.api_base.trim_end_matches('/'),
            reference.owner,
            reference.repo,
            reference.number
        )
    }
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
    headers
}

fn log_headers(reference: &IssueRef, headers: &HeaderMap) {
    trace!("{reference}: {} response headers", headers.len());
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<non-ascii>");
        if name.as_str() == RATE_LIMIT_REMAINING {
            debug!("github rate limit remaining: {value}");
        } else if name.as_str().starts_with("x-") {
            trace!("github header {name}: {value}");
        }
    }
}

#[async_trait]
impl IssueFetcher for GitHubClient {
    async fn fetch(&self, reference: &IssueRef) -> Result<Issue, FetchError> {
        let url = self.issue_url(reference);
        let failed = |message: String| FetchError::new(reference.clone(), message);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| failed(err.to_string()))?;
        log_headers(reference, response.headers());

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("GET {url} returned {status}")));
        }

        let body = response.text().await.map_err(|err| failed(err.to_string()))?;
        let issue = decode_issue(&body).map_err(|err| failed(format!("bad issue payload: {err}")))?;
        if issue.body.is_empty() {
            debug!("nil or empty body for {reference}");
        }
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::{GitHubClient, GitHubConfig, decode_issue};
    use tg_core::{IssueRef, IssueState};

    #[test]
    fn decodes_issue_payload() {
        let json = r#"{
            "number": 7,
            "title": "Ship it",
            "state": "closed",
            "body": "```[tasklist]\n- [ ] #8\n```",
            "labels": []
        }"#;
        let issue = decode_issue(json).expect("decode");
        assert_eq!(issue.title, "Ship it");
        assert_eq!(issue.state, IssueState::Closed);
        assert!(issue.body.contains("[tasklist]"));
    }

    #[test]
    fn null_or_missing_body_becomes_empty() {
        let issue = decode_issue(r#"{"title": "t", "state": "open", "body": null}"#).expect("null");
        assert!(issue.body.is_empty());
        let issue = decode_issue(r#"{"title": "t", "state": "open"}"#).expect("missing");
        assert!(issue.body.is_empty());
    }

    #[test]
    fn unknown_state_is_a_decode_error() {
        assert!(decode_issue(r#"{"title": "t", "state": "merged"}"#).is_err());
    }

    #[test]
    fn issue_url_uses_api_base() {
        let client = GitHubClient::new(
            "ghp_token",
            GitHubConfig::default().with_api_base("https://ghe.example.com/api/v3/"),
        )
        .expect("client");
        assert_eq!(
            client.issue_url(&IssueRef::new("me", "repo", 12)),
            "https://ghe.example.com/api/v3/repos/me/repo/issues/12"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(GitHubClient::new("bad\ntoken", GitHubConfig::default()).is_err());
    }

    #[test]
    fn default_config_targets_public_api() {
        let config = GitHubConfig::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert!(config.user_agent.starts_with("task-graph/"));
    }
}
