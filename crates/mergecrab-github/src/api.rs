use crate::{
    error::{GithubError, GithubResult},
    traits::{PullRequestSource, RateLimitProbe},
    types::{ClosedPullRequest, Credential, RateLimitInfo},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use mergecrab_core::RepositoryName;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};

/// Largest page size GitHub accepts for list endpoints
const PAGE_SIZE: u8 = 100;

/// GitHub API client bound to a single credential
#[derive(Clone)]
pub struct GithubApiClient {
    client: Octocrab,
}

impl GithubApiClient {
    /// Create a client for `credential`, optionally against a custom API root
    ///
    /// # Arguments
    /// * `credential` - Token to authenticate with, or anonymous
    /// * `api_url` - Base URL such as a GitHub Enterprise `/api/v3` root
    pub fn new(credential: &Credential, api_url: Option<&str>) -> GithubResult<Self> {
        let mut builder = Octocrab::builder();

        if let Some(token) = credential.token() {
            builder = builder.personal_token(token.to_string());
        }

        if let Some(url) = api_url {
            builder = builder.base_uri(url).map_err(|e| {
                GithubError::Configuration(format!("Invalid API URL {}: {}", url, e))
            })?;
        }

        let client = builder.build().map_err(|e| {
            GithubError::Configuration(format!("Failed to create octocrab client: {}", e))
        })?;

        Ok(Self { client })
    }

    /// Create client from existing octocrab instance
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateLimitProbe for GithubApiClient {
    async fn rate_limit(&self) -> GithubResult<RateLimitInfo> {
        let rate = self
            .client
            .ratelimit()
            .get()
            .await
            .map_err(|e| map_octocrab_error("rate limit", &e))?
            .rate;

        Ok(RateLimitInfo::new(
            rate.limit as u64,
            rate.remaining as u64,
            rate.reset,
        ))
    }
}

#[async_trait]
impl PullRequestSource for GithubApiClient {
    async fn closed_pull_requests(
        &self,
        repository: &RepositoryName,
    ) -> GithubResult<Vec<ClosedPullRequest>> {
        let route = format!("/repos/{}/{}/pulls", repository.owner(), repository.name());
        let params = ListPullsParams {
            state: "closed",
            per_page: PAGE_SIZE,
        };

        let mut page = self
            .client
            .get::<Page<ApiPullRequest>, _, _>(route, Some(&params))
            .await
            .map_err(|e| map_octocrab_error(&format!("list pull requests of {}", repository), &e))?;

        let mut pulls = Vec::new();
        loop {
            pulls.extend(page.items.drain(..).map(ClosedPullRequest::from));

            match self
                .client
                .get_page::<ApiPullRequest>(&page.next)
                .await
                .map_err(|e| {
                    map_octocrab_error(&format!("list pull requests of {}", repository), &e)
                })? {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(pulls)
    }

    async fn commit_parents(
        &self,
        repository: &RepositoryName,
        sha: &str,
    ) -> GithubResult<Vec<String>> {
        let route = format!(
            "/repos/{}/{}/commits/{}",
            repository.owner(),
            repository.name(),
            sha
        );

        let commit = self
            .client
            .get::<ApiCommit, _, _>(route, None::<&()>)
            .await
            .map_err(|e| map_octocrab_error(&format!("fetch commit {}", sha), &e))?;

        Ok(commit.parents.into_iter().map(|parent| parent.sha).collect())
    }
}

#[derive(Debug, Serialize)]
struct ListPullsParams {
    state: &'static str,
    per_page: u8,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    merge_commit_sha: Option<String>,
    merged_at: Option<DateTime<Utc>>,
    base: ApiCommitRef,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    parents: Vec<ApiCommitRef>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitRef {
    sha: String,
}

impl From<ApiPullRequest> for ClosedPullRequest {
    fn from(pull: ApiPullRequest) -> Self {
        // GitHub reports a test-merge hash for unmerged pull requests too
        let merge_commit_sha = match pull.merged_at {
            Some(_) => pull.merge_commit_sha,
            None => None,
        };

        Self {
            number: pull.number,
            merge_commit_sha,
            base_sha: pull.base.sha,
            merged_at: pull.merged_at,
        }
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// A 403 or 429 whose message or documentation link points at rate limiting
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GithubError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return if is_rate_limit_error(source) {
            GithubError::RateLimited(format!(
                "{} failed: GitHub returned {} {}",
                operation, source.status_code, source.message
            ))
        } else if is_auth_failure(source.status_code) {
            GithubError::Authentication(format!(
                "{} failed: GitHub returned {} {}",
                operation, source.status_code, source.message
            ))
        } else {
            GithubError::ApiError(format!(
                "{} failed with status {}: {}",
                operation, source.status_code, source.message
            ))
        };
    }

    if is_network_error(error) {
        return GithubError::Network(format!("{} failed: {}", operation, error));
    }

    GithubError::ApiError(format!("{} failed: {}", operation, error))
}
