use crate::error::GithubResult;
use crate::types::{ClosedPullRequest, RateLimitInfo};
use async_trait::async_trait;
use mergecrab_core::RepositoryName;

/// Reports the rate limit state of the credential behind a handle
#[async_trait]
pub trait RateLimitProbe: Send + Sync {
    async fn rate_limit(&self) -> GithubResult<RateLimitInfo>;
}

/// Read access to pull requests and commits of a repository
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// List every closed pull request, following pagination
    async fn closed_pull_requests(
        &self,
        repository: &RepositoryName,
    ) -> GithubResult<Vec<ClosedPullRequest>>;

    /// Parent hashes of the commit identified by `sha`
    async fn commit_parents(&self, repository: &RepositoryName, sha: &str)
    -> GithubResult<Vec<String>>;
}

/// Admission check performed before a unit of API work
#[async_trait]
pub trait BudgetGate: Send {
    type Source: PullRequestSource;

    /// Ensure the active source can afford `required_requests` calls
    ///
    /// Returns `false` when no source can, and the caller must stop.
    async fn check_budget(&mut self, required_requests: u64) -> GithubResult<bool>;

    /// Source bound to the currently active credential
    fn source(&self) -> &Self::Source;
}
