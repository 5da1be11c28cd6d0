use crate::{
    error::{GithubError, GithubResult},
    traits::{PullRequestSource, RateLimitProbe},
    types::{ClosedPullRequest, RateLimitInfo},
};
use async_trait::async_trait;
use mergecrab_core::RepositoryName;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory GitHub stand-in for testing
///
/// Clones share state, so a test can keep a clone and adjust quota after
/// handing another clone to a gate.
#[derive(Debug, Clone)]
pub struct FakeGithub {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug)]
struct FakeState {
    rate_limit: RateLimitInfo,
    fail_probes: bool,
    pulls: HashMap<String, Vec<ClosedPullRequest>>,
    commits: HashMap<String, Vec<String>>,
    commit_lookups: usize,
}

impl FakeGithub {
    /// Create a fake with the given remaining quota and reset timestamp
    pub fn new(remaining: u64, reset_at: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                rate_limit: RateLimitInfo::new(5000, remaining, reset_at),
                fail_probes: false,
                pulls: HashMap::new(),
                commits: HashMap::new(),
                commit_lookups: 0,
            })),
        }
    }

    /// Register the closed pull requests of a repository
    pub fn with_pull_requests(self, repository: &str, pulls: Vec<ClosedPullRequest>) -> Self {
        self.lock().pulls.insert(repository.to_string(), pulls);
        self
    }

    /// Register a commit and its parent hashes
    pub fn with_commit(self, sha: &str, parents: &[&str]) -> Self {
        self.lock().commits.insert(
            sha.to_string(),
            parents.iter().map(|parent| parent.to_string()).collect(),
        );
        self
    }

    pub fn set_remaining(&self, remaining: u64) {
        self.lock().rate_limit.remaining = remaining;
    }

    /// Make every subsequent rate limit probe fail
    pub fn fail_probes(&self, fail: bool) {
        self.lock().fail_probes = fail;
    }

    /// Number of commit lookups served so far
    pub fn commit_lookups(&self) -> usize {
        self.lock().commit_lookups
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RateLimitProbe for FakeGithub {
    async fn rate_limit(&self) -> GithubResult<RateLimitInfo> {
        let state = self.lock();
        if state.fail_probes {
            return Err(GithubError::Network("rate limit probe failed".to_string()));
        }
        Ok(state.rate_limit)
    }
}

#[async_trait]
impl PullRequestSource for FakeGithub {
    async fn closed_pull_requests(
        &self,
        repository: &RepositoryName,
    ) -> GithubResult<Vec<ClosedPullRequest>> {
        self.lock()
            .pulls
            .get(&repository.to_string())
            .cloned()
            .ok_or_else(|| GithubError::ApiError(format!("repository {} not found", repository)))
    }

    async fn commit_parents(
        &self,
        _repository: &RepositoryName,
        sha: &str,
    ) -> GithubResult<Vec<String>> {
        let mut state = self.lock();
        state.commit_lookups += 1;
        state
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| GithubError::ApiError(format!("commit {} not found", sha)))
    }
}
