//! Pull request classification.
//!
//! Separates a repository's closed pull requests into merged and unmerged,
//! then labels each merged one by the parent count of its merge commit.

use crate::{
    error::GithubResult,
    traits::{BudgetGate, PullRequestSource},
};
use mergecrab_core::{
    IntegratedPull, MAX_INTEGRATED_PULLS, Outcome, PullRequestRecord, RepositoryAggregate,
    RepositoryName, repository_budget,
};
use tracing::{debug, info, warn};

/// Merged pull requests of a repository, capped, plus the unmerged count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegratedPulls {
    pub pulls: Vec<IntegratedPull>,
    pub not_merged: u64,
    /// Merged pull requests beyond the cap that were dropped
    pub dropped: usize,
}

/// Classified records and counts for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    pub records: Vec<PullRequestRecord>,
    pub aggregate: RepositoryAggregate,
}

/// List closed pull requests and keep the first `MAX_INTEGRATED_PULLS` merged ones
///
/// Pull requests without a merge commit hash only increment `not_merged`.
/// Merged pull requests past the cap are dropped, not retried.
pub async fn fetch_integrated<S>(
    source: &S,
    repository: &RepositoryName,
) -> GithubResult<IntegratedPulls>
where
    S: PullRequestSource + ?Sized,
{
    let closed = source.closed_pull_requests(repository).await?;
    debug!("{} has {} closed pull requests", repository, closed.len());

    let mut pulls = Vec::new();
    let mut not_merged = 0;
    let mut dropped = 0;

    for pull in closed {
        match pull.into_integrated() {
            Some(integrated) if pulls.len() < MAX_INTEGRATED_PULLS => pulls.push(integrated),
            Some(_) => dropped += 1,
            None => not_merged += 1,
        }
    }

    if dropped > 0 {
        info!(
            "{}: keeping {} merged pull requests, dropping {} past the cap",
            repository,
            pulls.len(),
            dropped
        );
    }

    Ok(IntegratedPulls {
        pulls,
        not_merged,
        dropped,
    })
}

/// Classify one merged pull request by its merge commit's parent count
///
/// A failed commit lookup yields `Outcome::Unknown` instead of an error.
pub async fn classify<S>(source: &S, repository: &RepositoryName, pull: &IntegratedPull) -> Outcome
where
    S: PullRequestSource + ?Sized,
{
    match source
        .commit_parents(repository, &pull.merge_commit_sha)
        .await
    {
        Ok(parents) => Outcome::from_parent_count(parents.len()),
        Err(e) => {
            warn!(
                "{} #{}: merge commit {} lookup failed: {}",
                repository, pull.number, pull.merge_commit_sha, e
            );
            Outcome::Unknown
        }
    }
}

/// Check the budget, then classify every integrated pull request of a repository
///
/// Returns `None` when the gate refuses the budget, meaning the run must
/// stop before this repository.
pub async fn classify_repository<G>(
    gate: &mut G,
    repository: &RepositoryName,
) -> GithubResult<Option<RepositoryReport>>
where
    G: BudgetGate + ?Sized,
{
    if !gate.check_budget(repository_budget()).await? {
        return Ok(None);
    }

    let source = gate.source();
    let integrated = fetch_integrated(source, repository).await?;

    let mut records = Vec::with_capacity(integrated.pulls.len());
    for pull in integrated.pulls {
        let outcome = classify(source, repository, &pull).await;
        records.push(pull.with_outcome(outcome));
    }

    let aggregate = RepositoryAggregate::fold(repository.clone(), &records, integrated.not_merged);
    info!(
        "{}: {} merges, {} rebases, {} unknown, {} not merged",
        repository, aggregate.merges, aggregate.rebases, aggregate.unknown, aggregate.not_merged
    );

    Ok(Some(RepositoryReport { records, aggregate }))
}
