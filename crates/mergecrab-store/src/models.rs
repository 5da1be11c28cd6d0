use mergecrab_core::{PullRequestRecord, RepositoryAggregate};
use serde::{Deserialize, Serialize};

/// One row of a per-repository table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub merged_commit_sha: String,
    pub base_sha: String,
    pub date: String,
    pub merge_or_rebase: String,
}

impl From<&PullRequestRecord> for RecordRow {
    fn from(record: &PullRequestRecord) -> Self {
        Self {
            merged_commit_sha: record.merge_commit_sha.clone(),
            base_sha: record.base_sha.clone(),
            date: record.date(),
            merge_or_rebase: record.outcome.as_str().to_string(),
        }
    }
}

impl RecordRow {
    /// Field values in column order
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.merged_commit_sha.clone(),
            self.base_sha.clone(),
            self.date.clone(),
            self.merge_or_rebase.clone(),
        ]
    }
}

/// One row of the totals table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsRow {
    pub repository: String,
    pub total_merges: u64,
    pub total_rebases: u64,
    pub total_commit_not_found: u64,
    pub total_not_merged_pull_requests: u64,
}

impl From<&RepositoryAggregate> for TotalsRow {
    fn from(aggregate: &RepositoryAggregate) -> Self {
        Self {
            repository: aggregate.repository.to_string(),
            total_merges: aggregate.merges,
            total_rebases: aggregate.rebases,
            total_commit_not_found: aggregate.unknown,
            total_not_merged_pull_requests: aggregate.not_merged,
        }
    }
}

impl TotalsRow {
    /// Field values in column order
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.repository.clone(),
            self.total_merges.to_string(),
            self.total_rebases.to_string(),
            self.total_commit_not_found.to_string(),
            self.total_not_merged_pull_requests.to_string(),
        ]
    }
}
