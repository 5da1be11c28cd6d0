use crate::outcome::Outcome;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A merged pull request that still has to be classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegratedPull {
    /// Pull request number within its repository
    pub number: u64,
    /// Commit created when the pull request was integrated
    pub merge_commit_sha: String,
    /// Tip of the base branch the pull request targeted
    pub base_sha: String,
    /// When the pull request was merged, if the platform reported it
    pub merged_at: Option<DateTime<Utc>>,
}

impl IntegratedPull {
    /// Attach a classification, producing the final record
    pub fn with_outcome(self, outcome: Outcome) -> PullRequestRecord {
        PullRequestRecord {
            merge_commit_sha: self.merge_commit_sha,
            base_sha: self.base_sha,
            merged_at: self.merged_at,
            outcome,
        }
    }
}

/// Classified pull request, one row of a per-repository table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub merge_commit_sha: String,
    pub base_sha: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub outcome: Outcome,
}

impl PullRequestRecord {
    /// Merge timestamp in RFC 3339, empty when unknown
    pub fn date(&self) -> String {
        self.merged_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pull() -> IntegratedPull {
        IntegratedPull {
            number: 7,
            merge_commit_sha: "abc123".to_string(),
            base_sha: "def456".to_string(),
            merged_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_with_outcome_keeps_fields() {
        let record = pull().with_outcome(Outcome::Merge);
        assert_eq!(record.merge_commit_sha, "abc123");
        assert_eq!(record.base_sha, "def456");
        assert_eq!(record.outcome, Outcome::Merge);
    }

    #[test]
    fn test_date_formatting() {
        let record = pull().with_outcome(Outcome::Rebase);
        assert_eq!(record.date(), "2024-03-01T12:30:00Z");

        let mut undated = pull();
        undated.merged_at = None;
        assert_eq!(undated.with_outcome(Outcome::Rebase).date(), "");
    }
}
