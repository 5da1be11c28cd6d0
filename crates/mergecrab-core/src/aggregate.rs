use crate::outcome::Outcome;
use crate::record::PullRequestRecord;
use crate::repository::RepositoryName;
use serde::{Deserialize, Serialize};

/// Per-repository counts for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAggregate {
    pub repository: RepositoryName,
    pub merges: u64,
    pub rebases: u64,
    pub unknown: u64,
    pub not_merged: u64,
}

impl RepositoryAggregate {
    /// Create an aggregate with every count at zero
    pub fn new(repository: RepositoryName) -> Self {
        Self {
            repository,
            merges: 0,
            rebases: 0,
            unknown: 0,
            not_merged: 0,
        }
    }

    /// Fold a repository's classified records into an aggregate
    ///
    /// # Examples
    ///
    /// ```
    /// use mergecrab_core::{Outcome, PullRequestRecord, RepositoryAggregate, RepositoryName};
    ///
    /// let record = PullRequestRecord {
    ///     merge_commit_sha: "a".into(),
    ///     base_sha: "b".into(),
    ///     merged_at: None,
    ///     outcome: Outcome::Merge,
    /// };
    /// let repo = RepositoryName::parse("acme/widgets").unwrap();
    /// let aggregate = RepositoryAggregate::fold(repo, [&record], 2);
    /// assert_eq!((aggregate.merges, aggregate.not_merged), (1, 2));
    /// ```
    pub fn fold<'a, I>(repository: RepositoryName, records: I, not_merged: u64) -> Self
    where
        I: IntoIterator<Item = &'a PullRequestRecord>,
    {
        let mut aggregate = Self::new(repository);
        aggregate.not_merged = not_merged;
        for record in records {
            aggregate.record(record.outcome);
        }
        aggregate
    }

    /// Count one classified pull request
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Merge => self.merges += 1,
            Outcome::Rebase => self.rebases += 1,
            Outcome::Unknown => self.unknown += 1,
        }
    }

    /// Number of classified (merged) pull requests
    pub fn integrated(&self) -> u64 {
        self.merges + self.rebases + self.unknown
    }
}

/// Insertion-ordered mapping from repository to its aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSet {
    entries: Vec<RepositoryAggregate>,
}

impl AggregateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an aggregate, replacing any earlier one for the same repository
    ///
    /// A replaced entry keeps its original position.
    pub fn upsert(&mut self, aggregate: RepositoryAggregate) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.repository == aggregate.repository)
        {
            Some(existing) => *existing = aggregate,
            None => self.entries.push(aggregate),
        }
    }

    pub fn get(&self, repository: &RepositoryName) -> Option<&RepositoryAggregate> {
        self.entries
            .iter()
            .find(|aggregate| &aggregate.repository == repository)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryAggregate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a AggregateSet {
    type Item = &'a RepositoryAggregate;
    type IntoIter = std::slice::Iter<'a, RepositoryAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
