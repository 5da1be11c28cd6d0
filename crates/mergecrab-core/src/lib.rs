pub mod aggregate;
pub mod error;
pub mod outcome;
pub mod record;
pub mod repository;

// Re-export commonly used types
pub use aggregate::{AggregateSet, RepositoryAggregate};
pub use error::{CoreError, CoreResult};
pub use outcome::Outcome;
pub use record::{IntegratedPull, PullRequestRecord};
pub use repository::RepositoryName;

/// Hard ceiling on integrated pull requests classified per repository
pub const MAX_INTEGRATED_PULLS: usize = 200;

/// Request budget declared before processing one repository
///
/// One listing call plus a paired lookup for every integrated pull request
/// that may be classified.
pub const fn repository_budget() -> u64 {
    1 + 2 * MAX_INTEGRATED_PULLS as u64
}
