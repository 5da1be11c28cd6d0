pub mod api;
pub mod classifier;
pub mod error;
pub mod gate;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use api::GithubApiClient;
pub use classifier::{
    IntegratedPulls, RepositoryReport, classify, classify_repository, fetch_integrated,
};
pub use error::{GithubError, GithubResult};
pub use gate::TokenGate;
pub use mock::FakeGithub;
pub use traits::{BudgetGate, PullRequestSource, RateLimitProbe};
pub use types::{ClosedPullRequest, Credential, RateLimitInfo};
