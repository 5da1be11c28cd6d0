use thiserror::Error;

/// GitHub crate error types
#[derive(Debug, Error)]
pub enum GithubError {
    /// No usable credential set could be established
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A credential's remaining quota could not be queried
    #[error("Failed to probe rate limit for credential #{credential}: {message}")]
    Probe { credential: usize, message: String },

    /// GitHub refused the request because the credential's quota is spent
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("GitHub rejected the credential: {0}")]
    Authentication(String),

    #[error("GitHub API error: {0}")]
    ApiError(String),

    #[error("Network error talking to GitHub: {0}")]
    Network(String),
}

pub type GithubResult<T> = Result<T, GithubError>;
