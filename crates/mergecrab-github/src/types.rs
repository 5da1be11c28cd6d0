use chrono::{DateTime, Utc};
use mergecrab_core::IntegratedPull;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access credential for the GitHub API
///
/// A credential without a token stands for anonymous access.
pub struct Credential {
    token: Option<SecretString>,
}

impl Credential {
    /// Anonymous access (lowest rate limit)
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Credential from a raw token value; blank values become anonymous
    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Self::anonymous();
        }
        Self {
            token: Some(SecretString::from(trimmed.to_string())),
        }
    }

    /// Token value, exposed for client construction only
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.expose_secret())
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({self})")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            f.write_str("anonymous")
        } else {
            f.write_str("token")
        }
    }
}

/// Rate limit state reported for one credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window
    pub limit: u64,
    /// Remaining requests in the current window
    pub remaining: u64,
    /// Unix timestamp when the window resets
    pub reset_at: u64,
}

impl RateLimitInfo {
    pub fn new(limit: u64, remaining: u64, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Seconds from `now` (Unix timestamp) until the window resets
    ///
    /// Returns 0 when the reset time has already passed.
    pub fn seconds_until_reset_from(&self, now: i64) -> u64 {
        let now = u64::try_from(now).unwrap_or(0);
        self.reset_at.saturating_sub(now)
    }
}

/// Closed pull request as listed by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedPullRequest {
    pub number: u64,
    /// Present only when the pull request was merged
    pub merge_commit_sha: Option<String>,
    pub base_sha: String,
    pub merged_at: Option<DateTime<Utc>>,
}

impl ClosedPullRequest {
    /// A merged pull request
    pub fn merged(number: u64, merge_commit_sha: &str, base_sha: &str) -> Self {
        Self {
            number,
            merge_commit_sha: Some(merge_commit_sha.to_string()),
            base_sha: base_sha.to_string(),
            merged_at: None,
        }
    }

    /// A pull request closed without being merged
    pub fn unmerged(number: u64, base_sha: &str) -> Self {
        Self {
            number,
            merge_commit_sha: None,
            base_sha: base_sha.to_string(),
            merged_at: None,
        }
    }

    pub fn with_merged_at(mut self, merged_at: DateTime<Utc>) -> Self {
        self.merged_at = Some(merged_at);
        self
    }

    /// Convert into an integrated pull, or `None` when never merged
    pub fn into_integrated(self) -> Option<IntegratedPull> {
        let merge_commit_sha = self.merge_commit_sha?;
        Some(IntegratedPull {
            number: self.number,
            merge_commit_sha,
            base_sha: self.base_sha,
            merged_at: self.merged_at,
        })
    }
}
