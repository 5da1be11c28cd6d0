use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a merged pull request was integrated into its base branch
///
/// The signal is the parent count of the pull request's merge commit. A
/// fast-forwarded rebase and a fast-forwarded direct push look identical
/// under this rule, so `Rebase` covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Merge commit with two or more parents
    Merge,
    /// Single-parent commit (rebase or fast-forward)
    Rebase,
    /// The merge commit could not be looked up
    Unknown,
}

impl Outcome {
    /// Classify a merge commit by the number of parents it has
    ///
    /// # Examples
    ///
    /// ```
    /// use mergecrab_core::Outcome;
    ///
    /// assert_eq!(Outcome::from_parent_count(1), Outcome::Rebase);
    /// assert_eq!(Outcome::from_parent_count(2), Outcome::Merge);
    /// assert_eq!(Outcome::from_parent_count(3), Outcome::Merge);
    /// ```
    pub fn from_parent_count(parents: usize) -> Self {
        match parents {
            0 => Outcome::Unknown,
            1 => Outcome::Rebase,
            _ => Outcome::Merge,
        }
    }

    /// Label written to output tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Merge => "merge",
            Outcome::Rebase => "rebase",
            Outcome::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(Outcome::Merge),
            "rebase" => Ok(Outcome::Rebase),
            "unknown" => Ok(Outcome::Unknown),
            other => Err(CoreError::InvalidOutcome(other.to_string())),
        }
    }
}
