use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Full `owner/repo` name of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryName {
    owner: String,
    name: String,
}

impl RepositoryName {
    /// Parse an `owner/repo` identifier
    ///
    /// Surrounding whitespace is ignored. Both halves must be non-empty and
    /// contain no further `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mergecrab_core::RepositoryName;
    ///
    /// let repo = RepositoryName::parse("acme/widgets").unwrap();
    /// assert_eq!(repo.owner(), "acme");
    /// assert_eq!(repo.name(), "widgets");
    /// assert!(RepositoryName::parse("widgets").is_err());
    /// ```
    pub fn parse(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidRepository(input.to_string()))?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(CoreError::InvalidRepository(input.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File-system friendly stem used for per-repository output tables
    pub fn file_stem(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepositoryName> for String {
    fn from(value: RepositoryName) -> Self {
        value.to_string()
    }
}
