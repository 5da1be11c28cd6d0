use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Invalid repository identifier '{0}': expected owner/repo")]
    InvalidRepository(String),

    #[error("Invalid outcome label: {0}")]
    InvalidOutcome(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
