use crate::error::{StoreError, StoreResult};
use mergecrab_core::RepositoryName;
use std::path::Path;
use tracing::debug;

/// Read the first column of a CSV file that starts with a header row
///
/// Values are trimmed. Empty cells are kept so callers can decide what a
/// blank means (an anonymous token, or nothing at all).
///
/// # Errors
/// `StoreError::MissingInput` when the file does not exist.
pub fn read_column(path: &Path) -> StoreResult<Vec<String>> {
    if !path.is_file() {
        return Err(StoreError::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StoreError::csv(path, e))?;
        values.push(record.get(0).unwrap_or_default().to_string());
    }

    debug!("Read {} value(s) from {}", values.len(), path.display());
    Ok(values)
}

/// Load `owner/repo` identifiers, skipping blank rows
pub fn load_repositories(path: &Path) -> StoreResult<Vec<RepositoryName>> {
    read_column(path)?
        .iter()
        .filter(|value| !value.is_empty())
        .map(|value| RepositoryName::parse(value).map_err(StoreError::from))
        .collect()
}

/// Load raw token values; blank rows stand for anonymous access
pub fn load_tokens(path: &Path) -> StoreResult<Vec<String>> {
    read_column(path)
}
