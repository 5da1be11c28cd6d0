use crate::error::{StoreError, StoreResult};
use crate::models::{RecordRow, TotalsRow};
use mergecrab_core::{AggregateSet, PullRequestRecord, RepositoryName};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub const REPOSITORY_HEADER: [&str; 4] =
    ["merged_commit_sha", "base_sha", "date", "merge_or_rebase"];

pub const TOTALS_HEADER: [&str; 5] = [
    "repository",
    "total_merges",
    "total_rebases",
    "total_commit_not_found",
    "total_not_merged_pull_requests",
];

/// Merge `new_rows` into the table at `path` and rewrite it
///
/// Existing rows are kept in order, including rows whose field count differs
/// from the header; a new row is appended only when no identical row is
/// already present. A missing or empty file counts as an empty table. The
/// merged table is written to a temporary file beside `path` and then moved
/// over it, so a failed rewrite leaves the old table untouched. The file is
/// not locked, so concurrent writers must be serialized by the caller.
///
/// Returns the number of rows appended.
pub fn merge_rows<I>(path: &Path, header: &[&str], new_rows: I) -> StoreResult<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut rows = read_rows(path)?;
    let mut seen: HashSet<Vec<String>> = rows.iter().cloned().collect();

    let before = rows.len();
    for row in new_rows {
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    let appended = rows.len() - before;

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

    let mut staged = NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut staged);
        writer
            .write_record(header)
            .map_err(|e| StoreError::csv(path, e))?;
        for row in &rows {
            writer
                .write_record(row)
                .map_err(|e| StoreError::csv(path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(path, e))?;
    }
    staged
        .persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    Ok(appended)
}

fn read_rows(path: &Path) -> StoreResult<Vec<Vec<String>>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    reader
        .records()
        .map(|record| {
            record
                .map(|record| record.iter().map(str::to_string).collect())
                .map_err(|e| StoreError::csv(path, e))
        })
        .collect()
}

fn read_typed<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| StoreError::csv(path, e))?;
    reader
        .deserialize()
        .map(|row| row.map_err(|e| StoreError::csv(path, e)))
        .collect()
}

/// Output tables rooted at one directory
///
/// * `<dir>/repositories/<owner>__<repo>.csv` - one row per classified pull request
/// * `<dir>/totals.csv` - one row per repository aggregate
#[derive(Debug, Clone)]
pub struct TableStore {
    directory: PathBuf,
}

impl TableStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn repository_path(&self, repository: &RepositoryName) -> PathBuf {
        self.directory
            .join("repositories")
            .join(format!("{}.csv", repository.file_stem()))
    }

    pub fn totals_path(&self) -> PathBuf {
        self.directory.join("totals.csv")
    }

    /// Merge a repository's records into its table
    pub fn write_repository(
        &self,
        repository: &RepositoryName,
        records: &[PullRequestRecord],
    ) -> StoreResult<usize> {
        let path = self.repository_path(repository);
        let rows = records.iter().map(|record| RecordRow::from(record).fields());
        let appended = merge_rows(&path, &REPOSITORY_HEADER, rows)?;
        info!(
            "{}: wrote {} new row(s) to {}",
            repository,
            appended,
            path.display()
        );
        Ok(appended)
    }

    /// Merge every aggregate into the totals table
    pub fn write_totals(&self, aggregates: &AggregateSet) -> StoreResult<usize> {
        let path = self.totals_path();
        let rows = aggregates
            .iter()
            .map(|aggregate| TotalsRow::from(aggregate).fields());
        let appended = merge_rows(&path, &TOTALS_HEADER, rows)?;
        info!("Wrote {} new row(s) to {}", appended, path.display());
        Ok(appended)
    }

    pub fn read_repository(&self, repository: &RepositoryName) -> StoreResult<Vec<RecordRow>> {
        read_typed(&self.repository_path(repository))
    }

    pub fn read_totals(&self) -> StoreResult<Vec<TotalsRow>> {
        read_typed(&self.totals_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mergecrab_core::{Outcome, RepositoryAggregate};
    use tempfile::TempDir;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn record(sha: &str, outcome: Outcome) -> PullRequestRecord {
        PullRequestRecord {
            merge_commit_sha: sha.to_string(),
            base_sha: format!("base-{sha}"),
            merged_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
            outcome,
        }
    }

    fn aggregate(name: &str, merges: u64) -> RepositoryAggregate {
        let mut aggregate = RepositoryAggregate::new(RepositoryName::parse(name).unwrap());
        aggregate.merges = merges;
        aggregate
    }

    #[test]
    fn test_merge_rows_creates_file_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("table.csv");

        let appended = merge_rows(&path, &["a", "b"], vec![row(&["1", "2"])]).unwrap();

        assert_eq!(appended, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn test_merge_rows_keeps_old_rows_first_and_skips_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "a,b\nx,1\ny,2\n").unwrap();

        let appended = merge_rows(
            &path,
            &["a", "b"],
            vec![row(&["y", "2"]), row(&["z", "3"]), row(&["z", "3"])],
        )
        .unwrap();

        assert_eq!(appended, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\nx,1\ny,2\nz,3\n");
    }

    #[test]
    fn test_merge_rows_treats_empty_file_as_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "").unwrap();

        assert_eq!(merge_rows(&path, &["a"], vec![row(&["1"])]).unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n1\n");
    }

    #[test]
    fn test_merge_rows_preserves_ragged_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "a,b\nx,1\ny,2,extra\nz,3\n").unwrap();

        let appended = merge_rows(&path, &["a", "b"], vec![row(&["w", "4"])]).unwrap();

        assert_eq!(appended, 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a,b\nx,1\ny,2,extra\nz,3\nw,4\n"
        );
    }

    #[test]
    fn test_merge_rows_leaves_table_untouched_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        let original = b"a,b\nx,1\n\xff\xfe,2\nz,3\n".to_vec();
        fs::write(&path, &original).unwrap();

        let result = merge_rows(&path, &["a", "b"], vec![row(&["w", "4"])]);

        assert!(matches!(result, Err(StoreError::Csv { .. })));
        assert_eq!(fs::read(&path).unwrap(), original);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_repository_round_trips_rows() {
        let dir = TempDir::new().unwrap();
        let store = TableStore::new(dir.path());
        let repo = RepositoryName::parse("acme/widgets").unwrap();

        store
            .write_repository(&repo, &[record("m1", Outcome::Merge), record("m2", Outcome::Rebase)])
            .unwrap();

        let rows = store.read_repository(&repo).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].merged_commit_sha, "m1");
        assert_eq!(rows[0].date, "2024-06-01T08:00:00Z");
        assert_eq!(rows[1].merge_or_rebase, "rebase");
        assert!(store.repository_path(&repo).ends_with("repositories/acme__widgets.csv"));
    }

    #[test]
    fn test_write_totals_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = TableStore::new(dir.path());
        let mut set = AggregateSet::new();
        set.upsert(aggregate("acme/widgets", 3));

        assert_eq!(store.write_totals(&set).unwrap(), 1);
        assert_eq!(store.write_totals(&set).unwrap(), 0);

        let totals = store.read_totals().unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].repository, "acme/widgets");
        assert_eq!(totals[0].total_merges, 3);
    }

    #[test]
    fn test_write_totals_appends_changed_counts() {
        let dir = TempDir::new().unwrap();
        let store = TableStore::new(dir.path());

        let mut first = AggregateSet::new();
        first.upsert(aggregate("acme/widgets", 3));
        store.write_totals(&first).unwrap();

        let mut second = AggregateSet::new();
        second.upsert(aggregate("acme/widgets", 4));
        second.upsert(aggregate("acme/gears", 0));
        assert_eq!(store.write_totals(&second).unwrap(), 2);

        let merges: Vec<u64> = store
            .read_totals()
            .unwrap()
            .iter()
            .map(|row| row.total_merges)
            .collect();
        assert_eq!(merges, vec![3, 4, 0]);
    }

    #[test]
    fn test_reading_missing_tables_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = TableStore::new(dir.path());
        assert!(store.read_totals().unwrap().is_empty());
    }
}
