use anyhow::{Context, Result};
use mergecrab_core::{AggregateSet, RepositoryName};
use mergecrab_github::{BudgetGate, GithubError, classify_repository};
use mergecrab_store::TableStore;
use tracing::{error, info};

/// What one pass over the repository list produced
#[derive(Debug, Default)]
pub struct RunSummary {
    pub aggregates: AggregateSet,
    /// The budget gate refused work before every repository was processed
    pub stopped_early: bool,
    /// Repositories whose pull requests could not be listed
    pub skipped: Vec<RepositoryName>,
}

/// Classify every repository in order, writing tables as it goes
///
/// Per-repository tables are written as soon as a repository is done. The
/// totals table is flushed once at the end, including after an early stop
/// or a fatal gate error.
pub async fn run<G>(
    gate: &mut G,
    repositories: &[RepositoryName],
    store: &TableStore,
) -> Result<RunSummary>
where
    G: BudgetGate,
{
    let mut summary = RunSummary::default();
    let outcome = process(gate, repositories, store, &mut summary).await;

    store
        .write_totals(&summary.aggregates)
        .context("Failed to write totals table")?;

    outcome.map(|()| summary)
}

async fn process<G>(
    gate: &mut G,
    repositories: &[RepositoryName],
    store: &TableStore,
    summary: &mut RunSummary,
) -> Result<()>
where
    G: BudgetGate,
{
    for (position, repository) in repositories.iter().enumerate() {
        info!(
            "Processing {} ({}/{})",
            repository,
            position + 1,
            repositories.len()
        );

        match classify_repository(gate, repository).await {
            Ok(Some(report)) => {
                store
                    .write_repository(repository, &report.records)
                    .with_context(|| format!("Failed to write table for {}", repository))?;
                summary.aggregates.upsert(report.aggregate);
            }
            Ok(None) => {
                info!(
                    "Rate limit budget exhausted; stopping before {} with {} repositories left",
                    repository,
                    repositories.len() - position
                );
                summary.stopped_early = true;
                break;
            }
            Err(e @ (GithubError::Probe { .. } | GithubError::Configuration(_))) => {
                return Err(e).with_context(|| format!("Aborting run at {}", repository));
            }
            Err(e) => {
                error!("Skipping {}: {}", repository, e);
                summary.skipped.push(repository.clone());
            }
        }
    }

    Ok(())
}
