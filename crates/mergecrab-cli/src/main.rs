mod config;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use crate::config::{AppConfig, Overrides};
use mergecrab_github::{Credential, GithubApiClient, TokenGate};
use mergecrab_store::{TableStore, load_repositories, load_tokens};
use std::path::PathBuf;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "mergecrab")]
#[command(about = "Count how closed pull requests were integrated: merge commit or rebase")]
#[command(version = VERSION)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./mergecrab.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file listing owner/repo names in its first column
    #[arg(short, long)]
    repositories: Option<PathBuf>,

    /// CSV file listing API tokens in its first column
    #[arg(short, long)]
    tokens: Option<PathBuf>,

    /// Directory receiving the per-repository and totals tables
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Sleep until the rate limit resets instead of stopping early
    #[arg(short, long)]
    wait: bool,

    /// GitHub API root, for GitHub Enterprise installations
    #[arg(long)]
    api_url: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            repositories: self.repositories.clone(),
            tokens: self.tokens.clone(),
            output_dir: self.output_dir.clone(),
            api_url: self.api_url.clone(),
            wait_for_reset: self.wait.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run_cli(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    // octocrab's rustls backend needs an explicit process-wide provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = AppConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;

    let repositories = load_repositories(&config.input.repositories)?;
    let credentials: Vec<Credential> = load_tokens(&config.input.tokens)?
        .into_iter()
        .map(Credential::from_token)
        .collect();
    info!(
        "Loaded {} repositories and {} credentials",
        repositories.len(),
        credentials.len()
    );

    let api_url = config.github.api_url.as_deref();
    let mut gate = TokenGate::initialize(credentials, config.github.wait_for_reset, |credential| {
        GithubApiClient::new(credential, api_url)
    })
    .await
    .context("Failed to initialize credentials")?;

    let store = TableStore::new(&config.output.directory);
    let summary = runner::run(&mut gate, &repositories, &store).await?;

    info!(
        "Finished: {} repositories classified, {} skipped",
        summary.aggregates.len(),
        summary.skipped.len()
    );
    if summary.stopped_early {
        warn!("Run stopped early because every credential was out of quota");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["mergecrab"]).unwrap();
        let overrides = cli.overrides();

        assert!(cli.config.is_none());
        assert!(overrides.repositories.is_none());
        assert!(overrides.wait_for_reset.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "mergecrab",
            "--repositories",
            "repos.csv",
            "--output-dir",
            "out",
            "--wait",
            "--api-url",
            "https://ghe.example.com/api/v3",
        ])
        .unwrap();
        let overrides = cli.overrides();

        assert_eq!(overrides.repositories, Some(PathBuf::from("repos.csv")));
        assert_eq!(overrides.output_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.wait_for_reset, Some(true));
        assert_eq!(
            overrides.api_url.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["mergecrab", "--bogus"]).is_err());
    }
}
