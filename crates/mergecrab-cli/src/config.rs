use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub github: GithubConfig,
}

/// Input list locations (CSV, header row, values in the first column)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub repositories: PathBuf,
    pub tokens: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// GitHub access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API root for GitHub Enterprise; defaults to api.github.com
    pub api_url: Option<String>,
    /// Sleep until the rate limit resets instead of stopping early
    pub wait_for_reset: bool,
}

/// Values given on the command line, applied last
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repositories: Option<PathBuf>,
    pub tokens: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub wait_for_reset: Option<bool>,
}

impl AppConfig {
    /// Load configuration from file, environment variables and overrides
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. `config_file`, or mergecrab.toml in the working directory (if present)
    /// 3. Environment variables (prefixed with MERGECRAB_)
    /// 4. Command-line overrides
    ///
    /// Environment variables use double underscore for nesting:
    /// - MERGECRAB_INPUT__TOKENS=secrets/tokens.csv
    /// - MERGECRAB_GITHUB__WAIT_FOR_RESET=true
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("input.repositories", "repositories.csv")?
            .set_default("input.tokens", "tokens.csv")?
            .set_default("output.directory", "output")?
            .set_default("github.wait_for_reset", false)?;

        let builder = match config_file {
            Some(path) => builder.add_source(File::from(path)),
            None if Path::new("mergecrab.toml").exists() => {
                builder.add_source(File::with_name("mergecrab"))
            }
            None => builder,
        };

        let builder = builder.add_source(
            Environment::with_prefix("MERGECRAB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let builder = builder
            .set_override_option("input.repositories", path_value(&overrides.repositories))?
            .set_override_option("input.tokens", path_value(&overrides.tokens))?
            .set_override_option("output.directory", path_value(&overrides.output_dir))?
            .set_override_option("github.api_url", overrides.api_url.clone())?
            .set_override_option("github.wait_for_reset", overrides.wait_for_reset)?;

        builder.build()?.try_deserialize()
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|path| path.display().to_string())
}
