//! Configuration for a reaper run.
//!
//! Values come from the command line (including environment fallbacks) and an
//! optional TOML file. Command-line values win, exclusion lists from both sources
//! are combined, and `dry_run` is set if either source asks for it.

mod loader;
mod types;

use secrecy::{ExposeSecret as _, SecretString};
use thiserror::Error as ThisError;

use reaper_common::{ExclusionError, ExclusionFilter, parse_exclusion_arg};

use crate::cli::Cli;

pub use loader::load;
pub use types::{
    AgentSection, CirconusSection, CirconusSettings, ExcludeSection, FileConfig, Mode, Settings,
};
use types::{DEFAULT_APP_NAME, DEFAULT_CIRCONUS_URL, DEFAULT_CONSUL_ADDR, DEFAULT_NOMAD_ADDR};

/// Reasons a configuration is rejected before anything is queried.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error(r#"no mode selected, pick one of "query" or "consul/nomad""#)]
    MissingMode,
    #[error("a Circonus API key is required")]
    MissingApiKey,
    #[error("query mode requires a non-empty --query")]
    MissingQuery,
    #[error("invalid exclusion in config file: {0}")]
    InvalidExclusion(String),
    #[error(transparent)]
    Exclusion(#[from] ExclusionError),
}

impl Settings {
    /// Layers `cli` over `file` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no mode is selected, the API key is missing, query
    /// mode has no query, a config-file exclusion is empty or contains whitespace, or an
    /// exclusion pattern does not compile.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let FileConfig {
            mode,
            dry_run,
            prefix_search,
            query,
            circonus,
            consul,
            nomad,
            exclude,
        } = file;

        let mode = cli.mode.or(mode).ok_or(ConfigError::MissingMode)?;

        let api_key = cli
            .circonus_api_key
            .clone()
            .map(SecretString::from)
            .or(circonus.api_key)
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let query = cli.query.clone().or(query).unwrap_or_default();
        if mode == Mode::Query && query.trim().is_empty() {
            return Err(ConfigError::MissingQuery);
        }

        let file_targets = checked_exclusions(exclude.targets)?;
        let file_regexps = checked_exclusions(exclude.regexps)?;
        let exclusions = ExclusionFilter::new(
            file_targets.into_iter().chain(cli.exclude_targets.iter().cloned()),
            file_regexps.iter().chain(cli.exclude_regexps.iter()),
        )?;

        Ok(Self {
            mode,
            dry_run: cli.dry_run || dry_run,
            prefix_search: cli.prefix_search || prefix_search,
            query: if mode == Mode::Query {
                query
            } else {
                String::new()
            },
            circonus: CirconusSettings {
                api_key,
                app_name: pick(
                    cli.circonus_app_name.as_deref(),
                    circonus.app_name,
                    DEFAULT_APP_NAME,
                ),
                url: pick(cli.circonus_url.as_deref(), circonus.url, DEFAULT_CIRCONUS_URL),
            },
            consul_addr: pick(cli.consul_addr.as_deref(), consul.addr, DEFAULT_CONSUL_ADDR),
            nomad_addr: pick(cli.nomad_addr.as_deref(), nomad.addr, DEFAULT_NOMAD_ADDR),
            exclusions,
        })
    }
}

/// Applies the command-line token check to values read from the config file.
fn checked_exclusions(values: Vec<String>) -> Result<Vec<String>, ConfigError> {
    values
        .into_iter()
        .map(|value| parse_exclusion_arg(&value).map_err(ConfigError::InvalidExclusion))
        .collect()
}

fn pick(cli: Option<&str>, file: Option<String>, default: &str) -> String {
    cli.map(ToString::to_string)
        .or(file)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
