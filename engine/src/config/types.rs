//! Configuration data types.
//!
//! [`FileConfig`] mirrors the optional TOML file. [`Settings`] is the validated
//! result of layering the command line over that file, and is what a run consumes.

use core::fmt;

use clap::ValueEnum;
use secrecy::SecretString;
use serde::Deserialize;

use reaper_common::ExclusionFilter;

pub(crate) const DEFAULT_APP_NAME: &str = "reaper";
pub(crate) const DEFAULT_CIRCONUS_URL: &str = "https://api.circonus.com/v2";
pub(crate) const DEFAULT_CONSUL_ADDR: &str = "127.0.0.1:8500";
pub(crate) const DEFAULT_NOMAD_ADDR: &str = "http://127.0.0.1:4646";

/// Operating mode, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
pub enum Mode {
    /// Silence every metric matching a Circonus search query.
    #[serde(rename = "query")]
    Query,
    /// Reconcile against the Consul catalog and Nomad allocations.
    #[serde(rename = "consul/nomad")]
    #[value(name = "consul/nomad")]
    ConsulNomad,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Query => f.write_str("query"),
            Self::ConsulNomad => f.write_str("consul/nomad"),
        }
    }
}

/// Contents of the optional TOML configuration file.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<Mode>,
    pub dry_run: bool,
    pub prefix_search: bool,
    /// Circonus search query (query mode only).
    pub query: Option<String>,
    pub circonus: CirconusSection,
    pub consul: AgentSection,
    pub nomad: AgentSection,
    pub exclude: ExcludeSection,
}

/// `[circonus]` table.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct CirconusSection {
    pub api_key: Option<SecretString>,
    pub app_name: Option<String>,
    pub url: Option<String>,
}

/// `[consul]` and `[nomad]` tables.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSection {
    pub addr: Option<String>,
}

/// `[exclude]` table.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludeSection {
    pub targets: Vec<String>,
    pub regexps: Vec<String>,
}

/// Circonus connection settings.
#[derive(Debug, Clone)]
pub struct CirconusSettings {
    pub api_key: SecretString,
    pub app_name: String,
    pub url: String,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub dry_run: bool,
    pub prefix_search: bool,
    /// Non-empty in query mode, empty otherwise.
    pub query: String,
    pub circonus: CirconusSettings,
    pub consul_addr: String,
    pub nomad_addr: String,
    pub exclusions: ExclusionFilter,
}
