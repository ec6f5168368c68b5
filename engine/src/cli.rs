//! Command-line interface definitions for the reaper.

use std::{env, path::PathBuf};

use clap::{Parser, ValueEnum};

use reaper_common::parse_exclusion_arg;

use crate::config::Mode;

/// Top-level command-line interface definition.
///
/// Every option except `--config` and `--log-format` may also be set in the config file;
/// values given here take precedence.
#[derive(Debug, Default, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Circonus API key
    #[arg(long, env = "CIRCONUS_API_KEY", hide_env_values = true)]
    pub circonus_api_key: Option<String>,

    /// Name to use as the application name in the Circonus API Token UI [default: reaper]
    #[arg(long)]
    pub circonus_app_name: Option<String>,

    /// URL for the Circonus API [default: https://api.circonus.com/v2]
    #[arg(long, env = "CIRCONUS_API_URL")]
    pub circonus_url: Option<String>,

    /// Consul agent address [default: 127.0.0.1:8500]
    #[arg(long, env = "CONSUL_HTTP_ADDR")]
    pub consul_addr: Option<String>,

    /// Nomad agent address [default: http://127.0.0.1:4646]
    #[arg(long, env = "NOMAD_ADDR")]
    pub nomad_addr: Option<String>,

    /// Mode to operate in
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Do not make any actual changes
    #[arg(long)]
    pub dry_run: bool,

    /// Target to exclude (may be set more than once)
    #[arg(long = "exclude-target", value_parser = parse_exclusion_arg)]
    pub exclude_targets: Vec<String>,

    /// Regexp for targets to exclude (may be set more than once)
    #[arg(long = "exclude-regexp", value_parser = parse_exclusion_arg)]
    pub exclude_regexps: Vec<String>,

    /// Circonus search query of metrics to disable (query mode only)
    #[arg(long)]
    pub query: Option<String>,

    /// Search check bundles by host prefix instead of by exact host
    #[arg(long)]
    pub prefix_search: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Format of the log lines written to stderr.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
    Pretty,
}
