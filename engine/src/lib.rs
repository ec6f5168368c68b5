//! Library entry for the `reaper` binary.
//!
//! Exposes `inner_main` so the workspace-level binary can call into the engine.
//!
//! The engine wires the command line and config file into [`config::Settings`], builds the
//! Consul, Nomad and Circonus clients and runs the selected reconciliation mode.
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

pub mod app;
pub mod cli;
pub mod clients;
pub mod config;

use std::{io, sync::Once};

use eyre::{Result, WrapErr as _};
use tracing::{Instrument as _, info, info_span};
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use app::{RunOptions, reconcile_catalog, reconcile_query};
use cli::{Cli, LogFormat};
use clients::{CirconusClient, ConsulClient, NomadClient};
use config::{FileConfig, Mode, Settings};

static INIT_TRACING: Once = Once::new();

fn init_tracing(log_format: LogFormat) {
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_timer(ChronoLocal::rfc_3339())
            .with_writer(io::stderr);

        match log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// The reaper's main function; can be called from a shim binary.
///
/// Resolves the configuration, runs one reconciliation pass and prints its summary on stdout.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a client cannot be built, or the run
/// fails fatally. Isolated per-host failures are only logged.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    init_tracing(invocation.log_format);

    let file = match invocation.config {
        Some(ref path) => config::load(path).await?,
        None => FileConfig::default(),
    };
    let settings =
        Settings::resolve(&invocation, file).wrap_err("Invalid reaper configuration")?;
    let options = RunOptions::from(&settings);

    let circonus = CirconusClient::new(
        &settings.circonus.url,
        settings.circonus.api_key.clone(),
        &settings.circonus.app_name,
    )
    .wrap_err("Unable to create Circonus API client")?;

    let span = info_span!(
        "reaper.run",
        mode = %settings.mode,
        dry_run = settings.dry_run,
        version = env!("CARGO_PKG_VERSION")
    );
    let stats = match settings.mode {
        Mode::Query => {
            info!(query = %settings.query, "Starting query run");
            reconcile_query(&settings.query, &circonus, &options)
                .instrument(span)
                .await
                .wrap_err("Query run failed")?
        }
        Mode::ConsulNomad => {
            let consul = ConsulClient::new(&settings.consul_addr)
                .wrap_err("Unable to create Consul API client")?;
            let nomad = NomadClient::new(&settings.nomad_addr)
                .wrap_err("Unable to create Nomad API client")?;
            info!(
                consul = %settings.consul_addr,
                nomad = %settings.nomad_addr,
                "Starting consul/nomad run"
            );
            reconcile_catalog(&consul, &nomad, &circonus, &options)
                .instrument(span)
                .await
                .wrap_err("Consul/Nomad run failed")?
        }
    };

    println!("{stats}");
    Ok(())
}
