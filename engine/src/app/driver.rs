//! Top-level sequencing of a reconciliation run.

use tracing::info;

use reaper_common::RunStats;

use super::{
    ReconcileError, RunOptions, Snapshot, allocations::retoggle_allocations,
    query::silence_matching_query, unknown_hosts::deactivate_unknown_hosts,
};
use crate::clients::{Catalog, MonitoringBackend, Orchestrator};

/// Runs the `consul/nomad` mode.
///
/// Takes one snapshot of all collaborators, deactivates hosts only known to monitoring,
/// then retoggles allocation metrics on hosts known to both sides.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be taken or an integrity violation is hit.
pub async fn reconcile_catalog<C, O, M>(
    catalog: &C,
    orchestrator: &O,
    monitoring: &M,
    options: &RunOptions,
) -> Result<RunStats, ReconcileError>
where
    C: Catalog,
    O: Orchestrator,
    M: MonitoringBackend,
{
    let mut stats = RunStats::new(options.dry_run);
    let snapshot = Snapshot::collect(catalog, orchestrator, monitoring).await?;
    snapshot.record(&mut stats);

    deactivate_unknown_hosts(&snapshot, monitoring, options, &mut stats).await?;
    retoggle_allocations(&snapshot, orchestrator, monitoring, options, &mut stats).await?;

    info!(soft_failures = stats.soft_failures, "Reconciliation finished");
    Ok(stats)
}

/// Runs the `query` mode.
///
/// # Errors
///
/// Returns the first error encountered.
pub async fn reconcile_query<M: MonitoringBackend>(
    query: &str,
    monitoring: &M,
    options: &RunOptions,
) -> Result<RunStats, ReconcileError> {
    let mut stats = RunStats::new(options.dry_run);
    silence_matching_query(query, monitoring, options, &mut stats).await?;
    info!("Query finished");
    Ok(stats)
}
