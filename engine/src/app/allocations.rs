//! Retoggling of allocation-scoped metrics on Nomad clients.

use std::collections::{BTreeSet, HashSet};

use tracing::{Instrument as _, debug, info, info_span};

use reaper_common::{
    AllocationMetricPattern, CheckBundle, RunStats, check_bundle_id, check_bundle_metrics_cid,
    retoggle_allocation_metrics,
};

use super::{
    ReconcileError, RunOptions, Snapshot, error::isolate, targets::find_check_bundles_by_target,
};
use crate::clients::{MonitoringBackend, Orchestrator};

/// Aligns allocation metric statuses with live allocations on every shared host.
///
/// Hosts without a Nomad node are ignored; excluded hosts are counted and skipped.
///
/// # Errors
///
/// Returns an error only for an [`ReconcileError::Integrity`] violation. Every other
/// failure is isolated to the host or bundle it concerns.
pub async fn retoggle_allocations<O, M>(
    snapshot: &Snapshot,
    orchestrator: &O,
    monitoring: &M,
    options: &RunOptions,
    stats: &mut RunStats,
) -> Result<(), ReconcileError>
where
    O: Orchestrator,
    M: MonitoringBackend,
{
    for host in &snapshot.hosts.both {
        let Some(node_id) = snapshot.nodes.get(host) else {
            info!(%host, "Ignoring non-nomad client");
            continue;
        };
        if options.exclusions.is_excluded(host) {
            info!(%host, "Skipping excluded nomad client");
            stats.excluded_targets += 1;
            continue;
        }

        let span = info_span!("nomad_client", %host, %node_id);
        let result = retoggle_host(host, node_id, orchestrator, monitoring, options, stats)
            .instrument(span)
            .await;
        isolate(result, stats)?;
    }
    Ok(())
}

async fn retoggle_host<O, M>(
    host: &str,
    node_id: &str,
    orchestrator: &O,
    monitoring: &M,
    options: &RunOptions,
    stats: &mut RunStats,
) -> Result<(), ReconcileError>
where
    O: Orchestrator,
    M: MonitoringBackend,
{
    debug!("Searching nomad client");
    let live: HashSet<String> = orchestrator
        .list_allocations(node_id, true)
        .await
        .map_err(|source| ReconcileError::Allocations {
            host: host.to_string(),
            source,
        })?
        .into_iter()
        .map(|alloc| alloc.id.to_lowercase())
        .collect();
    stats.live_allocs += live.len();

    let bundles = find_check_bundles_by_target(monitoring, host, options.prefix_search)
        .await
        .map_err(|source| ReconcileError::BundleSearch {
            target: host.to_string(),
            source,
        })?;

    let pattern =
        AllocationMetricPattern::for_host(host).map_err(|source| ReconcileError::HostPattern {
            host: host.to_string(),
            source,
        })?;

    let mut excluded = BTreeSet::new();
    for bundle in &bundles {
        if options.exclusions.is_excluded(&bundle.target) {
            info!(
                bundle_target = %bundle.target,
                cid = %bundle.cid,
                "Skipping excluded check bundle"
            );
            excluded.insert(bundle.target.as_str());
            continue;
        }
        let result =
            retoggle_bundle(host, bundle, &pattern, &live, monitoring, options, stats).await;
        isolate(result, stats)?;
    }
    stats.excluded_targets += excluded.len();
    Ok(())
}

async fn retoggle_bundle<M: MonitoringBackend>(
    host: &str,
    bundle: &CheckBundle,
    pattern: &AllocationMetricPattern,
    live: &HashSet<String>,
    monitoring: &M,
    options: &RunOptions,
    stats: &mut RunStats,
) -> Result<(), ReconcileError> {
    let bundle_id = check_bundle_id(&bundle.cid).ok_or_else(|| ReconcileError::MalformedCid {
        host: host.to_string(),
        cid: bundle.cid.clone(),
    })?;
    let metrics_cid = check_bundle_metrics_cid(bundle_id);

    let mut collection = monitoring
        .fetch_check_bundle_metrics(&metrics_cid)
        .await
        .map_err(|source| ReconcileError::FetchMetrics {
            cid: metrics_cid.clone(),
            source,
        })?;

    let outcome = retoggle_allocation_metrics(&mut collection.metrics, pattern, live)?;
    stats.active_alloc_metrics += outcome.live_allocation_metrics;
    stats.available_alloc_metrics += outcome.ended_allocation_metrics;
    stats.metrics_to_enable += outcome.activated.len();
    stats.metrics_to_disable += outcome.deactivated.len();
    for metric in &outcome.activated {
        info!(cid = %metrics_cid, %metric, "Toggling metric to active");
    }
    for metric in &outcome.deactivated {
        info!(cid = %metrics_cid, %metric, "Toggling metric to available");
    }

    if !outcome.is_dirty() {
        return Ok(());
    }
    if options.dry_run {
        info!(cid = %collection.cid, "dry-run: about to update check bundle metrics");
        return Ok(());
    }
    info!(cid = %collection.cid, "About to update check bundle metrics");
    monitoring
        .update_check_bundle_metrics(&collection)
        .await
        .map_err(|source| ReconcileError::UpdateMetrics {
            cid: collection.cid.clone(),
            source,
        })?;
    stats.enabled_metrics += outcome.activated.len();
    stats.disabled_metrics += outcome.deactivated.len();
    Ok(())
}
