//! Deactivation of hosts that monitoring still knows but the catalog does not.

use std::collections::BTreeSet;

use tracing::{Instrument as _, info, info_span};

use reaper_common::RunStats;

use super::{
    ReconcileError, RunOptions, Snapshot, error::isolate, targets::find_check_bundles_by_target,
};
use crate::clients::MonitoringBackend;

/// Removes the check bundles of every monitoring-only host that is not excluded.
///
/// # Errors
///
/// Only fatal errors are returned; per-host failures are logged and counted.
pub async fn deactivate_unknown_hosts<M: MonitoringBackend>(
    snapshot: &Snapshot,
    monitoring: &M,
    options: &RunOptions,
    stats: &mut RunStats,
) -> Result<(), ReconcileError> {
    for host in &snapshot.hosts.right_only {
        if options.exclusions.is_excluded(host) {
            info!(%host, "Skipping check bundle deactivation for excluded target");
            stats.excluded_targets += 1;
            continue;
        }
        info!(%host, "Deactivating check bundles for target");
        stats.targets_to_disable += 1;

        let result = disable_target_checks(host, monitoring, options, stats)
            .instrument(info_span!("unknown_host", %host))
            .await;
        if matches!(result, Ok(())) && !options.dry_run {
            stats.disabled_targets += 1;
        }
        isolate(result, stats)?;
    }
    Ok(())
}

async fn disable_target_checks<M: MonitoringBackend>(
    host: &str,
    monitoring: &M,
    options: &RunOptions,
    stats: &mut RunStats,
) -> Result<(), ReconcileError> {
    let bundles = find_check_bundles_by_target(monitoring, host, options.prefix_search)
        .await
        .map_err(|source| ReconcileError::BundleSearch {
            target: host.to_string(),
            source,
        })?;

    // A prefix search may return bundles of other, excluded targets.
    let (skipped, doomed): (Vec<_>, Vec<_>) = bundles
        .iter()
        .partition(|bundle| options.exclusions.is_excluded(&bundle.target));
    for bundle in &skipped {
        info!(
            bundle_target = %bundle.target,
            cid = %bundle.cid,
            "Skipping excluded check bundle"
        );
    }
    stats.excluded_targets += skipped
        .iter()
        .map(|bundle| bundle.target.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    for bundle in doomed {
        if options.dry_run {
            info!(
                bundle_target = %bundle.target,
                cid = %bundle.cid,
                "dry-run: would delete check bundle"
            );
            continue;
        }
        info!(
            bundle_target = %bundle.target,
            cid = %bundle.cid,
            "About to delete check bundle"
        );
        monitoring
            .delete_check_bundle(bundle)
            .await
            .map_err(|source| ReconcileError::DeleteBundle {
                cid: bundle.cid.clone(),
                source,
            })?;
    }
    Ok(())
}
