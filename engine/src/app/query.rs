//! Query mode: silence every metric matching a Circonus search.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, info};

use reaper_common::{MetricSearchHit, RunStats, silence_metrics};

use super::{ReconcileError, RunOptions, targets::SEARCH_PAGE_SIZE};
use crate::clients::{MonitoringBackend, SearchFilter};

/// Flips every `active` metric matched by `query` to `available`.
///
/// Bundles of excluded targets are skipped. This never re-activates a metric.
///
/// # Errors
///
/// Every failure aborts the run, including failures of a single fetch or update.
pub async fn silence_matching_query<M: MonitoringBackend>(
    query: &str,
    monitoring: &M,
    options: &RunOptions,
    stats: &mut RunStats,
) -> Result<(), ReconcileError> {
    debug!(%query, "Resolving query");
    let hits = search_all_metrics(query, monitoring).await?;

    let mut by_bundle: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for hit in hits {
        by_bundle
            .entry(hit.check_bundle_cid)
            .or_default()
            .insert(hit.metric_name);
    }
    info!(bundles = by_bundle.len(), "Resolved query");

    for (cid, names) in &by_bundle {
        debug!(%cid, "Check bundle");
        let mut bundle = monitoring
            .fetch_check_bundle(cid)
            .await
            .map_err(|source| ReconcileError::FetchBundle {
                cid: cid.clone(),
                source,
            })?;
        if options.exclusions.is_excluded(&bundle.target) {
            info!(
                %cid,
                bundle_target = %bundle.target,
                "Skipping check bundle of excluded target"
            );
            stats.excluded_targets += 1;
            continue;
        }

        let silenced = silence_metrics(&mut bundle.metrics, names)?;
        stats.metrics_to_disable += silenced.len();
        for metric in &silenced {
            info!(%cid, %metric, "Toggling metric to available");
        }
        if silenced.is_empty() {
            continue;
        }
        if options.dry_run {
            info!(%cid, "dry-run: about to update check bundle");
            continue;
        }
        info!(%cid, "About to update check bundle");
        monitoring
            .update_check_bundle(&bundle)
            .await
            .map_err(|source| ReconcileError::UpdateBundle {
                cid: cid.clone(),
                source,
            })?;
        stats.disabled_metrics += silenced.len();
    }
    Ok(())
}

/// Pages through all metrics matching `query`.
///
/// Stops on a short page or on a page that adds nothing new, so a backend ignoring
/// the offset cannot loop forever.
async fn search_all_metrics<M: MonitoringBackend>(
    query: &str,
    monitoring: &M,
) -> Result<Vec<MetricSearchHit>, ReconcileError> {
    let mut hits = Vec::new();
    let mut seen = HashSet::new();
    let mut from = 0_usize;
    loop {
        let mut filter = SearchFilter::new();
        filter.insert("size".to_string(), vec![SEARCH_PAGE_SIZE.to_string()]);
        if from > 0 {
            filter.insert("from".to_string(), vec![from.to_string()]);
        }
        let page = monitoring
            .search_metrics(query, &filter)
            .await
            .map_err(|source| ReconcileError::MetricSearch {
                query: query.to_string(),
                source,
            })?;

        let page_len = page.len();
        let before = hits.len();
        hits.extend(page.into_iter().filter(|hit| seen.insert(hit.cid.clone())));
        debug!(from, page_len, "Fetched metric search page");
        if page_len < SEARCH_PAGE_SIZE || hits.len() == before {
            return Ok(hits);
        }
        from += page_len;
    }
}
