//! Lookups of check bundles by monitoring target.

use std::collections::BTreeSet;

use url::form_urlencoded;

use reaper_common::{CHECK_BUNDLE_PREFIX, CheckBundle};

use crate::clients::{ClientError, MonitoringBackend, SearchFilter, decode};

/// Page size requested from Circonus searches.
pub(crate) const SEARCH_PAGE_SIZE: usize = 1000;

const ACTIVE_BUNDLES: &str = "(active:1)";

/// Distinct targets of every active check bundle.
pub(crate) async fn monitoring_targets<M: MonitoringBackend>(
    monitoring: &M,
) -> Result<BTreeSet<String>, ClientError> {
    let bundles = monitoring
        .search_check_bundles(ACTIVE_BUNDLES, &SearchFilter::new())
        .await?;
    Ok(bundles.into_iter().map(|b| b.target).collect())
}

/// Builds the raw search path for the active check bundles of `host`.
///
/// With `prefix_search` every target starting with `host` matches.
pub(crate) fn check_bundle_search_path(host: &str, prefix_search: bool) -> String {
    let host = if prefix_search {
        format!("{host}*")
    } else {
        host.to_string()
    };
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("search", &format!("{ACTIVE_BUNDLES}(host:{host:?})"))
        .append_pair("size", &SEARCH_PAGE_SIZE.to_string())
        .finish();
    format!("{CHECK_BUNDLE_PREFIX}?{query}")
}

/// Active check bundles whose target is `host`.
pub(crate) async fn find_check_bundles_by_target<M: MonitoringBackend>(
    monitoring: &M,
    host: &str,
    prefix_search: bool,
) -> Result<Vec<CheckBundle>, ClientError> {
    let path = check_bundle_search_path(host, prefix_search);
    let body = monitoring.get(&path).await?;
    decode(&path, &body)
}
