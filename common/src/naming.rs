//! Naming conventions owned by external systems.
//!
//! Circonus encodes object IDs in CID paths, and the Nomad telemetry sink encodes
//! the allocation a metric belongs to inside the backtick-delimited metric name.
//! Both are matched with regular expressions mirroring those external contracts.

use std::sync::LazyLock;

use regex::Regex;

/// URL path of the check bundle collection.
pub const CHECK_BUNDLE_PREFIX: &str = "/check_bundle";
/// URL path of the check bundle metrics collection.
pub const CHECK_BUNDLE_METRICS_PREFIX: &str = "/check_bundle_metrics";
/// URL path of the metric collection.
pub const METRIC_PREFIX: &str = "/metric";
/// Shape of a check bundle CID: the collection prefix followed by a numeric ID.
pub const CHECK_BUNDLE_CID_PATTERN: &str = r"^(/check_bundle)/([0-9]+)$";

/// Telemetry path tokens preceding the allocation segments of a Nomad client metric.
const ALLOC_METRIC_ROOT: &str = "nomad";
const ALLOC_METRIC_SCOPE: &str = "client`allocs";
/// Lower-case UUID as used for Nomad allocation IDs.
const UUID_PATTERN: &str = r"([\da-f]{8}-[\da-f]{4}-[\da-f]{4}-[\da-f]{4}-[\da-f]{12})";

static CHECK_BUNDLE_CID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(CHECK_BUNDLE_CID_PATTERN).expect("check bundle CID pattern is a valid constant")
});

/// Extracts the numeric ID from a check bundle CID such as `/check_bundle/1234`.
///
/// Returns `None` when the CID does not have the expected shape.
#[must_use]
pub fn check_bundle_id(cid: &str) -> Option<&str> {
    CHECK_BUNDLE_CID_RE
        .captures(cid)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

/// CID of the metrics collection belonging to the check bundle with `bundle_id`.
#[must_use]
pub fn check_bundle_metrics_cid(bundle_id: &str) -> String {
    format!("{CHECK_BUNDLE_METRICS_PREFIX}/{bundle_id}")
}

/// Matcher for allocation-scoped metric names of a single Nomad client.
///
/// Metric names look like ``nomad`<host>`client`allocs`<job>`<group>`<alloc-id>`<task>`...``.
/// The host is escaped and the whole name is matched case-insensitively.
#[derive(Debug, Clone)]
pub struct AllocationMetricPattern {
    re: Regex,
}

impl AllocationMetricPattern {
    /// Builds the matcher for metrics reported by `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting expression exceeds the regex size limits,
    /// which can only happen for absurdly long host names.
    pub fn for_host(host: &str) -> Result<Self, regex::Error> {
        let host = regex::escape(host);
        let re = Regex::new(&format!(
            "(?i)^{ALLOC_METRIC_ROOT}`{host}`{ALLOC_METRIC_SCOPE}`.*`{UUID_PATTERN}`"
        ))?;
        Ok(Self { re })
    }

    /// Returns the lower-cased allocation ID embedded in `metric_name`, if any.
    #[must_use]
    pub fn allocation_id(&self, metric_name: &str) -> Option<String> {
        self.re
            .captures(metric_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
    }
}
