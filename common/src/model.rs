//! Documents exchanged with the monitoring backend, the catalog and the orchestrator.
//!
//! Circonus documents carry many more fields than reconciliation needs. Those are
//! kept in a flattened map so that writing a document back never drops them.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection status of a single metric inside a check bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum MetricStatus {
    /// The metric is being collected.
    Active,
    /// The metric is known but not collected.
    Available,
    /// Anything else the backend reported. Never produced by the reaper itself.
    Unknown(String),
}

impl MetricStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match *self {
            Self::Active => "active",
            Self::Available => "available",
            Self::Unknown(ref other) => other,
        }
    }
}

impl From<String> for MetricStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "available" => Self::Available,
            _ => Self::Unknown(value),
        }
    }
}

impl From<&str> for MetricStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<MetricStatus> for String {
    fn from(value: MetricStatus) -> Self {
        match value {
            MetricStatus::Active => "active".to_string(),
            MetricStatus::Available => "available".to_string(),
            MetricStatus::Unknown(other) => other,
        }
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric entry embedded in a check bundle or a check bundle metrics document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Metric {
    pub name: String,
    pub status: MetricStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metric {
    /// Creates a metric with no additional backend fields.
    #[must_use]
    pub fn new(name: impl Into<String>, status: MetricStatus) -> Self {
        Self {
            name: name.into(),
            status,
            extra: Map::new(),
        }
    }
}

/// A Circonus check bundle (`/check_bundle/<id>`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CheckBundle {
    #[serde(rename = "_cid")]
    pub cid: String,
    pub target: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The metric collection of a check bundle (`/check_bundle_metrics/<id>`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CheckBundleMetrics {
    #[serde(rename = "_cid")]
    pub cid: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One hit of a Circonus metric search (`/metric?search=...`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricSearchHit {
    #[serde(rename = "_cid")]
    pub cid: String,
    #[serde(rename = "_check_bundle")]
    pub check_bundle_cid: String,
    #[serde(rename = "_metric_name")]
    pub metric_name: String,
}

/// A Nomad client node as listed by `/v1/nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrchestratorNode {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ID")]
    pub id: String,
}

/// A Nomad allocation stub as listed by `/v1/node/<id>/allocations`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Allocation {
    #[serde(rename = "ID")]
    pub id: String,
}

/// A Consul catalog node as listed by `/v1/catalog/nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogNode {
    #[serde(rename = "Node")]
    pub node: String,
}
