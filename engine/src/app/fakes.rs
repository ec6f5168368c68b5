//! In-memory collaborators for driving the reconciler in tests.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Mutex,
};

use url::Url;

use reaper_common::{
    Allocation, CHECK_BUNDLE_METRICS_PREFIX, CHECK_BUNDLE_PREFIX, CheckBundle, CheckBundleMetrics,
    Metric, MetricSearchHit, MetricStatus, OrchestratorNode,
};

use crate::clients::{Catalog, ClientError, MonitoringBackend, Orchestrator, SearchFilter};

fn unavailable(what: &str) -> ClientError {
    ClientError::Status {
        url: format!("fake://{what}"),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: String::new(),
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeCatalog {
    hosts: Vec<String>,
    fail: bool,
}

impl FakeCatalog {
    pub(crate) fn new<'a>(hosts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            hosts: hosts.into_iter().map(str::to_string).collect(),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            hosts: Vec::new(),
            fail: true,
        }
    }
}

impl Catalog for FakeCatalog {
    async fn list_hosts(&self, _allow_stale: bool) -> Result<Vec<String>, ClientError> {
        if self.fail {
            return Err(unavailable("catalog"));
        }
        Ok(self.hosts.clone())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeOrchestrator {
    nodes: Vec<OrchestratorNode>,
    allocations: HashMap<String, Vec<String>>,
    failing_nodes: HashSet<String>,
}

impl FakeOrchestrator {
    pub(crate) fn with_node<'a>(
        mut self,
        name: &str,
        id: &str,
        allocations: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.nodes.push(OrchestratorNode {
            name: name.to_string(),
            id: id.to_string(),
        });
        self.allocations.insert(
            id.to_string(),
            allocations.into_iter().map(str::to_string).collect(),
        );
        self
    }

    /// Allocation queries for `id` fail.
    pub(crate) fn failing_allocations(mut self, id: &str) -> Self {
        self.failing_nodes.insert(id.to_string());
        self
    }
}

impl Orchestrator for FakeOrchestrator {
    async fn list_nodes(&self, _allow_stale: bool) -> Result<Vec<OrchestratorNode>, ClientError> {
        Ok(self.nodes.clone())
    }

    async fn list_allocations(
        &self,
        node_id: &str,
        _allow_stale: bool,
    ) -> Result<Vec<Allocation>, ClientError> {
        if self.failing_nodes.contains(node_id) {
            return Err(unavailable("allocations"));
        }
        Ok(self
            .allocations
            .get(node_id)
            .into_iter()
            .flatten()
            .map(|id| Allocation { id: id.clone() })
            .collect())
    }
}

#[derive(Debug, Default)]
struct MonitoringState {
    /// Check bundles keyed by CID.
    bundles: BTreeMap<String, CheckBundle>,
    hits: Vec<MetricSearchHit>,
    /// CIDs of every successful write, in order.
    writes: Vec<String>,
    delete_attempts: Vec<String>,
    metric_searches: Vec<SearchFilter>,
    failing_writes: HashSet<String>,
    failing_fetches: HashSet<String>,
    failing_targets: HashSet<String>,
}

/// Monitoring backend holding check bundles in memory.
///
/// A bundle's metric collection lives on the bundle itself, so the bundle and
/// bundle-metrics views of the same ID always agree.
#[derive(Debug, Default)]
pub(crate) struct FakeMonitoring {
    state: Mutex<MonitoringState>,
}

impl FakeMonitoring {
    pub(crate) fn with_bundle(self, id: u64, target: &str, metrics: Vec<Metric>) -> Self {
        self.with_cid(&format!("{CHECK_BUNDLE_PREFIX}/{id}"), target, metrics)
    }

    /// Adds a bundle under an arbitrary, possibly malformed, CID.
    pub(crate) fn with_cid(self, cid: &str, target: &str, metrics: Vec<Metric>) -> Self {
        self.state.lock().unwrap().bundles.insert(
            cid.to_string(),
            CheckBundle {
                cid: cid.to_string(),
                target: target.to_string(),
                metrics,
                extra: serde_json::Map::new(),
            },
        );
        self
    }

    pub(crate) fn with_hit(self, bundle_id: u64, metric_name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let n = state.hits.len();
            state.hits.push(MetricSearchHit {
                cid: format!("/metric/{n}"),
                check_bundle_cid: format!("{CHECK_BUNDLE_PREFIX}/{bundle_id}"),
                metric_name: metric_name.to_string(),
            });
        }
        self
    }

    /// Writes to `cid` (bundle or bundle-metrics) fail.
    pub(crate) fn failing_write(self, cid: &str) -> Self {
        self.state.lock().unwrap().failing_writes.insert(cid.to_string());
        self
    }

    /// Fetches of `cid` (bundle or bundle-metrics) fail.
    pub(crate) fn failing_fetch(self, cid: &str) -> Self {
        self.state.lock().unwrap().failing_fetches.insert(cid.to_string());
        self
    }

    /// Searches for bundles of `target` fail.
    pub(crate) fn failing_target(self, target: &str) -> Self {
        self.state.lock().unwrap().failing_targets.insert(target.to_string());
        self
    }

    pub(crate) fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub(crate) fn delete_attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_attempts.clone()
    }

    pub(crate) fn metric_searches(&self) -> Vec<SearchFilter> {
        self.state.lock().unwrap().metric_searches.clone()
    }

    /// Current status of `metric` on bundle `id`.
    pub(crate) fn status(&self, id: u64, metric: &str) -> Option<MetricStatus> {
        let state = self.state.lock().unwrap();
        state
            .bundles
            .get(&format!("{CHECK_BUNDLE_PREFIX}/{id}"))?
            .metrics
            .iter()
            .find(|m| m.name == metric)
            .map(|m| m.status.clone())
    }

    fn bundle_cid_of_metrics(cid: &str) -> String {
        cid.strip_prefix(CHECK_BUNDLE_METRICS_PREFIX)
            .map_or_else(|| cid.to_string(), |id| format!("{CHECK_BUNDLE_PREFIX}{id}"))
    }

    fn fetch(&self, cid: &str) -> Result<CheckBundle, ClientError> {
        let state = self.state.lock().unwrap();
        if state.failing_fetches.contains(cid) {
            return Err(unavailable(cid));
        }
        state
            .bundles
            .get(&Self::bundle_cid_of_metrics(cid))
            .cloned()
            .ok_or_else(|| ClientError::Status {
                url: format!("fake://{cid}"),
                status: reqwest::StatusCode::NOT_FOUND,
                body: String::new(),
            })
    }

    fn store(&self, cid: &str, metrics: &[Metric]) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(cid) {
            return Err(unavailable(cid));
        }
        let bundle_cid = Self::bundle_cid_of_metrics(cid);
        let bundle = state
            .bundles
            .get_mut(&bundle_cid)
            .ok_or_else(|| unavailable(cid))?;
        bundle.metrics = metrics.to_vec();
        state.writes.push(cid.to_string());
        Ok(())
    }
}

fn searched_host(path_and_query: &str) -> Option<String> {
    let url = Url::parse(&format!("fake://circonus{path_and_query}")).ok()?;
    let (_, search) = url.query_pairs().find(|(k, _)| k == "search")?;
    let host = search.split("(host:\"").nth(1)?.strip_suffix("\")")?;
    Some(host.to_string())
}

impl MonitoringBackend for FakeMonitoring {
    async fn search_check_bundles(
        &self,
        _query: &str,
        _filter: &SearchFilter,
    ) -> Result<Vec<CheckBundle>, ClientError> {
        Ok(self.state.lock().unwrap().bundles.values().cloned().collect())
    }

    async fn search_metrics(
        &self,
        _query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<MetricSearchHit>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.metric_searches.push(filter.clone());
        let param = |name: &str| {
            filter
                .get(name)
                .and_then(|v| v.first())
                .and_then(|v| v.parse::<usize>().ok())
        };
        let from = param("from").unwrap_or(0);
        let size = param("size").unwrap_or(usize::MAX);
        Ok(state.hits.iter().skip(from).take(size).cloned().collect())
    }

    async fn fetch_check_bundle(&self, cid: &str) -> Result<CheckBundle, ClientError> {
        self.fetch(cid)
    }

    async fn fetch_check_bundle_metrics(
        &self,
        cid: &str,
    ) -> Result<CheckBundleMetrics, ClientError> {
        let bundle = self.fetch(cid)?;
        Ok(CheckBundleMetrics {
            cid: cid.to_string(),
            metrics: bundle.metrics,
            extra: serde_json::Map::new(),
        })
    }

    async fn update_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle, ClientError> {
        self.store(&bundle.cid, &bundle.metrics)?;
        Ok(bundle.clone())
    }

    async fn update_check_bundle_metrics(
        &self,
        metrics: &CheckBundleMetrics,
    ) -> Result<CheckBundleMetrics, ClientError> {
        self.store(&metrics.cid, &metrics.metrics)?;
        Ok(metrics.clone())
    }

    async fn delete_check_bundle(&self, bundle: &CheckBundle) -> Result<(), ClientError> {
        self.state
            .lock()
            .unwrap()
            .delete_attempts
            .push(bundle.cid.clone());
        Err(ClientError::NotImplemented("DeleteCheckBundle"))
    }

    async fn get(&self, path_and_query: &str) -> Result<Vec<u8>, ClientError> {
        let host = searched_host(path_and_query).ok_or_else(|| unavailable(path_and_query))?;
        let state = self.state.lock().unwrap();
        if state.failing_targets.contains(host.trim_end_matches('*')) {
            return Err(unavailable(path_and_query));
        }
        let matches: Vec<&CheckBundle> = state
            .bundles
            .values()
            .filter(|b| match host.strip_suffix('*') {
                Some(prefix) => b.target.starts_with(prefix),
                None => b.target == host,
            })
            .collect();
        serde_json::to_vec(&matches).map_err(|source| ClientError::Decode {
            url: path_and_query.to_string(),
            source,
        })
    }
}
