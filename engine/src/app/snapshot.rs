//! Point-in-time view of the catalog, orchestrator and monitoring backend.

use std::collections::HashMap;

use tracing::{debug, info};

use reaper_common::{Partition, RunStats, partition};

use super::{ReconcileError, targets::monitoring_targets};
use crate::clients::{Catalog, MonitoringBackend, Orchestrator};

/// Everything a catalog run reads up front.
///
/// Built once and only read afterwards.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    /// Catalog hosts (left) against monitoring targets (right).
    pub hosts: Partition,
    /// Orchestrator node name to node ID.
    pub nodes: HashMap<String, String>,
    pub catalog_hosts: usize,
    pub monitoring_targets: usize,
}

impl Snapshot {
    /// Reads all three collaborators, tolerating stale reads.
    ///
    /// # Errors
    ///
    /// Any failure is a [`ReconcileError::Snapshot`], which is fatal.
    pub async fn collect<C, O, M>(
        catalog: &C,
        orchestrator: &O,
        monitoring: &M,
    ) -> Result<Self, ReconcileError>
    where
        C: Catalog,
        O: Orchestrator,
        M: MonitoringBackend,
    {
        let nodes: HashMap<_, _> = orchestrator
            .list_nodes(true)
            .await
            .map_err(|source| ReconcileError::Snapshot {
                what: "Nomad nodes",
                source,
            })?
            .into_iter()
            .map(|node| (node.name, node.id))
            .collect();

        let hosts = catalog
            .list_hosts(true)
            .await
            .map_err(|source| ReconcileError::Snapshot {
                what: "Consul hosts",
                source,
            })?;

        let targets = monitoring_targets(monitoring)
            .await
            .map_err(|source| ReconcileError::Snapshot {
                what: "Circonus targets",
                source,
            })?;

        let catalog_hosts = hosts.len();
        let monitoring_targets = targets.len();
        let hosts = partition(hosts, targets);
        info!(
            catalog_hosts,
            monitoring_targets,
            nomad_clients = nodes.len(),
            unknown = hosts.right_only.len(),
            shared = hosts.both.len(),
            "Collected snapshot"
        );
        debug!(unknown = ?hosts.right_only, "Hosts only known to monitoring");

        Ok(Self {
            hosts,
            nodes,
            catalog_hosts,
            monitoring_targets,
        })
    }

    /// Records the snapshot's sizes in `stats`.
    pub fn record(&self, stats: &mut RunStats) {
        stats.catalog_hosts = self.catalog_hosts;
        stats.monitoring_targets = self.monitoring_targets;
        stats.unknown_targets = self.hosts.right_only.len();
        stats.shared_hosts = self.hosts.both.len();
        stats.nomad_clients = self.nodes.len();
    }
}
