//! Counters accumulated over one reconciliation run.

use core::fmt;

/// Statistics of a single run.
///
/// Counters prefixed with a planned verb (`targets_to_disable`, `metrics_to_enable`, ...) are
/// derived from reads only and are identical between a dry run and a live run over the same
/// remote state. `disabled_targets`, `enabled_metrics` and `disabled_metrics` only count
/// writes the backend accepted, so they stay zero in a dry run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub dry_run: bool,

    /// Hosts registered in the Consul catalog.
    pub catalog_hosts: usize,
    /// Distinct targets of active Circonus check bundles.
    pub monitoring_targets: usize,
    /// Targets known to Circonus but absent from the catalog.
    pub unknown_targets: usize,
    /// Hosts present in both the catalog and Circonus.
    pub shared_hosts: usize,
    /// Nodes known to Nomad.
    pub nomad_clients: usize,

    pub targets_to_disable: usize,
    pub disabled_targets: usize,
    pub excluded_targets: usize,

    pub metrics_to_enable: usize,
    pub metrics_to_disable: usize,
    pub enabled_metrics: usize,
    pub disabled_metrics: usize,

    pub live_allocs: usize,
    pub active_alloc_metrics: usize,
    pub available_alloc_metrics: usize,

    /// Hosts or bundles skipped because of an isolated failure.
    pub soft_failures: usize,
}

impl RunStats {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    const fn mode(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "live" }
    }

    fn rows(&self) -> Vec<(String, usize)> {
        let mode = self.mode();
        vec![
            (format!("Targets To Disable {mode}"), self.targets_to_disable),
            (format!("Disabled Targets {mode}"), self.disabled_targets),
            (format!("Excluded Targets {mode}"), self.excluded_targets),
            (format!("Metrics To Disable {mode}"), self.metrics_to_disable),
            (format!("Disabled Metrics {mode}"), self.disabled_metrics),
            (format!("Metrics To Enable {mode}"), self.metrics_to_enable),
            (format!("Enabled Metrics {mode}"), self.enabled_metrics),
            ("Number of Consul Hosts".to_string(), self.catalog_hosts),
            ("Number of Circonus Targets".to_string(), self.monitoring_targets),
            ("Number of non-Consul Hosts".to_string(), self.unknown_targets),
            (
                "Number of Circonus and Consul Hosts".to_string(),
                self.shared_hosts,
            ),
            ("Number of Nomad Clients".to_string(), self.nomad_clients),
            ("Number of live allocs".to_string(), self.live_allocs),
            (
                "Number of active nomad alloc metrics".to_string(),
                self.active_alloc_metrics,
            ),
            (
                "Number of available nomad alloc metrics".to_string(),
                self.available_alloc_metrics,
            ),
            ("Soft failures".to_string(), self.soft_failures),
        ]
    }
}

/// Renders the human readable two-column summary.
impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        let width = rows.iter().map(|row| row.0.len()).max().unwrap_or(0);
        writeln!(f, "Summary:")?;
        for (label, value) in rows {
            writeln!(f, "{label:<width$}  {value}")?;
        }
        Ok(())
    }
}
