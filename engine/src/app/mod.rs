//! Reconciliation of Circonus check bundles against Consul and Nomad.

mod allocations;
mod driver;
mod error;
#[cfg(test)]
mod fakes;
mod query;
mod snapshot;
mod targets;
mod unknown_hosts;

use reaper_common::ExclusionFilter;

use crate::config::Settings;

pub use allocations::retoggle_allocations;
pub use driver::{reconcile_catalog, reconcile_query};
pub use error::ReconcileError;
pub use query::silence_matching_query;
pub use snapshot::Snapshot;
pub use unknown_hosts::deactivate_unknown_hosts;

/// Knobs shared by every phase of a run.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    /// Log intended writes instead of issuing them.
    pub dry_run: bool,
    pub prefix_search: bool,
    pub exclusions: ExclusionFilter,
}

impl From<&Settings> for RunOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            dry_run: settings.dry_run,
            prefix_search: settings.prefix_search,
            exclusions: settings.exclusions.clone(),
        }
    }
}
