//! Decides how a metric's collection status has to change.
//!
//! Every decision is computed before anything is mutated, so a metric collection is
//! either fully retoggled or left untouched when an [`IntegrityViolation`] is hit.

use alloc::collections::BTreeSet;
use std::collections::HashSet;

use thiserror::Error as ThisError;

use crate::{AllocationMetricPattern, Metric, MetricStatus};

/// A metric carried a status other than `active` or `available` where a decision was needed.
///
/// This means the backend's status model is not what the reaper assumes, so it is never
/// treated as a per-item failure.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("not sure what to do with metric {metric_name:?} in status {status:?}")]
pub struct IntegrityViolation {
    pub metric_name: String,
    pub status: String,
}

impl IntegrityViolation {
    fn new(metric: &Metric) -> Self {
        Self {
            metric_name: metric.name.clone(),
            status: metric.status.as_str().to_string(),
        }
    }
}

/// Required change for a single allocation metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Status already matches the allocation's liveness.
    Keep,
    /// The allocation is live again; resume collection.
    Activate,
    /// The allocation is gone; stop collection.
    Deactivate,
}

/// Decides the disposition of `metric` given whether its allocation is still live.
///
/// # Errors
///
/// Returns an [`IntegrityViolation`] if the metric's status is neither `active` nor `available`.
pub fn disposition(metric: &Metric, allocation_live: bool) -> Result<Disposition, IntegrityViolation> {
    match (allocation_live, &metric.status) {
        (true, &MetricStatus::Active) | (false, &MetricStatus::Available) => Ok(Disposition::Keep),
        (true, &MetricStatus::Available) => Ok(Disposition::Activate),
        (false, &MetricStatus::Active) => Ok(Disposition::Deactivate),
        (_, &MetricStatus::Unknown(_)) => Err(IntegrityViolation::new(metric)),
    }
}

/// Outcome of retoggling one metric collection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Retoggle {
    /// Allocation metrics whose allocation is live.
    pub live_allocation_metrics: usize,
    /// Allocation metrics whose allocation is no longer listed.
    pub ended_allocation_metrics: usize,
    /// Names flipped from `available` to `active`.
    pub activated: Vec<String>,
    /// Names flipped from `active` to `available`.
    pub deactivated: Vec<String>,
}

impl Retoggle {
    /// Whether any metric changed and the collection must be written back.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.activated.is_empty() || !self.deactivated.is_empty()
    }
}

/// Aligns the status of every allocation metric in `metrics` with the live allocations.
///
/// Metrics whose name does not match `pattern` are not allocation scoped and are left alone.
///
/// # Errors
///
/// Returns an [`IntegrityViolation`] for the first matched metric in an unexpected status.
/// `metrics` is not modified in that case.
pub fn retoggle_allocation_metrics(
    metrics: &mut [Metric],
    pattern: &AllocationMetricPattern,
    live_allocations: &HashSet<String>,
) -> Result<Retoggle, IntegrityViolation> {
    let mut outcome = Retoggle::default();
    let mut changes = Vec::new();

    for (idx, metric) in metrics.iter().enumerate() {
        let Some(allocation_id) = pattern.allocation_id(&metric.name) else {
            continue;
        };
        let live = live_allocations.contains(&allocation_id);
        if live {
            outcome.live_allocation_metrics += 1;
        } else {
            outcome.ended_allocation_metrics += 1;
        }
        match disposition(metric, live)? {
            Disposition::Keep => {}
            Disposition::Activate => {
                outcome.activated.push(metric.name.clone());
                changes.push((idx, MetricStatus::Active));
            }
            Disposition::Deactivate => {
                outcome.deactivated.push(metric.name.clone());
                changes.push((idx, MetricStatus::Available));
            }
        }
    }

    apply(metrics, changes);
    Ok(outcome)
}

/// Flips every `active` metric whose name is in `names` to `available`.
///
/// Returns the names that changed. This never re-activates anything.
///
/// # Errors
///
/// Returns an [`IntegrityViolation`] for the first named metric in an unexpected status.
/// `metrics` is not modified in that case.
pub fn silence_metrics(
    metrics: &mut [Metric],
    names: &BTreeSet<String>,
) -> Result<Vec<String>, IntegrityViolation> {
    let mut silenced = Vec::new();
    let mut changes = Vec::new();

    for (idx, metric) in metrics.iter().enumerate() {
        if !names.contains(&metric.name) {
            continue;
        }
        match metric.status {
            MetricStatus::Active => {
                silenced.push(metric.name.clone());
                changes.push((idx, MetricStatus::Available));
            }
            MetricStatus::Available => {}
            MetricStatus::Unknown(_) => return Err(IntegrityViolation::new(metric)),
        }
    }

    apply(metrics, changes);
    Ok(silenced)
}

fn apply(metrics: &mut [Metric], changes: Vec<(usize, MetricStatus)>) {
    for (idx, status) in changes {
        if let Some(metric) = metrics.get_mut(idx) {
            metric.status = status;
        }
    }
}
