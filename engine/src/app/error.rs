//! Failure taxonomy of a reconciliation run.

use thiserror::Error as ThisError;
use tracing::error;

use reaper_common::{IntegrityViolation, RunStats};

use crate::clients::ClientError;

/// Errors raised while reconciling.
///
/// Only [`ReconcileError::is_fatal`] errors abort a catalog run; everything else is isolated
/// to the host or bundle it concerns. Query mode propagates every error.
#[derive(Debug, ThisError)]
pub enum ReconcileError {
    #[error("unable to query {what}")]
    Snapshot {
        what: &'static str,
        #[source]
        source: ClientError,
    },
    #[error("unable to query Nomad allocations of {host:?}")]
    Allocations {
        host: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to find check bundles for target {target:?}")]
    BundleSearch {
        target: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to extract check bundle ID of {host:?} from {cid:?}")]
    MalformedCid { host: String, cid: String },
    #[error("unable to build allocation metric matcher for {host:?}")]
    HostPattern {
        host: String,
        #[source]
        source: regex::Error,
    },
    #[error("unable to fetch check bundle metrics {cid:?}")]
    FetchMetrics {
        cid: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to update check bundle metrics {cid:?}")]
    UpdateMetrics {
        cid: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to delete check bundle {cid:?}")]
    DeleteBundle {
        cid: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to search for metrics matching {query:?}")]
    MetricSearch {
        query: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to fetch check bundle {cid:?}")]
    FetchBundle {
        cid: String,
        #[source]
        source: ClientError,
    },
    #[error("unable to update check bundle {cid:?}")]
    UpdateBundle {
        cid: String,
        #[source]
        source: ClientError,
    },
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),
}

impl ReconcileError {
    /// Whether this error must abort the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(*self, Self::Snapshot { .. } | Self::Integrity(_))
    }
}

/// Logs and counts a non-fatal failure, propagating fatal ones.
pub(crate) fn isolate(
    result: Result<(), ReconcileError>,
    stats: &mut RunStats,
) -> Result<(), ReconcileError> {
    match result {
        Err(e) if !e.is_fatal() => {
            error!("{:#}", eyre::Report::new(e));
            stats.soft_failures += 1;
            Ok(())
        }
        other => other,
    }
}
