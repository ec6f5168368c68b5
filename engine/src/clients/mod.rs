//! Remote collaborators of the reconciler.
//!
//! The reconciler only depends on the traits declared here. The HTTP
//! implementations talk to Consul, Nomad and the Circonus API v2.

mod circonus;
mod consul;
mod nomad;

use alloc::collections::BTreeMap;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error as ThisError;
use tracing::debug;
use url::Url;

use reaper_common::{
    Allocation, CheckBundle, CheckBundleMetrics, MetricSearchHit, OrchestratorNode,
};

pub use circonus::CirconusClient;
pub use consul::ConsulClient;
pub use nomad::NomadClient;

/// Circonus search filter: query parameter name => values.
pub type SearchFilter = BTreeMap<String, Vec<String>>;

/// Errors returned by collaborator clients.
#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("invalid address {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unable to build HTTP client")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("unable to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} not implemented")]
    NotImplemented(&'static str),
}

/// Service catalog listing the hosts that are supposed to exist.
#[expect(
    async_fn_in_trait,
    reason = "Reconciliation is driven sequentially on a single-threaded runtime"
)]
pub trait Catalog {
    /// Names of all nodes registered in the catalog.
    async fn list_hosts(&self, allow_stale: bool) -> Result<Vec<String>, ClientError>;
}

/// Orchestrator scheduling allocations onto nodes.
#[expect(
    async_fn_in_trait,
    reason = "Reconciliation is driven sequentially on a single-threaded runtime"
)]
pub trait Orchestrator {
    async fn list_nodes(&self, allow_stale: bool) -> Result<Vec<OrchestratorNode>, ClientError>;

    /// Allocations currently listed for `node_id`, whatever their lifecycle phase.
    async fn list_allocations(
        &self,
        node_id: &str,
        allow_stale: bool,
    ) -> Result<Vec<Allocation>, ClientError>;
}

/// Monitoring backend owning check bundles and their metrics.
#[expect(
    async_fn_in_trait,
    reason = "Reconciliation is driven sequentially on a single-threaded runtime"
)]
pub trait MonitoringBackend {
    async fn search_check_bundles(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<CheckBundle>, ClientError>;

    async fn search_metrics(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<MetricSearchHit>, ClientError>;

    async fn fetch_check_bundle(&self, cid: &str) -> Result<CheckBundle, ClientError>;

    async fn fetch_check_bundle_metrics(
        &self,
        cid: &str,
    ) -> Result<CheckBundleMetrics, ClientError>;

    async fn update_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle, ClientError>;

    async fn update_check_bundle_metrics(
        &self,
        metrics: &CheckBundleMetrics,
    ) -> Result<CheckBundleMetrics, ClientError>;

    /// Structurally removes a check bundle.
    async fn delete_check_bundle(&self, bundle: &CheckBundle) -> Result<(), ClientError>;

    /// Raw `GET` of `path_and_query` relative to the API root.
    async fn get(&self, path_and_query: &str) -> Result<Vec<u8>, ClientError>;
}

/// Parses `addr` as a base URL, defaulting to `http://` when no scheme is given.
///
/// The returned string has no trailing slash so paths can be appended directly.
pub(crate) fn base_url(addr: &str) -> Result<String, ClientError> {
    let with_scheme = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    };
    Url::parse(&with_scheme).map_err(|source| ClientError::InvalidUrl {
        url: addr.to_string(),
        source,
    })?;
    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// Sends `request` and returns the body of a successful response.
pub(crate) async fn send(request: RequestBuilder, url: &str) -> Result<Vec<u8>, ClientError> {
    debug!(%url, "Sending request");
    let transport = |source| ClientError::Transport {
        url: url.to_string(),
        source,
    };
    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;
    if !status.is_success() {
        return Err(ClientError::Status {
            url: url.to_string(),
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body.to_vec())
}

/// Decodes a JSON response body.
pub(crate) fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Appends the `stale` query flag understood by Consul and Nomad.
pub(crate) fn with_stale(url: String, allow_stale: bool) -> String {
    if allow_stale { url + "?stale" } else { url }
}
