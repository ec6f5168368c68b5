//! Consul catalog client.

use reaper_common::CatalogNode;

use super::{Catalog, ClientError, base_url, decode, send, with_stale};

/// Reads node membership from the Consul catalog HTTP API.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: reqwest::Client,
    base: String,
}

impl ConsulClient {
    /// Creates a client for the agent at `addr` (`host:port` or a full URL).
    ///
    /// # Errors
    ///
    /// Returns an error if `addr` is not a valid address or the HTTP client cannot be built.
    pub fn new(addr: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base: base_url(addr)?,
        })
    }
}

impl Catalog for ConsulClient {
    async fn list_hosts(&self, allow_stale: bool) -> Result<Vec<String>, ClientError> {
        let url = with_stale(format!("{}/v1/catalog/nodes", self.base), allow_stale);
        let body = send(self.http.get(&url), &url).await?;
        let nodes: Vec<CatalogNode> = decode(&url, &body)?;
        Ok(nodes.into_iter().map(|n| n.node).collect())
    }
}
