//! Nomad node and allocation client.

use reaper_common::{Allocation, OrchestratorNode};

use super::{ClientError, Orchestrator, base_url, decode, send, with_stale};

/// Reads client nodes and their allocations from the Nomad HTTP API.
#[derive(Debug, Clone)]
pub struct NomadClient {
    http: reqwest::Client,
    base: String,
}

impl NomadClient {
    /// Creates a client for the agent at `addr`.
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

impl Orchestrator for NomadClient {
    async fn list_nodes(&self, allow_stale: bool) -> Result<Vec<OrchestratorNode>, ClientError> {
        let url = with_stale(format!("{}/v1/nodes", self.base), allow_stale);
        let body = send(self.http.get(&url), &url).await?;
        decode(&url, &body)
    }

    async fn list_allocations(
        &self,
        node_id: &str,
        allow_stale: bool,
    ) -> Result<Vec<Allocation>, ClientError> {
        let url = with_stale(
            format!("{}/v1/node/{node_id}/allocations", self.base),
            allow_stale,
        );
        let body = send(self.http.get(&url), &url).await?;
        decode(&url, &body)
    }
}
