//! Circonus API v2 client.

use reqwest::{Method, RequestBuilder, header};
use secrecy::{ExposeSecret as _, SecretString};
use serde::de::DeserializeOwned;

use reaper_common::{
    CHECK_BUNDLE_PREFIX, CheckBundle, CheckBundleMetrics, METRIC_PREFIX, MetricSearchHit,
};

use super::{ClientError, MonitoringBackend, SearchFilter, base_url, decode, send};

const AUTH_TOKEN_HEADER: &str = "X-Circonus-Auth-Token";
const APP_NAME_HEADER: &str = "X-Circonus-App-Name";

/// Authenticated client for the Circonus API.
#[derive(Debug, Clone)]
pub struct CirconusClient {
    http: reqwest::Client,
    base: String,
    api_key: SecretString,
    app_name: String,
}

impl CirconusClient {
    /// Creates a client for the API rooted at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid address or the HTTP client cannot be built.
    pub fn new(url: &str, api_key: SecretString, app_name: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base: base_url(url)?,
            api_key,
            app_name: app_name.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, self.api_key.expose_secret())
            .header(APP_NAME_HEADER, &self.app_name)
            .header(header::ACCEPT, "application/json")
    }

    async fn search<T: DeserializeOwned>(
        &self,
        prefix: &str,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<T>, ClientError> {
        let url = self.url(prefix);
        let mut params: Vec<(&str, &str)> = Vec::new();
        if !query.is_empty() {
            params.push(("search", query));
        }
        for (name, values) in filter {
            params.extend(values.iter().map(|v| (name.as_str(), v.as_str())));
        }
        let body = send(self.request(Method::GET, &url).query(&params), &url).await?;
        decode(&url, &body)
    }

    async fn fetch<T: DeserializeOwned>(&self, cid: &str) -> Result<T, ClientError> {
        let url = self.url(cid);
        let body = send(self.request(Method::GET, &url), &url).await?;
        decode(&url, &body)
    }

    async fn update<T: serde::Serialize + DeserializeOwned>(
        &self,
        cid: &str,
        document: &T,
    ) -> Result<T, ClientError> {
        let url = self.url(cid);
        let body = send(self.request(Method::PUT, &url).json(document), &url).await?;
        decode(&url, &body)
    }
}

impl MonitoringBackend for CirconusClient {
    async fn search_check_bundles(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<CheckBundle>, ClientError> {
        self.search(CHECK_BUNDLE_PREFIX, query, filter).await
    }

    async fn search_metrics(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<MetricSearchHit>, ClientError> {
        self.search(METRIC_PREFIX, query, filter).await
    }

    async fn fetch_check_bundle(&self, cid: &str) -> Result<CheckBundle, ClientError> {
        self.fetch(cid).await
    }

    async fn fetch_check_bundle_metrics(
        &self,
        cid: &str,
    ) -> Result<CheckBundleMetrics, ClientError> {
        self.fetch(cid).await
    }

    async fn update_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle, ClientError> {
        self.update(&bundle.cid, bundle).await
    }

    async fn update_check_bundle_metrics(
        &self,
        metrics: &CheckBundleMetrics,
    ) -> Result<CheckBundleMetrics, ClientError> {
        self.update(&metrics.cid, metrics).await
    }

    async fn delete_check_bundle(&self, _bundle: &CheckBundle) -> Result<(), ClientError> {
        Err(ClientError::NotImplemented("DeleteCheckBundle"))
    }

    async fn get(&self, path_and_query: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.url(path_and_query);
        send(self.request(Method::GET, &url), &url).await
    }
}
