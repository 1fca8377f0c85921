use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::error::{ReconError, ReconResult};

/// Timeout applied to the crt.sh and urlscan.io queries.
pub const API_TIMEOUT_SECS: u64 = 320;

/// Client for the passive-recon APIs: fixed user agent, JSON accept header.
pub fn create_api_client(user_agent: &str, timeout_secs: u64) -> ReconResult<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    ClientBuilder::new()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| ReconError::Config(format!("http client: {e}")))
}

/// GET `url` and decode the body as JSON. Non-2xx statuses and transport
/// errors are `Network`, undecodable bodies are `Parse`.
pub async fn get_json(client: &Client, source_name: &str, url: &str) -> ReconResult<serde_json::Value> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| ReconError::network(source_name, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ReconError::network(source_name, format!("HTTP {}", status)));
    }
    let text = resp.text().await.map_err(|e| ReconError::network(source_name, e))?;
    serde_json::from_str(&text).map_err(|e| ReconError::parse(source_name, e))
}
