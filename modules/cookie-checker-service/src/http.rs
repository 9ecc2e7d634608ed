//! HTTP client construction for check execution.

use reqwest::Client;
use std::time::Duration;

/// Build a client for one check: the config's timeout, and the proxy when a
/// URL is supplied. Responses are fully read per request, so the pool can
/// stay small.
pub fn build_check_client(timeout_secs: u64, proxy_url: &str) -> Result<Client, String> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(5)
        .timeout(Duration::from_secs(timeout_secs));

    if !proxy_url.is_empty() {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| format!("Invalid proxy URL {}: {}", proxy_url, e))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}
