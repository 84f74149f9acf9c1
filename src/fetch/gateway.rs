use reqwest::Url;
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    foundation::error::{LaminaError, LaminaResult},
};

/// One concrete URL to try when resolving a content URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayCandidate {
    /// Host name reported through the progress callback.
    pub domain: String,
    /// Full request URL.
    pub url: String,
}

/// Expand a content URI into the ordered list of URLs to attempt.
///
/// `ipfs://` URIs and bare CIDs map to `{gateway}/ipfs/{path}` per configured
/// gateway; plain `http(s)` URLs are attempted as-is against their own host.
pub fn resolve_candidates(uri: &str, gateways: &[String]) -> Vec<GatewayCandidate> {
    let uri = uri.trim();

    if uri.starts_with("http://") || uri.starts_with("https://") {
        let domain = host_of(uri).unwrap_or_else(|| uri.to_string());
        return vec![GatewayCandidate {
            domain,
            url: uri.to_string(),
        }];
    }

    let path = uri.strip_prefix("ipfs://").unwrap_or(uri);
    let path = path.strip_prefix("ipfs/").unwrap_or(path);
    gateways
        .iter()
        .map(|gw| {
            let base = gw.trim_end_matches('/');
            GatewayCandidate {
                domain: host_of(base).unwrap_or_else(|| base.to_string()),
                url: format!("{base}/ipfs/{path}"),
            }
        })
        .collect()
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// HTTP client that resolves content URIs through ordered gateway fallback.
///
/// Each candidate gets its own timeout; the next gateway is tried on any
/// failure. The progress callback receives the domain currently being
/// attempted so a UI can show where a slow layer is coming from.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    client: reqwest::Client,
    config: EngineConfig,
}

impl GatewayClient {
    /// Build a client from explicit engine configuration.
    pub fn new(config: EngineConfig) -> LaminaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.gateway_timeout())
            .build()
            .map_err(|e| LaminaError::validation(format!("build http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Fetch raw bytes for a content URI, trying each gateway in turn.
    ///
    /// Fails only once every candidate has failed; the error carries the URI
    /// so per-layer failures stay attributable.
    pub async fn fetch_bytes(
        &self,
        uri: &str,
        on_gateway: &(dyn Fn(&str) + Send + Sync),
    ) -> LaminaResult<Vec<u8>> {
        let candidates = resolve_candidates(uri, &self.config.gateways);
        if candidates.is_empty() {
            return Err(LaminaError::layer_fetch(format!(
                "no gateway candidates for '{uri}'"
            )));
        }

        let mut last_error = String::new();
        for candidate in &candidates {
            on_gateway(&candidate.domain);
            debug!(uri, domain = %candidate.domain, "attempting gateway");

            match tokio::time::timeout(
                self.config.gateway_timeout(),
                self.request_bytes(&candidate.url),
            )
            .await
            {
                Ok(Ok(bytes)) => return Ok(bytes),
                Ok(Err(e)) => {
                    warn!(uri, domain = %candidate.domain, error = %e, "gateway attempt failed");
                    last_error = e;
                }
                Err(_) => {
                    warn!(uri, domain = %candidate.domain, "gateway attempt timed out");
                    last_error = format!("timed out after {:?}", self.config.gateway_timeout());
                }
            }
        }

        Err(LaminaError::layer_fetch(format!(
            "'{uri}' unreachable after {} gateway attempts (last: {last_error})",
            candidates.len()
        )))
    }

    /// Fetch and deserialize a JSON document for a content URI.
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
        on_gateway: &(dyn Fn(&str) + Send + Sync),
    ) -> LaminaResult<T> {
        let bytes = self.fetch_bytes(uri, on_gateway).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| LaminaError::metadata_invalid(format!("parse '{uri}': {e}")))
    }

    async fn request_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/gateway.rs"]
mod tests;
