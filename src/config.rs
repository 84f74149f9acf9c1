use std::time::Duration;

/// Network the engine reads content for.
///
/// Threaded explicitly into [`crate::IpfsMetadataSource`] and
/// [`crate::HttpLayerSource`] at construction; there is no process-global
/// network-mode flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkMode {
    /// Production chain content.
    #[default]
    Mainnet,
    /// Test chain content.
    Testnet,
}

/// Engine configuration for everything that touches the network.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Which chain's content is being reconstructed.
    #[serde(default)]
    pub network: NetworkMode,

    /// Ordered IPFS gateway base URLs, tried first to last. A custom
    /// user-supplied gateway should be prepended.
    #[serde(default = "default_gateways")]
    pub gateways: Vec<String>,

    /// Timeout per gateway attempt, in seconds. A whole pass is never
    /// timed out; large pieces legitimately take minutes.
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: NetworkMode::default(),
            gateways: default_gateways(),
            gateway_timeout_secs: default_gateway_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Per-attempt gateway timeout as a [`Duration`].
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Prepend a preferred gateway, keeping the defaults as fallbacks.
    pub fn with_preferred_gateway(mut self, base_url: impl Into<String>) -> Self {
        self.gateways.insert(0, base_url.into());
        self
    }
}

fn default_gateways() -> Vec<String> {
    vec![
        "https://ipfs.io".to_string(),
        "https://cloudflare-ipfs.com".to_string(),
        "https://gateway.pinata.cloud".to_string(),
    ]
}

fn default_gateway_timeout_secs() -> u64 {
    30
}
