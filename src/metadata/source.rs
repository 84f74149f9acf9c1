use std::collections::HashMap;

use crate::{
    fetch::gateway::GatewayClient,
    foundation::error::{LaminaError, LaminaResult},
    metadata::model::MasterMetadata,
};

/// Typed supplier of master documents.
///
/// The chain-side `tokenURI` lookup happens outside this crate; callers hand
/// the engine a metadata URI and a source that can turn it into a validated
/// document. Failure here is fatal to the render pass.
pub trait MetadataSource: Send + Sync {
    /// Fetch and validate the master document behind `token_uri`.
    fn fetch_master(
        &self,
        token_uri: &str,
    ) -> impl Future<Output = LaminaResult<MasterMetadata>> + Send;
}

/// [`MetadataSource`] that resolves metadata JSON through IPFS gateway
/// fallback, sharing the layer fetcher's gateway machinery.
#[derive(Clone, Debug)]
pub struct IpfsMetadataSource {
    client: GatewayClient,
}

impl IpfsMetadataSource {
    /// Build a source over an existing gateway client.
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

impl MetadataSource for IpfsMetadataSource {
    async fn fetch_master(&self, token_uri: &str) -> LaminaResult<MasterMetadata> {
        let metadata: MasterMetadata = self
            .client
            .fetch_json(token_uri, &|_domain| {})
            .await
            .map_err(|e| match e {
                LaminaError::MetadataInvalid(_) => e,
                other => LaminaError::metadata_unavailable(other.to_string()),
            })?;
        metadata.validate()?;
        Ok(metadata)
    }
}

/// In-memory [`MetadataSource`] for tests and offline previews.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMetadataSource {
    documents: HashMap<String, MasterMetadata>,
}

impl InMemoryMetadataSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its token URI.
    pub fn insert(&mut self, token_uri: impl Into<String>, metadata: MasterMetadata) {
        self.documents.insert(token_uri.into(), metadata);
    }
}

impl MetadataSource for InMemoryMetadataSource {
    async fn fetch_master(&self, token_uri: &str) -> LaminaResult<MasterMetadata> {
        let metadata = self.documents.get(token_uri).cloned().ok_or_else(|| {
            LaminaError::metadata_unavailable(format!("no document for '{token_uri}'"))
        })?;
        metadata.validate()?;
        Ok(metadata)
    }
}
