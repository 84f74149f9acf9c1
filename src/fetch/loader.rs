use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Context;

use crate::{
    fetch::gateway::GatewayClient,
    foundation::error::{LaminaError, LaminaResult},
};

#[derive(Clone, Debug)]
/// Decoded layer image: premultiplied RGBA8 plus natural dimensions.
///
/// Handles are cheap to clone (pixel bytes are shared) and are what the
/// session image cache stores, so re-previewing with changed control values
/// reuses decoded pixels without touching the network.
pub struct ImageHandle {
    /// Content URI the pixels were fetched from.
    pub uri: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl ImageHandle {
    /// Whether this handle can stand in for a fetch of `uri`.
    pub fn is_valid_for(&self, uri: &str) -> bool {
        self.uri == uri
    }
}

/// Decode encoded image bytes into a premultiplied RGBA8 handle.
pub fn decode_image(uri: &str, bytes: &[u8]) -> LaminaResult<ImageHandle> {
    let dyn_img = image::load_from_memory(bytes)
        .with_context(|| format!("decode image from '{uri}'"))
        .map_err(LaminaError::from)?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(ImageHandle {
        uri: uri.to_string(),
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Supplier of layer images, the orchestrator's only I/O seam.
///
/// Implementations must return `cached` untouched (zero network calls) when
/// it is valid for `uri`. The callback receives the gateway domain currently
/// being attempted.
pub trait LayerSource: Send + Sync {
    /// Load the image behind `uri`, reusing `cached` when possible.
    fn load_image(
        &self,
        uri: &str,
        cached: Option<ImageHandle>,
        on_gateway: &(dyn Fn(&str) + Send + Sync),
    ) -> impl Future<Output = LaminaResult<ImageHandle>> + Send;
}

/// Production [`LayerSource`] backed by gateway-fallback HTTP fetching.
#[derive(Clone, Debug)]
pub struct HttpLayerSource {
    client: GatewayClient,
}

impl HttpLayerSource {
    /// Build a source over an existing gateway client.
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

impl LayerSource for HttpLayerSource {
    async fn load_image(
        &self,
        uri: &str,
        cached: Option<ImageHandle>,
        on_gateway: &(dyn Fn(&str) + Send + Sync),
    ) -> LaminaResult<ImageHandle> {
        if let Some(handle) = cached
            && handle.is_valid_for(uri)
        {
            return Ok(handle);
        }

        let bytes = self.client.fetch_bytes(uri, on_gateway).await?;
        decode_image(uri, &bytes)
    }
}

/// Session-scoped image cache keyed by content URI.
///
/// Append-only: legacy content is immutable once fetched, so entries are
/// never invalidated mid-session. Shared across render passes.
#[derive(Clone, Debug, Default)]
pub struct ImageCache {
    inner: Arc<Mutex<HashMap<String, ImageHandle>>>,
}

impl ImageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached handle for `uri`.
    pub fn get(&self, uri: &str) -> Option<ImageHandle> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(uri)
            .cloned()
    }

    /// Record a freshly decoded handle under its URI.
    pub fn insert(&self, handle: ImageHandle) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle.uri.clone(), handle);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/loader.rs"]
mod tests;
