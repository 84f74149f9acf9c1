use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use kurbo::Rect;
use tokio::{sync::mpsc::UnboundedSender, sync::watch, task::JoinHandle};
use tracing::warn;

use crate::{
    control::values::ControlValues,
    fetch::loader::{ImageCache, ImageHandle, LayerSource},
    foundation::core::{Canvas, Viewport},
    foundation::error::{LaminaError, LaminaResult},
    metadata::model::LayerDescriptor,
    metadata::source::MetadataSource,
    transform::resolver::{PositionBasis, resolve_transform},
};

#[derive(Clone, Debug)]
/// One fully built layer of a render pass.
///
/// The orchestrator owns the set for exactly one pass; interactive features
/// (layer-source inspector, drag-to-reposition) query resolved geometry here
/// instead of attaching state to display objects.
pub struct RenderedLayer {
    /// Layer id from the descriptor.
    pub id: String,
    /// Content URI the image was resolved from.
    pub source_uri: String,
    /// Decoded image handle (shared with the session cache).
    pub image: ImageHandle,
    /// Natural width in pixels, before any scaling.
    pub natural_width: u32,
    /// Natural height in pixels, before any scaling.
    pub natural_height: u32,
    /// Resolved pixel box in screen space (after scale-to-fit).
    pub frame: Rect,
    /// Resolved opacity in `[0, 1]`.
    pub opacity: f64,
}

#[derive(Clone, Debug)]
/// Incremental progress emitted while layers build.
///
/// A side channel for UI display only; correctness never depends on it.
pub struct Progress {
    /// Zero-based index of the layer currently loading.
    pub layer_index: usize,
    /// Total number of declared layers in the pass.
    pub total: usize,
    /// Gateway domain currently being attempted.
    pub domain: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Render pass lifecycle.
pub enum PassPhase {
    /// No pass running.
    Idle,
    /// Master document being fetched and validated.
    FetchingMetadata,
    /// Layer stack being fetched and assembled.
    BuildingLayers,
    /// Pass finished; output is current.
    Done,
    /// Pass aborted on a fatal error.
    Error,
}

#[derive(Clone, Debug)]
/// Output of a complete render pass.
pub struct ComposedArtwork {
    /// Master canvas in natural pixels.
    pub canvas: Canvas,
    /// Screen scale ratio the layer frames were resolved with.
    pub scale: f64,
    /// Ordered layer stack (declared order, minus failed layers).
    pub layers: Vec<RenderedLayer>,
}

/// Liveness guard for one render pass generation.
///
/// Checked after every suspension point: once a newer pass begins, the older
/// one abandons its work without mutating shared output, so a slow stale
/// fetch can never corrupt the current pass.
#[derive(Clone, Debug)]
pub struct PassGuard {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl PassGuard {
    /// Whether this guard's pass is still the newest.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Error with [`LaminaError::StaleGeneration`] when superseded.
    pub fn check(&self) -> LaminaResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(LaminaError::StaleGeneration)
        }
    }
}

/// Composition orchestrator: turns layer descriptors into an ordered,
/// anchored stack of [`RenderedLayer`]s.
///
/// All layer fetches of a pass launch concurrently; results are applied
/// strictly in declared order so every anchor is built before its
/// dependents. The image cache persists across passes within a session.
pub struct Composer<S: LayerSource + 'static> {
    source: Arc<S>,
    cache: ImageCache,
    generation: Arc<AtomicU64>,
    phase: watch::Sender<PassPhase>,
}

impl<S: LayerSource + 'static> Composer<S> {
    /// Build a composer over a layer source with a fresh session cache.
    pub fn new(source: S) -> Self {
        let (phase, _) = watch::channel(PassPhase::Idle);
        Self {
            source: Arc::new(source),
            cache: ImageCache::new(),
            generation: Arc::new(AtomicU64::new(0)),
            phase,
        }
    }

    /// Session image cache shared across passes.
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Watch the current pass phase.
    pub fn phase(&self) -> watch::Receiver<PassPhase> {
        self.phase.subscribe()
    }

    /// Start a new pass generation, superseding any in-flight pass.
    pub fn begin_pass(&self) -> PassGuard {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        PassGuard {
            current: Arc::clone(&self.generation),
            generation,
        }
    }

    fn set_phase(&self, guard: &PassGuard, phase: PassPhase) {
        // Only the newest generation may advance the observable phase.
        if guard.is_current() {
            self.phase.send_replace(phase);
        }
    }

    /// Run one complete render pass: fetch metadata, size the canvas from
    /// the master image, resolve control values, and build the layer stack.
    ///
    /// `minted` carries on-chain control values read by the caller (chain
    /// access is outside this crate); `overrides` carries ephemeral preview
    /// values. Both are keyed by absolute control key.
    #[tracing::instrument(skip(self, metadata_source, minted, overrides, progress))]
    pub async fn render<M: MetadataSource>(
        &self,
        metadata_source: &M,
        token_uri: &str,
        master_token_id: u64,
        minted: BTreeMap<String, f64>,
        overrides: BTreeMap<String, f64>,
        viewport: Viewport,
        progress: Option<UnboundedSender<Progress>>,
    ) -> LaminaResult<ComposedArtwork> {
        let guard = self.begin_pass();
        self.set_phase(&guard, PassPhase::FetchingMetadata);

        let metadata = match metadata_source.fetch_master(token_uri).await {
            Ok(m) => m,
            Err(e) => {
                self.set_phase(&guard, PassPhase::Error);
                return Err(e);
            }
        };
        guard.check()?;

        // The flattened reference render defines the canvas size.
        let master_image = self
            .source
            .load_image(&metadata.image, self.cache.get(&metadata.image), &|_| {})
            .await
            .map_err(|e| {
                self.set_phase(&guard, PassPhase::Error);
                LaminaError::metadata_unavailable(format!("master image: {e}"))
            })?;
        guard.check()?;
        self.cache.insert(master_image.clone());

        let canvas = Canvas {
            width: master_image.width,
            height: master_image.height,
        };
        let scale = canvas.scale_to_fit(viewport);

        let values = ControlValues::new(master_token_id, metadata.unminted_token_values(), minted)
            .with_overrides(overrides);

        self.set_phase(&guard, PassPhase::BuildingLayers);
        let layers = self
            .compose_layers(
                &guard,
                &metadata.layout.layers,
                &values,
                metadata.layout.version,
                scale,
                progress,
            )
            .await?;

        self.set_phase(&guard, PassPhase::Done);
        guard.check()?;
        Ok(ComposedArtwork {
            canvas,
            scale,
            layers,
        })
    }

    /// Build the ordered layer stack for one pass.
    ///
    /// Every layer's fetch is issued up front; layers are then processed in
    /// declared order, each awaiting only its own fetch. A failed layer is
    /// logged and skipped; a dependent whose anchor was skipped falls back
    /// to canvas-origin placement. Output order equals input order minus
    /// failures, and is deterministic for fixed inputs (which gateway served
    /// a layer never affects geometry).
    #[tracing::instrument(skip_all, fields(layers = descriptors.len()))]
    pub async fn compose_layers(
        &self,
        guard: &PassGuard,
        descriptors: &[LayerDescriptor],
        values: &ControlValues,
        layout_version: u32,
        screen_scale_ratio: f64,
        progress: Option<UnboundedSender<Progress>>,
    ) -> LaminaResult<Vec<RenderedLayer>> {
        let total = descriptors.len();
        let mut pending = Vec::with_capacity(total);

        // Launch every fetch before applying any result.
        for (index, descriptor) in descriptors.iter().enumerate() {
            let Some(uri) = descriptor.active_state_uri(values) else {
                warn!(layer = %descriptor.id, "layer declares no image source; skipping");
                pending.push(None);
                continue;
            };
            pending.push(Some((
                uri.to_string(),
                self.spawn_fetch(uri.to_string(), index, total, progress.clone()),
            )));
        }

        let mut out = Vec::with_capacity(total);
        let mut built_frames: HashMap<String, Rect> = HashMap::new();

        for (descriptor, slot) in descriptors.iter().zip(pending) {
            let Some((uri, task)) = slot else {
                continue;
            };

            let fetched = match task.await {
                Ok(result) => result,
                Err(join_error) => Err(LaminaError::layer_fetch(format!(
                    "fetch task for '{uri}' aborted: {join_error}"
                ))),
            };
            guard.check()?;

            let image = match fetched {
                Ok(image) => image,
                Err(e) => {
                    warn!(layer = %descriptor.id, uri = %uri, error = %e, "layer skipped");
                    continue;
                }
            };
            self.cache.insert(image.clone());

            let transform = resolve_transform(
                &descriptor.transform,
                layout_version,
                image.width,
                image.height,
                values,
            );

            // Fixed positions stay canvas-origin even on anchored layers;
            // only a relative position offsets from the anchor box.
            let (anchor_x, anchor_y) = match (&transform.basis, &descriptor.anchor) {
                (PositionBasis::Anchor, Some(anchor_id)) => {
                    match built_frames.get(anchor_id) {
                        Some(rect) => (rect.x0, rect.y0),
                        None => {
                            // The anchor's own fetch failed; degrade to
                            // canvas-origin placement instead of failing
                            // too.
                            warn!(
                                layer = %descriptor.id,
                                anchor = %anchor_id,
                                "anchor missing from output; treating layer as unanchored"
                            );
                            (0.0, 0.0)
                        }
                    }
                }
                _ => (0.0, 0.0),
            };

            let left = anchor_x + transform.left_offset * screen_scale_ratio;
            let top = anchor_y + transform.top_offset * screen_scale_ratio;
            let width = f64::from(image.width) * transform.scale * screen_scale_ratio;
            let height = f64::from(image.height) * transform.scale * screen_scale_ratio;
            let frame = Rect::new(left, top, left + width, top + height);

            built_frames.insert(descriptor.id.clone(), frame);
            out.push(RenderedLayer {
                id: descriptor.id.clone(),
                source_uri: uri,
                natural_width: image.width,
                natural_height: image.height,
                image,
                frame,
                opacity: transform.opacity,
            });
        }

        Ok(out)
    }

    fn spawn_fetch(
        &self,
        uri: String,
        index: usize,
        total: usize,
        progress: Option<UnboundedSender<Progress>>,
    ) -> JoinHandle<LaminaResult<ImageHandle>> {
        let source = Arc::clone(&self.source);
        let cached = self.cache.get(&uri);
        tokio::spawn(async move {
            let on_gateway = move |domain: &str| {
                if let Some(sender) = &progress {
                    let _ = sender.send(Progress {
                        layer_index: index,
                        total,
                        domain: domain.to_string(),
                    });
                }
            };
            source.load_image(&uri, cached, &on_gateway).await
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/orchestrator.rs"]
mod tests;
