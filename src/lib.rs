//! Lamina is a deterministic layer composition engine for on-chain
//! generative artworks.
//!
//! A master artwork is described by a typed metadata document: an ordered
//! list of image layers, each with parametric transform properties whose
//! inputs are "control token" values: numeric levers recorded on-chain,
//! defaulted in metadata for unminted levers, and overridable locally for
//! interactive preview.
//!
//! # Pipeline overview
//!
//! 1. **Fetch metadata**: a [`MetadataSource`] supplies a validated
//!    [`MasterMetadata`] document (layer list, control defaults).
//! 2. **Resolve controls**: [`ControlValues`] maps every control reference
//!    to one effective number (override > recorded default > 0).
//! 3. **Resolve transforms**: [`resolve_transform`] turns a layer's
//!    descriptor into concrete pixel offsets, scale and opacity.
//! 4. **Fetch layers**: a [`LayerSource`] retrieves image bytes through
//!    ordered IPFS gateway fallback, cached by URI for the session.
//! 5. **Compose**: the [`Composer`] launches all fetches concurrently,
//!    applies results strictly in declared order (anchors before
//!    dependents), and yields the ordered [`RenderedLayer`] stack,
//!    optionally [`flatten`]ed to one premultiplied RGBA8 frame.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: visual output is a pure function of the
//!   document, control values and scale ratio; which gateway served a layer
//!   never affects geometry.
//! - **Failure-tolerant**: a lost layer degrades the pass (fewer layers),
//!   never aborts it; only missing or invalid metadata is fatal.
//! - **Generation-guarded**: a superseded render pass abandons silently and
//!   never mutates newer output.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compose;
mod control;
mod fetch;
mod foundation;
mod metadata;
mod transform;

/// Explicit engine configuration (network mode, gateways, timeouts).
pub mod config;

pub use compose::flatten::{FrameRgba, flatten, over};
pub use compose::orchestrator::{
    ComposedArtwork, Composer, PassGuard, PassPhase, Progress, RenderedLayer,
};
pub use config::{EngineConfig, NetworkMode};
pub use control::values::ControlValues;
pub use fetch::gateway::{GatewayCandidate, GatewayClient, resolve_candidates};
pub use fetch::loader::{HttpLayerSource, ImageCache, ImageHandle, LayerSource, decode_image};
pub use foundation::core::{Canvas, Point, Rect, Vec2, Viewport};
pub use foundation::error::{LaminaError, LaminaResult};
pub use metadata::model::{
    AsyncAttributes, ControlRef, FixedPosition, LayerDescriptor, LayerStates, Layout,
    MasterMetadata, RelativePosition, TransformSpec, Value,
};
pub use metadata::source::{InMemoryMetadataSource, IpfsMetadataSource, MetadataSource};
pub use transform::resolver::{ConcreteTransform, PositionBasis, resolve_transform};
