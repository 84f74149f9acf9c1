/// Convenience result type used across lamina.
pub type LaminaResult<T> = Result<T, LaminaError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Fatal conditions (`MetadataUnavailable`, `MetadataInvalid`) abort a render
/// pass. `LayerFetch` is recoverable: the orchestrator logs it, omits the
/// layer, and continues. `StaleGeneration` is silent: it only signals that a
/// superseded pass must discard its work.
#[derive(thiserror::Error, Debug)]
pub enum LaminaError {
    /// Master metadata could not be obtained (missing token, exhausted
    /// gateways, transport failure).
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// Master metadata was obtained but is malformed or violates layout
    /// invariants (forward or cyclic anchor reference, bad document shape).
    #[error("metadata invalid: {0}")]
    MetadataInvalid(String),

    /// A layer image could not be retrieved after every gateway failed.
    #[error("layer fetch failed: {0}")]
    LayerFetch(String),

    /// The render pass was superseded by a newer generation; its results
    /// must be discarded without surfacing an error to the user.
    #[error("render pass superseded by a newer generation")]
    StaleGeneration,

    /// Invalid user-provided input outside the metadata document itself.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaminaError {
    /// Build a [`LaminaError::MetadataUnavailable`] value.
    pub fn metadata_unavailable(msg: impl Into<String>) -> Self {
        Self::MetadataUnavailable(msg.into())
    }

    /// Build a [`LaminaError::MetadataInvalid`] value.
    pub fn metadata_invalid(msg: impl Into<String>) -> Self {
        Self::MetadataInvalid(msg.into())
    }

    /// Build a [`LaminaError::LayerFetch`] value.
    pub fn layer_fetch(msg: impl Into<String>) -> Self {
        Self::LayerFetch(msg.into())
    }

    /// Build a [`LaminaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the orchestrator may continue the pass after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::LayerFetch(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
