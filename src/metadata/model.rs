use std::collections::{BTreeMap, HashSet};

use crate::{
    control::values::ControlValues,
    foundation::error::{LaminaError, LaminaResult},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A complete master artwork document.
///
/// The document is a pure data model fetched once per `(token address,
/// token id)` pair and replaced wholesale on token change. Rendering it is
/// performed by [`crate::Composer`].
pub struct MasterMetadata {
    /// Artwork title.
    #[serde(default)]
    pub name: String,

    /// Artwork description.
    #[serde(default)]
    pub description: String,

    /// URI of the flattened reference render; its natural size defines the
    /// composition canvas.
    pub image: String,

    /// Layer layout: schema version plus the ordered layer list.
    pub layout: Layout,

    /// Opaque marketplace attributes; carried through untouched.
    #[serde(default)]
    pub attributes: Vec<serde_json::Value>,

    /// Platform extension block: artists and unminted control defaults.
    #[serde(rename = "async-attributes", default)]
    pub async_attributes: Option<AsyncAttributes>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Platform extension attributes attached to a master document.
pub struct AsyncAttributes {
    /// Credited artists.
    #[serde(default)]
    pub artists: Vec<String>,

    /// Default control values recorded for levers not yet exercised
    /// on-chain, keyed by absolute control key (`"{token_id}-{lever_id}"`).
    #[serde(rename = "unminted-token-values", default)]
    pub unminted_token_values: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Layer layout block of a master document.
pub struct Layout {
    /// Layout schema version. Version 1 is the legacy center-anchored
    /// placement formula; unknown versions resolve with version-1 semantics.
    #[serde(default = "default_layout_version")]
    pub version: u32,

    /// Ordered layer list. Array order is z-order and anchor dependency
    /// order, validated by [`MasterMetadata::validate`].
    pub layers: Vec<LayerDescriptor>,
}

fn default_layout_version() -> u32 {
    1
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One layer of a master composition.
pub struct LayerDescriptor {
    /// Layer identifier, unique within the master.
    pub id: String,

    /// Id of an earlier layer whose resolved box a relative position
    /// offsets from. Absent means canvas-origin placement; a fixed
    /// position is canvas-origin even when an anchor is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    /// Fixed image source for single-state layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Control-selected image source for multi-state layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<LayerStates>,

    /// Parametric transform properties.
    #[serde(default)]
    pub transform: TransformSpec,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Candidate state URIs selected by a control value.
///
/// The selector resolves to an index into `options`; out-of-range values are
/// clamped so degraded legacy metadata still renders something.
pub struct LayerStates {
    /// Candidate image URIs, one per state.
    pub options: Vec<String>,

    /// Control reference whose resolved value selects the active option.
    #[serde(flatten)]
    pub selector: ControlRef,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Reference to a control lever on a layer token.
pub struct ControlRef {
    /// Control token id, relative to the master token id.
    #[serde(rename = "token-id")]
    pub token_id: u64,

    /// Lever index within the control token.
    #[serde(rename = "lever-id")]
    pub lever_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// A number that is either a literal or a control reference.
///
/// Every collection-defined transform field follows this duality, so a piece
/// can mix fixed and owner-controlled parameters freely, even across the two
/// axes of one position.
pub enum Value {
    /// Literal number, returned unchanged by resolution.
    Number(f64),
    /// Dynamic value resolved through the control value table.
    Ref(ControlRef),
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Raw transform descriptor of a layer.
///
/// All fields are optional; anything absent (or any transform kind this
/// vocabulary does not know) degrades to a neutral transform rather than
/// failing the render.
pub struct TransformSpec {
    /// Position relative to canvas origin, both axes literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_position: Option<FixedPosition>,

    /// Position relative to the anchor box, each axis independently literal
    /// or control-driven.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_position: Option<RelativePosition>,

    /// Uniform scale factor applied to the layer's natural size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Value>,

    /// Layer opacity in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Literal position against canvas origin.
pub struct FixedPosition {
    /// Horizontal center coordinate in natural pixels.
    pub x: f64,
    /// Vertical center coordinate in natural pixels.
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Position against the anchor box with literal-or-reference axes.
pub struct RelativePosition {
    /// Horizontal center coordinate.
    pub x: Value,
    /// Vertical center coordinate.
    pub y: Value,
}

impl LayerDescriptor {
    /// Resolve the image URI of this layer's currently active state.
    ///
    /// Single-state layers return their fixed URI. Multi-state layers select
    /// an option by resolved control value, clamped into range. Returns
    /// `None` when the layer declares no source at all (degraded metadata).
    pub fn active_state_uri(&self, values: &ControlValues) -> Option<&str> {
        if let Some(uri) = &self.uri {
            return Some(uri);
        }
        let states = self.states.as_ref()?;
        if states.options.is_empty() {
            return None;
        }
        let raw = values.resolve_ref(&states.selector);
        let max = states.options.len() - 1;
        let idx = if raw.is_finite() {
            (raw.max(0.0) as usize).min(max)
        } else {
            0
        };
        Some(&states.options[idx])
    }
}

impl MasterMetadata {
    /// Validate document invariants required for rendering.
    ///
    /// Layer ids must be unique and every anchor must name a layer that
    /// appears *earlier* in the list. Forward and self references are
    /// rejected here rather than trusted, so a cyclic layout can never reach
    /// the orchestrator.
    pub fn validate(&self) -> LaminaResult<()> {
        if self.image.trim().is_empty() {
            return Err(LaminaError::metadata_invalid("image URI must be non-empty"));
        }

        let mut seen = HashSet::new();
        for layer in &self.layout.layers {
            if layer.id.trim().is_empty() {
                return Err(LaminaError::metadata_invalid("layer id must be non-empty"));
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(LaminaError::metadata_invalid(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            if let Some(anchor) = &layer.anchor {
                if anchor == &layer.id {
                    return Err(LaminaError::metadata_invalid(format!(
                        "layer '{}' anchors to itself",
                        layer.id
                    )));
                }
                if !seen.contains(anchor.as_str()) {
                    return Err(LaminaError::metadata_invalid(format!(
                        "layer '{}' anchors to '{}' which does not appear earlier in the layer list",
                        layer.id, anchor
                    )));
                }
            }
            if let Some(states) = &layer.states
                && states.options.is_empty()
            {
                return Err(LaminaError::metadata_invalid(format!(
                    "layer '{}' declares an empty state option list",
                    layer.id
                )));
            }
        }

        Ok(())
    }

    /// Unminted control defaults, or an empty map when the extension block
    /// is absent.
    pub fn unminted_token_values(&self) -> BTreeMap<String, f64> {
        self.async_attributes
            .as_ref()
            .map(|a| a.unminted_token_values.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/metadata/model.rs"]
mod tests;
