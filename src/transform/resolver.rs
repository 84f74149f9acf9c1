use crate::{
    control::values::ControlValues,
    metadata::model::{TransformSpec, Value},
};

/// Origin a resolved position offsets from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionBasis {
    /// Offsets are relative to the canvas origin.
    Canvas,
    /// Offsets are relative to the anchor layer's resolved box origin.
    Anchor,
}

/// Concrete per-layer transform in unscaled pixel space.
///
/// Offsets are relative to the origin named by `basis`, before the screen
/// scale ratio is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConcreteTransform {
    /// Horizontal offset of the layer's left edge.
    pub left_offset: f64,
    /// Vertical offset of the layer's top edge.
    pub top_offset: f64,
    /// Origin the offsets are measured from.
    pub basis: PositionBasis,
    /// Uniform scale factor on the layer's natural size.
    pub scale: f64,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
}

impl ConcreteTransform {
    /// Neutral transform: zero canvas-origin offset, unit scale, fully
    /// opaque.
    pub fn neutral() -> Self {
        Self {
            left_offset: 0.0,
            top_offset: 0.0,
            basis: PositionBasis::Canvas,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

/// Resolve a raw transform descriptor into concrete pixel offsets.
///
/// Position coordinates address the layer's *center*; the legacy version-1
/// formula converts them to a top-left offset by subtracting half the
/// natural dimension per axis. A fixed position always resolves against the
/// canvas origin; only a relative position resolves against the anchor box,
/// and each of its axes resolves independently through the control table, so
/// one position can mix fixed and control-driven axes. Exactly one layout
/// version is applied per layer build; unknown versions resolve with
/// version-1 semantics. Missing or unrecognized transform kinds degrade to
/// [`ConcreteTransform::neutral`] rather than aborting.
pub fn resolve_transform(
    spec: &TransformSpec,
    layout_version: u32,
    natural_width: u32,
    natural_height: u32,
    values: &ControlValues,
) -> ConcreteTransform {
    let mut out = ConcreteTransform::neutral();

    let center = if let Some(fixed) = &spec.fixed_position {
        Some((fixed.x, fixed.y))
    } else if let Some(rel) = &spec.relative_position {
        out.basis = PositionBasis::Anchor;
        Some((values.resolve(&rel.x), values.resolve(&rel.y)))
    } else {
        None
    };

    if let Some((cx, cy)) = center {
        // Only version 1 exists in the wild; later versions reserve room for
        // different offset conventions.
        let _ = layout_version;
        out.left_offset = sanitize(cx, 0.0) - f64::from(natural_width) / 2.0;
        out.top_offset = sanitize(cy, 0.0) - f64::from(natural_height) / 2.0;
    }

    if let Some(scale) = &spec.scale {
        let s = values.resolve(scale);
        if s.is_finite() && s > 0.0 {
            out.scale = s;
        }
    }

    if let Some(opacity) = &spec.opacity {
        out.opacity = resolve_opacity(opacity, values);
    }

    out
}

fn resolve_opacity(value: &Value, values: &ControlValues) -> f64 {
    let raw = values.resolve(value);
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn sanitize(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/resolver.rs"]
mod tests;
