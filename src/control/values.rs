use std::collections::BTreeMap;

use crate::metadata::model::{ControlRef, Value};

/// Effective control value table for one master token.
///
/// Resolution is pure and infallible: `overrides` (local preview state) win
/// over recorded defaults (minted on-chain values merged over unminted
/// metadata defaults), and anything absent resolves to `0.0`; legacy pieces
/// are sometimes partially lost and must still render.
#[derive(Clone, Debug, Default)]
pub struct ControlValues {
    master_token_id: u64,
    defaults: BTreeMap<String, f64>,
    overrides: BTreeMap<String, f64>,
}

impl ControlValues {
    /// Build a table from unminted metadata defaults and minted on-chain
    /// values. Minted values shadow unminted ones for the same key.
    pub fn new(
        master_token_id: u64,
        unminted: BTreeMap<String, f64>,
        minted: BTreeMap<String, f64>,
    ) -> Self {
        let mut defaults = unminted;
        defaults.extend(minted);
        Self {
            master_token_id,
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    /// Replace the ephemeral preview overrides, keyed by absolute control
    /// key. Overrides are never persisted on-chain.
    pub fn with_overrides(mut self, overrides: BTreeMap<String, f64>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Absolute lookup key for a control reference.
    ///
    /// A reference's `token_id` is relative to the master token; the
    /// canonical key incorporates the master token id offset. The offset
    /// saturates so an absurd `token-id` in wild metadata still resolves
    /// (to the zero default) instead of panicking.
    pub fn key_for(&self, r: &ControlRef) -> String {
        format!(
            "{}-{}",
            self.master_token_id.saturating_add(r.token_id),
            r.lever_id
        )
    }

    /// Resolve a literal-or-reference value to a number.
    pub fn resolve(&self, value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Ref(r) => self.resolve_ref(r),
        }
    }

    /// Resolve a control reference to its effective number.
    pub fn resolve_ref(&self, r: &ControlRef) -> f64 {
        let key = self.key_for(r);
        if let Some(v) = self.overrides.get(&key) {
            return *v;
        }
        self.defaults.get(&key).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/control/values.rs"]
mod tests;
