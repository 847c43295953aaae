use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ModelError;
use crate::ids::WidgetId;

/// Which side of the comm channel wrote an attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeOrigin {
    Kernel,
    Browser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrChange {
    pub name: String,
    pub origin: ChangeOrigin,
}

/// Replicated key/value attribute model for one widget instance.
///
/// Writes that actually change a value are recorded in write order and
/// drained by whoever pumps the view (`EventBus::drain` style); writes of
/// an equal value are silent, matching the host framework's change
/// notification semantics.
#[derive(Debug, Default)]
pub struct AttrStore {
    attrs: BTreeMap<String, Value>,
    changes: Vec<AttrChange>,
}

impl AttrStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from default attributes without recording changes.
    pub fn with_defaults(defaults: BTreeMap<String, Value>) -> Self {
        Self {
            attrs: defaults,
            changes: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Kernel-side write.
    pub fn set(&mut self, name: &str, value: Value) {
        self.set_from(ChangeOrigin::Kernel, name, value);
    }

    pub fn set_from(&mut self, origin: ChangeOrigin, name: &str, value: Value) {
        if self.attrs.get(name) == Some(&value) {
            return;
        }
        self.attrs.insert(name.to_string(), value);
        self.changes.push(AttrChange {
            name: name.to_string(),
            origin,
        });
    }

    pub fn drain_changes(&mut self) -> Vec<AttrChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, ModelError> {
        self.required(name)?
            .as_f64()
            .ok_or_else(|| ModelError::TypeMismatch {
                name: name.to_string(),
                expected: "number",
            })
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ModelError> {
        self.required(name)?
            .as_bool()
            .ok_or_else(|| ModelError::TypeMismatch {
                name: name.to_string(),
                expected: "boolean",
            })
    }

    pub fn get_str(&self, name: &str) -> Result<&str, ModelError> {
        self.required(name)?
            .as_str()
            .ok_or_else(|| ModelError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            })
    }

    /// Numeric tuple attribute, e.g. a zoom target `[lon, lat, distance?]`.
    pub fn get_f64_seq(&self, name: &str) -> Result<Vec<f64>, ModelError> {
        let mismatch = || ModelError::TypeMismatch {
            name: name.to_string(),
            expected: "numeric sequence",
        };
        let items = self.required(name)?.as_array().ok_or_else(mismatch)?;
        items
            .iter()
            .map(|v| v.as_f64().ok_or_else(mismatch))
            .collect()
    }

    /// Child-reference list attribute (`layers`, `controls`).
    pub fn get_widget_ids(&self, name: &str) -> Result<Vec<WidgetId>, ModelError> {
        let mismatch = || ModelError::TypeMismatch {
            name: name.to_string(),
            expected: "widget reference list",
        };
        let items = self.required(name)?.as_array().ok_or_else(mismatch)?;
        items
            .iter()
            .map(|v| v.as_u64().map(WidgetId).ok_or_else(mismatch))
            .collect()
    }

    fn required(&self, name: &str) -> Result<&Value, ModelError> {
        self.attrs
            .get(name)
            .ok_or_else(|| ModelError::MissingAttr(name.to_string()))
    }
}

/// Rejects child lists that reference the same widget twice.
pub fn validate_children(ids: &[WidgetId]) -> Result<(), ModelError> {
    let mut seen = std::collections::BTreeSet::new();
    for id in ids {
        if !seen.insert(*id) {
            return Err(ModelError::DuplicateChild(*id));
        }
    }
    Ok(())
}
