use serde_json::{Map, Value};

use model::{Models, WidgetId, WidgetKind, options_object};
use sync::{BindError, ChildBinder, Materialized};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Zoom,
    Layers,
}

/// Rendering-side object for one map control. Controls are built
/// synchronously from their declared options; a layers control also
/// carries a (layer name, visible) snapshot rebuilt whenever the map's
/// layer list changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlHandle {
    pub kind: ControlKind,
    pub options: Map<String, Value>,
    pub entries: Vec<(String, bool)>,
}

/// Materializes control handles for the map's `controls` list.
#[derive(Debug)]
pub struct ControlBinder<'a> {
    pub models: &'a Models,
}

impl ChildBinder<WidgetId, ControlHandle> for ControlBinder<'_> {
    fn materialize(&mut self, id: &WidgetId) -> Result<Materialized<ControlHandle>, BindError> {
        let kind = self
            .models
            .kind_of(*id)
            .ok_or_else(|| BindError::new(format!("unknown widget {}", id.0)))?;
        let control_kind = match kind {
            WidgetKind::ZoomControl => ControlKind::Zoom,
            WidgetKind::LayersControl => ControlKind::Layers,
            other => {
                return Err(BindError::new(format!(
                    "{} is not a control",
                    other.model_name()
                )));
            }
        };
        let store = self
            .models
            .store(*id)
            .ok_or_else(|| BindError::new(format!("unknown widget {}", id.0)))?;
        Ok(Materialized::Ready(ControlHandle {
            kind: control_kind,
            options: options_object(store, kind.declared_options()),
            entries: Vec::new(),
        }))
    }

    fn dispose(&mut self, _handle: ControlHandle) {}
}
