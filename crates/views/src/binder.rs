use std::collections::BTreeMap;

use serde_json::json;
use tracing::warn;

use engine::{CreationTicket, Globe, LayerCreation};
use model::{EventMessage, Models, WidgetId, WidgetKind, validate_children};
use sync::{BindError, ChildBinder, Materialized};

use crate::group::GroupView;
use crate::layer::{LayerNode, engine_kind, init_layer, layer_config, layer_subscriptions};

/// Materializes layer nodes for a layer list (the map's or a group's).
///
/// Plain layers go through `Globe::add_layer`; when the library defers
/// construction, the ticket is recorded so the map view can route the
/// completion back to the owning list. Group widgets materialize
/// synchronously and reconcile their members recursively.
#[derive(Debug)]
pub struct LayerBinder<'a, G: Globe> {
    pub models: &'a Models,
    pub globe: &'a mut G,
    pub tickets: &'a mut BTreeMap<CreationTicket, WidgetId>,
    /// Outbound queue; a finished layer construction reports a `load`
    /// event for its widget.
    pub events: &'a mut Vec<EventMessage>,
}

impl<G: Globe> ChildBinder<WidgetId, LayerNode> for LayerBinder<'_, G> {
    fn materialize(&mut self, id: &WidgetId) -> Result<Materialized<LayerNode>, BindError> {
        let kind = self
            .models
            .kind_of(*id)
            .ok_or_else(|| BindError::new(format!("unknown widget {}", id.0)))?;

        if kind == WidgetKind::LayerGroup {
            let store = self
                .models
                .store(*id)
                .ok_or_else(|| BindError::new(format!("unknown widget {}", id.0)))?;
            let members = store
                .get_widget_ids("layers")
                .map_err(|e| BindError::new(e.to_string()))?;
            validate_children(&members).map_err(|e| BindError::new(e.to_string()))?;

            let mut group = GroupView::new(*id);
            group.members.update(&members, self);
            return Ok(Materialized::Ready(LayerNode::Group(group)));
        }

        if engine_kind(kind).is_none() {
            return Err(BindError::new(format!(
                "{} is not a layer",
                kind.model_name()
            )));
        }

        let config = layer_config(self.models, *id)?;
        match self
            .globe
            .add_layer(config)
            .map_err(|e| BindError::new(e.to_string()))?
        {
            LayerCreation::Created(layer_id) => {
                init_layer(self.models, self.globe, *id, layer_id);
                self.events
                    .push(EventMessage::new("load", json!({"widget": id.0})));
                Ok(Materialized::Ready(LayerNode::Layer {
                    id: layer_id,
                    subs: layer_subscriptions(kind),
                }))
            }
            LayerCreation::Deferred(ticket) => {
                self.tickets.insert(ticket, *id);
                Ok(Materialized::Pending)
            }
        }
    }

    fn dispose(&mut self, node: LayerNode) {
        match node {
            LayerNode::Layer { id, .. } => {
                if !self.globe.remove_layer(id) {
                    warn!(layer = id.0, "disposing a layer the library no longer has");
                }
            }
            LayerNode::Group(mut group) => {
                group.members.clear(self);
            }
        }
    }
}
