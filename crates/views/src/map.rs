use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, warn};

use engine::{
    ContextKind, CreationTicket, GeoPos, Globe, LayerId, ZoomTarget, context_for_crs,
};
use model::{
    AttrChange, ChangeOrigin, CustomMessage, DirtyGuard, Environment, EventMessage, Models,
    Subscriptions, WidgetId, WidgetKind, options_object, validate_children,
};
use sync::{BindError, ViewList};

use crate::binder::LayerBinder;
use crate::controls::{ControlBinder, ControlHandle, ControlKind};
use crate::error::ViewError;
use crate::layer::{LayerNode, apply_layer_change, init_layer, layer_config, layer_subscriptions};
use crate::view::RenderableView;

/// Lifecycle of the root map view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapViewState {
    Uninitialized,
    AwaitingLayout,
    ConstructingNativeObject,
    Ready,
    Disposed,
}

impl MapViewState {
    fn name(self) -> &'static str {
        match self {
            MapViewState::Uninitialized => "uninitialized",
            MapViewState::AwaitingLayout => "awaiting layout",
            MapViewState::ConstructingNativeObject => "constructing the native object",
            MapViewState::Ready => "ready",
            MapViewState::Disposed => "disposed",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum MapHandler {
    Zoom,
    Layers,
    Controls,
    Resize,
}

/// Top-level view: owns the rendering canvas association, the native
/// globe instance, and the layer/control child lists.
///
/// Everything is driven cooperatively: the host calls `render` when the
/// widget is attached, `layout_ready` once the hosting layout has a
/// size, and `pump` once per event-loop turn to apply attribute deltas
/// and deferred layer creations.
#[derive(Debug)]
pub struct MapView {
    widget: WidgetId,
    state: MapViewState,
    context: Option<ContextKind>,
    size: (u32, u32),
    layer_views: ViewList<WidgetId, LayerNode>,
    control_views: ViewList<WidgetId, ControlHandle>,
    tickets: BTreeMap<CreationTicket, WidgetId>,
    subscriptions: Subscriptions<MapHandler>,
    dirty: DirtyGuard,
    events: Vec<EventMessage>,
}

impl MapView {
    pub fn new(
        widget: WidgetId,
        env: &Environment,
        models: &mut Models,
    ) -> Result<Self, ViewError> {
        let store = models
            .store_mut(widget)
            .ok_or(ViewError::UnknownWidget(widget))?;
        // Mirror the injected host context into the read-only attribute.
        store.set_from(
            ChangeOrigin::Browser,
            "window_url",
            json!(env.page_url.clone()),
        );

        let mut subscriptions = Subscriptions::new();
        subscriptions.listen("zoom", MapHandler::Zoom);
        subscriptions.listen("layers", MapHandler::Layers);
        subscriptions.listen("controls", MapHandler::Controls);
        subscriptions.listen("width", MapHandler::Resize);
        subscriptions.listen("height", MapHandler::Resize);

        Ok(Self {
            widget,
            state: MapViewState::Uninitialized,
            context: None,
            size: (0, 0),
            layer_views: ViewList::new(),
            control_views: ViewList::new(),
            tickets: BTreeMap::new(),
            subscriptions,
            dirty: DirtyGuard::new(),
            events: Vec::new(),
        })
    }

    pub fn state(&self) -> MapViewState {
        self.state
    }

    pub fn context(&self) -> Option<ContextKind> {
        self.context
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Layer ids currently tracked, in z-order.
    pub fn layer_ids(&self) -> Vec<WidgetId> {
        self.layer_views.ids()
    }

    pub fn layer_handle(&self, widget: WidgetId) -> Option<LayerId> {
        find_layer_id(&self.layer_views, widget)
    }

    pub fn control_handle(&self, widget: WidgetId) -> Option<&ControlHandle> {
        self.control_views.handle_of(&widget)
    }

    /// Attachment to the DOM; layout is not guaranteed sized yet.
    pub fn render(&mut self) -> Result<(), ViewError> {
        if self.state != MapViewState::Uninitialized {
            return Err(self.bad_state("render"));
        }
        self.state = MapViewState::AwaitingLayout;
        Ok(())
    }

    /// The hosting layout resolved with a size: build the rendering
    /// context from `crs`, construct the native object, and synchronize
    /// the initial child lists.
    ///
    /// An unrecognized reference system is reported and leaves the view
    /// awaiting layout; the call can be repeated after the attribute is
    /// corrected.
    pub fn layout_ready<G: Globe>(
        &mut self,
        models: &mut Models,
        globe: &mut G,
        width: u32,
        height: u32,
    ) -> Result<(), ViewError> {
        if self.state != MapViewState::AwaitingLayout {
            return Err(self.bad_state("complete layout"));
        }
        let store = models
            .store(self.widget)
            .ok_or(ViewError::UnknownWidget(self.widget))?;
        let crs = store.get_str("crs").map_err(ViewError::Model)?.to_string();
        let context = match context_for_crs(&crs) {
            Ok(context) => context,
            Err(err) => {
                warn!(widget = self.widget.0, error = %err, "map context not created");
                return Err(err.into());
            }
        };

        self.state = MapViewState::ConstructingNativeObject;
        self.context = Some(context);
        self.size = (width, height);

        self.sync_layers(models, globe);
        self.sync_controls(models, globe);
        self.handle_zoom(models, globe);

        self.state = MapViewState::Ready;
        Ok(())
    }

    /// One cooperative turn: routes deferred layer creations, then
    /// dispatches attribute deltas for the map and every child widget,
    /// in registration order per change.
    pub fn pump<G: Globe>(&mut self, models: &mut Models, globe: &mut G) {
        if self.state == MapViewState::Disposed {
            // Late completions for a torn-down view: release immediately.
            for (ticket, creation) in globe.poll_created() {
                if self.tickets.remove(&ticket).is_some()
                    && let Ok(layer_id) = creation
                {
                    globe.remove_layer(layer_id);
                }
            }
            return;
        }
        if self.state != MapViewState::Ready {
            return;
        }

        self.route_creations(models, globe);

        let changes = match models.store_mut(self.widget) {
            Some(store) => store.drain_changes(),
            None => Vec::new(),
        };
        self.dispatch_map_changes(models, globe, &changes);

        let toggles_changed = pump_layer_nodes(
            &mut self.layer_views,
            models,
            globe,
            &mut self.tickets,
            &mut self.events,
        );
        if toggles_changed {
            self.rebuild_layers_controls(models);
        }
        self.pump_controls(models);
    }

    /// A navigation change originating in the library (user pan/zoom):
    /// written back to the store under the dirty flag so the zoom
    /// handler does not feed it straight back to the library.
    pub fn on_navigation_changed<G: Globe>(
        &mut self,
        models: &mut Models,
        globe: &mut G,
        target: &ZoomTarget,
    ) {
        if self.state != MapViewState::Ready {
            return;
        }
        if !self.dirty.set() {
            return;
        }
        let value = match target.distance {
            Some(distance) => json!([target.position.lon, target.position.lat, distance]),
            None => json!([target.position.lon, target.position.lat]),
        };
        let changes = match models.store_mut(self.widget) {
            Some(store) => {
                store.set_from(ChangeOrigin::Browser, "zoom", value);
                store.drain_changes()
            }
            None => Vec::new(),
        };
        // Dispatch while the flag is still set; the zoom handler skips.
        self.dispatch_map_changes(models, globe, &changes);
        self.dirty.clear();
    }

    /// Re-entrant resize from the host (window resize, panel shown).
    ///
    /// The guard may already be held by a navigation writeback; the
    /// invalidation still applies, only the acquisition is skipped.
    pub fn on_resize<G: Globe>(&mut self, globe: &mut G, width: u32, height: u32) {
        if self.state != MapViewState::Ready || (width, height) == self.size {
            return;
        }
        let acquired = self.dirty.set();
        self.size = (width, height);
        globe.invalidate_size(width, height, false);
        if acquired {
            self.dirty.clear();
        }
    }

    /// Queued outbound events, drained by the host for transport.
    pub fn take_events(&mut self) -> Vec<EventMessage> {
        std::mem::take(&mut self.events)
    }

    /// Pointer activity on the canvas, forwarded to the kernel with its
    /// geodetic position.
    pub fn on_mouse_event(&mut self, kind: &str, position: GeoPos) {
        if self.state != MapViewState::Ready {
            return;
        }
        self.events.push(EventMessage::new(
            kind,
            json!({"lon": position.lon, "lat": position.lat}),
        ));
    }

    /// A vector feature picked in the browser, forwarded on behalf of
    /// its layer widget. Picks for widgets without a live layer are
    /// dropped.
    pub fn on_feature_picked(
        &mut self,
        models: &Models,
        widget: WidgetId,
        feature: &serde_json::Value,
    ) {
        if self.state != MapViewState::Ready {
            return;
        }
        if models.kind_of(widget) != Some(WidgetKind::GeoJsonLayer)
            || find_layer_id(&self.layer_views, widget).is_none()
        {
            warn!(widget = widget.0, "feature pick for a widget without a live layer");
            return;
        }
        self.events.push(EventMessage::new(
            "interaction",
            json!({"widget": widget.0, "feature": feature}),
        ));
    }

    /// Custom comm message addressed to this view or one of its layers.
    pub fn handle_message<G: Globe>(
        &mut self,
        models: &mut Models,
        globe: &mut G,
        widget: WidgetId,
        msg: &CustomMessage,
    ) {
        if self.state != MapViewState::Ready {
            return;
        }
        match msg.method.as_str() {
            "redraw" => {
                let Some(layer_id) = find_layer_id(&self.layer_views, widget) else {
                    warn!(widget = widget.0, "redraw for a widget without a live layer");
                    return;
                };
                match layer_config(models, widget) {
                    Ok(config) => {
                        if let Err(err) = globe.update_layer(layer_id, &config) {
                            warn!(widget = widget.0, error = %err, "redraw failed");
                        }
                    }
                    Err(err) => warn!(widget = widget.0, error = %err, "redraw skipped"),
                }
            }
            // Hook point for future custom commands.
            other => debug!(widget = widget.0, method = other, "unhandled custom message"),
        }
    }

    /// Releases the native handle, every child handle, and all
    /// subscriptions. In-flight constructions are compensated as their
    /// completions arrive through `pump`.
    pub fn dispose<G: Globe>(&mut self, models: &mut Models, globe: &mut G) {
        if self.state == MapViewState::Disposed {
            return;
        }
        let mut binder = LayerBinder {
            models,
            globe,
            tickets: &mut self.tickets,
            events: &mut self.events,
        };
        self.layer_views.clear(&mut binder);
        let mut controls = ControlBinder { models };
        self.control_views.clear(&mut controls);
        self.subscriptions.clear();
        self.context = None;
        self.state = MapViewState::Disposed;
    }

    fn bad_state(&self, op: &'static str) -> ViewError {
        ViewError::BadState {
            state: self.state.name(),
            op,
        }
    }

    fn route_creations<G: Globe>(&mut self, models: &mut Models, globe: &mut G) {
        for (ticket, creation) in globe.poll_created() {
            let Some(widget) = self.tickets.remove(&ticket) else {
                warn!(ticket = ticket.0, "completion for an unknown creation ticket");
                if let Ok(layer_id) = creation {
                    globe.remove_layer(layer_id);
                }
                continue;
            };
            let Some(kind) = models.kind_of(widget) else {
                if let Ok(layer_id) = creation {
                    globe.remove_layer(layer_id);
                }
                continue;
            };

            let layer_id = creation.as_ref().ok().copied();
            let result = creation
                .map(|id| LayerNode::Layer {
                    id,
                    subs: layer_subscriptions(kind),
                })
                .map_err(|e| BindError::new(e.to_string()));

            let installed = {
                let mut binder = LayerBinder {
                    models,
                    globe: &mut *globe,
                    tickets: &mut self.tickets,
                    events: &mut self.events,
                };
                match resolve_in(&mut self.layer_views, &widget, result, &mut binder) {
                    Ok(installed) => installed,
                    Err(stray) => {
                        if let Ok(node) = stray {
                            use sync::ChildBinder as _;
                            warn!(widget = widget.0, "completion for an untracked layer");
                            binder.dispose(node);
                        }
                        false
                    }
                }
            };
            if installed && let Some(layer_id) = layer_id {
                init_layer(models, globe, widget, layer_id);
                self.events
                    .push(EventMessage::new("load", json!({"widget": widget.0})));
            }
        }
    }

    fn dispatch_map_changes<G: Globe>(
        &mut self,
        models: &mut Models,
        globe: &mut G,
        changes: &[AttrChange],
    ) {
        for key in self.subscriptions.dispatch(changes) {
            match key {
                MapHandler::Zoom => self.handle_zoom(models, globe),
                MapHandler::Layers => self.sync_layers(models, globe),
                MapHandler::Controls => self.sync_controls(models, globe),
                MapHandler::Resize => self.handle_attr_resize(models, globe),
            }
        }
    }

    fn handle_zoom<G: Globe>(&mut self, models: &Models, globe: &mut G) {
        // Skip when the value we would apply just came from the library.
        if self.dirty.is_set() {
            return;
        }
        let Some(store) = models.store(self.widget) else {
            return;
        };
        let tuple = match store.get_f64_seq("zoom") {
            Ok(tuple) => tuple,
            Err(err) => {
                warn!(widget = self.widget.0, error = %err, "bad zoom attribute");
                return;
            }
        };
        match ZoomTarget::from_tuple(&tuple) {
            Ok(target) => globe.zoom_to(&target),
            Err(err) => warn!(widget = self.widget.0, error = %err, "zoom not applied"),
        }
    }

    fn sync_layers<G: Globe>(&mut self, models: &mut Models, globe: &mut G) {
        let Some(store) = models.store(self.widget) else {
            return;
        };
        let ids = match store.get_widget_ids("layers") {
            Ok(ids) => ids,
            Err(err) => {
                warn!(widget = self.widget.0, error = %err, "bad layers attribute");
                return;
            }
        };
        if let Err(err) = validate_children(&ids) {
            warn!(widget = self.widget.0, error = %err, "layer list not synchronized");
            return;
        }
        let mut binder = LayerBinder {
            models,
            globe,
            tickets: &mut self.tickets,
            events: &mut self.events,
        };
        self.layer_views.update(&ids, &mut binder);
        self.rebuild_layers_controls(models);
    }

    fn sync_controls<G: Globe>(&mut self, models: &mut Models, _globe: &mut G) {
        let Some(store) = models.store(self.widget) else {
            return;
        };
        let ids = match store.get_widget_ids("controls") {
            Ok(ids) => ids,
            Err(err) => {
                warn!(widget = self.widget.0, error = %err, "bad controls attribute");
                return;
            }
        };
        if let Err(err) = validate_children(&ids) {
            warn!(widget = self.widget.0, error = %err, "control list not synchronized");
            return;
        }
        let mut binder = ControlBinder { models };
        self.control_views.update(&ids, &mut binder);
        self.rebuild_layers_controls(models);
    }

    fn handle_attr_resize<G: Globe>(&mut self, models: &Models, globe: &mut G) {
        let Some(store) = models.store(self.widget) else {
            return;
        };
        let (width, height) = match (store.get_f64("width"), store.get_f64("height")) {
            (Ok(w), Ok(h)) if w >= 0.0 && h >= 0.0 => (w as u32, h as u32),
            (w, h) => {
                let err = w.err().or_else(|| h.err());
                warn!(widget = self.widget.0, error = ?err, "bad size attributes");
                return;
            }
        };
        self.on_resize(globe, width, height);
    }

    /// Refreshes the (name, visible) toggles of every layers control
    /// from the current layer list.
    fn rebuild_layers_controls(&mut self, models: &Models) {
        let entries: Vec<(String, bool)> = self
            .layer_views
            .ids()
            .into_iter()
            .filter_map(|id| {
                let store = models.store(id)?;
                let name = store.get_str("name").unwrap_or("").to_string();
                let visible = store.get_bool("visible").unwrap_or(true);
                Some((name, visible))
            })
            .collect();
        for handle in self.control_views.handles_mut() {
            if handle.kind == ControlKind::Layers {
                handle.entries = entries.clone();
            }
        }
    }

    fn pump_controls(&mut self, models: &mut Models) {
        for widget in self.control_views.ids() {
            let Some(kind) = models.kind_of(widget) else {
                continue;
            };
            let changes = match models.store_mut(widget) {
                Some(store) => store.drain_changes(),
                None => continue,
            };
            if changes.is_empty() {
                continue;
            }
            let declared = kind.declared_options();
            if !changes.iter().any(|c| declared.contains(&c.name.as_str())) {
                continue;
            }
            let Some(store) = models.store(widget) else {
                continue;
            };
            let options = options_object(store, declared);
            if let Some(handle) = self.control_views.handle_of_mut(&widget) {
                handle.options = options;
            }
        }
    }
}

impl RenderableView for MapView {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn observed(&self) -> Vec<String> {
        self.subscriptions.names().map(str::to_string).collect()
    }
}

/// Routes an asynchronous creation outcome to whichever list tracks the
/// widget (the map's or a nested group's). Hands the outcome back if no
/// list does.
fn resolve_in<G: Globe>(
    list: &mut ViewList<WidgetId, LayerNode>,
    widget: &WidgetId,
    result: Result<LayerNode, BindError>,
    binder: &mut LayerBinder<'_, G>,
) -> Result<bool, Result<LayerNode, BindError>> {
    if list.tracks(widget) {
        return Ok(list.resolve(widget, result, binder));
    }
    let mut result = result;
    for node in list.handles_mut() {
        if let LayerNode::Group(group) = node {
            match resolve_in(&mut group.members, widget, result, binder) {
                Ok(installed) => return Ok(installed),
                Err(back) => result = back,
            }
        }
    }
    Err(result)
}

fn find_layer_id(list: &ViewList<WidgetId, LayerNode>, widget: WidgetId) -> Option<LayerId> {
    if let Some(LayerNode::Layer { id, .. }) = list.handle_of(&widget) {
        return Some(*id);
    }
    for node in list.handles() {
        if let LayerNode::Group(group) = node
            && let Some(id) = find_layer_id(&group.members, widget)
        {
            return Some(id);
        }
    }
    None
}

/// Drains and applies attribute deltas for every resolved child in the
/// tree. Changes accumulated while a child is still in flight stay
/// queued until it resolves.
///
/// Returns `true` when a drained change touched an attribute the layers
/// controls snapshot (`name`, `visible`), so the caller can refresh
/// them.
fn pump_layer_nodes<G: Globe>(
    list: &mut ViewList<WidgetId, LayerNode>,
    models: &mut Models,
    globe: &mut G,
    tickets: &mut BTreeMap<CreationTicket, WidgetId>,
    events: &mut Vec<EventMessage>,
) -> bool {
    let mut toggles_changed = false;
    for widget in list.ids() {
        if list.is_pending(&widget) {
            continue;
        }
        let changes = match models.store_mut(widget) {
            Some(store) => store.drain_changes(),
            None => continue,
        };
        if changes.iter().any(|c| c.name == "visible" || c.name == "name") {
            toggles_changed = true;
        }
        let Some(node) = list.handle_of_mut(&widget) else {
            continue;
        };
        match node {
            LayerNode::Layer { id, subs } => {
                let id = *id;
                for key in subs.dispatch(&changes) {
                    apply_layer_change(models, globe, widget, id, key);
                }
            }
            LayerNode::Group(group) => {
                if changes.iter().any(|c| c.name == "layers") {
                    let members = models
                        .store(widget)
                        .ok_or(())
                        .and_then(|s| s.get_widget_ids("layers").map_err(|_| ()));
                    match members {
                        Ok(members) if validate_children(&members).is_ok() => {
                            let mut binder = LayerBinder {
                                models,
                                globe: &mut *globe,
                                tickets: &mut *tickets,
                                events: &mut *events,
                            };
                            group.members.update(&members, &mut binder);
                        }
                        _ => {
                            warn!(widget = widget.0, "bad group layer list, not synchronized");
                        }
                    }
                }
                toggles_changed |=
                    pump_layer_nodes(&mut group.members, models, globe, tickets, events);
            }
        }
    }
    toggles_changed
}

#[cfg(test)]
mod tests {
    use super::{MapView, MapViewState};
    use crate::view::RenderableView;
    use engine::{GeoPos, InMemoryGlobe, ZoomTarget};
    use model::{CustomMessage, Environment, Models, WidgetId, WidgetKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn env() -> Environment {
        Environment::new("https://notebooks.example/lab")
    }

    fn ids(widgets: &[WidgetId]) -> serde_json::Value {
        json!(widgets.iter().map(|w| w.0).collect::<Vec<_>>())
    }

    fn ready_view(
        models: &mut Models,
        globe: &mut InMemoryGlobe,
        layers: &[WidgetId],
    ) -> (WidgetId, MapView) {
        let map = models.create(WidgetKind::Map);
        models.store_mut(map).unwrap().set("layers", ids(layers));
        let mut view = MapView::new(map, &env(), models).unwrap();
        view.render().unwrap();
        view.layout_ready(models, globe, 500, 500).unwrap();
        (map, view)
    }

    #[test]
    fn lifecycle_runs_render_then_layout() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let map = models.create(WidgetKind::Map);
        let mut view = MapView::new(map, &env(), &mut models).unwrap();

        assert_eq!(view.state(), MapViewState::Uninitialized);
        assert_eq!(view.widget(), map);
        assert_eq!(
            view.observed(),
            vec!["zoom", "layers", "controls", "width", "height"]
        );
        assert!(view.layout_ready(&mut models, &mut globe, 500, 500).is_err());

        view.render().unwrap();
        assert!(view.render().is_err());
        view.layout_ready(&mut models, &mut globe, 500, 500).unwrap();
        assert_eq!(view.state(), MapViewState::Ready);
        // Initial navigation is pushed from the zoom attribute.
        assert_eq!(globe.zooms.len(), 1);
        assert_eq!(
            models.store(map).unwrap().get("window_url"),
            Some(&json!("https://notebooks.example/lab"))
        );
    }

    #[test]
    fn unknown_reference_system_keeps_awaiting_layout() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let map = models.create(WidgetKind::Map);
        models.store_mut(map).unwrap().set("crs", json!("EPSG:3857"));

        let mut view = MapView::new(map, &env(), &mut models).unwrap();
        view.render().unwrap();
        assert!(view.layout_ready(&mut models, &mut globe, 500, 500).is_err());
        assert_eq!(view.state(), MapViewState::AwaitingLayout);

        // Correcting the attribute lets the layout completion be retried.
        models.store_mut(map).unwrap().set("crs", json!("Equatorial"));
        view.layout_ready(&mut models, &mut globe, 500, 500).unwrap();
        assert_eq!(view.state(), MapViewState::Ready);
    }

    #[test]
    fn layer_swap_disposes_and_materializes_exactly_once() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::OsmLayer);
        let l2 = models.create(WidgetKind::OsmLayer);
        let l3 = models.create(WidgetKind::OsmLayer);
        let (map, mut view) = ready_view(&mut models, &mut globe, &[l1, l2]);

        assert_eq!(globe.layer_count(), 2);
        let kept = view.layer_handle(l2).unwrap();
        let dropped = view.layer_handle(l1).unwrap();

        models.store_mut(map).unwrap().set("layers", ids(&[l2, l3]));
        view.pump(&mut models, &mut globe);

        assert_eq!(globe.layer_count(), 2);
        assert!(globe.layer(dropped).is_none());
        assert_eq!(view.layer_handle(l2), Some(kept));
        assert!(view.layer_handle(l1).is_none());
        assert!(view.layer_handle(l3).is_some());
        assert_eq!(view.layer_ids(), vec![l2, l3]);
    }

    #[test]
    fn duplicate_layer_list_is_not_synchronized() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::OsmLayer);
        let l2 = models.create(WidgetKind::OsmLayer);
        let (map, mut view) = ready_view(&mut models, &mut globe, &[l1]);

        models
            .store_mut(map)
            .unwrap()
            .set("layers", ids(&[l2, l1, l2]));
        view.pump(&mut models, &mut globe);

        // The previous list stays live untouched.
        assert_eq!(view.layer_ids(), vec![l1]);
        assert_eq!(globe.layer_count(), 1);
    }

    #[test]
    fn library_navigation_does_not_echo_back() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let (map, mut view) = ready_view(&mut models, &mut globe, &[]);
        assert_eq!(globe.zooms.len(), 1);

        let target = ZoomTarget {
            position: GeoPos { lon: 5.0, lat: 45.0 },
            distance: Some(300000.0),
        };
        view.on_navigation_changed(&mut models, &mut globe, &target);

        // The attribute reflects the library, with no round trip back.
        assert_eq!(
            models.store(map).unwrap().get("zoom"),
            Some(&json!([5.0, 45.0, 300000.0]))
        );
        assert_eq!(globe.zooms.len(), 1);

        // A genuine kernel-side change still navigates.
        models
            .store_mut(map)
            .unwrap()
            .set("zoom", json!([0.0, 0.0, 50000.0]));
        view.pump(&mut models, &mut globe);
        assert_eq!(globe.zooms.len(), 2);
    }

    #[test]
    fn size_attribute_change_invalidates_without_animation() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let (map, mut view) = ready_view(&mut models, &mut globe, &[]);

        let store = models.store_mut(map).unwrap();
        store.set("width", json!(640));
        store.set("height", json!(480));
        view.pump(&mut models, &mut globe);

        assert_eq!(view.size(), (640, 480));
        assert_eq!(globe.size_invalidations, vec![(640, 480, false)]);
    }

    #[test]
    fn resize_queued_before_navigation_writeback_still_applies() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let (map, mut view) = ready_view(&mut models, &mut globe, &[]);

        // A kernel-side width change is pending when the browser pans.
        models.store_mut(map).unwrap().set("width", json!(800));
        let target = ZoomTarget {
            position: GeoPos { lon: 2.0, lat: 48.0 },
            distance: None,
        };
        view.on_navigation_changed(&mut models, &mut globe, &target);

        // The resize is applied, while the zoom still does not echo.
        assert_eq!(view.size(), (800, 500));
        assert_eq!(globe.size_invalidations, vec![(800, 500, false)]);
        assert_eq!(globe.zooms.len(), 1);

        // The guard was released: later kernel changes propagate.
        models.store_mut(map).unwrap().set("zoom", json!([9.0, 9.0]));
        view.pump(&mut models, &mut globe);
        assert_eq!(globe.zooms.len(), 2);
    }

    #[test]
    fn deferred_creation_resolves_through_pump() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::deferred();
        let l1 = models.create(WidgetKind::OsmLayer);
        let (_, mut view) = ready_view(&mut models, &mut globe, &[l1]);

        assert!(view.layer_handle(l1).is_none());
        assert_eq!(globe.queued_count(), 1);

        globe.finish_creations();
        view.pump(&mut models, &mut globe);

        assert!(view.layer_handle(l1).is_some());
        assert_eq!(globe.layer_count(), 1);
    }

    #[test]
    fn deferred_creation_routes_into_nested_group() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::deferred();
        let leaf = models.create(WidgetKind::OsmLayer);
        let group = models.create(WidgetKind::LayerGroup);
        models.store_mut(group).unwrap().set("layers", ids(&[leaf]));
        let (_, mut view) = ready_view(&mut models, &mut globe, &[group]);

        globe.finish_creations();
        view.pump(&mut models, &mut globe);

        assert!(view.layer_handle(leaf).is_some());
        assert_eq!(globe.layer_count(), 1);
    }

    #[test]
    fn disposal_compensates_creations_still_in_flight() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::deferred();
        let l1 = models.create(WidgetKind::OsmLayer);
        let (_, mut view) = ready_view(&mut models, &mut globe, &[l1]);

        view.dispose(&mut models, &mut globe);
        assert_eq!(view.state(), MapViewState::Disposed);

        // The construction completes after teardown; pump releases it.
        globe.finish_creations();
        view.pump(&mut models, &mut globe);
        assert_eq!(globe.layer_count(), 0);
    }

    #[test]
    fn layer_attribute_changes_flow_to_the_library() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::OsmLayer);
        let (_, mut view) = ready_view(&mut models, &mut globe, &[l1]);
        let id = view.layer_handle(l1).unwrap();

        models.store_mut(l1).unwrap().set("opacity", json!(0.4));
        view.pump(&mut models, &mut globe);
        assert_eq!(globe.layer(id).unwrap().opacity, Some(0.4));

        models.store_mut(l1).unwrap().set("visible", json!(false));
        view.pump(&mut models, &mut globe);
        assert_eq!(globe.layer(id).unwrap().visible, Some(false));
    }

    #[test]
    fn layers_control_mirrors_the_layer_list() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::OsmLayer);
        models.store_mut(l1).unwrap().set("name", json!("Base"));
        let l2 = models.create(WidgetKind::WmsLayer);
        models.store_mut(l2).unwrap().set("name", json!("Overlay"));
        let control = models.create(WidgetKind::LayersControl);

        let map = models.create(WidgetKind::Map);
        let store = models.store_mut(map).unwrap();
        store.set("layers", ids(&[l1, l2]));
        store.set("controls", ids(&[control]));
        let mut view = MapView::new(map, &env(), &mut models).unwrap();
        view.render().unwrap();
        view.layout_ready(&mut models, &mut globe, 500, 500).unwrap();

        let handle = view.control_handle(control).unwrap();
        assert_eq!(
            handle.entries,
            vec![("Base".to_string(), true), ("Overlay".to_string(), true)]
        );

        models.store_mut(map).unwrap().set("layers", ids(&[l2]));
        view.pump(&mut models, &mut globe);
        assert_eq!(
            view.control_handle(control).unwrap().entries,
            vec![("Overlay".to_string(), true)]
        );
    }

    #[test]
    fn layers_control_tracks_member_visibility_toggles() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::OsmLayer);
        models.store_mut(l1).unwrap().set("name", json!("Base"));
        let control = models.create(WidgetKind::LayersControl);

        let map = models.create(WidgetKind::Map);
        let store = models.store_mut(map).unwrap();
        store.set("layers", ids(&[l1]));
        store.set("controls", ids(&[control]));
        let mut view = MapView::new(map, &env(), &mut models).unwrap();
        view.render().unwrap();
        view.layout_ready(&mut models, &mut globe, 500, 500).unwrap();
        assert_eq!(
            view.control_handle(control).unwrap().entries,
            vec![("Base".to_string(), true)]
        );

        // Toggling the layer itself, not the list, refreshes the snapshot.
        models.store_mut(l1).unwrap().set("visible", json!(false));
        view.pump(&mut models, &mut globe);
        assert_eq!(
            view.control_handle(control).unwrap().entries,
            vec![("Base".to_string(), false)]
        );
    }

    #[test]
    fn control_option_changes_update_the_handle() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let control = models.create(WidgetKind::ZoomControl);
        let (map, mut view) = ready_view(&mut models, &mut globe, &[]);
        models
            .store_mut(map)
            .unwrap()
            .set("controls", ids(&[control]));
        view.pump(&mut models, &mut globe);

        models
            .store_mut(control)
            .unwrap()
            .set("position", json!("bottomright"));
        view.pump(&mut models, &mut globe);

        let handle = view.control_handle(control).unwrap();
        assert_eq!(handle.options.get("position"), Some(&json!("bottomright")));
    }

    #[test]
    fn redraw_message_refreshes_the_layer() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::WmsLayer);
        let (_, mut view) = ready_view(&mut models, &mut globe, &[l1]);
        let id = view.layer_handle(l1).unwrap();

        view.handle_message(&mut models, &mut globe, l1, &CustomMessage::new("redraw"));
        assert_eq!(globe.layer(id).unwrap().refreshes, 1);

        // Unknown methods are ignored.
        view.handle_message(&mut models, &mut globe, l1, &CustomMessage::new("spin"));
        assert_eq!(globe.layer(id).unwrap().refreshes, 1);
    }

    #[test]
    fn feature_picks_are_forwarded_for_live_vector_layers() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let geo = models.create(WidgetKind::GeoJsonLayer);
        let (_, mut view) = ready_view(&mut models, &mut globe, &[geo]);
        view.take_events();

        let feature = json!({"type": "Feature", "properties": {"id": 4}});
        view.on_feature_picked(&models, geo, &feature);
        let events = view.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "interaction");
        assert_eq!(events[0].content["widget"], json!(geo.0));
        assert_eq!(events[0].content["feature"], feature);
        // Draining is one-shot.
        assert!(view.take_events().is_empty());

        // A widget without a live layer forwards nothing.
        let stray = models.create(WidgetKind::GeoJsonLayer);
        view.on_feature_picked(&models, stray, &feature);
        assert!(view.take_events().is_empty());
    }

    #[test]
    fn mouse_events_carry_the_geodetic_position() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let (_, mut view) = ready_view(&mut models, &mut globe, &[]);
        view.take_events();

        view.on_mouse_event("mousedown", GeoPos { lon: 1.4, lat: 43.6 });
        let events = view.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "mousedown");
        assert_eq!(events[0].content, json!({"lon": 1.4, "lat": 43.6}));

        // A disposed view forwards nothing.
        view.dispose(&mut models, &mut globe);
        view.on_mouse_event("mouseup", GeoPos { lon: 1.4, lat: 43.6 });
        assert!(view.take_events().is_empty());
    }

    #[test]
    fn layer_constructions_report_load_events() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::deferred();
        let l1 = models.create(WidgetKind::OsmLayer);
        let (_, mut view) = ready_view(&mut models, &mut globe, &[l1]);

        // Nothing reported while the construction is in flight.
        assert!(view.take_events().is_empty());

        globe.finish_creations();
        view.pump(&mut models, &mut globe);
        let events = view.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "load");
        assert_eq!(events[0].content, json!({"widget": l1.0}));

        // Synchronous constructions report as well.
        let mut immediate = InMemoryGlobe::new();
        let l2 = models.create(WidgetKind::OsmLayer);
        let (_, mut view) = ready_view(&mut models, &mut immediate, &[l2]);
        let events = view.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "load");
    }

    #[test]
    fn rejected_layer_leaves_siblings_live() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        globe.reject_base_url("https://bad.example");
        let good = models.create(WidgetKind::OsmLayer);
        let bad = models.create(WidgetKind::OsmLayer);
        models
            .store_mut(bad)
            .unwrap()
            .set("url", json!("https://bad.example"));

        let (_, view) = ready_view(&mut models, &mut globe, &[good, bad]);
        assert!(view.layer_handle(good).is_some());
        assert!(view.layer_handle(bad).is_none());
        assert_eq!(globe.layer_count(), 1);
    }

    #[test]
    fn disposal_releases_every_handle() {
        let mut models = Models::new();
        let mut globe = InMemoryGlobe::new();
        let l1 = models.create(WidgetKind::OsmLayer);
        let control = models.create(WidgetKind::ZoomControl);
        let map = models.create(WidgetKind::Map);
        let store = models.store_mut(map).unwrap();
        store.set("layers", ids(&[l1]));
        store.set("controls", ids(&[control]));
        let mut view = MapView::new(map, &env(), &mut models).unwrap();
        view.render().unwrap();
        view.layout_ready(&mut models, &mut globe, 500, 500).unwrap();
        assert_eq!(globe.layer_count(), 1);

        view.dispose(&mut models, &mut globe);
        assert_eq!(globe.layer_count(), 0);
        assert!(view.control_handle(control).is_none());
        assert_eq!(view.state(), MapViewState::Disposed);

        // Further pumps and messages are inert.
        models.store_mut(map).unwrap().set("width", json!(800));
        view.pump(&mut models, &mut globe);
        assert!(globe.size_invalidations.is_empty());
    }
}
