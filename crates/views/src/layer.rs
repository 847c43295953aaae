use tracing::warn;

use engine::{Globe, LayerConfig, LayerId, LayerKind, VectorStyle};
use model::{AttrStore, Models, Subscriptions, WidgetId, WidgetKind, options_object};
use sync::BindError;

use crate::geojson::styled_data;
use crate::group::GroupView;

/// Live rendering-side state for one child of a layer list: either a
/// library layer handle with its subscription list, or a nested group.
#[derive(Debug)]
pub enum LayerNode {
    Layer {
        id: LayerId,
        subs: Subscriptions<LayerHandler>,
    },
    Group(GroupView),
}

/// Handler keys a layer view registers for its attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerHandler {
    Opacity,
    Visible,
    Time,
    /// Service parameters changed; re-apply the full configuration.
    Params,
    Data,
    Style,
}

pub fn engine_kind(kind: WidgetKind) -> Option<LayerKind> {
    match kind {
        WidgetKind::OsmLayer => Some(LayerKind::Osm),
        WidgetKind::WmsLayer => Some(LayerKind::Wms),
        WidgetKind::WmtsLayer => Some(LayerKind::Wmts),
        WidgetKind::HipsLayer => Some(LayerKind::Hips),
        WidgetKind::GeoJsonLayer => Some(LayerKind::GeoJson),
        _ => None,
    }
}

/// Subscription list for a freshly materialized layer of `kind`,
/// in the registration order the view hierarchy uses.
pub fn layer_subscriptions(kind: WidgetKind) -> Subscriptions<LayerHandler> {
    let mut subs = Subscriptions::new();
    subs.listen("opacity", LayerHandler::Opacity);
    subs.listen("visible", LayerHandler::Visible);
    match kind {
        WidgetKind::WmsLayer | WidgetKind::WmtsLayer => {
            subs.listen("time", LayerHandler::Time);
            for name in ["url", "layers", "format", "transparent", "background"] {
                subs.listen(name, LayerHandler::Params);
            }
        }
        WidgetKind::OsmLayer | WidgetKind::HipsLayer => {
            subs.listen("url", LayerHandler::Params);
            subs.listen("background", LayerHandler::Params);
        }
        WidgetKind::GeoJsonLayer => {
            subs.listen("data", LayerHandler::Data);
            subs.listen("style", LayerHandler::Style);
        }
        _ => {}
    }
    subs
}

/// Builds the library configuration for a layer widget: the shared
/// basics (crs, opacity, visibility, background), the per-kind service
/// fields, and the declared pass-through options.
pub fn layer_config(models: &Models, widget: WidgetId) -> Result<LayerConfig, BindError> {
    let kind = models
        .kind_of(widget)
        .ok_or_else(|| BindError::new(format!("unknown widget {}", widget.0)))?;
    let engine_kind = engine_kind(kind)
        .ok_or_else(|| BindError::new(format!("{} is not a layer", kind.model_name())))?;
    let store = models
        .store(widget)
        .ok_or_else(|| BindError::new(format!("unknown widget {}", widget.0)))?;

    let mut config = LayerConfig::new(engine_kind);
    apply_basic_config(&mut config, store);

    match engine_kind {
        LayerKind::Osm | LayerKind::Hips => {
            config.base_url = non_empty(store, "url");
        }
        LayerKind::Wms => {
            config.base_url = non_empty(store, "url");
            config.layers = non_empty(store, "layers");
            config.format = non_empty(store, "format");
            config.transparent = store.get_bool("transparent").ok();
            config.time = non_empty(store, "time");
        }
        LayerKind::Wmts => {
            config.layers = non_empty(store, "layers");
            config.format = non_empty(store, "format");
            config.transparent = store.get_bool("transparent").ok();
            config.time = non_empty(store, "time");
        }
        LayerKind::GeoJson => {}
    }

    config.options = options_object(store, kind.declared_options());
    Ok(config)
}

fn apply_basic_config(config: &mut LayerConfig, store: &AttrStore) {
    config.crs = non_empty(store, "crs");
    config.opacity = store.get_f64("opacity").ok();
    config.visible = store.get_bool("visible").ok();
    config.background = store.get_bool("background").unwrap_or(false);
}

fn non_empty(store: &AttrStore, name: &str) -> Option<String> {
    store
        .get_str(name)
        .ok()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First-time setup a configuration object cannot carry: GeoJSON layers
/// receive their feature payload and style through dedicated calls.
pub fn init_layer<G: Globe>(models: &Models, globe: &mut G, widget: WidgetId, id: LayerId) {
    if models.kind_of(widget) != Some(WidgetKind::GeoJsonLayer) {
        return;
    }
    let Some(store) = models.store(widget) else {
        return;
    };
    let data = store.get("data").cloned().unwrap_or_default();
    let style = store.get("style").cloned().unwrap_or_default();
    globe.add_feature_collection(id, &styled_data(&data, &style));
    globe.set_style(id, &VectorStyle::from_attr(&style));
}

/// Applies one attribute delta to a live layer handle.
pub fn apply_layer_change<G: Globe>(
    models: &Models,
    globe: &mut G,
    widget: WidgetId,
    id: LayerId,
    handler: LayerHandler,
) {
    let Some(store) = models.store(widget) else {
        return;
    };
    match handler {
        LayerHandler::Opacity => {
            // Opacity is only pushed while the layer is visible.
            match (store.get_bool("visible"), store.get_f64("opacity")) {
                (Ok(true), Ok(opacity)) => globe.set_opacity(id, opacity),
                (Ok(false), _) => {}
                (visible, opacity) => {
                    let err = visible.err().or_else(|| opacity.err());
                    warn!(widget = widget.0, error = ?err, "bad opacity attributes");
                }
            }
        }
        LayerHandler::Visible => match store.get_bool("visible") {
            Ok(visible) => globe.set_visible(id, visible),
            Err(err) => warn!(widget = widget.0, error = %err, "bad visible attribute"),
        },
        LayerHandler::Time => match store.get_str("time") {
            Ok(time) => globe.set_time(id, time),
            Err(err) => warn!(widget = widget.0, error = %err, "bad time attribute"),
        },
        LayerHandler::Params => match layer_config(models, widget) {
            Ok(config) => {
                if let Err(err) = globe.update_layer(id, &config) {
                    warn!(widget = widget.0, error = %err, "layer refresh failed");
                }
            }
            Err(err) => warn!(widget = widget.0, error = %err, "bad layer configuration"),
        },
        LayerHandler::Data => {
            let data = store.get("data").cloned().unwrap_or_default();
            let style = store.get("style").cloned().unwrap_or_default();
            globe.remove_all_features(id);
            globe.add_feature_collection(id, &styled_data(&data, &style));
        }
        LayerHandler::Style => {
            let style = store.get("style").cloned().unwrap_or_default();
            globe.set_style(id, &VectorStyle::from_attr(&style));
        }
    }
}
