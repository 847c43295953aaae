use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::ids::WidgetId;
use crate::store::AttrStore;

/// Every widget class the module declares, one per model/view pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum WidgetKind {
    Map,
    OsmLayer,
    WmsLayer,
    WmtsLayer,
    HipsLayer,
    GeoJsonLayer,
    LayerGroup,
    ZoomControl,
    LayersControl,
}

impl WidgetKind {
    /// Stable model name used by the front-end widget registry.
    pub fn model_name(self) -> &'static str {
        match self {
            WidgetKind::Map => "GlobeMapModel",
            WidgetKind::OsmLayer => "OsmLayerModel",
            WidgetKind::WmsLayer => "WmsLayerModel",
            WidgetKind::WmtsLayer => "WmtsLayerModel",
            WidgetKind::HipsLayer => "HipsLayerModel",
            WidgetKind::GeoJsonLayer => "GeoJsonLayerModel",
            WidgetKind::LayerGroup => "LayerGroupModel",
            WidgetKind::ZoomControl => "ZoomControlModel",
            WidgetKind::LayersControl => "LayersControlModel",
        }
    }

    pub fn is_layer(self) -> bool {
        matches!(
            self,
            WidgetKind::OsmLayer
                | WidgetKind::WmsLayer
                | WidgetKind::WmtsLayer
                | WidgetKind::HipsLayer
                | WidgetKind::GeoJsonLayer
                | WidgetKind::LayerGroup
        )
    }

    pub fn is_control(self) -> bool {
        matches!(self, WidgetKind::ZoomControl | WidgetKind::LayersControl)
    }

    /// Attribute names declared as pass-through library options
    /// (translated to camelCase when building engine configuration).
    pub fn declared_options(self) -> &'static [&'static str] {
        match self {
            WidgetKind::Map => &["min_zoom", "max_zoom", "zoom_delta", "scroll_wheel_zoom"],
            WidgetKind::OsmLayer => &["min_zoom", "max_zoom", "tile_size", "attribution"],
            WidgetKind::WmsLayer | WidgetKind::WmtsLayer => &["attribution"],
            WidgetKind::HipsLayer => &["attribution"],
            WidgetKind::GeoJsonLayer | WidgetKind::LayerGroup => &[],
            WidgetKind::ZoomControl => &[
                "position",
                "zoom_in_text",
                "zoom_in_title",
                "zoom_out_text",
                "zoom_out_title",
            ],
            WidgetKind::LayersControl => &["position"],
        }
    }

    /// Default attribute values, mirrored on both sides of the comm.
    pub fn defaults(self) -> BTreeMap<String, Value> {
        let mut attrs = BTreeMap::new();
        let mut put = |name: &str, value: Value| {
            attrs.insert(name.to_string(), value);
        };

        if self.is_layer() {
            put("name", json!(""));
            put("crs", json!(""));
            put("opacity", json!(1.0));
            put("visible", json!(true));
            put("background", json!(false));
        }
        if self.is_control() {
            put("position", json!("topleft"));
        }

        match self {
            WidgetKind::Map => {
                put("crs", json!("CRS:84"));
                put("zoom", json!([0.0, 0.0, 50000.0]));
                put("width", json!(500));
                put("height", json!(500));
                put("layers", json!([]));
                put("controls", json!([]));
                put("window_url", json!(""));
                put("min_zoom", json!(1.0));
                put("max_zoom", json!(18.0));
                put("zoom_delta", json!(1.0));
                put("scroll_wheel_zoom", json!(false));
            }
            WidgetKind::OsmLayer => {
                put("url", json!("https://c.tile.openstreetmap.org"));
                put("min_zoom", json!(0));
                put("max_zoom", json!(18));
                put("tile_size", json!(256));
                put("attribution", json!(""));
            }
            WidgetKind::WmsLayer => {
                put("url", json!(""));
                put("layers", json!(""));
                put("format", json!("image/jpeg"));
                put("transparent", json!(false));
                put("time", json!(""));
                put("attribution", json!(""));
            }
            WidgetKind::WmtsLayer => {
                put("layers", json!(""));
                put("format", json!("image/jpeg"));
                put("transparent", json!(false));
                put("time", json!(""));
                put("attribution", json!(""));
            }
            WidgetKind::HipsLayer => {
                put("url", json!(""));
                put("attribution", json!(""));
            }
            WidgetKind::GeoJsonLayer => {
                put("data", json!({}));
                put("style", json!({}));
                put("hover_style", json!({}));
                put("point_style", json!({}));
            }
            WidgetKind::LayerGroup => {
                put("layers", json!([]));
            }
            WidgetKind::ZoomControl => {
                put("zoom_in_text", json!("+"));
                put("zoom_in_title", json!("Zoom in"));
                put("zoom_out_text", json!("-"));
                put("zoom_out_title", json!("Zoom out"));
            }
            WidgetKind::LayersControl => {}
        }

        attrs
    }
}

/// One replicated widget model: identity, kind, and its attribute store.
#[derive(Debug)]
pub struct WidgetModel {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub store: AttrStore,
}

/// Registry of live widget models, keyed by identity.
///
/// Models are created on first reference and removed when the owning
/// output is torn down.
#[derive(Debug, Default)]
pub struct Models {
    next_id: u64,
    models: BTreeMap<WidgetId, WidgetModel>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, kind: WidgetKind) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.models.insert(
            id,
            WidgetModel {
                id,
                kind,
                store: AttrStore::with_defaults(kind.defaults()),
            },
        );
        id
    }

    pub fn remove(&mut self, id: WidgetId) -> bool {
        self.models.remove(&id).is_some()
    }

    pub fn kind_of(&self, id: WidgetId) -> Option<WidgetKind> {
        self.models.get(&id).map(|m| m.kind)
    }

    pub fn store(&self, id: WidgetId) -> Option<&AttrStore> {
        self.models.get(&id).map(|m| &m.store)
    }

    pub fn store_mut(&mut self, id: WidgetId) -> Option<&mut AttrStore> {
        self.models.get_mut(&id).map(|m| &mut m.store)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
