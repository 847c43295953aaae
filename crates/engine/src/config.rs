use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Layer families the rendering library can construct.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    #[serde(rename = "OSM")]
    Osm,
    #[serde(rename = "WMS")]
    Wms,
    #[serde(rename = "WMTS")]
    Wmts,
    Hips,
    #[serde(rename = "GeoJSON")]
    GeoJson,
}

/// Configuration object handed to `Globe::add_layer`, serialized in the
/// camelCase wire form the library expects.
///
/// `options` carries the already-translated pass-through option
/// attributes declared by the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub background: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Comma-separated service layer names (WMS/WMTS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl LayerConfig {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            base_url: None,
            background: false,
            crs: None,
            opacity: None,
            visible: None,
            layers: None,
            format: None,
            transparent: None,
            time: None,
            options: Map::new(),
        }
    }
}
