use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Vector feature styling applied through the library's per-style
/// setters (fill color, stroke width, ...). Unset fields leave the
/// layer's current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VectorStyle {
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub point_radius: Option<f64>,
}

impl VectorStyle {
    /// Reads a style from a widget's free-form `style` attribute,
    /// ignoring keys the library has no setter for.
    pub fn from_attr(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Fields set on `self` win over `base`.
    pub fn merged_over(&self, base: &VectorStyle) -> VectorStyle {
        VectorStyle {
            fill_color: self.fill_color.clone().or_else(|| base.fill_color.clone()),
            stroke_color: self
                .stroke_color
                .clone()
                .or_else(|| base.stroke_color.clone()),
            stroke_width: self.stroke_width.or(base.stroke_width),
            point_radius: self.point_radius.or(base.point_radius),
        }
    }
}
