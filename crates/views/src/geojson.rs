use serde_json::{Map, Value, json};

use model::{AttrStore, DirtyGuard};

/// Merges the widget-level `style` object into each feature's
/// `properties.style`, widget style winning over per-feature style.
/// Data that is not a Feature or FeatureCollection passes through
/// unchanged, as does an empty style.
pub fn styled_data(data: &Value, style: &Value) -> Value {
    let Some(style_obj) = style.as_object().filter(|o| !o.is_empty()) else {
        return data.clone();
    };

    let mut data = data.clone();
    match data.get("type").and_then(Value::as_str) {
        Some("Feature") => apply_feature_style(&mut data, style_obj),
        Some("FeatureCollection") => {
            if let Some(features) = data.get_mut("features").and_then(Value::as_array_mut) {
                for feature in features {
                    apply_feature_style(feature, style_obj);
                }
            }
        }
        _ => {}
    }
    data
}

fn apply_feature_style(feature: &mut Value, style: &Map<String, Value>) {
    let Some(feature) = feature.as_object_mut() else {
        return;
    };
    let properties = feature
        .entry("properties".to_string())
        .or_insert_with(|| json!({}));
    let Some(properties) = properties.as_object_mut() else {
        return;
    };
    let merged = match properties.get("style").and_then(Value::as_object) {
        Some(existing) => {
            let mut merged = existing.clone();
            for (key, value) in style {
                merged.insert(key.clone(), value.clone());
            }
            merged
        }
        None => style.clone(),
    };
    properties.insert("style".to_string(), Value::Object(merged));
}

/// Kernel-side restyle on `data`/`style` change: rewrites `data` with the
/// widget style applied.
///
/// This is the embedding kernel's hook, called after it mutates either
/// attribute on a vector layer's store. The browser side never needs
/// it: layer views merge independently through [`styled_data`] when
/// they apply `data` deltas. The guard stops the rewrite from
/// re-triggering itself when the resulting change is dispatched back to
/// this handler.
pub fn restyle(store: &mut AttrStore, guard: &mut DirtyGuard) {
    if !guard.set() {
        return;
    }
    let data = store.get("data").cloned().unwrap_or_else(|| json!({}));
    let style = store.get("style").cloned().unwrap_or_else(|| json!({}));
    store.set("data", styled_data(&data, &style));
    guard.clear();
}
