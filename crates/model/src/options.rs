use serde_json::{Map, Value};

use crate::store::AttrStore;

/// Converts a declared `snake_case` option name into the `camelCase`
/// form the rendering library expects.
///
/// Idempotent: input without underscores passes through unchanged, so
/// translating an already-translated key is a no-op. Callers must keep
/// each declared option set injective under this mapping (e.g. not
/// declaring both `zoom_delta` and `zoomDelta`).
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_'
            && let Some(next) = chars.peek().copied()
        {
            chars.next();
            out.extend(next.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Builds the library configuration fragment for the declared option
/// attributes of a store. Options that are not set are skipped.
pub fn options_object(store: &AttrStore, declared: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    for key in declared {
        let Some(value) = store.get(key) else {
            continue;
        };
        let translated = camel_case(key);
        debug_assert!(
            !out.contains_key(&translated),
            "declared options collide after translation: {translated:?}"
        );
        out.insert(translated, value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{camel_case, options_object};
    use crate::store::AttrStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn translates_snake_case() {
        assert_eq!(camel_case("zoom_delta"), "zoomDelta");
        assert_eq!(camel_case("zoom_snap"), "zoomSnap");
        assert_eq!(camel_case("url"), "url");
    }

    #[test]
    fn translation_is_idempotent() {
        assert_eq!(camel_case(&camel_case("tile_size")), "tileSize");
        assert_eq!(camel_case("zoomDelta"), "zoomDelta");
    }

    #[test]
    fn declared_set_stays_injective() {
        let translated: Vec<_> = ["zoom_delta", "zoom_snap"]
            .iter()
            .map(|k| camel_case(k))
            .collect();
        assert_eq!(translated, vec!["zoomDelta", "zoomSnap"]);
    }

    #[test]
    fn builds_config_fragment_from_declared_options() {
        let mut store = AttrStore::new();
        store.set("zoom_delta", json!(1.0));
        store.set("max_zoom", json!(18));
        store.set("ignored", json!(true));

        let options = options_object(&store, &["zoom_delta", "max_zoom", "missing"]);
        assert_eq!(
            serde_json::Value::Object(options),
            json!({"zoomDelta": 1.0, "maxZoom": 18})
        );
    }
}
