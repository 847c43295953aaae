use model::{Models, WidgetId, WidgetKind};

use crate::error::ViewError;

/// Identity the front end advertises to the widget manager. Both sides
/// must agree on the module name and the semver requirement before any
/// model is instantiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub version: &'static str,
}

impl ModuleDescriptor {
    pub fn current() -> Self {
        Self {
            name: "globelink",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

const ALL_KINDS: [WidgetKind; 9] = [
    WidgetKind::Map,
    WidgetKind::OsmLayer,
    WidgetKind::WmsLayer,
    WidgetKind::WmtsLayer,
    WidgetKind::HipsLayer,
    WidgetKind::GeoJsonLayer,
    WidgetKind::LayerGroup,
    WidgetKind::ZoomControl,
    WidgetKind::LayersControl,
];

/// Resolves an advertised model name to its widget kind.
pub fn kind_for_model_name(name: &str) -> Option<WidgetKind> {
    ALL_KINDS.into_iter().find(|k| k.model_name() == name)
}

/// Instantiates a model for an advertised class name, with its kind
/// defaults applied.
pub fn create_model(models: &mut Models, name: &str) -> Result<WidgetId, ViewError> {
    let kind = kind_for_model_name(name).ok_or_else(|| ViewError::UnknownModelName {
        name: name.to_string(),
    })?;
    Ok(models.create(kind))
}

#[cfg(test)]
mod tests {
    use super::{ModuleDescriptor, create_model, kind_for_model_name};
    use model::{Models, WidgetKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn every_kind_round_trips_through_its_model_name() {
        for kind in super::ALL_KINDS {
            assert_eq!(kind_for_model_name(kind.model_name()), Some(kind));
        }
        assert_eq!(kind_for_model_name("TileLayerModel"), None);
    }

    #[test]
    fn create_model_applies_kind_defaults() {
        let mut models = Models::new();
        let id = create_model(&mut models, "GlobeMapModel").unwrap();
        assert_eq!(models.kind_of(id), Some(WidgetKind::Map));
        assert!(create_model(&mut models, "NoSuchModel").is_err());
    }

    #[test]
    fn descriptor_names_the_module() {
        let descriptor = ModuleDescriptor::current();
        assert_eq!(descriptor.name, "globelink");
        assert!(!descriptor.version.is_empty());
    }
}
