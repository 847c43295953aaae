use crate::error::ConfigError;

/// Rendering context family selected by the map's reference system:
/// a planetary surface or the celestial sphere.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContextKind {
    Planet,
    Sky,
}

const PLANET_CRS: &[&str] = &["CRS:84", "IAU2000:49900", "IAU2000:49901", "HorizontalLocal"];
const SKY_CRS: &[&str] = &["Equatorial", "Galactic"];

/// Dispatches a reference-system identifier to its context kind.
///
/// An unrecognized identifier is a reported configuration error, not a
/// fatal one: no context is set and the widget stays usable.
pub fn context_for_crs(crs: &str) -> Result<ContextKind, ConfigError> {
    if PLANET_CRS.contains(&crs) {
        return Ok(ContextKind::Planet);
    }
    if SKY_CRS.contains(&crs) {
        return Ok(ContextKind::Sky);
    }
    Err(ConfigError::UnknownCrs(crs.to_string()))
}
