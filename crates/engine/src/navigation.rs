use crate::error::ConfigError;

/// Geodetic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPos {
    pub lon: f64,
    pub lat: f64,
}

/// Navigation target for `Globe::zoom_to`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomTarget {
    pub position: GeoPos,
    /// Camera distance in meters; the library keeps its current distance
    /// when absent.
    pub distance: Option<f64>,
}

impl ZoomTarget {
    /// Parses the widget's `zoom` attribute: `[lon, lat]` or
    /// `[lon, lat, distance]`.
    pub fn from_tuple(values: &[f64]) -> Result<Self, ConfigError> {
        match *values {
            [lon, lat] => Ok(Self {
                position: GeoPos { lon, lat },
                distance: None,
            }),
            [lon, lat, distance] => Ok(Self {
                position: GeoPos { lon, lat },
                distance: Some(distance),
            }),
            _ => Err(ConfigError::BadZoomTuple { len: values.len() }),
        }
    }
}
