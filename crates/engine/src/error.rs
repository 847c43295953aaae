use crate::globe::LayerId;

/// Configuration problems reported to diagnostics; the offending call is
/// aborted and the widget stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownCrs(String),
    /// A zoom target must be `[lon, lat]` or `[lon, lat, distance]`.
    BadZoomTuple {
        len: usize,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownCrs(crs) => write!(f, "unknown reference system {crs:?}"),
            ConfigError::BadZoomTuple { len } => {
                write!(f, "zoom target needs 2 or 3 components, got {len}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failures surfaced by the rendering library. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    LayerNotFound(LayerId),
    Rejected(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::LayerNotFound(id) => write!(f, "no layer with id {}", id.0),
            EngineError::Rejected(reason) => write!(f, "layer construction rejected: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}
