use serde_json::Value;

use crate::config::LayerConfig;
use crate::error::EngineError;
use crate::navigation::ZoomTarget;
use crate::style::VectorStyle;

/// Identifies a live layer inside the rendering library.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

/// Correlates a deferred layer construction with its completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CreationTicket(pub u64);

/// Outcome of `add_layer`: some libraries hand the id back immediately,
/// others report it through a creation callback a turn later.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerCreation {
    Created(LayerId),
    Deferred(CreationTicket),
}

/// The rendering API surface this system consumes.
///
/// Everything behind this trait is the wrapped library's concern:
/// projection math, tile loading, navigation animation. Views only
/// translate attribute deltas into these calls. All methods are
/// single-threaded and cooperative; nothing here blocks.
pub trait Globe {
    fn add_layer(&mut self, config: LayerConfig) -> Result<LayerCreation, EngineError>;

    /// Drains completions for previously deferred constructions, in
    /// submission order.
    fn poll_created(&mut self) -> Vec<(CreationTicket, Result<LayerId, EngineError>)>;

    /// Returns `false` if the layer was not live.
    fn remove_layer(&mut self, id: LayerId) -> bool;

    /// Re-applies configuration to a live layer (service parameters,
    /// background flag) and forces a refresh.
    fn update_layer(&mut self, id: LayerId, config: &LayerConfig) -> Result<(), EngineError>;

    fn set_opacity(&mut self, id: LayerId, opacity: f64);
    fn set_visible(&mut self, id: LayerId, visible: bool);
    fn set_time(&mut self, id: LayerId, time: &str);
    fn set_style(&mut self, id: LayerId, style: &VectorStyle);

    fn add_feature_collection(&mut self, id: LayerId, features: &Value);
    fn remove_all_features(&mut self, id: LayerId);

    fn zoom_to(&mut self, target: &ZoomTarget);

    /// Size invalidation after a hosting-layout change; `animated` is
    /// false for re-entrant resize events.
    fn invalidate_size(&mut self, width: u32, height: u32, animated: bool);
}
