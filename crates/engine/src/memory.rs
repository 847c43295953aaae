use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::LayerConfig;
use crate::error::EngineError;
use crate::globe::{CreationTicket, Globe, LayerCreation, LayerId};
use crate::navigation::ZoomTarget;
use crate::style::VectorStyle;

/// Everything the in-memory globe knows about one live layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub config: LayerConfig,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,
    pub time: Option<String>,
    pub style: VectorStyle,
    pub features: Vec<Value>,
    pub refreshes: usize,
}

impl LayerRecord {
    fn new(config: LayerConfig) -> Self {
        Self {
            config,
            opacity: None,
            visible: None,
            time: None,
            style: VectorStyle::default(),
            features: Vec::new(),
            refreshes: 0,
        }
    }
}

/// Recording `Globe` implementation.
///
/// In immediate mode `add_layer` hands the id back synchronously; in
/// deferred mode constructions queue up until `finish_creations` runs,
/// which is how tests exercise the in-flight reconciliation paths.
#[derive(Debug, Default)]
pub struct InMemoryGlobe {
    next_layer: u64,
    next_ticket: u64,
    defer_creations: bool,
    reject_base_urls: Vec<String>,
    queued: Vec<(CreationTicket, LayerConfig)>,
    completed: Vec<(CreationTicket, Result<LayerId, EngineError>)>,
    layers: BTreeMap<LayerId, LayerRecord>,
    pub zooms: Vec<ZoomTarget>,
    pub size_invalidations: Vec<(u32, u32, bool)>,
}

impl InMemoryGlobe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred() -> Self {
        Self {
            defer_creations: true,
            ..Self::default()
        }
    }

    /// Makes any construction for this base URL fail, immediately or at
    /// completion time depending on the mode.
    pub fn reject_base_url(&mut self, url: impl Into<String>) {
        self.reject_base_urls.push(url.into());
    }

    /// Completes all queued constructions; results become visible on the
    /// next `poll_created`.
    pub fn finish_creations(&mut self) {
        for (ticket, config) in std::mem::take(&mut self.queued) {
            let result = self.construct(config);
            self.completed.push((ticket, result));
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerRecord> {
        self.layers.get(&id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    fn construct(&mut self, config: LayerConfig) -> Result<LayerId, EngineError> {
        if let Some(url) = &config.base_url
            && self.reject_base_urls.iter().any(|r| r == url)
        {
            return Err(EngineError::Rejected(format!("unreachable service {url}")));
        }
        self.next_layer += 1;
        let id = LayerId(self.next_layer);
        self.layers.insert(id, LayerRecord::new(config));
        Ok(id)
    }

    fn record(&mut self, id: LayerId) -> Option<&mut LayerRecord> {
        self.layers.get_mut(&id)
    }
}

impl Globe for InMemoryGlobe {
    fn add_layer(&mut self, config: LayerConfig) -> Result<LayerCreation, EngineError> {
        if self.defer_creations {
            self.next_ticket += 1;
            let ticket = CreationTicket(self.next_ticket);
            self.queued.push((ticket, config));
            return Ok(LayerCreation::Deferred(ticket));
        }
        self.construct(config).map(LayerCreation::Created)
    }

    fn poll_created(&mut self) -> Vec<(CreationTicket, Result<LayerId, EngineError>)> {
        std::mem::take(&mut self.completed)
    }

    fn remove_layer(&mut self, id: LayerId) -> bool {
        self.layers.remove(&id).is_some()
    }

    fn update_layer(&mut self, id: LayerId, config: &LayerConfig) -> Result<(), EngineError> {
        let Some(record) = self.record(id) else {
            return Err(EngineError::LayerNotFound(id));
        };
        record.config = config.clone();
        record.refreshes += 1;
        Ok(())
    }

    fn set_opacity(&mut self, id: LayerId, opacity: f64) {
        if let Some(record) = self.record(id) {
            record.opacity = Some(opacity);
        }
    }

    fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(record) = self.record(id) {
            record.visible = Some(visible);
        }
    }

    fn set_time(&mut self, id: LayerId, time: &str) {
        if let Some(record) = self.record(id) {
            record.time = Some(time.to_string());
        }
    }

    fn set_style(&mut self, id: LayerId, style: &VectorStyle) {
        if let Some(record) = self.record(id) {
            record.style = style.clone();
        }
    }

    fn add_feature_collection(&mut self, id: LayerId, features: &Value) {
        if let Some(record) = self.record(id) {
            record.features.push(features.clone());
        }
    }

    fn remove_all_features(&mut self, id: LayerId) {
        if let Some(record) = self.record(id) {
            record.features.clear();
        }
    }

    fn zoom_to(&mut self, target: &ZoomTarget) {
        self.zooms.push(*target);
    }

    fn invalidate_size(&mut self, width: u32, height: u32, animated: bool) {
        self.size_invalidations.push((width, height, animated));
    }
}
