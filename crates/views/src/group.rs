use model::WidgetId;
use sync::ViewList;

use crate::layer::LayerNode;
use crate::view::RenderableView;

/// View for a layer-group widget: a composite child whose own `layers`
/// attribute is reconciled with the same contract as the map's list.
/// Groups may nest.
#[derive(Debug)]
pub struct GroupView {
    widget: WidgetId,
    pub members: ViewList<WidgetId, LayerNode>,
}

impl GroupView {
    pub fn new(widget: WidgetId) -> Self {
        Self {
            widget,
            members: ViewList::new(),
        }
    }
}

impl RenderableView for GroupView {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn observed(&self) -> Vec<String> {
        vec!["layers".to_string()]
    }
}
