use model::WidgetId;

/// Minimal capability surface a concrete widget view implements.
///
/// Kept deliberately small: views are composed from an attribute store,
/// an explicit subscription list, and a rendering handle, not from a
/// base-class hierarchy.
pub trait RenderableView {
    fn widget(&self) -> WidgetId;

    /// Attribute names this view reacts to, in registration order.
    fn observed(&self) -> Vec<String>;
}
