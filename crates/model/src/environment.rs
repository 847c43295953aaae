/// Host context injected at view construction instead of being read from
/// process or page globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// URL of the page hosting the widget, mirrored into the map model's
    /// read-only `window_url` attribute.
    pub page_url: String,
}

impl Environment {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
        }
    }
}
