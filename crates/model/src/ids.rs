/// Identifies a widget model in a deterministic, stable way.
///
/// This is intentionally a small, copyable handle so child lists can be
/// diffed and routed without heap allocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(pub u64);
