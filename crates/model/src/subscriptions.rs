use crate::store::AttrChange;

/// Explicit list of (attribute name, handler key) registrations for one
/// view, dispatched in registration order and disposed as a unit.
///
/// Handler keys are small copyable enums owned by the view; keeping the
/// handlers out of the list sidesteps leaked callbacks on teardown.
#[derive(Debug)]
pub struct Subscriptions<K> {
    entries: Vec<(String, K)>,
}

impl<K> Default for Subscriptions<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy> Subscriptions<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&mut self, name: impl Into<String>, key: K) {
        self.entries.push((name.into(), key));
    }

    /// Attribute names in registration order, duplicates included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Handlers registered for `name`, in registration order.
    pub fn handlers_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = K> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, k)| *k)
    }

    /// Flattens a drained change list into handler keys, preserving both
    /// change order and per-attribute registration order.
    pub fn dispatch(&self, changes: &[AttrChange]) -> Vec<K> {
        let mut keys = Vec::new();
        for change in changes {
            keys.extend(self.handlers_for(&change.name));
        }
        keys
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
