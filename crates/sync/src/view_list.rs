use std::collections::BTreeSet;

use tracing::warn;

/// Child construction failure. The failed id is treated as absent and
/// synchronization of the remaining ids continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    pub reason: String,
}

impl BindError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "child materialization failed: {}", self.reason)
    }
}

impl std::error::Error for BindError {}

/// Outcome of a `materialize` call: either the handle exists now, or
/// construction needs a round trip and will be delivered to
/// [`ViewList::resolve`] later.
#[derive(Debug)]
pub enum Materialized<H> {
    Ready(H),
    Pending,
}

/// The two callbacks the synchronizer drives.
///
/// Each live child id owns exactly one handle; `dispose` receives the
/// handle back exactly once.
pub trait ChildBinder<I, H> {
    fn materialize(&mut self, id: &I) -> Result<Materialized<H>, BindError>;
    fn dispose(&mut self, handle: H);
}

#[derive(Debug)]
enum Slot<H> {
    /// Materialization is in flight; no handle exists yet.
    Pending,
    Resolved(H),
}

#[derive(Debug)]
struct Entry<I, H> {
    id: I,
    slot: Slot<H>,
}

/// What one `update` pass actually did, for callers that want to assert
/// or report on it. Failures are also logged as they happen.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport<I> {
    pub materialized: Vec<I>,
    pub disposed: Vec<I>,
    pub failures: Vec<(I, BindError)>,
}

impl<I> Default for SyncReport<I> {
    fn default() -> Self {
        Self {
            materialized: Vec::new(),
            disposed: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Reconciles an ordered list of child ids against a parallel list of
/// live handles.
///
/// Additions and removals are applied exactly once, idempotently,
/// regardless of how many times `update` is invoked with the same list,
/// and an `update` arriving while a previous materialization is still in
/// flight never constructs the same id twice. There is no cancellation:
/// a superseded in-flight construction is compensated with a dispose
/// once it resolves.
#[derive(Debug)]
pub struct ViewList<I, H> {
    entries: Vec<Entry<I, H>>,
    /// In-flight ids that are no longer requested; their late handles
    /// are disposed on arrival.
    stale: Vec<I>,
}

impl<I, H> Default for ViewList<I, H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            stale: Vec::new(),
        }
    }
}

impl<I, H> ViewList<I, H>
where
    I: Clone + Ord + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requested ids currently tracked (resolved or pending).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &I) -> bool {
        self.entries.iter().any(|e| &e.id == id)
    }

    /// Whether a late resolution for `id` would be routed to this list,
    /// either into a pending entry or as a stale compensation.
    pub fn tracks(&self, id: &I) -> bool {
        self.contains(id) || self.stale.contains(id)
    }

    pub fn is_pending(&self, id: &I) -> bool {
        self.entries
            .iter()
            .any(|e| &e.id == id && matches!(e.slot, Slot::Pending))
    }

    /// Ids in current order.
    pub fn ids(&self) -> Vec<I> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Resolved handles in current id order; unresolved entries are
    /// skipped.
    pub fn handles(&self) -> impl Iterator<Item = &H> {
        self.entries.iter().filter_map(|e| match &e.slot {
            Slot::Resolved(h) => Some(h),
            Slot::Pending => None,
        })
    }

    pub fn handles_mut(&mut self) -> impl Iterator<Item = &mut H> {
        self.entries.iter_mut().filter_map(|e| match &mut e.slot {
            Slot::Resolved(h) => Some(h),
            Slot::Pending => None,
        })
    }

    pub fn handle_of(&self, id: &I) -> Option<&H> {
        self.entries.iter().find(|e| &e.id == id).and_then(|e| {
            match &e.slot {
                Slot::Resolved(h) => Some(h),
                Slot::Pending => None,
            }
        })
    }

    pub fn handle_of_mut(&mut self, id: &I) -> Option<&mut H> {
        self.entries
            .iter_mut()
            .find(|e| &e.id == id)
            .and_then(|e| match &mut e.slot {
                Slot::Resolved(h) => Some(h),
                Slot::Pending => None,
            })
    }

    /// Reconciles the tracked children against `ids`.
    ///
    /// Duplicate ids in the request keep their first occurrence; callers
    /// are expected to have validated the list model-side.
    pub fn update<B: ChildBinder<I, H>>(&mut self, ids: &[I], binder: &mut B) -> SyncReport<I> {
        let mut report = SyncReport::default();

        let mut requested = BTreeSet::new();
        let mut ordered: Vec<I> = Vec::with_capacity(ids.len());
        for id in ids {
            if requested.insert(id.clone()) {
                ordered.push(id.clone());
            }
        }

        // Removals first, so a swap of ids never holds two handles at once.
        let mut kept: Vec<Entry<I, H>> = Vec::with_capacity(ordered.len());
        for entry in self.entries.drain(..) {
            if requested.contains(&entry.id) {
                kept.push(entry);
                continue;
            }
            match entry.slot {
                Slot::Resolved(handle) => {
                    binder.dispose(handle);
                    report.disposed.push(entry.id);
                }
                // Still in flight: compensate once it resolves.
                Slot::Pending => self.stale.push(entry.id),
            }
        }

        // Rebuild in requested order, materializing only genuinely new ids.
        for id in ordered {
            if let Some(pos) = kept.iter().position(|e| e.id == id) {
                self.entries.push(kept.swap_remove(pos));
                continue;
            }
            if let Some(pos) = self.stale.iter().position(|s| *s == id) {
                // Re-requested while its first construction is still in
                // flight: reinstate the pending entry, do not build twice.
                self.stale.swap_remove(pos);
                self.entries.push(Entry {
                    id,
                    slot: Slot::Pending,
                });
                continue;
            }
            match binder.materialize(&id) {
                Ok(Materialized::Ready(handle)) => {
                    report.materialized.push(id.clone());
                    self.entries.push(Entry {
                        id,
                        slot: Slot::Resolved(handle),
                    });
                }
                Ok(Materialized::Pending) => {
                    report.materialized.push(id.clone());
                    self.entries.push(Entry {
                        id,
                        slot: Slot::Pending,
                    });
                }
                Err(err) => {
                    warn!(id = ?id, error = %err, "child materialization rejected");
                    report.failures.push((id, err));
                }
            }
        }

        debug_assert!(kept.is_empty());
        report
    }

    /// Delivers the outcome of an asynchronous materialization.
    ///
    /// Returns `true` if the handle was installed. A handle arriving for
    /// an id that is no longer requested is disposed immediately; a
    /// failure removes the id, leaving siblings untouched.
    pub fn resolve<B: ChildBinder<I, H>>(
        &mut self,
        id: &I,
        result: Result<H, BindError>,
        binder: &mut B,
    ) -> bool {
        if let Some(pos) = self.stale.iter().position(|s| s == id) {
            self.stale.swap_remove(pos);
            if let Ok(handle) = result {
                binder.dispose(handle);
            }
            return false;
        }

        let Some(pos) = self
            .entries
            .iter()
            .position(|e| &e.id == id && matches!(e.slot, Slot::Pending))
        else {
            // Unknown or already-resolved id: never leak the handle.
            if let Ok(handle) = result {
                warn!(id = ?id, "late handle for untracked child, disposing");
                binder.dispose(handle);
            }
            return false;
        };

        match result {
            Ok(handle) => {
                self.entries[pos].slot = Slot::Resolved(handle);
                true
            }
            Err(err) => {
                warn!(id = ?id, error = %err, "child materialization failed");
                self.entries.remove(pos);
                false
            }
        }
    }

    /// Disposes every resolved handle and marks in-flight constructions
    /// stale so their late handles are disposed on arrival.
    pub fn clear<B: ChildBinder<I, H>>(&mut self, binder: &mut B) -> SyncReport<I> {
        let mut report = SyncReport::default();
        for entry in self.entries.drain(..) {
            match entry.slot {
                Slot::Resolved(handle) => {
                    binder.dispose(handle);
                    report.disposed.push(entry.id);
                }
                Slot::Pending => self.stale.push(entry.id),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::{BindError, ChildBinder, Materialized, ViewList};
    use pretty_assertions::assert_eq;

    /// Test binder with scriptable deferral and rejection.
    #[derive(Debug, Default)]
    struct Recorder {
        next_handle: u64,
        defer: Vec<u32>,
        reject: Vec<u32>,
        materialize_calls: Vec<u32>,
        dispose_calls: Vec<u64>,
    }

    impl ChildBinder<u32, u64> for Recorder {
        fn materialize(&mut self, id: &u32) -> Result<Materialized<u64>, BindError> {
            self.materialize_calls.push(*id);
            if self.reject.contains(id) {
                return Err(BindError::new(format!("rejected {id}")));
            }
            if self.defer.contains(id) {
                return Ok(Materialized::Pending);
            }
            self.next_handle += 1;
            Ok(Materialized::Ready(self.next_handle))
        }

        fn dispose(&mut self, handle: u64) {
            self.dispose_calls.push(handle);
        }
    }

    #[test]
    fn final_set_matches_last_request() {
        let mut binder = Recorder::default();
        let mut list = ViewList::new();

        list.update(&[1, 2], &mut binder);
        list.update(&[2, 3], &mut binder);

        assert_eq!(list.ids(), vec![2, 3]);
        // One materialize per net addition, one dispose per net removal.
        assert_eq!(binder.materialize_calls, vec![1, 2, 3]);
        assert_eq!(binder.dispose_calls.len(), 1);
    }

    #[test]
    fn repeated_update_is_idempotent() {
        let mut binder = Recorder::default();
        let mut list = ViewList::new();

        list.update(&[1, 2], &mut binder);
        let report = list.update(&[1, 2], &mut binder);

        assert!(report.materialized.is_empty());
        assert!(report.disposed.is_empty());
        assert_eq!(binder.materialize_calls, vec![1, 2]);
        assert!(binder.dispose_calls.is_empty());
    }

    #[test]
    fn unchanged_entries_keep_their_handle_and_order() {
        let mut binder = Recorder::default();
        let mut list = ViewList::new();

        list.update(&[1, 2], &mut binder);
        let kept = *list.handle_of(&2).unwrap();
        list.update(&[2, 3], &mut binder);

        assert_eq!(list.handle_of(&2), Some(&kept));
        assert_eq!(list.ids(), vec![2, 3]);
    }

    #[test]
    fn overlapping_update_never_duplicates_a_pending_id() {
        let mut binder = Recorder {
            defer: vec![7],
            ..Recorder::default()
        };
        let mut list = ViewList::new();

        list.update(&[7], &mut binder);
        assert!(list.is_pending(&7));
        // Second update while construction is in flight.
        list.update(&[7, 8], &mut binder);

        assert_eq!(binder.materialize_calls, vec![7, 8]);
        assert!(list.resolve(&7, Ok(99), &mut binder));
        assert_eq!(list.handle_of(&7), Some(&99));
    }

    #[test]
    fn removal_crossing_inflight_addition_compensates() {
        let mut binder = Recorder {
            defer: vec![7],
            ..Recorder::default()
        };
        let mut list = ViewList::new();

        list.update(&[7], &mut binder);
        // Dropped before the construction resolves.
        list.update(&[], &mut binder);
        assert!(list.is_empty());

        assert!(!list.resolve(&7, Ok(99), &mut binder));
        assert_eq!(binder.dispose_calls, vec![99]);
        assert_eq!(binder.materialize_calls, vec![7]);
    }

    #[test]
    fn rerequest_while_inflight_reinstates_without_rebuild() {
        let mut binder = Recorder {
            defer: vec![7],
            ..Recorder::default()
        };
        let mut list = ViewList::new();

        list.update(&[7], &mut binder);
        list.update(&[], &mut binder);
        list.update(&[7], &mut binder);

        assert_eq!(binder.materialize_calls, vec![7]);
        assert!(list.resolve(&7, Ok(42), &mut binder));
        assert_eq!(list.handle_of(&7), Some(&42));
        assert!(binder.dispose_calls.is_empty());
    }

    #[test]
    fn rejection_leaves_siblings_synchronized() {
        let mut binder = Recorder {
            reject: vec![2],
            ..Recorder::default()
        };
        let mut list = ViewList::new();

        let report = list.update(&[1, 2, 3], &mut binder);

        assert_eq!(list.ids(), vec![1, 3]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, 2);
        assert_eq!(list.handles().count(), 2);
    }

    #[test]
    fn async_failure_removes_only_that_id() {
        let mut binder = Recorder {
            defer: vec![2],
            ..Recorder::default()
        };
        let mut list = ViewList::new();

        list.update(&[1, 2, 3], &mut binder);
        assert!(!list.resolve(&2, Err(BindError::new("boom")), &mut binder));

        assert_eq!(list.ids(), vec![1, 3]);
        assert_eq!(list.handles().count(), 2);
    }

    #[test]
    fn clear_disposes_everything_and_strands_inflight() {
        let mut binder = Recorder {
            defer: vec![3],
            ..Recorder::default()
        };
        let mut list = ViewList::new();

        list.update(&[1, 2, 3], &mut binder);
        let report = list.clear(&mut binder);

        assert_eq!(report.disposed, vec![1, 2]);
        assert!(list.is_empty());
        // The in-flight child is disposed when it finally arrives.
        list.resolve(&3, Ok(55), &mut binder);
        assert_eq!(binder.dispose_calls.len(), 3);
    }

    #[test]
    fn duplicate_request_ids_collapse_to_first_occurrence() {
        let mut binder = Recorder::default();
        let mut list = ViewList::new();

        list.update(&[5, 5, 6], &mut binder);
        assert_eq!(list.ids(), vec![5, 6]);
        assert_eq!(binder.materialize_calls, vec![5, 6]);
    }
}
