/// Re-entrancy guard between engine-originated events and store writes.
///
/// Purely cooperative: a view sets the flag before writing an
/// engine-originated value back into its store and clears it afterwards;
/// the attribute handler for that same value skips itself while the flag
/// is set, which is what breaks the feedback loop.
#[derive(Debug, Default)]
pub struct DirtyGuard {
    set: bool,
}

impl DirtyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Returns `false` if the guard was already set (re-entrant call).
    pub fn set(&mut self) -> bool {
        if self.set {
            return false;
        }
        self.set = true;
        true
    }

    pub fn clear(&mut self) {
        self.set = false;
    }
}

#[cfg(test)]
mod tests {
    use super::DirtyGuard;

    #[test]
    fn reentrant_set_is_refused() {
        let mut guard = DirtyGuard::new();
        assert!(guard.set());
        assert!(!guard.set());
        guard.clear();
        assert!(guard.set());
    }
}
