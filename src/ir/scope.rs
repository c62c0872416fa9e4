use std::cell::Cell;
use std::fmt;

/// Lexical scope of a method being compiled: either the root method of the compilation or a
/// method inlined into it
///
/// Many frame states (one per block boundary, handler, etc.) point at the same scope, and all of
/// them may report lock nesting to it. The only mutable part of a scope is its minimum number of
/// locks, which only ever grows, so the order in which frame states report does not matter.
pub struct ScopeData<'g> {
    /// Name of the method (eg. `java/lang/String.hashCode()I`)
    pub name: String,

    /// Scope into which this one is inlined (missing for the root method)
    pub caller: Option<ScopeId<'g>>,

    /// Inlining depth (0 for the root method)
    pub level: usize,

    /// Largest number of monitors simultaneously held so far
    minimum_number_of_locks: Cell<usize>,
}

impl<'g> ScopeData<'g> {
    pub fn root(name: impl Into<String>) -> ScopeData<'g> {
        ScopeData {
            name: name.into(),
            caller: None,
            level: 0,
            minimum_number_of_locks: Cell::new(0),
        }
    }

    pub fn inlined(caller: ScopeId<'g>, name: impl Into<String>) -> ScopeData<'g> {
        ScopeData {
            name: name.into(),
            caller: Some(caller),
            level: caller.level + 1,
            minimum_number_of_locks: Cell::new(0),
        }
    }

    /// Number of lock records the activation of this scope needs room for
    pub fn minimum_number_of_locks(&self) -> usize {
        self.minimum_number_of_locks.get()
    }

    /// Record that at least `locks` monitors may be held at once
    ///
    /// Only has an effect if `locks` is greater than the previous minimum.
    pub fn set_minimum_number_of_locks(&self, locks: usize) {
        let previous = self.minimum_number_of_locks.get();
        if locks > previous {
            log::trace!(
                "Scope {} needs {} lock(s) (was {})",
                self.name,
                locks,
                previous
            );
            self.minimum_number_of_locks.set(locks);
        }
    }
}

/// Handle to a scope allocated in a [`super::Graph`]
#[derive(Copy, Clone)]
pub struct ScopeId<'g>(pub(super) &'g ScopeData<'g>);

impl<'g> std::ops::Deref for ScopeId<'g> {
    type Target = ScopeData<'g>;

    fn deref(&self) -> &ScopeData<'g> {
        self.0
    }
}

impl<'g> PartialEq for ScopeId<'g> {
    fn eq(&self, other: &ScopeId<'g>) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<'g> Eq for ScopeId<'g> {}

impl<'g> fmt::Debug for ScopeId<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.0.name, self.0.level)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn minimum_locks_never_decrease() {
        let scope = ScopeData::root("Foo.bar()V");
        assert_eq!(scope.minimum_number_of_locks(), 0);

        for (requested, expected) in [(1, 1), (3, 3), (2, 3), (0, 3), (4, 4)] {
            scope.set_minimum_number_of_locks(requested);
            assert_eq!(scope.minimum_number_of_locks(), expected);
        }
    }
}
