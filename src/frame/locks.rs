use crate::errors::{Error, Result};

/// Monitors held at a point in the method, in the order they were acquired
///
/// Most methods never lock anything, so the underlying vector is only allocated on the first
/// `lock`. An unallocated stack and an allocated but empty one hold the same monitors and compare
/// equal.
#[derive(Clone, Debug)]
pub struct LockStack<V> {
    held: Option<Vec<V>>,
}

impl<V> LockStack<V> {
    pub fn new() -> LockStack<V> {
        LockStack { held: None }
    }

    pub fn as_slice(&self) -> &[V] {
        self.held.as_deref().unwrap_or(&[])
    }
}

impl<V: Copy> LockStack<V> {
    /// Has any monitor ever been pushed onto this stack (or the one it was copied from)?
    pub fn is_allocated(&self) -> bool {
        self.held.is_some()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Monitor at some depth, counting from the outermost one
    pub fn get(&self, index: usize) -> Option<V> {
        self.as_slice().get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = V> + '_ {
        self.as_slice().iter().copied()
    }

    pub(super) fn push(&mut self, obj: V) {
        self.held.get_or_insert_with(Vec::new).push(obj);
    }

    pub(super) fn pop(&mut self) -> Result<V> {
        self.held
            .as_mut()
            .and_then(Vec::pop)
            .ok_or(Error::NoLockHeld)
    }
}

impl<V> Default for LockStack<V> {
    fn default() -> Self {
        LockStack::new()
    }
}

impl<V: PartialEq> PartialEq for LockStack<V> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<V: Eq> Eq for LockStack<V> {}
