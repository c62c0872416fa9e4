use crate::kind::Kind;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Anything that can be stored in a frame slot
///
/// Frames only ever need to know the kind of the IR value they are holding (to check pushes and
/// pops, and to know how many slots it covers). Values are copied in and out of slots freely, so
/// they are expected to be cheap handles into some IR graph.
pub trait Value: Copy + Eq + fmt::Debug {
    fn kind(&self) -> Kind;
}

/// IR value node, allocated in a [`super::Graph`]
pub struct ValueData {
    /// Position of the value in the graph (order of allocation)
    pub id: usize,

    /// Kind of the value produced
    pub kind: Kind,

    /// Free-form description (eg. `param0`, `iadd`), only used for debugging
    pub label: String,
}

/// Handle to an IR value node
///
/// Identity is determined by the node the handle points to (ie. the pointer), not from the
/// underlying data: two distinct `iconst 1` nodes are different values.
#[derive(Copy, Clone)]
pub struct ValueId<'g>(pub(super) &'g ValueData);

impl<'g> ValueId<'g> {
    pub fn id(&self) -> usize {
        self.0.id
    }

    pub fn label(&self) -> &'g str {
        &self.0.label
    }
}

impl<'g> Value for ValueId<'g> {
    fn kind(&self) -> Kind {
        self.0.kind
    }
}

impl<'g> PartialEq for ValueId<'g> {
    fn eq(&self, other: &ValueId<'g>) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<'g> Eq for ValueId<'g> {}

impl<'g> Hash for ValueId<'g> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state)
    }
}

impl<'g> fmt::Debug for ValueId<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0.kind.type_char(), self.0.id)?;
        if !self.0.label.is_empty() {
            write!(f, "({})", self.0.label)?;
        }
        Ok(())
    }
}
