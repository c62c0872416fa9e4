//! The slice of the IR graph that frame states depend on
//!
//! Frame states hold IR values in their slots and point to the scope of the method being
//! decoded. Both are allocated in arenas that live for exactly one compilation, so that handles
//! can be freely copied into every snapshot without reference counting.

use crate::kind::Kind;
use elsa::FrozenVec;
use typed_arena::Arena;

mod scope;
mod value;

pub use scope::*;
pub use value::*;

pub struct GraphArenas<'g> {
    value_arena: Arena<ValueData>,
    scope_arena: Arena<ScopeData<'g>>,
}

impl<'g> GraphArenas<'g> {
    pub fn new() -> Self {
        GraphArenas {
            value_arena: Arena::new(),
            scope_arena: Arena::new(),
        }
    }
}

impl<'g> Default for GraphArenas<'g> {
    fn default() -> Self {
        GraphArenas::new()
    }
}

/// Values and scopes created during one compilation
pub struct Graph<'g> {
    arenas: &'g GraphArenas<'g>,
    values: FrozenVec<&'g ValueData>,
    scopes: FrozenVec<&'g ScopeData<'g>>,
}

impl<'g> Graph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g GraphArenas<'g>) -> Self {
        Graph {
            arenas,
            values: FrozenVec::new(),
            scopes: FrozenVec::new(),
        }
    }

    /// Add a new value node to the graph
    pub fn add_value(&self, kind: Kind, label: impl Into<String>) -> ValueId<'g> {
        let data = &*self.arenas.value_arena.alloc(ValueData {
            id: self.values.len(),
            kind,
            label: label.into(),
        });
        self.values.push(data);
        ValueId(data)
    }

    /// Add the scope of the method being compiled
    pub fn add_root_scope(&self, name: impl Into<String>) -> ScopeId<'g> {
        self.add_scope(ScopeData::root(name))
    }

    /// Add the scope of a method inlined into `caller`
    pub fn add_inlined_scope(&self, caller: ScopeId<'g>, name: impl Into<String>) -> ScopeId<'g> {
        self.add_scope(ScopeData::inlined(caller, name))
    }

    fn add_scope(&self, data: ScopeData<'g>) -> ScopeId<'g> {
        let data = &*self.arenas.scope_arena.alloc(data);
        self.scopes.push(data);
        ScopeId(data)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Largest number of lock records needed by any scope in the compilation
    pub fn max_locks(&self) -> usize {
        self.scopes
            .iter()
            .map(ScopeData::minimum_number_of_locks)
            .max()
            .unwrap_or(0)
    }
}
