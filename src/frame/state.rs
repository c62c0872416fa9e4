use super::{FrameBuffer, FrameStateBuilder, LockStack};
use crate::errors::Result;
use crate::ir::{ScopeId, Value};
use crate::kind::Kind;
use crate::settings::Settings;
use bitflags::bitflags;
use std::fmt;
use std::ops::Deref;

/// Contents of a frame, along with the read-only operations on them
///
/// A `Frame` is never handled directly: it is always owned by either a [`FrameState`] (frozen)
/// or a [`FrameStateBuilder`] (being mutated), both of which dereference to it. Anything that
/// only needs to inspect a frame should take a `&Frame`, so that it accepts either.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Frame<'g, V> {
    pub(super) buffer: FrameBuffer<V>,

    /// Scope of the method whose bytecode is being decoded
    pub(super) scope: ScopeId<'g>,

    pub(super) locks: LockStack<V>,

    /// Has a word-like value been pushed onto this frame or any frame it was copied from?
    pub(super) unsafe_mode: bool,

    pub(super) settings: Settings,
}

bitflags! {
    /// Parts of a frame to keep when copying it
    pub struct CopyParts: u8 {
        const LOCALS = 0b001;
        const STACK = 0b010;
        const LOCKS = 0b100;
    }
}

impl<'g, V: Value> Frame<'g, V> {
    pub(super) fn new(
        scope: ScopeId<'g>,
        max_locals: usize,
        max_stack: usize,
        settings: Settings,
    ) -> Frame<'g, V> {
        Frame {
            buffer: FrameBuffer::new(max_locals, max_stack),
            scope,
            locks: LockStack::new(),
            unsafe_mode: false,
            settings,
        }
    }

    pub fn scope(&self) -> ScopeId<'g> {
        self.scope
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn buffer(&self) -> &FrameBuffer<V> {
        &self.buffer
    }

    pub fn max_locals(&self) -> usize {
        self.buffer.max_locals()
    }

    pub fn max_stack(&self) -> usize {
        self.buffer.max_stack()
    }

    /// Number of slots used on the operand stack (`long` and `double` count twice)
    pub fn stack_size(&self) -> usize {
        self.buffer.stack_index()
    }

    pub fn is_stack_empty(&self) -> bool {
        self.stack_size() == 0
    }

    /// Are kind checks relaxed because a word-like value was pushed?
    pub fn is_unsafe(&self) -> bool {
        self.unsafe_mode
    }

    /// Value in a local variable (`None` if it is uninitialized or the high word of a wide value)
    pub fn local_at(&self, index: usize) -> Result<Option<V>> {
        self.buffer.local(index)
    }

    /// Value on the stack, counting from the bottom (`None` for the high word of a wide value)
    pub fn stack_at(&self, index: usize) -> Result<Option<V>> {
        self.buffer.stack_slot(index)
    }

    /// Value in the locals or stack, indexing both as one sequence
    pub fn value_at(&self, index: usize) -> Option<V> {
        self.buffer.value_at(index)
    }

    /// Number of locals plus the stack size
    pub fn values_size(&self) -> usize {
        self.buffer.values_size()
    }

    /// Initialized locals, with their index and kind
    pub fn locals(&self) -> impl Iterator<Item = (usize, Kind, V)> + '_ {
        self.buffer.locals()
    }

    /// Values on the stack from the bottom up, with their index and kind
    pub fn stack(&self) -> impl Iterator<Item = (usize, Kind, V)> + '_ {
        self.buffer.stack()
    }

    /// Held monitors, outermost first
    pub fn locks(&self) -> impl Iterator<Item = V> + '_ {
        self.locks.iter()
    }

    pub fn locks_size(&self) -> usize {
        self.locks.len()
    }

    pub fn lock_at(&self, index: usize) -> Option<V> {
        self.locks.get(index)
    }

    /// Every value this frame keeps alive: locals, then stack, then monitors
    pub fn live_values(&self) -> impl Iterator<Item = V> + '_ {
        live_values(&self.buffer, &self.locks)
    }

    /// Can this frame and `other` reach the same program point?
    ///
    /// They must have the same shape (locals, stack, monitors) and the same kinds on the stack.
    /// Locals may disagree since a merge can just kill locals that don't match.
    pub fn is_compatible_with(&self, other: &Frame<'g, V>) -> bool {
        if self.max_locals() != other.max_locals()
            || self.max_stack() != other.max_stack()
            || self.stack_size() != other.stack_size()
            || self.locks_size() != other.locks_size()
        {
            return false;
        }

        (0..self.stack_size()).all(|index| {
            let kind1 = self.buffer.stack_slot(index).ok().flatten().map(|v| v.kind());
            let kind2 = other.buffer.stack_slot(index).ok().flatten().map(|v| v.kind());
            kind1 == kind2
        })
    }

    /// Mutable copy of this frame
    pub fn to_builder(&self) -> FrameStateBuilder<'g, V> {
        FrameStateBuilder::from_frame(self.clone())
    }

    /// Mutable copy of only some parts of this frame
    ///
    /// Left out locals are uninitialized, a left out stack is empty, and left out monitors are
    /// not held.
    pub fn copy_with(&self, parts: CopyParts) -> FrameStateBuilder<'g, V> {
        let mut frame = Frame::new(
            self.scope,
            self.max_locals(),
            self.max_stack(),
            self.settings,
        );
        frame.unsafe_mode = self.unsafe_mode;
        if parts.contains(CopyParts::LOCALS) {
            frame.buffer.copy_locals_from(&self.buffer);
        }
        if parts.contains(CopyParts::STACK) {
            frame.buffer.copy_stack_from(&self.buffer);
        }
        if parts.contains(CopyParts::LOCKS) {
            frame.locks = self.locks.clone();
        }
        FrameStateBuilder::from_frame(frame)
    }
}

fn live_values<'a, V: Value>(
    buffer: &'a FrameBuffer<V>,
    locks: &'a LockStack<V>,
) -> impl Iterator<Item = V> + 'a {
    buffer
        .locals()
        .chain(buffer.stack())
        .map(|(_, _, value)| value)
        .chain(locks.iter())
}

/// Renders as eg. `Foo.bar()V@0 [i0 _ | j1 _ a2 | locks a2]` (`_` is an empty slot)
impl<'g, V: Value> fmt::Display for Frame<'g, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot<V: fmt::Debug>(f: &mut fmt::Formatter<'_>, slot: Option<V>) -> fmt::Result {
            match slot {
                Some(value) => write!(f, " {:?}", value),
                None => f.write_str(" _"),
            }
        }

        write!(f, "{:?} [", self.scope)?;
        for index in 0..self.max_locals() {
            slot(f, self.value_at(index))?;
        }
        f.write_str(" |")?;
        for index in self.max_locals()..self.values_size() {
            slot(f, self.value_at(index))?;
        }
        if !self.locks.is_empty() {
            f.write_str(" | locks")?;
            for lock in self.locks() {
                write!(f, " {:?}", lock)?;
            }
        }
        f.write_str(" ]")?;
        if self.unsafe_mode {
            f.write_str(" unsafe")?;
        }
        Ok(())
    }
}

/// Frozen snapshot of a frame
///
/// Frame states get attached to whatever needs to remember the frame at some point in the
/// bytecode: block entries, exception handlers, deoptimization points, inlined call sites. Since
/// they are shared that way, there is no way to modify one. Continuing to decode from a frame
/// state means first making a mutable copy with [`Frame::to_builder`] or [`Frame::copy_with`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FrameState<'g, V> {
    frame: Frame<'g, V>,
}

impl<'g, V: Value> FrameState<'g, V> {
    pub(super) fn from_frame(frame: Frame<'g, V>) -> FrameState<'g, V> {
        FrameState { frame }
    }

    pub fn as_frame(&self) -> &Frame<'g, V> {
        &self.frame
    }
}

impl<'g, V> Deref for FrameState<'g, V> {
    type Target = Frame<'g, V>;

    fn deref(&self) -> &Frame<'g, V> {
        &self.frame
    }
}

impl<'g, V: Value> fmt::Display for FrameState<'g, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.frame, f)
    }
}
