use crate::errors::{Error, Result};
use crate::ir::Value;
use crate::kind::Kind;
use std::fmt;

/// Local variables followed by the operand stack, in one flat vector of slots
///
/// The first `max_locals` slots are the local variables. The operand stack starts right after and
/// grows up to `max_stack` slots. Only the first `stack_index` stack slots are live: whatever is
/// above is left over from earlier pushes and is never read.
///
/// A slot is either a value or empty. Empty local slots are uninitialized locals. Empty live stack
/// slots are always the high word of a `long` or `double` sitting right below.
#[derive(Clone)]
pub struct FrameBuffer<V> {
    max_locals: usize,
    stack_index: usize,
    slots: Vec<Option<V>>,
}

impl<V> FrameBuffer<V> {
    pub fn max_locals(&self) -> usize {
        self.max_locals
    }

    pub fn max_stack(&self) -> usize {
        self.slots.len() - self.max_locals
    }

    /// Number of live stack slots
    pub fn stack_index(&self) -> usize {
        self.stack_index
    }

    /// Number of slots holding either locals or live stack
    pub fn values_size(&self) -> usize {
        self.max_locals + self.stack_index
    }
}

impl<V: Value> FrameBuffer<V> {
    /// Buffer with every slot empty
    pub fn new(max_locals: usize, max_stack: usize) -> FrameBuffer<V> {
        FrameBuffer {
            max_locals,
            stack_index: 0,
            slots: vec![None; max_locals + max_stack],
        }
    }

    pub fn local(&self, index: usize) -> Result<Option<V>> {
        if index < self.max_locals {
            Ok(self.slots[index])
        } else {
            Err(Error::LocalIndexOutOfRange {
                index,
                max_locals: self.max_locals,
            })
        }
    }

    /// Live stack slot, counting from the bottom of the stack
    pub fn stack_slot(&self, index: usize) -> Result<Option<V>> {
        if index < self.stack_index {
            Ok(self.slots[self.max_locals + index])
        } else {
            Err(Error::StackIndexOutOfRange {
                index,
                stack_size: self.stack_index,
            })
        }
    }

    /// Slot in the locals or live stack (`None` when empty or out of range)
    pub fn value_at(&self, index: usize) -> Option<V> {
        if index < self.values_size() {
            self.slots[index]
        } else {
            None
        }
    }

    /// Populated local variables, with their index
    pub fn locals(&self) -> impl Iterator<Item = (usize, Kind, V)> + '_ {
        populated(&self.slots[..self.max_locals])
    }

    /// Values on the live stack, with their index from the bottom of the stack
    ///
    /// High words of wide values are skipped, so the indices may have gaps.
    pub fn stack(&self) -> impl Iterator<Item = (usize, Kind, V)> + '_ {
        populated(&self.slots[self.max_locals..self.values_size()])
    }

    pub(super) fn push(&mut self, slot: Option<V>) -> Result<()> {
        if self.stack_index >= self.max_stack() {
            return Err(Error::StackOverflow {
                max_stack: self.max_stack(),
            });
        }
        self.slots[self.max_locals + self.stack_index] = slot;
        self.stack_index += 1;
        Ok(())
    }

    pub(super) fn pop(&mut self) -> Result<Option<V>> {
        if self.stack_index == 0 {
            return Err(Error::EmptyStack);
        }
        self.stack_index -= 1;
        Ok(self.slots[self.max_locals + self.stack_index])
    }

    /// Move the top of the stack without touching slot contents
    ///
    /// Callers must ensure `stack_index <= max_stack`.
    pub(super) fn set_stack_index(&mut self, stack_index: usize) {
        debug_assert!(stack_index <= self.max_stack());
        self.stack_index = stack_index;
    }

    /// Callers must ensure `index < max_locals`.
    pub(super) fn set_local(&mut self, index: usize, slot: Option<V>) {
        debug_assert!(index < self.max_locals);
        self.slots[index] = slot;
    }

    pub(super) fn clear_locals(&mut self) {
        for slot in &mut self.slots[..self.max_locals] {
            *slot = None;
        }
    }

    /// Copy the whole locals region of a buffer with the same `max_locals`
    pub(super) fn copy_locals_from(&mut self, other: &FrameBuffer<V>) {
        debug_assert_eq!(self.max_locals, other.max_locals);
        let max_locals = self.max_locals;
        self.slots[..max_locals].copy_from_slice(&other.slots[..max_locals]);
    }

    /// Copy the live stack of a buffer whose stack fits in this one
    pub(super) fn copy_stack_from(&mut self, other: &FrameBuffer<V>) {
        debug_assert!(other.stack_index <= self.max_stack());
        let to = self.max_locals;
        let from = other.max_locals;
        let len = other.stack_index;
        self.slots[to..to + len].copy_from_slice(&other.slots[from..from + len]);
        self.stack_index = len;
    }
}

fn populated<V: Value>(slots: &[Option<V>]) -> impl Iterator<Item = (usize, Kind, V)> + '_ {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| slot.map(|value| (index, value.kind(), value)))
}

/// Buffers are equal when their locals and live stacks are (dead stack slots are ignored)
impl<V: PartialEq> PartialEq for FrameBuffer<V> {
    fn eq(&self, other: &Self) -> bool {
        self.max_locals == other.max_locals
            && self.max_stack() == other.max_stack()
            && self.stack_index == other.stack_index
            && self.slots[..self.values_size()] == other.slots[..other.values_size()]
    }
}

impl<V: Eq> Eq for FrameBuffer<V> {}

impl<V: fmt::Debug> fmt::Debug for FrameBuffer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("locals", &&self.slots[..self.max_locals])
            .field("stack", &&self.slots[self.max_locals..self.values_size()])
            .field("max_stack", &self.max_stack())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    struct Const(Kind, i64);

    impl Value for Const {
        fn kind(&self) -> Kind {
            self.0
        }
    }

    #[test]
    fn regions() {
        let mut buffer: FrameBuffer<Const> = FrameBuffer::new(2, 3);
        assert_eq!((buffer.max_locals(), buffer.max_stack()), (2, 3));
        assert_eq!(buffer.values_size(), 2);

        buffer.set_local(1, Some(Const(Kind::Int, 7)));
        buffer.push(Some(Const(Kind::Long, 8))).unwrap();
        buffer.push(None).unwrap();

        assert_eq!(buffer.local(0), Ok(None));
        assert_eq!(buffer.local(1), Ok(Some(Const(Kind::Int, 7))));
        assert!(matches!(
            buffer.local(2),
            Err(Error::LocalIndexOutOfRange { index: 2, max_locals: 2 })
        ));
        assert_eq!(buffer.stack_slot(0), Ok(Some(Const(Kind::Long, 8))));
        assert_eq!(buffer.stack_slot(1), Ok(None));
        assert!(matches!(
            buffer.stack_slot(2),
            Err(Error::StackIndexOutOfRange { index: 2, stack_size: 2 })
        ));
        assert_eq!(buffer.value_at(2), Some(Const(Kind::Long, 8)));
        assert_eq!(buffer.value_at(4), None);

        let stack: Vec<_> = buffer.stack().collect();
        assert_eq!(stack, vec![(0, Kind::Long, Const(Kind::Long, 8))]);
        let locals: Vec<_> = buffer.locals().collect();
        assert_eq!(locals, vec![(1, Kind::Int, Const(Kind::Int, 7))]);
    }

    #[test]
    fn overflow_and_underflow() {
        let mut buffer: FrameBuffer<Const> = FrameBuffer::new(0, 1);
        assert_eq!(buffer.pop(), Err(Error::EmptyStack));
        buffer.push(Some(Const(Kind::Int, 1))).unwrap();
        assert_eq!(
            buffer.push(Some(Const(Kind::Int, 2))),
            Err(Error::StackOverflow { max_stack: 1 })
        );
        assert_eq!(buffer.pop(), Ok(Some(Const(Kind::Int, 1))));
    }

    #[test]
    fn equality_ignores_dead_stack() {
        let mut buffer1: FrameBuffer<Const> = FrameBuffer::new(1, 2);
        let buffer2: FrameBuffer<Const> = FrameBuffer::new(1, 2);

        buffer1.push(Some(Const(Kind::Float, 3))).unwrap();
        assert_ne!(buffer1, buffer2);
        buffer1.set_stack_index(0);
        assert_eq!(buffer1, buffer2);
    }
}
