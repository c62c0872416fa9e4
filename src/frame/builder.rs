use super::{Frame, FrameState};
use crate::errors::{Error, Result};
use crate::ir::{ScopeId, Value};
use crate::kind::Kind;
use crate::settings::Settings;
use std::fmt;
use std::ops::Deref;

/// Frame being updated as bytecode is decoded
///
/// This is the only way to modify a frame. Every operation checks its preconditions before
/// touching anything, so a builder that returned an error is left exactly as it was.
///
/// Builders are not `Clone`: handing a frame to other parts of the compiler goes
/// through [`FrameStateBuilder::immutable_copy`] (or [`FrameStateBuilder::freeze`]), and forking
/// decoding goes through [`Frame::to_builder`].
#[derive(Debug)]
pub struct FrameStateBuilder<'g, V> {
    frame: Frame<'g, V>,
}

impl<'g, V: Value> FrameStateBuilder<'g, V> {
    /// Empty frame, with default settings
    pub fn new(scope: ScopeId<'g>, max_locals: usize, max_stack: usize) -> Self {
        Self::with_settings(scope, max_locals, max_stack, Settings::default())
    }

    /// Empty frame
    pub fn with_settings(
        scope: ScopeId<'g>,
        max_locals: usize,
        max_stack: usize,
        settings: Settings,
    ) -> Self {
        FrameStateBuilder {
            frame: Frame::new(scope, max_locals, max_stack, settings),
        }
    }

    /// Frame on entry to a method, with its parameters in the first locals
    ///
    /// For an inlined method, the parameters are the arguments popped off the caller's stack.
    pub fn method_entry(
        scope: ScopeId<'g>,
        max_locals: usize,
        max_stack: usize,
        parameters: &[V],
    ) -> Result<Self> {
        let mut builder = Self::new(scope, max_locals, max_stack);
        builder.store_parameters(parameters)?;
        Ok(builder)
    }

    pub(super) fn from_frame(frame: Frame<'g, V>) -> Self {
        FrameStateBuilder { frame }
    }

    /// Snapshot of the frame, independent from any further changes to this builder
    pub fn immutable_copy(&self) -> FrameState<'g, V> {
        FrameState::from_frame(self.frame.clone())
    }

    /// Turn the builder into a snapshot, when there is nothing more to decode from it
    pub fn freeze(self) -> FrameState<'g, V> {
        log::debug!("Freezing {}", self.frame);
        FrameState::from_frame(self.frame)
    }

    /// Push a value of the given kind (high word included for wide kinds)
    ///
    /// Pushing a word-like value switches the frame into unsafe mode.
    pub fn push(&mut self, kind: Kind, value: V) -> Result<()> {
        self.check_storable(kind)?;
        let value = self.check_kind(kind, value)?;

        let width = kind.slot_width();
        if self.stack_size() + width > self.max_stack() {
            return Err(fault(Error::StackOverflow {
                max_stack: self.max_stack(),
            }));
        }
        self.frame.buffer.push(Some(value))?;
        if width == 2 {
            self.frame.buffer.push(None)?;
        }

        if kind.is_word_like() {
            self.enter_unsafe_mode(kind);
        }
        Ok(())
    }

    /// Push a raw slot, without checking anything about it
    ///
    /// This is what instructions like `dup2` or `swap`, which shuffle slots around regardless of
    /// what they hold, are built on.
    pub fn xpush(&mut self, slot: Option<V>) -> Result<()> {
        self.frame.buffer.push(slot).map_err(fault)
    }

    /// Push an `int` (or `boolean`, `byte`, `char`, `short`)
    pub fn ipush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Int, value)
    }

    pub fn fpush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Float, value)
    }

    /// Push an object reference
    pub fn apush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Object, value)
    }

    /// Push a machine word (switches the frame into unsafe mode)
    pub fn wpush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Word, value)
    }

    /// Push a `jsr` return address (switches the frame into unsafe mode)
    pub fn jpush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Jsr, value)
    }

    pub fn lpush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Long, value)
    }

    pub fn dpush(&mut self, value: V) -> Result<()> {
        self.push(Kind::Double, value)
    }

    /// Pop a value of the given kind (high word included for wide kinds)
    pub fn pop(&mut self, kind: Kind) -> Result<V> {
        if kind.is_void() {
            return Err(Error::VoidKind);
        }

        let width = kind.slot_width();
        let stack_size = self.stack_size();
        if stack_size < width {
            return Err(fault(Error::EmptyStack));
        }
        let low = stack_size - width;
        if width == 2 && self.frame.buffer.stack_slot(low + 1)?.is_some() {
            return Err(fault(Error::CorruptHighWord {
                slot: self.max_locals() + low + 1,
            }));
        }

        let value = match self.frame.buffer.stack_slot(low)? {
            Some(value) => self.check_kind(kind, value)?,
            None => {
                return Err(fault(Error::MissingValue {
                    slot: self.max_locals() + low,
                }))
            }
        };
        self.frame.buffer.set_stack_index(low);
        Ok(value)
    }

    /// Pop a raw slot, without checking anything about it
    pub fn xpop(&mut self) -> Result<Option<V>> {
        self.frame.buffer.pop().map_err(fault)
    }

    pub fn ipop(&mut self) -> Result<V> {
        self.pop(Kind::Int)
    }

    pub fn fpop(&mut self) -> Result<V> {
        self.pop(Kind::Float)
    }

    pub fn apop(&mut self) -> Result<V> {
        self.pop(Kind::Object)
    }

    pub fn wpop(&mut self) -> Result<V> {
        self.pop(Kind::Word)
    }

    pub fn jpop(&mut self) -> Result<V> {
        self.pop(Kind::Jsr)
    }

    pub fn lpop(&mut self) -> Result<V> {
        self.pop(Kind::Long)
    }

    pub fn dpop(&mut self) -> Result<V> {
        self.pop(Kind::Double)
    }

    /// Pop the arguments of a call
    ///
    /// `size` is the number of stack slots the arguments take up (as in
    /// [`Frame::stack_size`], so wide arguments count twice). The arguments are returned in the
    /// order they were pushed, without high words, so there can be fewer of them than `size`.
    pub fn pop_arguments(&mut self, size: usize) -> Result<Vec<V>> {
        let stack_size = self.stack_size();
        if size > stack_size {
            return Err(fault(Error::EmptyStack));
        }

        let base = stack_size - size;
        let mut arguments = Vec::with_capacity(size);
        let mut after_wide = false;
        for index in base..stack_size {
            match self.frame.buffer.stack_slot(index)? {
                Some(argument) => {
                    after_wide = argument.kind().is_wide();
                    arguments.push(argument);
                }
                None if after_wide => after_wide = false,
                None => {
                    return Err(fault(Error::MissingValue {
                        slot: self.max_locals() + index,
                    }))
                }
            }
        }

        self.frame.buffer.set_stack_index(base);
        Ok(arguments)
    }

    /// Drop everything on the stack above `size` slots
    pub fn truncate_stack(&mut self, size: usize) -> Result<()> {
        let stack_size = self.stack_size();
        if size > stack_size {
            return Err(fault(Error::TruncateAboveStack { size, stack_size }));
        }
        if 0 < size && size < stack_size {
            let below = self.frame.buffer.stack_slot(size - 1)?;
            let above = self.frame.buffer.stack_slot(size)?;
            if let (Some(value), None) = (below, above) {
                if value.kind().is_wide() {
                    return Err(fault(Error::SplitsWideValue { size }));
                }
            }
        }

        self.frame.buffer.set_stack_index(size);
        Ok(())
    }

    /// Drop everything on the stack (eg. on entry to an exception handler)
    pub fn clear_stack(&mut self) {
        self.frame.buffer.set_stack_index(0);
    }

    /// Mark every local as uninitialized
    pub fn clear_locals(&mut self) {
        self.frame.buffer.clear_locals();
    }

    /// Read a local variable of the given kind
    pub fn load_local(&self, index: usize, kind: Kind) -> Result<V> {
        if kind.is_void() {
            return Err(Error::VoidKind);
        }
        self.check_local_range(index, kind.slot_width())?;

        let value = match self.frame.buffer.local(index)? {
            Some(value) => value,
            None => return Err(fault(Error::MissingValue { slot: index })),
        };
        if kind.is_wide() && self.frame.buffer.local(index + 1)?.is_some() {
            return Err(fault(Error::CorruptHighWord { slot: index + 1 }));
        }
        self.check_kind(kind, value)
    }

    /// Write a local variable of the given kind
    ///
    /// If the local right below held a wide value, that value is now invalid (its high word is
    /// being overwritten) so it is cleared.
    pub fn store_local(&mut self, index: usize, kind: Kind, value: V) -> Result<()> {
        self.check_storable(kind)?;
        let value = self.check_kind(kind, value)?;
        let width = kind.slot_width();
        self.check_local_range(index, width)?;

        let buffer = &mut self.frame.buffer;
        if index > 0 {
            if let Some(previous) = buffer.local(index - 1)? {
                if previous.kind().is_wide() {
                    buffer.set_local(index - 1, None);
                }
            }
        }
        buffer.set_local(index, Some(value));
        if width == 2 {
            buffer.set_local(index + 1, None);
        }
        Ok(())
    }

    /// Mark a local as uninitialized
    pub fn invalidate_local(&mut self, index: usize) -> Result<()> {
        self.check_local_range(index, 1)?;
        self.frame.buffer.set_local(index, None);
        Ok(())
    }

    /// Store parameters into consecutive locals, starting at local 0
    pub fn store_parameters(&mut self, parameters: &[V]) -> Result<()> {
        let mut width = 0;
        for parameter in parameters {
            let kind = parameter.kind();
            self.check_storable(kind)?;
            width += kind.slot_width();
        }
        self.check_local_range(0, width)?;

        let mut index = 0;
        for parameter in parameters {
            let kind = parameter.kind();
            self.store_local(index, kind, *parameter)?;
            index += kind.slot_width();
        }
        Ok(())
    }

    /// Overwrite all locals with those of another frame (which must have as many locals)
    pub fn replace_locals(&mut self, with: &Frame<'g, V>) -> Result<()> {
        if with.max_locals() != self.max_locals() {
            return Err(fault(Error::LocalsMismatch {
                expected: self.max_locals(),
                found: with.max_locals(),
            }));
        }

        log::debug!("Replacing locals of {} with those of {}", self.frame, with);
        self.frame.buffer.copy_locals_from(&with.buffer);
        self.frame.unsafe_mode |= with.unsafe_mode;
        Ok(())
    }

    /// Overwrite the stack with the one of another frame
    pub fn replace_stack(&mut self, with: &Frame<'g, V>) -> Result<()> {
        if with.stack_size() > self.max_stack() {
            return Err(fault(Error::StackOverflow {
                max_stack: self.max_stack(),
            }));
        }

        log::debug!("Replacing stack of {} with that of {}", self.frame, with);
        self.frame.buffer.copy_stack_from(&with.buffer);
        self.frame.unsafe_mode |= with.unsafe_mode;
        Ok(())
    }

    /// Overwrite the held monitors with those of another frame
    pub fn replace_locks(&mut self, with: &Frame<'g, V>) {
        self.frame.locks = with.locks.clone();
    }

    /// Acquire a monitor on `obj`
    ///
    /// `total_number_of_locks` is how many monitors are held once this one is, counting those
    /// held by callers `scope` is inlined into. The scope remembers the largest such number.
    pub fn lock(&mut self, scope: ScopeId<'g>, obj: V, total_number_of_locks: usize) -> Result<()> {
        let obj = self.check_kind(Kind::Object, obj)?;
        self.frame.locks.push(obj);
        scope.set_minimum_number_of_locks(total_number_of_locks);
        Ok(())
    }

    /// Release the most recently acquired monitor
    pub fn unlock(&mut self) -> Result<V> {
        self.frame.locks.pop().map_err(fault)
    }

    fn check_kind(&self, expected: Kind, value: V) -> Result<V> {
        let found = value.kind();
        if found == expected || self.frame.unsafe_mode || !self.frame.settings.check_kinds {
            Ok(value)
        } else {
            Err(Error::KindMismatch { expected, found })
        }
    }

    /// Can values of this kind go in a slot?
    fn check_storable(&self, kind: Kind) -> Result<()> {
        if kind.is_void() {
            Err(Error::VoidKind)
        } else if kind.is_word_like() && !self.frame.settings.allow_word_kinds {
            Err(Error::WordKind { kind })
        } else {
            Ok(())
        }
    }

    fn check_local_range(&self, index: usize, width: usize) -> Result<()> {
        let max_locals = self.max_locals();
        match index.checked_add(width) {
            Some(end) if end <= max_locals => Ok(()),
            _ => Err(fault(Error::LocalIndexOutOfRange {
                index: index.saturating_add(width.max(1) - 1),
                max_locals,
            })),
        }
    }

    fn enter_unsafe_mode(&mut self, kind: Kind) {
        if !self.frame.unsafe_mode {
            log::trace!(
                "Pushed a {} value, relaxing kind checks in {:?}",
                kind,
                self.frame.scope
            );
            self.frame.unsafe_mode = true;
        }
    }
}

fn fault(error: Error) -> Error {
    log::error!("Frame state fault: {}", error);
    error
}

impl<'g, V> Deref for FrameStateBuilder<'g, V> {
    type Target = Frame<'g, V>;

    fn deref(&self) -> &Frame<'g, V> {
        &self.frame
    }
}

impl<'g, V: Value> fmt::Display for FrameStateBuilder<'g, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.frame, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{Graph, GraphArenas, ValueId};

    fn values<'g>(graph: &Graph<'g>, kinds: &[Kind]) -> Vec<ValueId<'g>> {
        kinds
            .iter()
            .map(|kind| graph.add_value(*kind, format!("{}", kind)))
            .collect()
    }

    #[test]
    fn typed_push_and_pop() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.typed()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 8);

        let kinds = [Kind::Int, Kind::Long, Kind::Float, Kind::Double, Kind::Object];
        let vs = values(&graph, &kinds);
        builder.ipush(vs[0]).unwrap();
        builder.lpush(vs[1]).unwrap();
        builder.fpush(vs[2]).unwrap();
        builder.dpush(vs[3]).unwrap();
        builder.apush(vs[4]).unwrap();
        assert_eq!(builder.stack_size(), 7);
        assert!(!builder.is_unsafe());

        assert_eq!(builder.apop(), Ok(vs[4]));
        assert_eq!(builder.dpop(), Ok(vs[3]));
        assert_eq!(builder.fpop(), Ok(vs[2]));
        assert_eq!(builder.lpop(), Ok(vs[1]));
        assert_eq!(builder.ipop(), Ok(vs[0]));
        assert!(builder.is_stack_empty());
    }

    #[test]
    fn wide_values_have_empty_high_words() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.wide()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 4);

        let long = graph.add_value(Kind::Long, "lconst_0");
        builder.push(Kind::Long, long).unwrap();
        assert_eq!(builder.stack_at(0), Ok(Some(long)));
        assert_eq!(builder.stack_at(1), Ok(None));

        // A single slot pop sees the high word, not a value
        assert_eq!(builder.ipop(), Err(Error::MissingValue { slot: 1 }));
        assert_eq!(builder.stack_size(), 2);

        // Corrupting the high word is caught
        builder.xpop().unwrap();
        builder.xpush(Some(long)).unwrap();
        assert_eq!(
            builder.pop(Kind::Long),
            Err(Error::CorruptHighWord { slot: 1 })
        );
    }

    #[test]
    fn kind_mismatches() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.mismatch()V");
        let mut builder = FrameStateBuilder::new(scope, 1, 4);

        let float = graph.add_value(Kind::Float, "fconst_0");
        assert_eq!(
            builder.ipush(float),
            Err(Error::KindMismatch {
                expected: Kind::Int,
                found: Kind::Float
            })
        );
        assert!(builder.is_stack_empty());

        builder.fpush(float).unwrap();
        assert_eq!(
            builder.apop(),
            Err(Error::KindMismatch {
                expected: Kind::Object,
                found: Kind::Float
            })
        );
        assert_eq!(builder.stack_size(), 1);

        assert_eq!(builder.push(Kind::Void, float), Err(Error::VoidKind));
        assert_eq!(builder.pop(Kind::Void), Err(Error::VoidKind));
    }

    #[test]
    fn word_values_relax_kind_checks() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.unsafe()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 4);

        let word = graph.add_value(Kind::Word, "pointer");
        let int = graph.add_value(Kind::Int, "iconst_0");
        builder.wpush(word).unwrap();
        assert!(builder.is_unsafe());

        // Anything goes from now on
        builder.apush(int).unwrap();
        assert_eq!(builder.fpop(), Ok(int));
        assert_eq!(builder.ipop(), Ok(word));
        assert!(builder.is_unsafe());

        // Copies stay unsafe
        assert!(builder.immutable_copy().is_unsafe());
        assert!(builder.to_builder().is_unsafe());
    }

    #[test]
    fn jsr_addresses_are_word_like() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.jsr()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 2);

        let address = graph.add_value(Kind::Jsr, "jsr");
        builder.jpush(address).unwrap();
        assert!(builder.is_unsafe());
        assert_eq!(builder.jpop(), Ok(address));
    }

    #[test]
    fn settings() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.settings()V");
        let word = graph.add_value(Kind::Word, "pointer");
        let int = graph.add_value(Kind::Int, "iconst_0");

        let mut strict = FrameStateBuilder::with_settings(scope, 1, 2, Settings::STRICT);
        assert_eq!(strict.wpush(word), Err(Error::WordKind { kind: Kind::Word }));
        assert_eq!(
            strict.store_local(0, Kind::Word, word),
            Err(Error::WordKind { kind: Kind::Word })
        );
        assert!(strict.is_stack_empty());

        let unchecked = Settings {
            check_kinds: false,
            ..Settings::DEFAULT
        };
        let mut relaxed = FrameStateBuilder::with_settings(scope, 1, 2, unchecked);
        relaxed.apush(int).unwrap();
        assert!(!relaxed.is_unsafe());
        assert_eq!(relaxed.to_builder().settings(), &unchecked);

        // Structural checks still happen
        relaxed.apush(int).unwrap();
        assert_eq!(
            relaxed.apush(int),
            Err(Error::StackOverflow { max_stack: 2 })
        );
    }

    #[test]
    fn overflow() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.overflow()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 3);

        let vs = values(&graph, &[Kind::Int, Kind::Double]);
        builder.ipush(vs[0]).unwrap();
        builder.ipush(vs[0]).unwrap();

        // Not even the low word gets pushed
        assert_eq!(
            builder.dpush(vs[1]),
            Err(Error::StackOverflow { max_stack: 3 })
        );
        assert_eq!(builder.stack_size(), 2);
        assert_eq!(builder.xpop(), Ok(Some(vs[0])));
        assert_eq!(builder.xpop(), Ok(Some(vs[0])));
        assert_eq!(builder.xpop(), Err(Error::EmptyStack));
        assert_eq!(builder.pop(Kind::Long), Err(Error::EmptyStack));
    }

    #[test]
    fn pop_arguments() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.call()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 8);

        // receiver, int, long, double, on top of an unrelated int
        let vs = values(
            &graph,
            &[Kind::Int, Kind::Object, Kind::Int, Kind::Long, Kind::Double],
        );
        builder.ipush(vs[0]).unwrap();
        builder.apush(vs[1]).unwrap();
        builder.ipush(vs[2]).unwrap();
        builder.lpush(vs[3]).unwrap();
        builder.dpush(vs[4]).unwrap();
        assert_eq!(builder.stack_size(), 7);

        let arguments = builder.pop_arguments(6).unwrap();
        assert_eq!(arguments, vec![vs[1], vs[2], vs[3], vs[4]]);
        assert_eq!(builder.stack_size(), 1);

        assert_eq!(builder.pop_arguments(0), Ok(vec![]));
        assert_eq!(builder.pop_arguments(2), Err(Error::EmptyStack));
        assert_eq!(builder.stack_size(), 1);
    }

    #[test]
    fn pop_arguments_cannot_split_wide_values() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.split()V");
        let mut builder = FrameStateBuilder::new(scope, 2, 4);

        let long = graph.add_value(Kind::Long, "lconst_1");
        builder.lpush(long).unwrap();

        // Only the high word
        assert_eq!(
            builder.pop_arguments(1),
            Err(Error::MissingValue { slot: 3 })
        );
        assert_eq!(builder.stack_size(), 2);
        assert_eq!(builder.pop_arguments(2), Ok(vec![long]));
    }

    #[test]
    fn truncate() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.truncate()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 6);

        let vs = values(&graph, &[Kind::Int, Kind::Double, Kind::Object]);
        builder.ipush(vs[0]).unwrap();
        builder.dpush(vs[1]).unwrap();
        builder.apush(vs[2]).unwrap();

        assert_eq!(
            builder.truncate_stack(5),
            Err(Error::TruncateAboveStack {
                size: 5,
                stack_size: 4
            })
        );
        assert_eq!(
            builder.truncate_stack(2),
            Err(Error::SplitsWideValue { size: 2 })
        );
        assert_eq!(builder.stack_size(), 4);

        builder.truncate_stack(3).unwrap();
        assert_eq!(builder.dpop(), Ok(vs[1]));
        builder.truncate_stack(1).unwrap();
        assert_eq!(builder.stack_size(), 1);
        builder.clear_stack();
        assert!(builder.is_stack_empty());
    }

    #[test]
    fn locals() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.locals()V");
        let mut builder = FrameStateBuilder::new(scope, 4, 0);

        let vs = values(&graph, &[Kind::Int, Kind::Long, Kind::Object]);
        assert_eq!(
            builder.load_local(0, Kind::Int),
            Err(Error::MissingValue { slot: 0 })
        );

        builder.store_local(0, Kind::Int, vs[0]).unwrap();
        builder.store_local(1, Kind::Long, vs[1]).unwrap();
        assert_eq!(builder.load_local(0, Kind::Int), Ok(vs[0]));
        assert_eq!(builder.load_local(1, Kind::Long), Ok(vs[1]));
        assert_eq!(builder.local_at(2), Ok(None));
        assert_eq!(
            builder.load_local(1, Kind::Int),
            Err(Error::KindMismatch {
                expected: Kind::Int,
                found: Kind::Long
            })
        );

        // A long in the last local has nowhere to put its high word
        assert_eq!(
            builder.store_local(3, Kind::Long, vs[1]),
            Err(Error::LocalIndexOutOfRange {
                index: 4,
                max_locals: 4
            })
        );

        // Overwriting the high word kills the long
        builder.store_local(2, Kind::Object, vs[2]).unwrap();
        assert_eq!(builder.local_at(1), Ok(None));
        assert_eq!(builder.load_local(2, Kind::Object), Ok(vs[2]));

        builder.invalidate_local(0).unwrap();
        assert_eq!(builder.local_at(0), Ok(None));
        assert_eq!(
            builder.invalidate_local(4),
            Err(Error::LocalIndexOutOfRange {
                index: 4,
                max_locals: 4
            })
        );

        builder.clear_locals();
        assert_eq!(builder.locals().count(), 0);
    }

    #[test]
    fn method_entry() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.entry(JLjava/lang/Object;)V");

        let vs = values(&graph, &[Kind::Object, Kind::Long, Kind::Object]);
        let builder = FrameStateBuilder::method_entry(scope, 5, 2, &vs).unwrap();
        let locals: Vec<_> = builder.locals().collect();
        assert_eq!(
            locals,
            vec![
                (0, Kind::Object, vs[0]),
                (1, Kind::Long, vs[1]),
                (3, Kind::Object, vs[2]),
            ]
        );

        assert!(matches!(
            FrameStateBuilder::method_entry(scope, 3, 2, &vs),
            Err(Error::LocalIndexOutOfRange { max_locals: 3, .. })
        ));
    }

    #[test]
    fn huge_local_indices() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.huge()V");
        let mut builder = FrameStateBuilder::new(scope, 2, 0);
        let long = graph.add_value(Kind::Long, "lconst_0");

        assert_eq!(
            builder.load_local(usize::MAX, Kind::Int),
            Err(Error::LocalIndexOutOfRange {
                index: usize::MAX,
                max_locals: 2
            })
        );
        assert_eq!(
            builder.invalidate_local(usize::MAX),
            Err(Error::LocalIndexOutOfRange {
                index: usize::MAX,
                max_locals: 2
            })
        );
        assert_eq!(
            builder.store_local(usize::MAX - 1, Kind::Long, long),
            Err(Error::LocalIndexOutOfRange {
                index: usize::MAX,
                max_locals: 2
            })
        );
        assert_eq!(builder.locals().count(), 0);
    }

    #[test]
    fn failed_store_parameters_changes_nothing() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.params()V");
        let mut builder = FrameStateBuilder::new(scope, 3, 0);

        let vs = values(&graph, &[Kind::Int, Kind::Object, Kind::Long, Kind::Int]);
        builder.store_local(2, Kind::Int, vs[3]).unwrap();
        let before = builder.immutable_copy();

        // The long would end past the last local
        assert!(matches!(
            builder.store_parameters(&vs[..3]),
            Err(Error::LocalIndexOutOfRange { max_locals: 3, .. })
        ));
        assert_eq!(builder.immutable_copy(), before);
        assert_eq!(builder.buffer(), before.as_frame().buffer());
    }

    #[cfg(feature = "trusted")]
    #[test]
    fn trusted_builds_only_check_structure() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.trusted()V");
        let mut builder = FrameStateBuilder::new(scope, 1, 1);
        assert!(!builder.settings().check_kinds);

        let float = graph.add_value(Kind::Float, "fconst_0");
        builder.ipush(float).unwrap();
        assert!(!builder.is_unsafe());
        assert_eq!(
            builder.apush(float),
            Err(Error::StackOverflow { max_stack: 1 })
        );
        assert_eq!(builder.lpop(), Err(Error::EmptyStack));
        assert_eq!(builder.apop(), Ok(float));
        assert_eq!(builder.unlock(), Err(Error::NoLockHeld));
    }

    #[test]
    fn locks() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let scope = graph.add_root_scope("Test.synchronized()V");
        let mut builder = FrameStateBuilder::new(scope, 0, 2);

        let vs = values(&graph, &[Kind::Object, Kind::Object, Kind::Int]);
        assert_eq!(builder.unlock(), Err(Error::NoLockHeld));

        builder.lock(scope, vs[0], 1).unwrap();
        builder.lock(scope, vs[1], 2).unwrap();
        assert_eq!(builder.locks().collect::<Vec<_>>(), vec![vs[0], vs[1]]);
        assert_eq!(builder.lock_at(1), Some(vs[1]));
        assert_eq!(scope.minimum_number_of_locks(), 2);

        assert_eq!(
            builder.lock(scope, vs[2], 3),
            Err(Error::KindMismatch {
                expected: Kind::Object,
                found: Kind::Int
            })
        );
        assert_eq!(builder.locks_size(), 2);
        assert_eq!(scope.minimum_number_of_locks(), 2);

        assert_eq!(builder.unlock(), Ok(vs[1]));
        assert_eq!(builder.unlock(), Ok(vs[0]));
        assert_eq!(builder.unlock(), Err(Error::NoLockHeld));
        assert_eq!(scope.minimum_number_of_locks(), 2);
    }

    #[test]
    fn replace_parts() {
        let arenas = GraphArenas::new();
        let graph = Graph::new(&arenas);
        let caller = graph.add_root_scope("Test.caller()V");
        let callee = graph.add_inlined_scope(caller, "Test.callee()V");

        let vs = values(&graph, &[Kind::Int, Kind::Object, Kind::Long]);
        let mut source = FrameStateBuilder::new(callee, 2, 4);
        source.store_local(0, Kind::Int, vs[0]).unwrap();
        source.store_local(1, Kind::Object, vs[1]).unwrap();
        source.lpush(vs[2]).unwrap();
        source.lock(callee, vs[1], 1).unwrap();

        let mut target = FrameStateBuilder::new(caller, 2, 3);
        target.replace_locals(&source).unwrap();
        target.replace_stack(&source).unwrap();
        target.replace_locks(&source);
        assert_eq!(target.local_at(0), Ok(Some(vs[0])));
        assert_eq!(target.local_at(1), Ok(Some(vs[1])));
        assert_eq!(target.lpop(), Ok(vs[2]));
        assert_eq!(target.locks_size(), 1);
        assert_eq!(target.scope(), caller);

        // Locks are copied, not shared
        target.unlock().unwrap();
        assert_eq!(source.locks_size(), 1);

        let mut narrow = FrameStateBuilder::new(caller, 3, 1);
        assert_eq!(
            narrow.replace_locals(&source),
            Err(Error::LocalsMismatch {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            narrow.replace_stack(&source),
            Err(Error::StackOverflow { max_stack: 1 })
        );

        // No locks held in the source means none held in the target
        let empty: FrameStateBuilder<ValueId> = FrameStateBuilder::new(caller, 0, 0);
        narrow.lock(caller, vs[1], 1).unwrap();
        narrow.replace_locks(&empty);
        assert_eq!(narrow.locks_size(), 0);
    }
}
