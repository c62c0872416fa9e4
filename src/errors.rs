use crate::kind::Kind;

/// Violation of a frame state invariant
///
/// None of these are caused by the program being compiled (that has already been verified when
/// its class was loaded). They indicate a bug in whatever is driving the frame state: the bytecode
/// decoder, the inliner, or the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("cannot push or store a value of kind void")]
    VoidKind,

    /// Value kind does not match the kind expected by the operation
    #[error("expected a value of kind {expected}, but found {found}")]
    KindMismatch { expected: Kind, found: Kind },

    /// Word-like kinds were disabled in the settings
    #[error("values of kind {kind} are not allowed in this frame")]
    WordKind { kind: Kind },

    #[error("operand stack overflow (max stack is {max_stack})")]
    StackOverflow { max_stack: usize },

    #[error("operand stack is empty")]
    EmptyStack,

    /// Expected a value, but the slot is empty (an uninitialized local or the high word of a wide
    /// value)
    #[error("slot {slot} does not hold a value")]
    MissingValue { slot: usize },

    /// The slot above a `long` or `double` should be an empty placeholder
    #[error("slot {slot} should be the empty high word of a wide value")]
    CorruptHighWord { slot: usize },

    #[error("stack slot {index} is out of range (stack size is {stack_size})")]
    StackIndexOutOfRange { index: usize, stack_size: usize },

    #[error("local {index} is out of range (max locals is {max_locals})")]
    LocalIndexOutOfRange { index: usize, max_locals: usize },

    #[error("cannot truncate a stack of size {stack_size} to size {size}")]
    TruncateAboveStack { size: usize, stack_size: usize },

    #[error("truncating the stack to size {size} would split a wide value")]
    SplitsWideValue { size: usize },

    /// Frames being spliced together disagree on the number of locals
    #[error("expected {expected} locals, but found {found}")]
    LocalsMismatch { expected: usize, found: usize },

    /// Attempt to release a monitor when none is held
    #[error("no monitor is held")]
    NoLockHeld,
}

pub type Result<T> = std::result::Result<T, Error>;
