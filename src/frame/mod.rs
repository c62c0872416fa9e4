//! Abstract frame state
//!
//! While bytecode is decoded into IR, the compiler simulates the JVM frame of the method: the
//! local variables and the operand stack hold the IR values that the bytecode would have put
//! there at runtime, and the monitor stack holds the objects locked by `monitorenter`. For
//! example, decoding `iload_1; iconst_2; iadd` pushes the value in local 1, pushes a constant
//! node, then pops both to build an add node which gets pushed back.
//!
//! Frames come in two flavours:
//!
//!   - [`FrameStateBuilder`] is owned by the decoding loop and mutated one instruction at a time
//!   - [`FrameState`] is a frozen snapshot, suitable for sharing across the compiler (block
//!     entries, exception handlers, deoptimization info, inlining)
//!
//! Both dereference to [`Frame`] for read access. There is no way to turn a `FrameState` back
//! into a builder other than copying it, so a snapshot can never be modified from under the code
//! holding it.
//!
//! ### Wide values
//!
//! Like in the JVM, `long` and `double` values take two slots. The value itself goes in the
//! lower slot and the upper slot (the "high word") is left empty. Typed pushes and pops handle
//! high words automatically.

mod buffer;
mod builder;
mod locks;
mod state;

pub use buffer::*;
pub use builder::*;
pub use locks::*;
pub use state::*;
