//! Abstract JVM frame state for a bytecode to graph IR compiler front end
//!
//! When a method's bytecode is turned into graph IR, the compiler walks the bytecode and keeps
//! track of which IR value sits in each local variable and operand stack slot. This crate is that
//! bookkeeping: see [`frame`] for the frames themselves and [`ir`] for the values and scopes they
//! refer to.
//!
//! ### Simple example
//!
//! Decoding `iload_0; iconst_1; iadd; istore_1` inside `static void f(int)`:
//!
//! ```
//! use framestate::frame::FrameStateBuilder;
//! use framestate::ir::{Graph, GraphArenas};
//! use framestate::{Error, Kind};
//!
//! # fn decode() -> Result<(), Error> {
//! let arenas = GraphArenas::new();
//! let graph = Graph::new(&arenas);
//! let scope = graph.add_root_scope("Example.f(I)V");
//!
//! // Entry frame: the parameter is in local 0
//! let param = graph.add_value(Kind::Int, "param0");
//! let mut frame = FrameStateBuilder::method_entry(scope, 2, 2, &[param])?;
//!
//! frame.ipush(frame.load_local(0, Kind::Int)?)?;
//! frame.ipush(graph.add_value(Kind::Int, "iconst_1"))?;
//! let _one = frame.ipop()?;
//! let x = frame.ipop()?;
//! assert_eq!((x, frame.stack_size()), (param, 0));
//!
//! let sum = graph.add_value(Kind::Int, "iadd");
//! frame.ipush(sum)?;
//! let sum = frame.ipop()?;
//! frame.store_local(1, Kind::Int, sum)?;
//!
//! // Snapshot the frame at the end of the block
//! let snapshot = frame.immutable_copy();
//! assert_eq!(snapshot.local_at(1)?, Some(sum));
//! # Ok(())
//! # }
//! # decode().unwrap();
//! ```

mod errors;
pub mod frame;
pub mod ir;
mod kind;
mod settings;
pub mod util;

pub use errors::*;
pub use kind::*;
pub use settings::*;
