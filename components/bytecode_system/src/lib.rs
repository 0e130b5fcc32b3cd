//! Bytecode metadata consumed by the speculative compiler
//!
//! This crate provides the opcode vocabulary of the VM together with the
//! per-method metadata the compiler needs when it lowers call sites and
//! literal construction.
//!
//! # Features
//!
//! - Closed opcode set with a canonical ordering
//! - Call argument accounting shared by every call opcode
//! - Method literals with call-field bits
//! - Per-file method tables, compiled-method flags and literal buffers
//!
//! # Example
//!
//! ```
//! use bytecode_system::{compute_call_argc, EcmaOpcode, NUM_MANDATORY_JSFUNC_ARGS};
//!
//! // `this.f(a, b)` has value inputs [this, a, b, f]
//! let argc = compute_call_argc(4, EcmaOpcode::CallThis2);
//! assert_eq!(argc - NUM_MANDATORY_JSFUNC_ARGS, 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_argc;
pub mod method;
pub mod opcode;

// Re-export main types at crate root
pub use call_argc::{compute_call_argc, NUM_MANDATORY_JSFUNC_ARGS};
pub use method::{
    CallField, CallMethodFlagMap, FileId, LiteralTable, MethodError, MethodId, MethodLiteral,
    MethodTable, ObjectLiteral,
};
pub use opcode::EcmaOpcode;
