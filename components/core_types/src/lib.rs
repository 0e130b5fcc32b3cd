//! Core value and type vocabulary shared by the speculative compiler.
//!
//! This crate provides the tagged runtime value representation together
//! with the small closed type lattices the lowering pass reasons about.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of runtime values
//! - [`ParamType`] - Speculated type attached to a typed operation
//! - [`ElementsKind`] - Array element representation lattice
//! - [`JSType`] / [`BuiltinTypeId`] - Object layout families and builtin receivers
//! - [`BuiltinsStubId`] - Builtin functions with dedicated fast paths
//! - [`value_ops`] - Reference semantics of primitive operations
//!
//! # Examples
//!
//! ```
//! use core_types::{value_ops, TypedBinOp, Value};
//!
//! let sum = value_ops::generic_binary(TypedBinOp::Add, &Value::Smi(40), &Value::Smi(2));
//! assert_eq!(sum, Value::Smi(42));
//! assert_eq!(sum.type_of(), "number");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod builtins;
mod elements_kind;
mod js_type;
mod param_type;
mod typed_op;
mod value;
pub mod value_ops;

pub use builtins::BuiltinsStubId;
pub use elements_kind::ElementsKind;
pub use js_type::{BuiltinTypeId, JSType};
pub use param_type::ParamType;
pub use typed_op::{TypedBinOp, TypedJumpOp, TypedUnOp};
pub use value::Value;
