//! Object Model - hidden classes, object heap and global tables
//!
//! This component provides:
//! - Hidden classes with in-object and out-of-line slot layout
//! - Heap objects: plain objects, arrays, typed arrays, maps, functions
//! - Global environment, global constants and builtin prototype tables
//! - Prototype-change markers and array element stability
//! - The compilation lock that yields a read-only heap view

pub mod error;
pub mod hidden_class;
pub mod jit_lock;
pub mod model;
pub mod object;

// Re-export main types
pub use error::ObjectModelError;
pub use hidden_class::{HClass, HClassId, PropertyAttributes, PropertyLookupResult, Representation};
pub use jit_lock::{HeapReadGuard, HeapWriteGuard, SharedObjectModel};
pub use model::ObjectModel;
pub use object::{FunctionData, JsObject, ObjectId, ObjectKind, ProtoOrHClass};
