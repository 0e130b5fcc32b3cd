//! Heap object representation
//!
//! Provides the `JsObject` type with hidden class-based property storage.

use bytecode_system::{FileId, MethodId};
use core_types::{BuiltinsStubId, Value};

use crate::hidden_class::{HClassId, PropertyLookupResult};

/// Index of an object in the model's heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl ObjectId {
    /// Tagged reference to this object.
    pub fn to_value(self) -> Value {
        Value::HeapObject(self.0)
    }

    /// Object referenced by a tagged value.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_heap_object().map(ObjectId)
    }
}

/// The `protoOrHClass` field of a function.
///
/// Before the first construction it holds the `prototype` object; once an
/// instance layout exists it holds the instance hidden class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoOrHClass {
    /// Nothing assigned yet
    None,
    /// The `prototype` object
    Prototype(ObjectId),
    /// Initial hidden class of instances
    HClass(HClassId),
}

/// Payload of a function object.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionData {
    /// File the method lives in
    pub file: FileId,
    /// Method offset
    pub method: MethodId,
    /// Method index within the file
    pub method_index: u32,
    /// `prototype` or instance layout
    pub proto_or_hclass: ProtoOrHClass,
    /// Builtin the function implements, if any
    pub builtin: Option<BuiltinsStubId>,
    /// Class constructor that is a derived class
    pub is_derived: bool,
    /// Method has compiled code
    pub is_compiled: bool,
}

impl FunctionData {
    /// Ordinary user function.
    pub fn new(file: FileId, method: MethodId, method_index: u32) -> Self {
        Self {
            file,
            method,
            method_index,
            proto_or_hclass: ProtoOrHClass::None,
            builtin: None,
            is_derived: false,
            is_compiled: true,
        }
    }

    /// Builtin function.
    pub fn builtin(id: BuiltinsStubId) -> Self {
        Self {
            builtin: Some(id),
            ..Self::new(FileId(0), MethodId(0), 0)
        }
    }
}

/// Layout-specific payload of a heap object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Ordinary object
    Plain,
    /// Array with its dense elements
    Array {
        /// Elements, `Value::Hole` for holes
        elements: Vec<Value>,
        /// Elements are shared copy-on-write storage
        is_cow: bool,
    },
    /// Typed array; element type comes from the hidden class
    TypedArray {
        /// Elements in the typed array's domain
        elements: Vec<f64>,
    },
    /// Map collection in insertion order
    Map {
        /// Entries
        entries: Vec<(Value, Value)>,
    },
    /// Function
    Function(FunctionData),
    /// Wrapper of a primitive
    PrimitiveRef(Value),
    /// Accessor pair
    Accessor {
        /// Getter function
        getter: Option<ObjectId>,
        /// Setter function
        setter: Option<ObjectId>,
    },
    /// Global variable cell; `Value::Hole` once invalidated
    PropertyBox(Value),
}

/// Heap object with hidden class-based property storage
#[derive(Debug, Clone, PartialEq)]
pub struct JsObject {
    /// Hidden class describing this object's layout
    pub hclass: HClassId,
    /// In-object slots, indexed by hidden class offsets
    pub inline_slots: Vec<Value>,
    /// Out-of-line properties array; its length is its capacity
    pub properties: Vec<Value>,
    /// Layout-specific payload
    pub kind: ObjectKind,
}

impl JsObject {
    /// Creates an object with `inlined_props` undefined in-object slots.
    pub fn new(hclass: HClassId, inlined_props: u32, kind: ObjectKind) -> Self {
        Self {
            hclass,
            inline_slots: vec![Value::Undefined; inlined_props as usize],
            properties: Vec::new(),
            kind,
        }
    }

    /// Reads the slot `plr` designates. Missing slots read as hole.
    pub fn load_slot(&self, plr: &PropertyLookupResult) -> Value {
        let slots = if plr.in_object {
            &self.inline_slots
        } else {
            &self.properties
        };
        slots.get(plr.offset as usize).cloned().unwrap_or(Value::Hole)
    }

    /// Writes the slot `plr` designates, growing the out-of-line array when
    /// the offset is past its capacity.
    pub fn store_slot(&mut self, plr: &PropertyLookupResult, value: Value) {
        let slots = if plr.in_object {
            &mut self.inline_slots
        } else {
            &mut self.properties
        };
        let offset = plr.offset as usize;
        if offset >= slots.len() {
            slots.resize(offset + 1, Value::Undefined);
        }
        slots[offset] = value;
    }

    /// Function payload, if this is a function.
    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(data) => Some(data),
            _ => None,
        }
    }
}
