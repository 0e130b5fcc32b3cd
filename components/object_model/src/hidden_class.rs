//! Hidden class system for object property access.
//!
//! Hidden classes enable fast property access by tracking object shape
//! and using slot-based lookups instead of dictionary lookups. The compiler
//! reads them to build inline-cache style accesses.

use std::collections::HashMap;

use core_types::{ElementsKind, JSType, Value};

use crate::ObjectId;

/// Index of a hidden class in the model's hclass arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HClassId(pub u32);

/// Storage representation of a property slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    /// Slot never written
    #[default]
    None,
    /// int32 payload
    Int,
    /// double payload
    Double,
    /// Any tagged value
    Tagged,
}

impl Representation {
    /// Narrowest representation that stores `value`.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Smi(_) => Representation::Int,
            Value::Double(_) => Representation::Double,
            _ => Representation::Tagged,
        }
    }

    /// Whether `value` can be stored without widening the slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    /// use object_model::Representation;
    ///
    /// assert!(Representation::Double.can_store(&Value::Smi(1)));
    /// assert!(!Representation::Int.can_store(&Value::Double(0.5)));
    /// assert!(Representation::Tagged.can_store(&Value::Null));
    /// ```
    pub fn can_store(self, value: &Value) -> bool {
        match self {
            Representation::None | Representation::Tagged => true,
            Representation::Int => value.is_int(),
            Representation::Double => value.is_number(),
        }
    }
}

/// A property descriptor for a hidden class.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAttributes {
    /// Name of the property
    pub key: String,
    /// Slot index: in-object slot, or index in the out-of-line array
    pub offset: u32,
    /// Stored inside the object rather than in the properties array
    pub in_object: bool,
    /// Slot holds an accessor pair
    pub is_accessor: bool,
    /// Slot representation
    pub representation: Representation,
    /// Data property may be written
    pub writable: bool,
    /// Slot is known to hold a function
    pub is_function: bool,
}

/// A resolved `(hidden class, key)` lookup.
///
/// This is what the compiler bakes into property access gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyLookupResult {
    /// The key exists in the layout
    pub found: bool,
    /// In-object slot
    pub in_object: bool,
    /// Slot index
    pub offset: u32,
    /// Accessor pair rather than data
    pub is_accessor: bool,
    /// Slot representation
    pub representation: Representation,
    /// Data property may be written
    pub writable: bool,
    /// Slot is known to hold a function
    pub is_function: bool,
}

impl PropertyLookupResult {
    /// Result for a key that is not in the layout.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Result describing an existing slot.
    pub fn from_attributes(attr: &PropertyAttributes) -> Self {
        Self {
            found: true,
            in_object: attr.in_object,
            offset: attr.offset,
            is_accessor: attr.is_accessor,
            representation: attr.representation,
            writable: attr.writable,
            is_function: attr.is_function,
        }
    }
}

/// Hidden class for heap objects.
///
/// Objects with the same properties in the same order share a hidden class.
/// Besides the layout the class records the object's layout family, its
/// prototype, its elements kind and the prototype-change marker the
/// compiler's guards consult.
///
/// # Example
///
/// ```
/// use core_types::JSType;
/// use object_model::HClass;
///
/// let mut class = HClass::new(JSType::JSObject, 2);
/// class.append_property("x");
/// class.append_property("y");
/// class.append_property("z");
///
/// assert!(class.find_property("x").unwrap().in_object);
/// assert!(!class.find_property("z").unwrap().in_object);
/// assert_eq!(class.find_property("z").unwrap().offset, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HClass {
    /// Layout family
    pub object_type: JSType,
    /// Properties in definition order
    pub layout: Vec<PropertyAttributes>,
    /// Number of in-object slots
    pub inlined_props: u32,
    /// Transitions to other hidden classes when properties are added
    pub transitions: HashMap<String, HClassId>,
    /// Prototype object
    pub prototype: Option<ObjectId>,
    /// Instances are used as prototypes
    pub is_prototype: bool,
    /// Array elements are stable (no holes leaking to prototypes, no
    /// exotic prototype)
    pub is_stable_elements: bool,
    /// Element representation of array instances
    pub elements_kind: ElementsKind,
    /// Prototype-change marker: some object on the prototype chain changed
    pub proto_changed: bool,
    /// Class was produced by ahead-of-time layout
    pub is_ts: bool,
}

impl HClass {
    /// Creates an empty hidden class with `inlined_props` in-object slots.
    pub fn new(object_type: JSType, inlined_props: u32) -> Self {
        HClass {
            object_type,
            layout: Vec::new(),
            inlined_props,
            transitions: HashMap::new(),
            prototype: None,
            is_prototype: false,
            is_stable_elements: object_type == JSType::JSArray,
            elements_kind: ElementsKind::NONE,
            proto_changed: false,
            is_ts: false,
        }
    }

    /// Sets the prototype.
    pub fn with_prototype(mut self, prototype: Option<ObjectId>) -> Self {
        self.prototype = prototype;
        self
    }

    /// Sets the elements kind.
    pub fn with_elements_kind(mut self, kind: ElementsKind) -> Self {
        self.elements_kind = kind;
        self
    }

    /// Looks up a property by name.
    pub fn find_property(&self, key: &str) -> Option<&PropertyAttributes> {
        self.layout.iter().find(|attr| attr.key == key)
    }

    /// Resolves `key` against this class only.
    pub fn lookup(&self, key: &str) -> PropertyLookupResult {
        self.find_property(key)
            .map(PropertyLookupResult::from_attributes)
            .unwrap_or_else(PropertyLookupResult::not_found)
    }

    /// Where the next added property would live: `(in_object, offset)`.
    pub fn next_slot(&self) -> (bool, u32) {
        let in_object = self.layout.iter().filter(|a| a.in_object).count() as u32;
        if in_object < self.inlined_props {
            (true, in_object)
        } else {
            let out_of_line = self.layout.len() as u32 - in_object;
            (false, out_of_line)
        }
    }

    /// Appends a writable tagged data property and returns its attributes.
    pub fn append_property(&mut self, key: &str) -> PropertyAttributes {
        self.append(key, Representation::Tagged, false)
    }

    /// Appends a property with explicit representation and accessor flag.
    pub fn append(&mut self, key: &str, representation: Representation, is_accessor: bool) -> PropertyAttributes {
        let (in_object, offset) = self.next_slot();
        let attr = PropertyAttributes {
            key: key.to_string(),
            offset,
            in_object,
            is_accessor,
            representation,
            writable: true,
            is_function: false,
        };
        self.layout.push(attr.clone());
        attr
    }

    /// Copy of this class without transitions, the starting point of a
    /// transition target.
    pub fn derive(&self) -> HClass {
        HClass {
            transitions: HashMap::new(),
            proto_changed: false,
            ..self.clone()
        }
    }
}
