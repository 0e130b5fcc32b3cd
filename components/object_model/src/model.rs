//! The object heap together with the global tables the compiler consults.
//!
//! Read-only queries are what the compiler uses while it holds the heap
//! lock. Mutators model what the running program does between compilation
//! and execution; they keep prototype-change markers and array stability
//! consistent the way the runtime would.

use std::collections::HashMap;

use core_types::{BuiltinTypeId, ElementsKind, JSType, Value};

use crate::error::ObjectModelError;
use crate::hidden_class::{HClass, HClassId, PropertyLookupResult, Representation};
use crate::object::{FunctionData, JsObject, ObjectId, ObjectKind, ProtoOrHClass};

/// Upper bound on prototype chain walks, a guard against cyclic chains.
const MAX_PROTO_CHAIN: usize = 64;

/// Heap of objects and hidden classes plus the global environment tables.
#[derive(Debug, Default)]
pub struct ObjectModel {
    hclasses: Vec<HClass>,
    objects: Vec<JsObject>,
    builtin_prototypes: HashMap<BuiltinTypeId, ObjectId>,
    builtin_objects: HashMap<BuiltinTypeId, ObjectId>,
    global_env_objects: Vec<ObjectId>,
    global_const_hclasses: Vec<HClassId>,
    object_function_hclass: Option<HClassId>,
    global_boxes: HashMap<String, ObjectId>,
}

impl ObjectModel {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------

    /// Registers a hidden class.
    pub fn add_hclass(&mut self, hclass: HClass) -> HClassId {
        let id = HClassId(self.hclasses.len() as u32);
        self.hclasses.push(hclass);
        id
    }

    /// Hidden class by id.
    pub fn hclass(&self, id: HClassId) -> Option<&HClass> {
        self.hclasses.get(id.0 as usize)
    }

    fn hclass_mut(&mut self, id: HClassId) -> Result<&mut HClass, ObjectModelError> {
        self.hclasses
            .get_mut(id.0 as usize)
            .ok_or(ObjectModelError::InvalidHClass(id))
    }

    /// Allocates an object of `hclass`.
    pub fn new_object(&mut self, hclass: HClassId, kind: ObjectKind) -> Result<ObjectId, ObjectModelError> {
        let inlined = self
            .hclass(hclass)
            .ok_or(ObjectModelError::InvalidHClass(hclass))?
            .inlined_props;
        let id = ObjectId(self.objects.len());
        self.objects.push(JsObject::new(hclass, inlined, kind));
        Ok(id)
    }

    /// Allocates an array of `hclass` holding `elements`.
    pub fn new_array(&mut self, hclass: HClassId, elements: Vec<Value>) -> Result<ObjectId, ObjectModelError> {
        self.new_object(hclass, ObjectKind::Array { elements, is_cow: false })
    }

    /// Object by id.
    pub fn object(&self, id: ObjectId) -> Option<&JsObject> {
        self.objects.get(id.0)
    }

    /// Mutable object by id.
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut JsObject, ObjectModelError> {
        self.objects.get_mut(id.0).ok_or(ObjectModelError::InvalidObject(id))
    }

    /// Hidden class of a tagged value, if it references an object.
    pub fn hclass_of(&self, value: &Value) -> Option<HClassId> {
        let id = ObjectId::from_value(value)?;
        self.object(id).map(|o| o.hclass)
    }

    /// Hidden class of a tagged value, resolved.
    pub fn hclass_ref_of(&self, value: &Value) -> Option<&HClass> {
        self.hclass_of(value).and_then(|id| self.hclass(id))
    }

    /// Function payload behind a tagged value.
    pub fn function_of(&self, value: &Value) -> Option<&FunctionData> {
        let id = ObjectId::from_value(value)?;
        self.object(id)?.as_function()
    }

    // ------------------------------------------------------------------
    // Compile-time queries
    // ------------------------------------------------------------------

    /// Resolves `key` in `hclass`'s own layout.
    pub fn lookup_property(&self, hclass: HClassId, key: &str) -> PropertyLookupResult {
        self.hclass(hclass)
            .map(|h| h.lookup(key))
            .unwrap_or_else(PropertyLookupResult::not_found)
    }

    /// Walks the prototype chain starting at `hclass` and returns the
    /// holder's hidden class, its depth (0 for own properties) and the
    /// resolved slot.
    pub fn find_holder(&self, hclass: HClassId, key: &str) -> Option<(HClassId, u32, PropertyLookupResult)> {
        let mut current = hclass;
        for depth in 0..MAX_PROTO_CHAIN {
            let plr = self.lookup_property(current, key);
            if plr.found {
                return Some((current, depth as u32, plr));
            }
            let proto = self.hclass(current)?.prototype?;
            current = self.object(proto)?.hclass;
        }
        None
    }

    /// Prototype of `hclass`'s instances.
    pub fn prototype_of(&self, hclass: HClassId) -> Option<ObjectId> {
        self.hclass(hclass).and_then(|h| h.prototype)
    }

    /// Whether `proto` appears on the prototype chain of `hclass`.
    pub fn chain_contains(&self, hclass: HClassId, proto: ObjectId) -> bool {
        let mut current = self.prototype_of(hclass);
        for _ in 0..MAX_PROTO_CHAIN {
            let Some(p) = current else {
                return false;
            };
            if p == proto {
                return true;
            }
            current = self.object(p).and_then(|o| self.prototype_of(o.hclass));
        }
        false
    }

    /// Target of the `key` transition out of `hclass`.
    pub fn transition_target(&self, hclass: HClassId, key: &str) -> Option<HClassId> {
        self.hclass(hclass)?.transitions.get(key).copied()
    }

    /// Prototype object of a builtin receiver family.
    pub fn builtin_prototype(&self, id: BuiltinTypeId) -> Option<ObjectId> {
        self.builtin_prototypes.get(&id).copied()
    }

    /// Hidden class of a builtin prototype object.
    pub fn builtin_prototype_hclass(&self, id: BuiltinTypeId) -> Option<HClassId> {
        self.builtin_prototype(id).and_then(|p| self.object(p)).map(|o| o.hclass)
    }

    /// Global builtin object (`Math`, `Object`, ...).
    pub fn builtin_object(&self, id: BuiltinTypeId) -> Option<ObjectId> {
        self.builtin_objects.get(&id).copied()
    }

    /// Object stored at `index` in the global environment.
    pub fn global_env_object(&self, index: usize) -> Option<ObjectId> {
        self.global_env_objects.get(index).copied()
    }

    /// Hidden class of the global-environment object at `index`.
    pub fn global_env_hclass(&self, index: usize) -> Option<HClassId> {
        self.global_env_object(index).and_then(|o| self.object(o)).map(|o| o.hclass)
    }

    /// Global-constant hidden class at `index`.
    pub fn global_const_hclass(&self, index: usize) -> Option<HClassId> {
        self.global_const_hclasses.get(index).copied()
    }

    /// Initial hidden class of `{}`.
    pub fn object_function_hclass(&self) -> Option<HClassId> {
        self.object_function_hclass
    }

    /// Property box of a global variable.
    pub fn global_box(&self, name: &str) -> Option<ObjectId> {
        self.global_boxes.get(name).copied()
    }

    // ------------------------------------------------------------------
    // Global tables
    // ------------------------------------------------------------------

    /// Installs a builtin prototype object and marks it as a prototype.
    pub fn set_builtin_prototype(&mut self, id: BuiltinTypeId, proto: ObjectId) -> Result<(), ObjectModelError> {
        self.make_prototype(proto)?;
        self.builtin_prototypes.insert(id, proto);
        Ok(())
    }

    /// Installs a global builtin object.
    pub fn set_builtin_object(&mut self, id: BuiltinTypeId, object: ObjectId) {
        self.builtin_objects.insert(id, object);
    }

    /// Appends an object to the global environment and returns its index.
    pub fn push_global_env_object(&mut self, object: ObjectId) -> usize {
        self.global_env_objects.push(object);
        self.global_env_objects.len() - 1
    }

    /// Appends a global-constant hidden class and returns its index.
    pub fn push_global_const_hclass(&mut self, hclass: HClassId) -> usize {
        self.global_const_hclasses.push(hclass);
        self.global_const_hclasses.len() - 1
    }

    /// Sets the initial hidden class of `{}`.
    pub fn set_object_function_hclass(&mut self, hclass: HClassId) {
        self.object_function_hclass = Some(hclass);
    }

    /// Defines or updates a global variable cell.
    pub fn set_global(&mut self, name: &str, value: Value, box_hclass: HClassId) -> Result<ObjectId, ObjectModelError> {
        if let Some(cell) = self.global_box(name) {
            self.object_mut(cell)?.kind = ObjectKind::PropertyBox(value);
            return Ok(cell);
        }
        let cell = self.new_object(box_hclass, ObjectKind::PropertyBox(value))?;
        self.global_boxes.insert(name.to_string(), cell);
        Ok(cell)
    }

    /// Invalidates a global variable cell, as deleting or reconfiguring the
    /// global does.
    pub fn invalidate_global(&mut self, name: &str) -> Result<(), ObjectModelError> {
        if let Some(cell) = self.global_boxes.remove(name) {
            self.object_mut(cell)?.kind = ObjectKind::PropertyBox(Value::Hole);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Runtime mutators
    // ------------------------------------------------------------------

    fn derive_hclass(&mut self, obj: ObjectId, edit: impl FnOnce(&mut HClass)) -> Result<HClassId, ObjectModelError> {
        let current = self.object(obj).ok_or(ObjectModelError::InvalidObject(obj))?.hclass;
        let mut derived = self
            .hclass(current)
            .ok_or(ObjectModelError::InvalidHClass(current))?
            .derive();
        edit(&mut derived);
        let id = self.add_hclass(derived);
        self.object_mut(obj)?.hclass = id;
        Ok(id)
    }

    /// Gives `obj` a prototype hidden class.
    pub fn make_prototype(&mut self, obj: ObjectId) -> Result<HClassId, ObjectModelError> {
        let current = self.object(obj).ok_or(ObjectModelError::InvalidObject(obj))?.hclass;
        if self.hclass(current).is_some_and(|h| h.is_prototype) {
            return Ok(current);
        }
        self.derive_hclass(obj, |h| h.is_prototype = true)
    }

    /// Marks every hidden class whose prototype chain contains `proto` as
    /// changed.
    pub fn mark_prototype_changed(&mut self, proto: ObjectId) {
        let affected: Vec<usize> = (0..self.hclasses.len())
            .filter(|i| self.chain_contains(HClassId(*i as u32), proto))
            .collect();
        for i in affected {
            self.hclasses[i].proto_changed = true;
        }
    }

    fn notify_if_prototype(&mut self, obj: ObjectId) {
        let is_proto = self
            .object(obj)
            .and_then(|o| self.hclass(o.hclass))
            .is_some_and(|h| h.is_prototype);
        if is_proto {
            self.mark_prototype_changed(obj);
        }
    }

    /// Creates (or reuses) the transition adding `key` to `from`.
    pub fn add_transition(&mut self, from: HClassId, key: &str, representation: Representation) -> Result<HClassId, ObjectModelError> {
        if let Some(target) = self.transition_target(from, key) {
            return Ok(target);
        }
        let mut target = self.hclass(from).ok_or(ObjectModelError::InvalidHClass(from))?.derive();
        target.append(key, representation, false);
        let id = self.add_hclass(target);
        self.hclass_mut(from)?.transitions.insert(key.to_string(), id);
        Ok(id)
    }

    /// `obj[key] = value` on an own data property or by adding one.
    ///
    /// Writing to a prototype object invalidates the markers of every
    /// hidden class that inherits from it.
    pub fn set_property(&mut self, obj: ObjectId, key: &str, value: Value) -> Result<(), ObjectModelError> {
        let hclass = self.object(obj).ok_or(ObjectModelError::InvalidObject(obj))?.hclass;
        let own = self.lookup_property(hclass, key);
        if own.is_accessor {
            return Err(ObjectModelError::WrongKind {
                object: obj,
                expected: "data property holder",
            });
        }
        let plr = if own.found {
            own
        } else {
            let target = self.add_transition(hclass, key, Representation::Tagged)?;
            self.object_mut(obj)?.hclass = target;
            self.lookup_property(target, key)
        };
        self.object_mut(obj)?.store_slot(&plr, value);
        if !own.found {
            self.notify_if_prototype(obj);
        }
        Ok(())
    }

    /// Defines an accessor property `key` on `obj`.
    pub fn define_accessor(
        &mut self,
        obj: ObjectId,
        key: &str,
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
        accessor_hclass: HClassId,
    ) -> Result<(), ObjectModelError> {
        let pair = self.new_object(accessor_hclass, ObjectKind::Accessor { getter, setter })?;
        let hclass = self.object(obj).ok_or(ObjectModelError::InvalidObject(obj))?.hclass;
        let mut derived = self.hclass(hclass).ok_or(ObjectModelError::InvalidHClass(hclass))?.derive();
        let attr = derived.append(key, Representation::Tagged, true);
        let target = self.add_hclass(derived);
        let plr = PropertyLookupResult::from_attributes(&attr);
        let object = self.object_mut(obj)?;
        object.hclass = target;
        object.store_slot(&plr, pair.to_value());
        self.notify_if_prototype(obj);
        Ok(())
    }

    /// Reads `key` through the prototype chain. Accessors read as their
    /// accessor pair object.
    pub fn get_property(&self, obj: ObjectId, key: &str) -> Value {
        let Some(object) = self.object(obj) else {
            return Value::Undefined;
        };
        match self.find_holder(object.hclass, key) {
            Some((holder_hclass, _, plr)) => self
                .holder_object(obj, holder_hclass)
                .and_then(|h| self.object(h))
                .map(|h| h.load_slot(&plr))
                .unwrap_or(Value::Undefined),
            None => Value::Undefined,
        }
    }

    /// First object on `obj`'s prototype chain (itself included) whose
    /// hidden class is `holder_hclass`.
    pub fn holder_object(&self, obj: ObjectId, holder_hclass: HClassId) -> Option<ObjectId> {
        let mut current = Some(obj);
        for _ in 0..MAX_PROTO_CHAIN {
            let id = current?;
            let object = self.object(id)?;
            if object.hclass == holder_hclass {
                return Some(id);
            }
            current = self.prototype_of(object.hclass);
        }
        None
    }

    /// `Object.setPrototypeOf(obj, proto)`.
    ///
    /// The object moves to a fresh hidden class. An array whose new
    /// prototype is not `Array.prototype` loses element stability.
    pub fn set_prototype(&mut self, obj: ObjectId, proto: Option<ObjectId>) -> Result<(), ObjectModelError> {
        if let Some(p) = proto {
            self.make_prototype(p)?;
        }
        let array_proto = self.builtin_prototype(BuiltinTypeId::Array);
        let was_proto = self
            .object(obj)
            .and_then(|o| self.hclass(o.hclass))
            .is_some_and(|h| h.is_prototype);
        if was_proto {
            self.mark_prototype_changed(obj);
        }
        self.derive_hclass(obj, |h| {
            h.prototype = proto;
            if h.object_type == JSType::JSArray && proto != array_proto {
                h.is_stable_elements = false;
            }
        })?;
        Ok(())
    }

    /// Drops element stability of an array.
    pub fn make_unstable(&mut self, obj: ObjectId) -> Result<(), ObjectModelError> {
        self.derive_hclass(obj, |h| h.is_stable_elements = false)?;
        Ok(())
    }

    /// Moves an array to a hidden class with a different elements kind.
    pub fn set_elements_kind(&mut self, obj: ObjectId, kind: ElementsKind) -> Result<(), ObjectModelError> {
        self.derive_hclass(obj, |h| h.elements_kind = kind)?;
        Ok(())
    }

    /// Assigns `func.prototype`.
    ///
    /// The function's own hidden class marker is invalidated since guards
    /// on the function assume its prototype is unchanged.
    pub fn set_function_prototype(&mut self, func: ObjectId, proto: ObjectId) -> Result<(), ObjectModelError> {
        self.make_prototype(proto)?;
        let object = self.object_mut(func)?;
        let hclass = object.hclass;
        match &mut object.kind {
            ObjectKind::Function(data) => data.proto_or_hclass = ProtoOrHClass::Prototype(proto),
            _ => {
                return Err(ObjectModelError::WrongKind {
                    object: func,
                    expected: "function",
                })
            }
        }
        self.hclass_mut(hclass)?.proto_changed = true;
        Ok(())
    }

    /// Records the instance hidden class of a constructor.
    pub fn set_function_instance_hclass(&mut self, func: ObjectId, hclass: HClassId) -> Result<(), ObjectModelError> {
        match &mut self.object_mut(func)?.kind {
            ObjectKind::Function(data) => {
                data.proto_or_hclass = ProtoOrHClass::HClass(hclass);
                Ok(())
            }
            _ => Err(ObjectModelError::WrongKind {
                object: func,
                expected: "function",
            }),
        }
    }

    /// Replaces the function a value refers to, keeping its hidden class.
    pub fn function_data_mut(&mut self, func: ObjectId) -> Result<&mut FunctionData, ObjectModelError> {
        match &mut self.object_mut(func)?.kind {
            ObjectKind::Function(data) => Ok(data),
            _ => Err(ObjectModelError::WrongKind {
                object: func,
                expected: "function",
            }),
        }
    }
}
