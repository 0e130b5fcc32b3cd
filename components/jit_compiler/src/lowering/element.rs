//! Keyed and indexed element accesses
//!
//! Only sites whose receivers were a single builtin family are lowered:
//! string characters, array elements dispatched on the profiled elements
//! kind, and typed array elements. Every access is bounds checked against
//! the receiver's current length.

use core_types::{ElementsKind, JSType, ParamType, Value};

use super::TypedBytecodeLowering;
use crate::builder::CircuitBuilder;
use crate::circuit::{CheckKind, ElementAccessKind, GateOp, GateRef};
use crate::deopt::DeoptType;
use crate::error::LoweringResult;
use crate::type_info_accessors::{LoadBuiltinObjTypeInfoAccessor, StoreBuiltinObjTypeInfoAccessor};

/// Receiver family of an element access.
#[derive(Debug, Clone, Copy)]
enum ElementTarget {
    String,
    Array { kind: ElementsKind, is_create_array: bool },
    TypedArray(JSType),
}

macro_rules! element_target {
    ($acc:expr) => {
        if !$acc.is_mono() {
            None
        } else if $acc.is_builtins_string() {
            Some(ElementTarget::String)
        } else if $acc.is_builtins_array() {
            Some(ElementTarget::Array {
                kind: $acc.array_elements_kind(),
                is_create_array: $acc.receiver_is_create_array(),
            })
        } else if $acc.is_builtins_typed_array() {
            $acc.builtins_js_type().map(ElementTarget::TypedArray)
        } else {
            None
        }
    };
}

/// Guards `receiver` as a member of `target` and `key` as an in-bounds
/// index. Yields the guarded receiver and key.
fn guard_element_access(
    b: &mut CircuitBuilder<'_>,
    target: ElementTarget,
    receiver: GateRef,
    key: GateRef,
) -> LoweringResult<(GateRef, GateRef)> {
    let (receiver, length) = match target {
        ElementTarget::String => {
            let receiver = b.check(CheckKind::EcmaString, vec![receiver], DeoptType::NotString1)?;
            (receiver, b.effect(GateOp::LoadStringLength, vec![receiver]))
        }
        ElementTarget::Array { kind, is_create_array } => {
            let mut receiver = receiver;
            if !is_create_array {
                receiver = b.check(CheckKind::StableArray, vec![receiver], DeoptType::NotStableArray1)?;
            }
            if !kind.is_generic() {
                receiver = b.check(CheckKind::ElementsKind(kind), vec![receiver], DeoptType::InconsistentElementsKind1)?;
            }
            (receiver, b.effect(GateOp::LoadArrayLength, vec![receiver]))
        }
        ElementTarget::TypedArray(js_type) => {
            let receiver = b.check(CheckKind::TypedArray(js_type), vec![receiver], DeoptType::NotTypedArray1)?;
            (receiver, b.effect(GateOp::LoadTypedArrayLength, vec![receiver]))
        }
    };
    let key = b.check(CheckKind::Index, vec![key, length], DeoptType::NotLegalIdx1)?;
    Ok((receiver, key))
}

fn load_kind(target: ElementTarget) -> ElementAccessKind {
    match target {
        ElementTarget::String => ElementAccessKind::StringChar,
        ElementTarget::Array { kind, .. } => ElementAccessKind::for_array(kind),
        ElementTarget::TypedArray(js_type) => ElementAccessKind::TypedArray(js_type),
    }
}

impl TypedBytecodeLowering<'_, '_> {
    /// `LDOBJBYVALUE` and `LDTHISBYVALUE`.
    pub(super) fn lower_ld_obj_by_value(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = LoadBuiltinObjTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.has_no_type() {
            return Ok(());
        }
        let (Some(receiver), Some(key), Some(target)) = (acc.receiver(), acc.key_gate(), element_target!(acc)) else {
            return Ok(());
        };
        self.lower_element_load(gate, target, receiver, |_| key)
    }

    /// `LDOBJBYINDEX`: typed arrays only.
    pub(super) fn lower_ld_obj_by_index(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = LoadBuiltinObjTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.has_no_type() {
            return Ok(());
        }
        let (Some(receiver), Some(index), Some(target @ ElementTarget::TypedArray(_))) =
            (acc.receiver(), acc.index(), element_target!(acc))
        else {
            return Ok(());
        };
        // Indices past the Smi range stay generic.
        let Ok(index) = i32::try_from(index) else {
            return Ok(());
        };
        self.lower_element_load(gate, target, receiver, |b| b.constant(Value::Smi(index)))
    }

    fn lower_element_load(
        &mut self,
        gate: GateRef,
        target: ElementTarget,
        receiver: GateRef,
        key: impl FnOnce(&mut CircuitBuilder<'_>) -> GateRef,
    ) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let key = key(&mut b);
        let (receiver, key) = if no_check { (receiver, key) } else { guard_element_access(&mut b, target, receiver, key)? };
        let result = b.effect(GateOp::LoadElement(load_kind(target)), vec![receiver, key]);
        b.replace_hir(Some(result))
    }

    /// `STOBJBYVALUE` on arrays and typed arrays.
    pub(super) fn lower_st_obj_by_value(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = StoreBuiltinObjTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.has_no_type() {
            return Ok(());
        }
        let (Some(key), Some(target)) = (acc.key_gate(), element_target!(acc)) else {
            return Ok(());
        };
        match target {
            ElementTarget::String => return Ok(()),
            // A store that moves the array to another elements kind stays generic.
            ElementTarget::Array { kind, .. } if acc.transition_elements_kind() != kind => return Ok(()),
            _ => {}
        }
        self.lower_element_store(gate, target, acc.receiver(), acc.value(), |_| key)
    }

    /// `STOBJBYINDEX`: `Float32Array` receivers only.
    pub(super) fn lower_st_obj_by_index(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = StoreBuiltinObjTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.has_no_type() {
            return Ok(());
        }
        let (Some(index), Some(target @ ElementTarget::TypedArray(JSType::JSFloat32Array))) =
            (acc.index(), element_target!(acc))
        else {
            return Ok(());
        };
        let Ok(index) = i32::try_from(index) else {
            return Ok(());
        };
        self.lower_element_store(gate, target, acc.receiver(), acc.value(), |b| b.constant(Value::Smi(index)))
    }

    fn lower_element_store(
        &mut self,
        gate: GateRef,
        target: ElementTarget,
        receiver: GateRef,
        value: GateRef,
        key: impl FnOnce(&mut CircuitBuilder<'_>) -> GateRef,
    ) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let trusted_number = self.circuit.is_trusted_number(value);
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let key = key(&mut b);
        let kind = load_kind(target);
        if no_check {
            b.effect(GateOp::StoreElement(kind), vec![receiver, key, value]);
            return b.replace_hir(None);
        }

        let (receiver, key) = guard_element_access(&mut b, target, receiver, key)?;
        let value = match kind {
            ElementAccessKind::ArrayInt => {
                b.check(CheckKind::PrimitiveType(ParamType::Int), vec![value], DeoptType::NotInt1)?
            }
            ElementAccessKind::ArrayDouble | ElementAccessKind::TypedArray(_) if !trusted_number => {
                b.check(CheckKind::PrimitiveType(ParamType::Number), vec![value], DeoptType::NotNumber1)?
            }
            ElementAccessKind::ArrayObject => b.check(CheckKind::HeapObject, vec![value], DeoptType::NotHeapObject3)?,
            _ => value,
        };
        if matches!(target, ElementTarget::Array { .. }) {
            b.check(CheckKind::CowArray, vec![receiver], DeoptType::CowArray1)?;
        }
        b.effect(GateOp::StoreElement(kind), vec![receiver, key, value]);
        b.replace_hir(None)
    }
}
