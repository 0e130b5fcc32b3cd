//! Accessor of object literal creation

use core_types::Value;
use object_model::HClassId;

use super::{bytecode_info, TypeInfoAccessor};
use crate::circuit::{Circuit, GateRef};
use crate::compilation_env::CompilationEnv;
use crate::error::LoweringResult;

/// Values that can be baked into an allocation without running user code.
fn is_bakeable(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Null | Value::Boolean(_) | Value::Smi(_) | Value::Double(_) | Value::String(_)
    )
}

/// `CREATEOBJECTWITHBUFFER` site
#[derive(Debug, Clone)]
pub struct CreateObjWithBufferTypeInfoAccessor {
    gate: GateRef,
    hclass: Option<HClassId>,
    slots: Option<Vec<Value>>,
}

impl CreateObjWithBufferTypeInfoAccessor {
    /// Reads the site's profiled class and literal buffer.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let hclass = env
            .recorder()
            .define_type(info.pc_offset)
            .map(|d| d.profile_type)
            .filter(|pt| env.recorder().is_valid_pt(pt))
            .and_then(|pt| pt.hclass());
        let literal = info
            .imms
            .first()
            .and_then(|&id| env.literals().and_then(|table| table.get(env.file(), id)));

        let slots = match (hclass.and_then(|id| env.heap().hclass(id)), literal) {
            (Some(class), Some(literal)) => {
                let props = &literal.properties;
                let layout_matches = class.layout.len() == props.len()
                    && props.len() <= class.inlined_props as usize
                    && class.layout.iter().zip(props).all(|(attr, (key, value))| {
                        attr.key == *key
                            && attr.in_object
                            && !attr.is_accessor
                            && is_bakeable(value)
                            && attr.representation.can_store(value)
                    });
                layout_matches.then(|| {
                    let fill = if class.is_ts { Value::Hole } else { Value::Undefined };
                    let mut slots: Vec<Value> = props.iter().map(|(_, v)| v.clone()).collect();
                    slots.resize(class.inlined_props as usize, fill);
                    slots
                })
            }
            _ => None,
        };
        Ok(Self { gate, hclass, slots })
    }

    /// Profiled class of the created object.
    pub fn hclass(&self) -> Option<HClassId> {
        self.hclass
    }

    /// The literal can be allocated with its values baked in.
    pub fn can_optimize(&self) -> bool {
        self.hclass.is_some() && self.slots.is_some()
    }

    /// Initial values of every in-object slot.
    pub fn slot_values(&self) -> &[Value] {
        self.slots.as_deref().unwrap_or_default()
    }
}

impl TypeInfoAccessor for CreateObjWithBufferTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}
