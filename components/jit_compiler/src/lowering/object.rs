//! `instanceof` and object literal creation

use super::TypedBytecodeLowering;
use crate::builder::CircuitBuilder;
use crate::circuit::{CheckKind, GateOp, GateRef};
use crate::deopt::DeoptType;
use crate::error::LoweringResult;
use crate::type_info_accessors::{CreateObjWithBufferTypeInfoAccessor, InstanceOfTypeInfoAccessor};

impl TypedBytecodeLowering<'_, '_> {
    /// `INSTANCEOF` against a profiled constructor shape. The target's
    /// shape and prototype chain are pinned, so the ordinary algorithm runs
    /// without `Symbol.hasInstance` lookups.
    pub(super) fn lower_instance_of(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = InstanceOfTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.types_is_empty() || acc.has_illegal_type() {
            return Ok(());
        }
        let Some(expected) = acc.expected_hclass(0) else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let target = acc.target();
        if !no_check {
            b.check(CheckKind::ObjectType { hclass: expected }, vec![target], DeoptType::InconsistentHClass6)?;
            b.check(CheckKind::ProtoChangeMarker, vec![target], DeoptType::PrototypeChanged4)?;
        }
        let result = b.effect_with_frame_state(GateOp::OrdinaryHasInstance, vec![acc.object(), target])?;
        b.replace_hir(Some(result))
    }

    /// `CREATEEMPTYOBJECT`.
    pub(super) fn lower_create_empty_object(&mut self, gate: GateRef) -> LoweringResult<()> {
        let Some(hclass) = self.env.heap().object_function_hclass() else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let object = b.effect(GateOp::CreateEmptyObject { hclass }, vec![]);
        b.replace_hir(Some(object))
    }

    /// `CREATEOBJECTWITHBUFFER` whose literal fits the profiled class.
    pub(super) fn lower_create_obj_with_buffer(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = CreateObjWithBufferTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let Some(hclass) = acc.hclass().filter(|_| acc.can_optimize()) else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let slots: Vec<GateRef> = acc.slot_values().iter().map(|v| b.constant(v.clone())).collect();
        let object = b.effect(GateOp::TypedCreateObjWithBuffer { hclass }, slots);
        b.replace_hir(Some(object))
    }
}
