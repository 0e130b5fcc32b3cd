//! Conditional jumps

use core_types::{ParamType, TypedJumpOp};

use super::TypedBytecodeLowering;
use crate::circuit::{GateOp, GateRef};
use crate::error::LoweringResult;
use crate::type_info_accessors::ConditionJumpTypeInfoAccessor;

impl TypedBytecodeLowering<'_, '_> {
    /// `JEQZ`/`JNEZ` on a boolean condition become a typed jump in place;
    /// the branch edges keep hanging off the replacement.
    pub(super) fn lower_condition_jump(&mut self, gate: GateRef, op: TypedJumpOp) -> LoweringResult<()> {
        let acc = ConditionJumpTypeInfoAccessor::new(self.circuit, gate)?;
        if !self.circuit.is_trusted_boolean(acc.value()) {
            return Ok(());
        }
        self.add_profiling(gate)?;

        let g = self.circuit.gate(gate)?;
        let state = g.state_in.first().copied().unwrap_or_else(|| self.circuit.state_entry());
        let depend = g.depend_in.first().copied().unwrap_or_else(|| self.circuit.depend_entry());
        let jump = self.circuit.new_gate(
            GateOp::TypedConditionJump { op, param: ParamType::Boolean, weight: acc.branch_weight() },
            vec![state],
            vec![depend],
            vec![acc.value()],
        );
        self.circuit.replace_gate(gate, jump, jump, None)
    }
}
