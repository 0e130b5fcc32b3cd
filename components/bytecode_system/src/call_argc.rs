//! Argument accounting for call bytecodes.

use crate::opcode::EcmaOpcode;

/// Implicit leading arguments of every JS function frame: the callee,
/// `new.target` and `this`.
pub const NUM_MANDATORY_JSFUNC_ARGS: usize = 3;

/// Number of actual arguments a call gate passes, mandatory slots included.
///
/// `num_value_in` counts the call gate's value inputs. `this`-calls carry
/// both the receiver and the callee as value inputs; every other call
/// carries only the callee.
pub fn compute_call_argc(num_value_in: usize, op: EcmaOpcode) -> usize {
    if op.is_this_call() {
        num_value_in + NUM_MANDATORY_JSFUNC_ARGS - 2
    } else {
        num_value_in + NUM_MANDATORY_JSFUNC_ARGS - 1
    }
}
