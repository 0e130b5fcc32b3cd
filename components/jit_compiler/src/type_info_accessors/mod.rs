//! Typed views of bytecode gates
//!
//! An accessor wraps one bytecode gate and answers the questions a lowering
//! strategy asks before it commits: which gates are the operands, what
//! single type can be speculated, and which receiver shapes were profiled.
//!
//! Accessors copy what they need out of the circuit and the profile when
//! they are built, so a strategy can hold one while it edits the circuit.
//! Weak or missing evidence is never an error; it shows up as an empty,
//! illegal or `Any` answer the strategy must check first.
//!
//! # Operand layouts
//!
//! | Opcode family | Value inputs |
//! |---|---|
//! | binary operators | `[left, right]` |
//! | unary operators, `TYPEOF`, `TONUMERIC`, `ISTRUE`/`ISFALSE` | `[value]` |
//! | `JEQZ`/`JNEZ` | `[condition]` |
//! | `LDOBJBYNAME` | `[receiver]` |
//! | `LDTHISBYNAME` | `[]`, receiver is the `this` argument |
//! | `STOBJBYNAME`, `STOWNBYNAME`, `DEFINE*BYNAME` | `[receiver, value]` |
//! | `STTHISBYNAME` | `[value]` |
//! | `LDOBJBYVALUE` / `LDTHISBYVALUE` | `[receiver, key]` / `[key]` |
//! | `STOBJBYVALUE`, `STOWNBYVALUE` | `[receiver, key, value]` |
//! | `LDOBJBYINDEX` / `STOBJBYINDEX` | `[receiver]` / `[receiver, value]`, index in `imms[0]` |
//! | `LDPRIVATEPROPERTY` / `STPRIVATEPROPERTY` | `[receiver]` / `[receiver, value]`, `imms = [level, slot]` |
//! | `CALLARG*`, `CALLRANGE` | `[args..., func]` |
//! | `CALLTHIS*`, `CALLTHISRANGE`, `CALLRUNTIME_CALLINIT` | `[this, args..., func]` |
//! | `NEWOBJRANGE` | `[ctor, args...]` |
//! | `SUPERCALLTHISRANGE` | `[args...]` |
//! | `INSTANCEOF` | `[object, target]` |
//! | `GETITERATOR` | `[object]` |

mod arithmetic;
mod builtin;
mod call;
mod create;
mod object_access;

pub use arithmetic::{
    BinOpTypeInfoAccessor, ConditionJumpTypeInfoAccessor, TypeOfTypeInfoAccessor, UnOpTypeInfoAccessor,
};
pub use builtin::{LoadBuiltinObjTypeInfoAccessor, StoreBuiltinObjTypeInfoAccessor};
pub use call::{
    CallTypeInfoAccessor, GetIteratorTypeInfoAccessor, InstanceOfTypeInfoAccessor, LoadGlobalTypeInfoAccessor,
    NewObjRangeTypeInfoAccessor, SuperCallTypeInfoAccessor,
};
pub use create::CreateObjWithBufferTypeInfoAccessor;
pub use object_access::{
    AccessInfo, AccessKind, LoadObjPropertyTypeInfoAccessor, LoadPrivatePropertyTypeInfoAccessor,
    StoreObjByNameTypeInfoAccessor, StorePrivatePropertyTypeInfoAccessor,
};

use bytecode_system::EcmaOpcode;
use core_types::ParamType;

use crate::circuit::{ArgKind, BytecodeInfo, Circuit, GateRef};
use crate::error::{LoweringError, LoweringResult};

/// Largest number of receiver shapes a polymorphic access dispatches on
pub const MAX_POLY_CANDIDATES: usize = 4;

/// Common surface of the accessors
pub trait TypeInfoAccessor {
    /// Bytecode gate the accessor describes.
    fn gate(&self) -> GateRef;

    /// Best single speculated type; `Any` when none applies.
    fn param_type(&self) -> ParamType {
        ParamType::Any
    }
}

/// Bytecode payload of `gate`.
pub(crate) fn bytecode_info(circuit: &Circuit, gate: GateRef) -> LoweringResult<&BytecodeInfo> {
    circuit.op(gate)?.bytecode().ok_or(LoweringError::InvalidGate(gate))
}

/// Receiver of a property access, following the `this` variants.
pub(crate) fn receiver_of(circuit: &Circuit, gate: GateRef, opcode: EcmaOpcode) -> LoweringResult<Option<GateRef>> {
    match opcode {
        EcmaOpcode::LdThisByName | EcmaOpcode::StThisByName | EcmaOpcode::LdThisByValue => {
            Ok(circuit.find_arg(ArgKind::This))
        }
        _ => circuit.value_in(gate, 0).map(Some),
    }
}
