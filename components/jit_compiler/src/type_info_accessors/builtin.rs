//! Accessors of accesses whose receivers were builtin objects
//!
//! Profiles record builtin receivers (arrays, strings, typed arrays, maps,
//! global objects) by family rather than by hidden class. These accessors
//! expose that family so strategies can pick a fixed-function fast path
//! such as a length read or a typed element load.

use bytecode_system::EcmaOpcode;
use core_types::{BuiltinTypeId, ElementsKind, JSType};
use pgo_profiler::{GlobalsKind, ProfileKind, ProfileType};

use super::{bytecode_info, receiver_of, TypeInfoAccessor};
use crate::circuit::{Circuit, GateOp, GateRef};
use crate::compilation_env::CompilationEnv;
use crate::error::LoweringResult;

/// Builtin receiver profile of one access site.
#[derive(Debug, Clone, Default)]
struct BuiltinSite {
    types: Vec<ProfileType>,
    elements_kinds: Vec<ElementsKind>,
    transition_kinds: Vec<ElementsKind>,
}

impl BuiltinSite {
    fn read(env: &CompilationEnv<'_>, offset: u32) -> Self {
        let Some(rw) = env.recorder().rw_type(offset) else {
            return Self::default();
        };
        let types = rw
            .infos()
            .iter()
            .map(|info| info.receiver)
            .filter(|pt| matches!(pt.kind, ProfileKind::Builtins { .. } | ProfileKind::Globals { .. }))
            .collect();
        Self {
            types,
            elements_kinds: env.recorder().elements_kinds_for_user(offset),
            transition_kinds: env.recorder().transition_elements_kinds_for_user(offset),
        }
    }

    /// Builtin family shared by every profiled receiver.
    fn builtin_type(&self) -> Option<BuiltinTypeId> {
        let first = self.types.first()?.builtin_type()?;
        self.types.iter().all(|pt| pt.builtin_type() == Some(first)).then_some(first)
    }
}

fn is_create_array(circuit: &Circuit, gate: GateRef) -> bool {
    circuit
        .op(gate)
        .ok()
        .and_then(GateOp::bytecode)
        .is_some_and(|info| info.opcode == EcmaOpcode::CreateEmptyArray)
}

macro_rules! builtin_queries {
    () => {
        /// No builtin receiver was profiled.
        pub fn has_no_type(&self) -> bool {
            self.site.types.is_empty()
        }

        /// Exactly one builtin receiver was profiled.
        pub fn is_mono(&self) -> bool {
            self.site.types.len() == 1
        }

        /// Family shared by every profiled receiver.
        pub fn builtin_type(&self) -> Option<BuiltinTypeId> {
            self.site.builtin_type()
        }

        /// Receivers were arrays.
        pub fn is_builtins_array(&self) -> bool {
            self.builtin_type() == Some(BuiltinTypeId::Array)
        }

        /// Receivers were strings.
        pub fn is_builtins_string(&self) -> bool {
            self.builtin_type() == Some(BuiltinTypeId::String)
        }

        /// Receivers were typed arrays of one layout.
        pub fn is_builtins_typed_array(&self) -> bool {
            self.builtin_type().is_some_and(BuiltinTypeId::is_typed_array)
        }

        /// Receivers were maps.
        pub fn is_builtins_map(&self) -> bool {
            self.builtin_type() == Some(BuiltinTypeId::Map)
        }

        /// Layout of the profiled builtin receivers.
        pub fn builtins_js_type(&self) -> Option<JSType> {
            self.builtin_type().and_then(BuiltinTypeId::to_js_type)
        }

        /// Elements kind of a single array receiver before transitions.
        pub fn array_elements_kind(&self) -> ElementsKind {
            match self.site.elements_kinds.as_slice() {
                [kind] => *kind,
                _ => ElementsKind::GENERIC,
            }
        }

        /// Elements kind of a single array receiver after transitions.
        pub fn transition_elements_kind(&self) -> ElementsKind {
            match self.site.transition_kinds.as_slice() {
                [kind] => *kind,
                _ => ElementsKind::GENERIC,
            }
        }
    };
}

/// Load whose receivers were builtins
#[derive(Debug, Clone)]
pub struct LoadBuiltinObjTypeInfoAccessor {
    gate: GateRef,
    receiver: Option<GateRef>,
    key_gate: Option<GateRef>,
    key: Option<String>,
    index: Option<u32>,
    receiver_is_create_array: bool,
    site: BuiltinSite,
}

impl LoadBuiltinObjTypeInfoAccessor {
    /// Reads a named, by-value or by-index load.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let receiver = receiver_of(circuit, gate, info.opcode)?;
        let key_gate = match info.opcode {
            EcmaOpcode::LdObjByValue => Some(circuit.value_in(gate, 1)?),
            EcmaOpcode::LdThisByValue => Some(circuit.value_in(gate, 0)?),
            _ => None,
        };
        let index = match info.opcode {
            EcmaOpcode::LdObjByIndex | EcmaOpcode::WideLdObjByIndex => info.imms.first().copied(),
            _ => None,
        };
        Ok(Self {
            gate,
            receiver,
            key_gate,
            key: info.key.clone(),
            index,
            receiver_is_create_array: receiver.is_some_and(|r| is_create_array(circuit, r)),
            site: BuiltinSite::read(env, info.pc_offset),
        })
    }

    /// Receiver operand.
    pub fn receiver(&self) -> Option<GateRef> {
        self.receiver
    }

    /// Key operand of a by-value load.
    pub fn key_gate(&self) -> Option<GateRef> {
        self.key_gate
    }

    /// Property name of a named load.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Immediate index of a by-index load.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Receiver was created by an array literal in this method.
    pub fn receiver_is_create_array(&self) -> bool {
        self.receiver_is_create_array
    }

    /// Global table entry of a single global receiver.
    pub fn globals_id(&self) -> Option<(GlobalsKind, u32)> {
        match self.site.types.as_slice() {
            [ProfileType { kind: ProfileKind::Globals { kind, index }, .. }] => Some((*kind, *index)),
            _ => None,
        }
    }

    builtin_queries!();
}

impl TypeInfoAccessor for LoadBuiltinObjTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// Store whose receivers were builtins
#[derive(Debug, Clone)]
pub struct StoreBuiltinObjTypeInfoAccessor {
    gate: GateRef,
    receiver: GateRef,
    key_gate: Option<GateRef>,
    index: Option<u32>,
    value: GateRef,
    receiver_is_create_array: bool,
    site: BuiltinSite,
}

impl StoreBuiltinObjTypeInfoAccessor {
    /// Reads a by-value or by-index store.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let receiver = circuit.value_in(gate, 0)?;
        let (key_gate, index, value) = match info.opcode {
            EcmaOpcode::StObjByIndex | EcmaOpcode::WideStObjByIndex => {
                (None, info.imms.first().copied(), circuit.value_in(gate, 1)?)
            }
            _ => (Some(circuit.value_in(gate, 1)?), None, circuit.value_in(gate, 2)?),
        };
        Ok(Self {
            gate,
            receiver,
            key_gate,
            index,
            value,
            receiver_is_create_array: is_create_array(circuit, receiver),
            site: BuiltinSite::read(env, info.pc_offset),
        })
    }

    /// Receiver operand.
    pub fn receiver(&self) -> GateRef {
        self.receiver
    }

    /// Key operand of a by-value store.
    pub fn key_gate(&self) -> Option<GateRef> {
        self.key_gate
    }

    /// Immediate index of a by-index store.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Stored value.
    pub fn value(&self) -> GateRef {
        self.value
    }

    /// Receiver was created by an array literal in this method.
    pub fn receiver_is_create_array(&self) -> bool {
        self.receiver_is_create_array
    }

    builtin_queries!();
}

impl TypeInfoAccessor for StoreBuiltinObjTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}
