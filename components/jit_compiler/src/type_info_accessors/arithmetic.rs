//! Accessors of operators, `typeof` and conditional jumps

use core_types::ParamType;
use pgo_profiler::PGOSampleType;

use super::{bytecode_info, TypeInfoAccessor};
use crate::circuit::{BranchWeight, Circuit, GateRef};
use crate::compilation_env::CompilationEnv;
use crate::error::LoweringResult;

fn sample_at(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Option<PGOSampleType>> {
    let offset = bytecode_info(circuit, gate)?.pc_offset;
    Ok(env.recorder().sample_type(offset).copied().filter(|s| !s.is_none()))
}

/// Most precise number type covering both sides.
fn join_numbers(a: ParamType, b: ParamType) -> ParamType {
    match (a, b) {
        (ParamType::Int, ParamType::Int) => ParamType::Int,
        (ParamType::Double, ParamType::Double) => ParamType::Double,
        _ => ParamType::Number,
    }
}

/// Binary operator operands and their speculation
#[derive(Debug, Clone)]
pub struct BinOpTypeInfoAccessor {
    gate: GateRef,
    left: GateRef,
    right: GateRef,
    sample: Option<PGOSampleType>,
    left_type: ParamType,
    right_type: ParamType,
}

impl BinOpTypeInfoAccessor {
    /// Reads a binary operator gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let left = circuit.value_in(gate, 0)?;
        let right = circuit.value_in(gate, 1)?;
        Ok(Self {
            gate,
            left,
            right,
            sample: sample_at(env, circuit, gate)?,
            left_type: circuit.trusted_type(left),
            right_type: circuit.trusted_type(right),
        })
    }

    /// Left operand.
    pub fn left(&self) -> GateRef {
        self.left
    }

    /// Right operand.
    pub fn right(&self) -> GateRef {
        self.right
    }

    /// Statically known type of the left operand.
    pub fn left_type(&self) -> ParamType {
        self.left_type
    }

    /// Statically known type of the right operand.
    pub fn right_type(&self) -> ParamType {
        self.right_type
    }

    /// Either side is statically `undefined` or `null`.
    pub fn left_or_right_is_undefined_or_null(&self) -> bool {
        let nullish = |t: ParamType| matches!(t, ParamType::Undefined | ParamType::Null);
        nullish(self.left_type) || nullish(self.right_type)
    }

    /// Both operands are numbers, by profile or statically.
    pub fn has_number_type(&self) -> bool {
        if self.left_or_right_is_undefined_or_null() {
            return false;
        }
        match self.sample {
            Some(sample) => sample.is_number(),
            None => self.left_type.is_number_type() && self.right_type.is_number_type(),
        }
    }

    /// Both operands are interned strings.
    pub fn is_intern_string_type(&self) -> bool {
        match self.sample {
            Some(sample) => sample.is_intern_string(),
            None => self.left_type.is_intern_string_type() && self.right_type.is_intern_string_type(),
        }
    }

    /// Both operands are strings.
    pub fn is_string_type(&self) -> bool {
        match self.sample {
            Some(sample) => sample.is_string(),
            None => self.left_type.is_string_type() && self.right_type.is_string_type(),
        }
    }

    /// One side is a string and the other a number or string.
    pub fn is_number_or_string_type(&self) -> bool {
        match self.sample {
            Some(sample) => sample.is_number_or_string(),
            None => {
                (self.left_type.is_string_type() && self.right_type.is_number_type())
                    || (self.left_type.is_number_type() && self.right_type.is_string_type())
            }
        }
    }
}

impl TypeInfoAccessor for BinOpTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }

    fn param_type(&self) -> ParamType {
        if self.has_number_type() {
            return match self.sample {
                Some(sample) => sample.param_type(),
                None => join_numbers(self.left_type, self.right_type),
            };
        }
        if self.is_intern_string_type() {
            ParamType::InternString
        } else if self.is_string_type() || self.is_number_or_string_type() {
            ParamType::String
        } else {
            ParamType::Any
        }
    }
}

/// Unary operator operand and its speculation
#[derive(Debug, Clone)]
pub struct UnOpTypeInfoAccessor {
    gate: GateRef,
    value: GateRef,
    sample: Option<PGOSampleType>,
    value_type: ParamType,
}

impl UnOpTypeInfoAccessor {
    /// Reads a unary operator gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let value = circuit.value_in(gate, 0)?;
        Ok(Self { gate, value, sample: sample_at(env, circuit, gate)?, value_type: circuit.trusted_type(value) })
    }

    /// Operand.
    pub fn value(&self) -> GateRef {
        self.value
    }

    /// Statically known type of the operand.
    pub fn value_type(&self) -> ParamType {
        self.value_type
    }

    /// The operand is a number, by profile or statically.
    pub fn has_number_type(&self) -> bool {
        match self.sample {
            Some(sample) => sample.is_number(),
            None => self.value_type.is_number_type(),
        }
    }

    /// The profile saw only booleans.
    pub fn is_boolean_type(&self) -> bool {
        self.sample.is_some_and(|s| s.is_boolean())
    }
}

impl TypeInfoAccessor for UnOpTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }

    fn param_type(&self) -> ParamType {
        match self.sample {
            Some(sample) if sample.is_number() => sample.param_type(),
            Some(_) => ParamType::Any,
            None if self.value_type.is_number_type() => self.value_type,
            None => ParamType::Any,
        }
    }
}

/// Condition of a conditional jump
#[derive(Debug, Clone)]
pub struct ConditionJumpTypeInfoAccessor {
    gate: GateRef,
    value: GateRef,
    weight: BranchWeight,
}

impl ConditionJumpTypeInfoAccessor {
    /// Reads a `JEQZ`/`JNEZ` gate.
    pub fn new(circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let weight = bytecode_info(circuit, gate)?.weight;
        Ok(Self { gate, value: circuit.value_in(gate, 0)?, weight })
    }

    /// Condition operand.
    pub fn value(&self) -> GateRef {
        self.value
    }

    /// Branch weight recorded on the jump.
    pub fn branch_weight(&self) -> BranchWeight {
        self.weight
    }
}

impl TypeInfoAccessor for ConditionJumpTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// Operand of `typeof`
#[derive(Debug, Clone)]
pub struct TypeOfTypeInfoAccessor {
    gate: GateRef,
    value: GateRef,
    param: ParamType,
}

impl TypeOfTypeInfoAccessor {
    /// Reads a `TYPEOF` gate; static typing wins over the profile.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let value = circuit.value_in(gate, 0)?;
        let trusted = circuit.trusted_type(value);
        let param = if trusted.type_of_string().is_some() {
            trusted
        } else {
            sample_at(env, circuit, gate)?.map_or(ParamType::Any, |s| s.param_type())
        };
        Ok(Self { gate, value, param })
    }

    /// Operand.
    pub fn value(&self) -> GateRef {
        self.value
    }

    /// The operand's `typeof` result is not unique.
    pub fn is_illegal_type(&self) -> bool {
        self.param.type_of_string().is_none()
    }
}

impl TypeInfoAccessor for TypeOfTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }

    fn param_type(&self) -> ParamType {
        self.param
    }
}
