//! Profile-guided typed lowering of bytecode gates
//!
//! [`TypedBytecodeLowering`] visits every `JsBytecode` gate of a method
//! once. Each opcode maps to a [`BytecodeShape`]; the strategy for that
//! shape builds the accessor, decides from profile and static types whether
//! a speculation is justified, and only then rewrites the gate into a typed
//! region guarded by checks that deoptimize to the gate's frame state.
//!
//! A strategy that finds too little evidence returns without touching the
//! circuit. Errors are reserved for broken invariants and abandon the whole
//! compilation unit.
//!
//! Strategies live in submodules by family:
//!
//! - `arithmetic`: binary and unary operators, `TONUMERIC`, `TYPEOF`,
//!   `ISTRUE`/`ISFALSE`
//! - `control`: `JEQZ`/`JNEZ`
//! - `property`: named, private and global property accesses
//! - `element`: by-value and by-index element accesses
//! - `calls`: calls, `new`, `super(...)` and `GETITERATOR`
//! - `object`: `instanceof` and object literal creation

mod arithmetic;
mod calls;
mod control;
mod element;
mod object;
mod property;

#[cfg(test)]
pub(crate) mod fixture;

use bytecode_system::EcmaOpcode;
use core_types::{TypedBinOp, TypedJumpOp, TypedUnOp, Value};
use tracing::{debug, info, trace};

use crate::circuit::{ArgKind, Circuit, GateOp, GateRef, RuntimeId};
use crate::compilation_env::CompilationEnv;
use crate::error::LoweringResult;
use crate::options::{LoweringOptions, OptBcRange};
use crate::stats::LoweringStats;
use crate::type_info_accessors::bytecode_info;

/// Accessor family an opcode is lowered through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytecodeShape {
    /// Arithmetic, bitwise or relational operator
    BinaryOp(TypedBinOp),
    /// `==`, `!=`, `===`, `!==`; nullish operands get a single compare
    EqualityOp(TypedBinOp),
    /// Numeric unary operator
    UnaryOp(TypedUnOp),
    /// `TONUMERIC`
    ToNumeric,
    /// `ISTRUE`/`ISFALSE` and their profiled runtime variants
    TruthTest(TypedUnOp),
    /// `JEQZ`/`JNEZ`
    ConditionJump(TypedJumpOp),
    /// `TYPEOF`
    TypeOf,
    /// Named property load
    LoadByName,
    /// Named property store or definition
    StoreByName,
    /// Private field load
    LoadPrivate,
    /// Private field store
    StorePrivate,
    /// Keyed element load
    LoadByValue,
    /// Element load with an immediate index
    LoadByIndex,
    /// Keyed element store
    StoreByValue,
    /// Element store with an immediate index
    StoreByIndex,
    /// Own element definition; only counted
    StoreOwnByValue,
    /// Global variable or builtin load
    LoadGlobal,
    /// `instanceof`
    InstanceOf,
    /// `GETITERATOR`
    GetIterator,
    /// Call with an `undefined` receiver
    Call,
    /// Call with an explicit receiver
    CallThis,
    /// `new`
    NewObjRange,
    /// `super(...)`
    SuperCall,
    /// `{}`
    CreateEmptyObject,
    /// Object literal from a buffer
    CreateObjWithBuffer,
    /// No strategy exists
    Unspecialized,
}

impl BytecodeShape {
    /// Shape of `opcode`.
    pub fn of(opcode: EcmaOpcode) -> Self {
        use BytecodeShape as S;
        use EcmaOpcode as Op;
        match opcode {
            Op::Add2 => S::BinaryOp(TypedBinOp::Add),
            Op::Sub2 => S::BinaryOp(TypedBinOp::Sub),
            Op::Mul2 => S::BinaryOp(TypedBinOp::Mul),
            Op::Div2 => S::BinaryOp(TypedBinOp::Div),
            Op::Mod2 => S::BinaryOp(TypedBinOp::Mod),
            Op::Less => S::BinaryOp(TypedBinOp::Less),
            Op::LessEq => S::BinaryOp(TypedBinOp::LessEq),
            Op::Greater => S::BinaryOp(TypedBinOp::Greater),
            Op::GreaterEq => S::BinaryOp(TypedBinOp::GreaterEq),
            Op::Shl2 => S::BinaryOp(TypedBinOp::Shl),
            Op::Shr2 => S::BinaryOp(TypedBinOp::Shr),
            Op::Ashr2 => S::BinaryOp(TypedBinOp::Ashr),
            Op::And2 => S::BinaryOp(TypedBinOp::And),
            Op::Or2 => S::BinaryOp(TypedBinOp::Or),
            Op::Xor2 => S::BinaryOp(TypedBinOp::Xor),
            Op::Eq => S::EqualityOp(TypedBinOp::Eq),
            Op::NotEq => S::EqualityOp(TypedBinOp::NotEq),
            Op::StrictEq => S::EqualityOp(TypedBinOp::StrictEq),
            Op::StrictNotEq => S::EqualityOp(TypedBinOp::StrictNotEq),
            Op::Neg => S::UnaryOp(TypedUnOp::Neg),
            Op::Not => S::UnaryOp(TypedUnOp::Not),
            Op::Inc => S::UnaryOp(TypedUnOp::Inc),
            Op::Dec => S::UnaryOp(TypedUnOp::Dec),
            Op::ToNumeric => S::ToNumeric,
            Op::IsTrue | Op::CallRuntimeIsTrue => S::TruthTest(TypedUnOp::IsTrue),
            Op::IsFalse | Op::CallRuntimeIsFalse => S::TruthTest(TypedUnOp::IsFalse),
            Op::Jeqz => S::ConditionJump(TypedJumpOp::Jeqz),
            Op::Jnez => S::ConditionJump(TypedJumpOp::Jnez),
            Op::TypeOf => S::TypeOf,
            Op::LdObjByName | Op::LdThisByName => S::LoadByName,
            Op::StObjByName
            | Op::StThisByName
            | Op::DefineFieldByName
            | Op::DefinePropertyByName
            | Op::StOwnByName => S::StoreByName,
            Op::LdPrivateProperty => S::LoadPrivate,
            Op::StPrivateProperty => S::StorePrivate,
            Op::LdObjByValue | Op::LdThisByValue => S::LoadByValue,
            Op::LdObjByIndex | Op::WideLdObjByIndex => S::LoadByIndex,
            Op::StObjByValue => S::StoreByValue,
            Op::StObjByIndex | Op::WideStObjByIndex => S::StoreByIndex,
            Op::StOwnByValue => S::StoreOwnByValue,
            Op::TryLdGlobalByName => S::LoadGlobal,
            Op::InstanceOf => S::InstanceOf,
            Op::GetIterator => S::GetIterator,
            Op::CallArg0 | Op::CallArg1 | Op::CallArgs2 | Op::CallArgs3 | Op::CallRange => S::Call,
            Op::CallThis0
            | Op::CallThis1
            | Op::CallThis2
            | Op::CallThis3
            | Op::CallThisRange
            | Op::CallRuntimeCallInit => S::CallThis,
            Op::NewObjRange | Op::WideNewObjRange => S::NewObjRange,
            Op::SuperCallThisRange | Op::WideSuperCallThisRange => S::SuperCall,
            Op::CreateEmptyObject => S::CreateEmptyObject,
            Op::CreateObjectWithBuffer => S::CreateObjWithBuffer,
            Op::LdUndefined
            | Op::LdNull
            | Op::LdTrue
            | Op::LdFalse
            | Op::LdaStr
            | Op::Ldai
            | Op::Fldai
            | Op::LdLexVar
            | Op::DefineFunc
            | Op::CreateEmptyArray
            | Op::Jmp
            | Op::Return
            | Op::Throw => S::Unspecialized,
        }
    }
}

/// The typed lowering pass over one method's circuit
pub struct TypedBytecodeLowering<'a, 'c> {
    circuit: &'c mut Circuit,
    env: &'c CompilationEnv<'a>,
    options: LoweringOptions,
    ranges: Vec<OptBcRange>,
    stats: LoweringStats,
}

impl<'a, 'c> TypedBytecodeLowering<'a, 'c> {
    /// Pass over `circuit`, reading profile and heap through `env`.
    pub fn new(circuit: &'c mut Circuit, env: &'c CompilationEnv<'a>, options: LoweringOptions) -> Self {
        let ranges = options.bc_ranges();
        Self { circuit, env, options, ranges, stats: LoweringStats::default() }
    }

    /// Lowers every bytecode gate present when the pass starts.
    pub fn run_lowering(mut self) -> LoweringResult<LoweringStats> {
        for gate in self.circuit.all_gates() {
            let Some(opcode) = self.circuit.get(gate).and_then(|g| g.op.bytecode()).map(|info| info.opcode) else {
                continue;
            };
            self.lower(gate, opcode)?;
        }

        if self.options.enable_log {
            info!(
                method = %self.options.method_name,
                all_typed_op_count = self.stats.all_typed_op_count,
                all_non_typed_op_count = self.stats.all_non_typed_op_count,
                typed_op_rate = self.stats.typed_op_rate(),
                "typed bytecode lowering finished"
            );
        }
        if self.options.profiling {
            self.stats.print_hit_rates(&self.options.method_name);
        }
        Ok(self.stats)
    }

    fn in_ignore_range(&self, index: usize) -> Option<OptBcRange> {
        self.ranges.iter().copied().find(|r| r.contains(index))
    }

    fn lower(&mut self, gate: GateRef, opcode: EcmaOpcode) -> LoweringResult<()> {
        self.stats.add_bytecode_count(opcode);
        if let Some(range) = self.in_ignore_range(opcode.index()) {
            trace!(opcode = opcode.name(), index = opcode.index(), start = range.start, end = range.end, "opcode in ignore range");
            self.stats.delete_bytecode_count(opcode);
            self.stats.all_non_typed_op_count += 1;
            return Ok(());
        }

        let shape = BytecodeShape::of(opcode);
        if shape == BytecodeShape::Unspecialized {
            self.stats.delete_bytecode_count(opcode);
            self.stats.all_non_typed_op_count += 1;
            return Ok(());
        }
        self.stats.all_typed_op_count += 1;

        let hits_before = self.stats.hit_typed_op_count;
        match shape {
            BytecodeShape::BinaryOp(op) => self.lower_typed_bin_op(gate, op)?,
            BytecodeShape::EqualityOp(op) => self.lower_typed_eq_or_not_eq(gate, op)?,
            BytecodeShape::UnaryOp(op) => self.lower_typed_un_op(gate, op)?,
            BytecodeShape::ToNumeric => self.lower_to_numeric(gate)?,
            BytecodeShape::TruthTest(op) => self.lower_is_true_or_false(gate, op)?,
            BytecodeShape::ConditionJump(op) => self.lower_condition_jump(gate, op)?,
            BytecodeShape::TypeOf => self.lower_type_of(gate)?,
            BytecodeShape::LoadByName => self.lower_ld_obj_by_name(gate)?,
            BytecodeShape::StoreByName => self.lower_st_obj_by_name(gate)?,
            BytecodeShape::LoadPrivate => self.lower_ld_private_property(gate)?,
            BytecodeShape::StorePrivate => self.lower_st_private_property(gate)?,
            BytecodeShape::LoadByValue => self.lower_ld_obj_by_value(gate)?,
            BytecodeShape::LoadByIndex => self.lower_ld_obj_by_index(gate)?,
            BytecodeShape::StoreByValue => self.lower_st_obj_by_value(gate)?,
            BytecodeShape::StoreByIndex => self.lower_st_obj_by_index(gate)?,
            BytecodeShape::StoreOwnByValue => self.add_profiling(gate)?,
            BytecodeShape::LoadGlobal => self.lower_try_ld_global_by_name(gate)?,
            BytecodeShape::InstanceOf => self.lower_instance_of(gate)?,
            BytecodeShape::GetIterator => self.lower_get_iterator(gate)?,
            BytecodeShape::Call => self.lower_typed_call(gate)?,
            BytecodeShape::CallThis => self.lower_typed_call_this(gate)?,
            BytecodeShape::NewObjRange => self.lower_new_obj_range(gate)?,
            BytecodeShape::SuperCall => self.lower_super_call(gate)?,
            BytecodeShape::CreateEmptyObject => self.lower_create_empty_object(gate)?,
            BytecodeShape::CreateObjWithBuffer => self.lower_create_obj_with_buffer(gate)?,
            BytecodeShape::Unspecialized => {}
        }

        if self.options.enable_type_log {
            if self.stats.hit_typed_op_count > hits_before {
                debug!(opcode = opcode.name(), gate = gate.index(), ?shape, "lowered");
            } else {
                debug!(opcode = opcode.name(), gate = gate.index(), ?shape, "left generic");
            }
        }
        Ok(())
    }

    /// Counts a specialization of `gate` and, when tracing or profiling,
    /// threads the runtime hooks into its effect chain. A `StateSplit`
    /// feeding the gate is treated as part of it, so the hooks go in front.
    ///
    /// Must run before a builder is positioned at `gate`.
    pub(crate) fn add_profiling(&mut self, gate: GateRef) -> LoweringResult<()> {
        let opcode = bytecode_info(self.circuit, gate)?.opcode;
        self.stats.add_hit_bytecode_count(opcode);
        if !self.options.trace_bc && !self.options.profiling {
            return Ok(());
        }

        let target = match self.circuit.gate(gate)?.depend_in.first() {
            Some(&dep) if matches!(self.circuit.op(dep)?, GateOp::StateSplit) => dep,
            _ => gate,
        };
        let g = self.circuit.gate(target)?;
        let state = g.state_in.first().copied().unwrap_or_else(|| self.circuit.state_entry());
        let mut depend = g.depend_in.first().copied().unwrap_or_else(|| self.circuit.depend_entry());
        let opcode_index = self.circuit.constant(Value::Smi(opcode.index() as i32));

        if self.options.trace_bc {
            let typed_path = self.circuit.constant(Value::Smi(1));
            depend = self.circuit.new_gate(
                GateOp::CallRuntime(RuntimeId::DebugAOTPrint),
                vec![state],
                vec![depend],
                vec![opcode_index, typed_path],
            );
        }
        if self.options.profiling {
            let func = self.circuit.arg(ArgKind::Func);
            let pc = bytecode_info(self.circuit, gate)?.pc_offset;
            let bc_index = self.circuit.constant(Value::Smi(pc as i32));
            depend = self.circuit.new_gate(
                GateOp::CallRuntime(RuntimeId::ProfileOptimizedCode),
                vec![state],
                vec![depend],
                vec![func, bc_index, opcode_index],
            );
        }
        self.circuit.set_depend(target, 0, depend)
    }

    /// Unchecked compilation.
    fn no_check(&self) -> bool {
        self.options.no_check
    }
}
