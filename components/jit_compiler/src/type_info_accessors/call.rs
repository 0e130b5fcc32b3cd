//! Accessors of calls, constructions and other callee-driven bytecodes

use bytecode_system::{compute_call_argc, EcmaOpcode, MethodId, NUM_MANDATORY_JSFUNC_ARGS};
use core_types::{BuiltinTypeId, BuiltinsStubId, Value};
use object_model::{HClassId, ObjectId};
use pgo_profiler::ProfileType;

use super::{bytecode_info, TypeInfoAccessor};
use crate::circuit::{Circuit, ConstValue, GateOp, GateRef};
use crate::compilation_env::CompilationEnv;
use crate::error::{LoweringError, LoweringResult};

/// What the method tables say about a profiled JS callee.
#[derive(Debug, Clone, Copy, Default)]
struct CalleeInfo {
    method: Option<MethodId>,
    num_args: Option<u32>,
    typed_call: bool,
    fast_call: bool,
    hot: bool,
    no_gc: bool,
    method_index: Option<u32>,
    same_const_pool: bool,
}

impl CalleeInfo {
    fn resolve(env: &CompilationEnv<'_>, pt: Option<&ProfileType>) -> Self {
        let Some(pt) = pt else {
            return Self::default();
        };
        let (Some(method), Some(file)) = (pt.method_id(), env.callee_file(pt)) else {
            return Self::default();
        };
        if !method.is_valid() {
            return Self::default();
        }
        let flags = env.call_flags();
        let literal = env.method_literal(file, method);
        Self {
            method: Some(method),
            num_args: literal.map(|l| l.num_args()),
            typed_call: literal.is_some_and(|l| l.is_typed_call()),
            fast_call: literal.is_some_and(|l| l.is_fast_call()) && flags.is_fast_call(file, method),
            hot: flags.is_compiled(file, method),
            no_gc: flags.is_no_gc(file, method),
            method_index: env.methods().method_index(file, method),
            same_const_pool: env.in_same_const_pool(file, method),
        }
    }

    fn is_valid(&self) -> bool {
        self.method.is_some() && self.num_args.is_some()
    }
}

fn sample_profile(env: &CompilationEnv<'_>, offset: u32) -> Option<ProfileType> {
    env.recorder().sample_type(offset).and_then(|s| s.profile_type()).copied()
}

/// JS call site
#[derive(Debug, Clone)]
pub struct CallTypeInfoAccessor {
    gate: GateRef,
    opcode: EcmaOpcode,
    func: GateRef,
    this: Option<GateRef>,
    args: Vec<GateRef>,
    argc: usize,
    builtin: Option<BuiltinsStubId>,
    callee: CalleeInfo,
    func_op: Option<GateOp>,
    heap_constant: Option<ObjectId>,
}

impl CallTypeInfoAccessor {
    /// Reads a `CALLARG*`, `CALLRANGE`, `CALLTHIS*` or `CALLRUNTIME_CALLINIT`
    /// gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef, jit_compile: bool) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let opcode = info.opcode;
        if !opcode.is_this_call() && !opcode.is_plain_call() {
            return Err(LoweringError::UnsupportedCallArgc(opcode));
        }
        let inputs = circuit.gate(gate)?.value_in.clone();
        let Some((&func, rest)) = inputs.split_last() else {
            return Err(LoweringError::InvalidGate(gate));
        };
        let (this, args) = if opcode.is_this_call() {
            match rest.split_first() {
                Some((&this, args)) => (Some(this), args.to_vec()),
                None => return Err(LoweringError::InvalidGate(gate)),
            }
        } else {
            (None, rest.to_vec())
        };
        let argc = compute_call_argc(inputs.len(), opcode)
            .checked_sub(NUM_MANDATORY_JSFUNC_ARGS)
            .ok_or(LoweringError::InvalidGate(gate))?;

        let pt = sample_profile(env, info.pc_offset);
        let callee = CalleeInfo::resolve(env, pt.as_ref());
        let func_op = circuit.op(func).ok().cloned();
        let heap_constant = match (&func_op, callee.method) {
            (Some(GateOp::Constant(ConstValue::Js(value @ Value::HeapObject(id)))), Some(method)) if jit_compile => env
                .heap()
                .function_of(value)
                .filter(|f| f.method == method)
                .map(|_| ObjectId(*id)),
            _ => None,
        };
        Ok(Self {
            gate,
            opcode,
            func,
            this,
            args,
            argc,
            builtin: pt.and_then(|p| p.builtin_function_id()),
            callee,
            func_op,
            heap_constant,
        })
    }

    /// Call opcode.
    pub fn opcode(&self) -> EcmaOpcode {
        self.opcode
    }

    /// Callee operand.
    pub fn func(&self) -> GateRef {
        self.func
    }

    /// Receiver operand of a `this` call.
    pub fn this(&self) -> Option<GateRef> {
        self.this
    }

    /// User arguments.
    pub fn args(&self) -> &[GateRef] {
        &self.args
    }

    /// Number of user arguments.
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Profiled builtin callee.
    pub fn builtin_id(&self) -> Option<BuiltinsStubId> {
        self.builtin
    }

    /// Profiled JS callee.
    pub fn method_id(&self) -> Option<MethodId> {
        self.callee.method
    }

    /// The profiled callee resolves to a known method literal.
    pub fn is_valid_call_method_id(&self) -> bool {
        self.callee.is_valid()
    }

    /// The callee's literal allows typed calls.
    pub fn is_typed_call(&self) -> bool {
        self.callee.typed_call
    }

    /// The callee already has compiled code.
    pub fn is_hot(&self) -> bool {
        self.callee.hot
    }

    /// The callee supports the fast-call convention.
    pub fn can_fast_call(&self) -> bool {
        self.callee.fast_call
    }

    /// The callee never triggers a collection.
    pub fn is_no_gc(&self) -> bool {
        self.callee.no_gc
    }

    /// The user argument count equals the callee's declared parameters.
    pub fn arity_matches(&self) -> bool {
        self.callee.num_args.is_some_and(|n| n as usize == self.argc)
    }

    /// Method index of the callee within its file.
    pub fn method_index(&self) -> Option<u32> {
        self.callee.method_index
    }

    /// The callee shares the caller's constant pool.
    pub fn in_same_const_pool(&self) -> bool {
        self.callee.same_const_pool
    }

    /// The callee was loaded from a global builtin object.
    pub fn func_is_from_global(&self) -> bool {
        matches!(self.func_op, Some(GateOp::LoadBuiltinObject { .. }))
    }

    /// The callee was created by `DEFINEFUNC` in this method.
    pub fn func_is_define_func(&self) -> bool {
        matches!(&self.func_op, Some(GateOp::JsBytecode(info)) if info.opcode == EcmaOpcode::DefineFunc)
    }

    /// The callee was loaded from an object slot (method table call).
    pub fn func_is_load_vtable(&self) -> bool {
        matches!(self.func_op, Some(GateOp::LoadProperty { .. }))
    }

    /// Heap constant of the callee when it is statically the profiled
    /// function.
    pub fn heap_constant(&self) -> Option<ObjectId> {
        self.heap_constant
    }
}

impl TypeInfoAccessor for CallTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// `new` site
#[derive(Debug, Clone)]
pub struct NewObjRangeTypeInfoAccessor {
    gate: GateRef,
    ctor: GateRef,
    args: Vec<GateRef>,
    hclass: Option<HClassId>,
    builtin: Option<BuiltinsStubId>,
    callee: CalleeInfo,
    ctor_op: Option<GateOp>,
    heap_constant: Option<ObjectId>,
}

impl NewObjRangeTypeInfoAccessor {
    /// Reads a `NEWOBJRANGE` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef, jit_compile: bool) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let inputs = circuit.gate(gate)?.value_in.clone();
        let Some((&ctor, args)) = inputs.split_first() else {
            return Err(LoweringError::InvalidGate(gate));
        };
        let define = env.recorder().define_type(info.pc_offset).copied();
        let hclass = define
            .filter(|d| env.recorder().is_valid_pt(&d.profile_type))
            .and_then(|d| d.profile_type.hclass());
        let ctor_pt = define.map(|d| d.ctor);
        let callee = CalleeInfo::resolve(env, ctor_pt.as_ref());
        let ctor_op = circuit.op(ctor).ok().cloned();
        let heap_constant = match (&ctor_op, callee.method) {
            (Some(GateOp::Constant(ConstValue::Js(value @ Value::HeapObject(id)))), Some(method)) if jit_compile => env
                .heap()
                .function_of(value)
                .filter(|f| f.method == method)
                .map(|_| ObjectId(*id)),
            _ => None,
        };
        Ok(Self {
            gate,
            ctor,
            args: args.to_vec(),
            hclass,
            builtin: ctor_pt.and_then(|p| p.builtin_function_id()),
            callee,
            ctor_op,
            heap_constant,
        })
    }

    /// Constructor operand.
    pub fn ctor(&self) -> GateRef {
        self.ctor
    }

    /// User arguments.
    pub fn args(&self) -> &[GateRef] {
        &self.args
    }

    /// Profiled instance hidden class.
    pub fn hclass(&self) -> Option<HClassId> {
        self.hclass
    }

    /// Profiled builtin constructor.
    pub fn builtin_id(&self) -> Option<BuiltinsStubId> {
        self.builtin
    }

    /// Profiled constructor method.
    pub fn method_id(&self) -> Option<MethodId> {
        self.callee.method
    }

    /// The profiled constructor resolves to a known method literal.
    pub fn is_valid_call_method_id(&self) -> bool {
        self.callee.is_valid()
    }

    /// Declared parameters of the constructor.
    pub fn num_args(&self) -> Option<u32> {
        self.callee.num_args
    }

    /// The constructor operand is the global `Number`.
    pub fn is_new_number(&self) -> bool {
        let number = BuiltinTypeId::global_index_of(BuiltinTypeId::Number.global_name());
        matches!(self.ctor_op, Some(GateOp::LoadBuiltinObject { index }) if Some(index) == number)
    }

    /// Heap constant of the constructor when it is statically the profiled
    /// function.
    pub fn heap_constant(&self) -> Option<ObjectId> {
        self.heap_constant
    }
}

impl TypeInfoAccessor for NewObjRangeTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// `super(...)` call in a derived constructor
#[derive(Debug, Clone)]
pub struct SuperCallTypeInfoAccessor {
    gate: GateRef,
    args: Vec<GateRef>,
    callee: CalleeInfo,
}

impl SuperCallTypeInfoAccessor {
    /// Reads a `SUPERCALLTHISRANGE` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let pt = sample_profile(env, info.pc_offset);
        Ok(Self {
            gate,
            args: circuit.gate(gate)?.value_in.clone(),
            callee: CalleeInfo::resolve(env, pt.as_ref()),
        })
    }

    /// User arguments.
    pub fn args(&self) -> &[GateRef] {
        &self.args
    }

    /// The profiled super constructor resolves to a known method literal.
    pub fn is_valid_call_method_id(&self) -> bool {
        self.callee.is_valid()
    }
}

impl TypeInfoAccessor for SuperCallTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// `instanceof`
#[derive(Debug, Clone)]
pub struct InstanceOfTypeInfoAccessor {
    gate: GateRef,
    object: GateRef,
    target: GateRef,
    expected: Vec<HClassId>,
    count: usize,
}

impl InstanceOfTypeInfoAccessor {
    /// Reads an `INSTANCEOF` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let (expected, count) = match env.recorder().rw_type(info.pc_offset) {
            Some(rw) => (
                rw.infos()
                    .iter()
                    .map(|i| i.receiver)
                    .filter(|pt| env.recorder().is_valid_pt(pt))
                    .filter_map(|pt| pt.hclass())
                    .collect(),
                rw.count(),
            ),
            None => (Vec::new(), 0),
        };
        Ok(Self { gate, object: circuit.value_in(gate, 0)?, target: circuit.value_in(gate, 1)?, expected, count })
    }

    /// Object operand.
    pub fn object(&self) -> GateRef {
        self.object
    }

    /// Constructor operand.
    pub fn target(&self) -> GateRef {
        self.target
    }

    /// No target shape was profiled.
    pub fn types_is_empty(&self) -> bool {
        self.count == 0
    }

    /// Some profiled target is not a live user class.
    pub fn has_illegal_type(&self) -> bool {
        self.expected.len() != self.count
    }

    /// Profiled target shape `i`.
    pub fn expected_hclass(&self, i: usize) -> Option<HClassId> {
        self.expected.get(i).copied()
    }
}

impl TypeInfoAccessor for InstanceOfTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// `GETITERATOR`
#[derive(Debug, Clone)]
pub struct GetIteratorTypeInfoAccessor {
    gate: GateRef,
    object: GateRef,
    builtin: Option<BuiltinsStubId>,
}

impl GetIteratorTypeInfoAccessor {
    /// Reads a `GETITERATOR` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let builtin = sample_profile(env, info.pc_offset).and_then(|p| p.builtin_function_id());
        Ok(Self { gate, object: circuit.value_in(gate, 0)?, builtin })
    }

    /// Iterated object.
    pub fn object(&self) -> GateRef {
        self.object
    }

    /// Profiled builtin iterator factory.
    pub fn iterator_builtin(&self) -> Option<BuiltinsStubId> {
        self.builtin.filter(|id| id.is_iterator_method())
    }
}

impl TypeInfoAccessor for GetIteratorTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// `TRYLDGLOBALBYNAME`
#[derive(Debug, Clone)]
pub struct LoadGlobalTypeInfoAccessor {
    gate: GateRef,
    key: Option<String>,
    property_box: Option<ObjectId>,
}

impl LoadGlobalTypeInfoAccessor {
    /// Reads a global load.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let key = bytecode_info(circuit, gate)?.key.clone();
        let property_box = key.as_deref().and_then(|k| env.heap().global_box(k));
        Ok(Self { gate, key, property_box })
    }

    /// Global name.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Index of the name among the global builtins.
    pub fn builtin_index(&self) -> Option<usize> {
        self.key.as_deref().and_then(BuiltinTypeId::global_index_of)
    }

    /// Property box of a global variable of that name.
    pub fn property_box(&self) -> Option<ObjectId> {
        self.property_box
    }
}

impl TypeInfoAccessor for LoadGlobalTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}
