//! One method under compilation together with the heap it runs against
//!
//! Bytecode gates are chained on a single control path in the order they
//! are appended; each gets a frame state at its own pc offset so a failing
//! guard reports where the interpreter resumes.

use std::sync::Arc;

use bytecode_system::{CallMethodFlagMap, FileId, MethodId, MethodLiteral, MethodTable};
use core_types::Value;
use jit_compiler::circuit::{ArgKind, BytecodeInfo, GateOp};
use jit_compiler::{Circuit, CompilationEnv, GateRef, LoweringOptions, LoweringResult, LoweringStats, TypedBytecodeLowering};
use object_model::{HClassId, HeapWriteGuard, ObjectModel, SharedObjectModel};
use pgo_profiler::{
    LoadedFiles, PGOObjectInfo, PGORWOpType, PGOSampleType, PGOTypeRecorder, PgoTypeRecord, ProfileError, ProfileStore,
    ProfileType,
};
use tracing::debug;

use crate::evaluator::{evaluate, EvalError, Execution};

/// File the compiled method lives in.
pub const FILE: FileId = FileId(1);
/// The compiled method.
pub const MAIN: MethodId = MethodId(1);

const ABC_NAME: &str = "app.abc";
const RECORD_NAME: &str = "app";
const METHOD_NAME: &str = "main";

/// Heap, profile, method tables and circuit of one compilation
pub struct CompileUnit {
    /// Heap shared with the compiler
    pub heap: SharedObjectModel,
    /// Recorded profile
    pub store: ProfileStore,
    /// Profile id of the compiled file
    pub abc: u32,
    /// Files the runtime has loaded
    pub loaded: LoadedFiles,
    /// Methods of the loaded files
    pub methods: MethodTable,
    /// Compiled-code flags of callees
    pub flags: CallMethodFlagMap,
    /// The method body
    pub circuit: Circuit,
    state: GateRef,
    depend: GateRef,
}

impl CompileUnit {
    /// Empty method `main` in `app.abc` with `num_args` parameters.
    pub fn new(num_args: u32) -> Self {
        let mut store = ProfileStore::new();
        let abc = store.add_abc(ABC_NAME);
        let mut loaded = LoadedFiles::new();
        loaded.load(ABC_NAME, FILE);
        let mut methods = MethodTable::new();
        // A fresh table has no entry to collide with.
        let _ = methods.add_method(FILE, MethodLiteral::new(MAIN, METHOD_NAME, num_args), 0);
        let circuit = Circuit::new();
        let (state, depend) = (circuit.state_entry(), circuit.depend_entry());
        Self {
            heap: SharedObjectModel::new(ObjectModel::new()),
            store,
            abc,
            loaded,
            methods,
            flags: CallMethodFlagMap::new(),
            circuit,
            state,
            depend,
        }
    }

    /// Runtime-side access to the heap.
    pub fn heap_mut(&self) -> HeapWriteGuard<'_> {
        self.heap.lock_mut()
    }

    /// Profile identity of a hidden class of the compiled file.
    pub fn class(&self, hclass: HClassId) -> ProfileType {
        ProfileType::class(self.abc, hclass)
    }

    /// Declared parameter `i`.
    pub fn param(&mut self, i: u32) -> GateRef {
        self.circuit.arg(ArgKind::Param(i))
    }

    /// Constant value gate.
    pub fn constant(&mut self, value: Value) -> GateRef {
        self.circuit.constant(value)
    }

    /// Records profile feedback for the bytecode at `offset`.
    pub fn record(&mut self, offset: u32, record: PgoTypeRecord) -> Result<(), ProfileError> {
        self.store.record(RECORD_NAME, METHOD_NAME, MAIN, offset, record)
    }

    /// Records an operand sample.
    pub fn sample(&mut self, offset: u32, sample: PGOSampleType) -> Result<(), ProfileError> {
        self.record(offset, PgoTypeRecord::Sample(sample))
    }

    /// Records the receiver shapes of a property access.
    pub fn rw(&mut self, offset: u32, infos: Vec<PGOObjectInfo>) -> Result<(), ProfileError> {
        self.record(offset, PgoTypeRecord::RwOp(PGORWOpType::new(infos)))
    }

    /// Appends a bytecode gate to the control path.
    pub fn bytecode(&mut self, info: BytecodeInfo, values: Vec<GateRef>) -> LoweringResult<GateRef> {
        let pc = info.pc_offset;
        let gate = self.circuit.new_gate(GateOp::JsBytecode(info), vec![self.state], vec![self.depend], values);
        let frame_state = self.circuit.new_gate(GateOp::FrameState { pc_offset: pc }, vec![], vec![], vec![]);
        self.circuit.set_frame_state(gate, frame_state)?;
        self.state = gate;
        self.depend = gate;
        Ok(gate)
    }

    /// Closes the control path with a `Return` of `value`.
    pub fn ret(&mut self, value: GateRef) -> GateRef {
        let gate = self.circuit.new_gate(GateOp::Return, vec![self.state], vec![self.depend], vec![value]);
        self.state = gate;
        self.depend = gate;
        gate
    }

    /// Runs the typed lowering over the method while holding the heap lock.
    pub fn compile(&mut self, options: LoweringOptions) -> LoweringResult<LoweringStats> {
        let CompileUnit { heap, store, loaded, methods, flags, circuit, .. } = self;
        let guard = heap.lock_for_compile();
        let recorder = PGOTypeRecorder::new(&*store, &*loaded, RECORD_NAME, METHOD_NAME, MAIN)?;
        let env = CompilationEnv::new(&guard, Arc::new(recorder), &*methods, &*flags, FILE, MAIN);
        let stats = TypedBytecodeLowering::new(circuit, &env, options).run_lowering()?;
        debug!(hits = stats.hit_typed_op_count, gates = circuit.gate_count(), "compiled unit");
        Ok(stats)
    }

    /// Executes the circuit against the current heap.
    pub fn evaluate(&self, args: &[Value]) -> Result<Execution, EvalError> {
        let heap = self.heap.lock_for_compile();
        evaluate(&self.circuit, &heap, args)
    }
}
