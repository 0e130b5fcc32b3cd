//! Hand-built compilation units for strategy tests
//!
//! A [`Fixture`] owns everything a compilation reads: the heap, the profile
//! store, the method tables and the circuit. Bytecode gates are chained on
//! one straight-line control path in creation order, each with its own
//! frame state.

use std::sync::Arc;

use bytecode_system::{CallMethodFlagMap, FileId, LiteralTable, MethodId, MethodLiteral, MethodTable};
use core_types::Value;
use object_model::{HeapWriteGuard, ObjectModel, SharedObjectModel};
use pgo_profiler::{LoadedFiles, PGOObjectInfo, PGORWOpType, PGOSampleType, PGOTypeRecorder, PgoTypeRecord, ProfileStore, ProfileType};

use super::TypedBytecodeLowering;
use crate::circuit::{ArgKind, BytecodeInfo, CheckKind, Circuit, GateOp, GateRef};
use crate::compilation_env::CompilationEnv;
use crate::deopt::DeoptType;
use crate::error::LoweringResult;
use crate::options::LoweringOptions;
use crate::stats::LoweringStats;

pub(crate) const MAIN: MethodId = MethodId(1);
pub(crate) const FILE: FileId = FileId(1);

pub(crate) struct Fixture {
    pub heap: SharedObjectModel,
    pub store: ProfileStore,
    pub abc: u32,
    pub loaded: LoadedFiles,
    pub methods: MethodTable,
    pub flags: CallMethodFlagMap,
    pub literals: LiteralTable,
    pub circuit: Circuit,
    state: GateRef,
    depend: GateRef,
}

impl Fixture {
    pub fn new() -> Self {
        let mut store = ProfileStore::new();
        let abc = store.add_abc("app.abc");
        let mut loaded = LoadedFiles::new();
        loaded.load("app.abc", FILE);
        let mut methods = MethodTable::new();
        methods.add_method(FILE, MethodLiteral::new(MAIN, "main", 0), 0).expect("main method");
        let circuit = Circuit::new();
        let state = circuit.state_entry();
        let depend = circuit.depend_entry();
        Self {
            heap: SharedObjectModel::new(ObjectModel::new()),
            store,
            abc,
            loaded,
            methods,
            flags: CallMethodFlagMap::new(),
            literals: LiteralTable::new(),
            circuit,
            state,
            depend,
        }
    }

    pub fn heap_mut(&self) -> HeapWriteGuard<'_> {
        self.heap.lock_mut()
    }

    pub fn param(&mut self, i: u32) -> GateRef {
        self.circuit.arg(ArgKind::Param(i))
    }

    pub fn arg(&mut self, kind: ArgKind) -> GateRef {
        self.circuit.arg(kind)
    }

    pub fn constant(&mut self, value: Value) -> GateRef {
        self.circuit.constant(value)
    }

    /// Identity of a hidden class of the compiled file.
    pub fn class(&self, hclass: object_model::HClassId) -> ProfileType {
        ProfileType::class(self.abc, hclass)
    }

    pub fn record(&mut self, offset: u32, record: PgoTypeRecord) {
        self.store.record("app", "main", MAIN, offset, record).expect("profile record");
    }

    pub fn sample(&mut self, offset: u32, sample: PGOSampleType) {
        self.record(offset, PgoTypeRecord::Sample(sample));
    }

    pub fn rw(&mut self, offset: u32, infos: Vec<PGOObjectInfo>) {
        self.record(offset, PgoTypeRecord::RwOp(PGORWOpType::new(infos)));
    }

    /// Appends a bytecode gate to the control path.
    pub fn bytecode(&mut self, info: BytecodeInfo, values: Vec<GateRef>) -> GateRef {
        let pc = info.pc_offset;
        let gate = self.circuit.new_gate(GateOp::JsBytecode(info), vec![self.state], vec![self.depend], values);
        let frame_state = self.circuit.new_gate(GateOp::FrameState { pc_offset: pc }, vec![], vec![], vec![]);
        self.circuit.set_frame_state(gate, frame_state).expect("frame state");
        self.state = gate;
        self.depend = gate;
        gate
    }

    /// Appends a `StateSplit` to the effect chain.
    pub fn state_split(&mut self) -> GateRef {
        let split = self.circuit.new_gate(GateOp::StateSplit, vec![self.state], vec![self.depend], vec![]);
        let frame_state = self.circuit.new_gate(GateOp::FrameState { pc_offset: 0 }, vec![], vec![], vec![]);
        self.circuit.set_frame_state(split, frame_state).expect("frame state");
        self.depend = split;
        split
    }

    /// Closes the control path with a `Return` of `value`.
    pub fn ret(&mut self, value: GateRef) -> GateRef {
        let gate = self.circuit.new_gate(GateOp::Return, vec![self.state], vec![self.depend], vec![value]);
        self.state = gate;
        self.depend = gate;
        gate
    }

    pub fn run(&mut self, options: LoweringOptions) -> LoweringResult<LoweringStats> {
        self.with_env(|env, circuit| TypedBytecodeLowering::new(circuit, env, options).run_lowering())?
    }

    /// Calls `f` with the compilation environment under the JIT lock.
    pub fn with_env<R>(&mut self, f: impl FnOnce(&CompilationEnv<'_>, &mut Circuit) -> R) -> LoweringResult<R> {
        let Fixture { heap, store, loaded, methods, flags, literals, circuit, .. } = self;
        let guard = heap.lock_for_compile();
        let recorder = PGOTypeRecorder::new(&*store, &*loaded, "app", "main", MAIN)?;
        let env = CompilationEnv::new(&guard, Arc::new(recorder), &*methods, &*flags, FILE, MAIN).with_literals(&*literals);
        Ok(f(&env, circuit))
    }

    /// Every guard of the live circuit with its deopt reason.
    pub fn checks(&self) -> Vec<(CheckKind, DeoptType)> {
        self.circuit
            .all_gates()
            .into_iter()
            .filter_map(|g| match self.circuit.get(g).map(|gate| &gate.op) {
                Some(GateOp::Check { kind, deopt }) => Some((kind.clone(), *deopt)),
                _ => None,
            })
            .collect()
    }

    /// Gates of the live circuit whose operation matches `pred`.
    pub fn find(&self, pred: impl Fn(&GateOp) -> bool) -> Vec<GateRef> {
        self.circuit
            .all_gates()
            .into_iter()
            .filter(|g| self.circuit.get(*g).is_some_and(|gate| pred(&gate.op)))
            .collect()
    }
}
