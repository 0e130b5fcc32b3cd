//! Unit tests for running the lowering pass through the public API

use std::sync::Arc;

use bytecode_system::{CallMethodFlagMap, EcmaOpcode, FileId, MethodId, MethodLiteral, MethodTable};
use core_types::JSType;
use jit_compiler::circuit::{ArgKind, BytecodeInfo, CheckKind, GateOp};
use jit_compiler::{Circuit, CompilationEnv, DeoptType, GateRef, LoweringOptions, LoweringStats, TypedBytecodeLowering};
use object_model::{HClass, HClassId, ObjectModel, SharedObjectModel};
use pgo_profiler::{
    LoadedFiles, PGOObjectInfo, PGORWOpType, PGOSampleType, PGOTypeRecorder, PgoTypeRecord, ProfileStore, ProfileType,
    SampleKind,
};

const FILE: FileId = FileId(3);
const MAIN: MethodId = MethodId(10);

/// One method under compilation with a straight-line body.
struct Method {
    model: ObjectModel,
    store: ProfileStore,
    abc: u32,
    circuit: Circuit,
    last: GateRef,
}

impl Method {
    fn new() -> Self {
        let mut store = ProfileStore::new();
        let abc = store.add_abc("lib.abc");
        let circuit = Circuit::new();
        let last = circuit.state_entry();
        Self { model: ObjectModel::new(), store, abc, circuit, last }
    }

    fn record(&mut self, offset: u32, record: PgoTypeRecord) {
        self.store.record("lib", "lib", MAIN, offset, record).unwrap();
    }

    fn push(&mut self, info: BytecodeInfo, values: Vec<GateRef>) -> GateRef {
        let pc = info.pc_offset;
        let depend = if self.last == self.circuit.state_entry() { self.circuit.depend_entry() } else { self.last };
        let gate = self.circuit.new_gate(GateOp::JsBytecode(info), vec![self.last], vec![depend], values);
        let fs = self.circuit.new_gate(GateOp::FrameState { pc_offset: pc }, vec![], vec![], vec![]);
        self.circuit.set_frame_state(gate, fs).unwrap();
        self.last = gate;
        gate
    }

    fn compile(self, options: LoweringOptions) -> (Circuit, LoweringStats) {
        let Method { model, store, mut circuit, .. } = self;
        let heap = SharedObjectModel::new(model);
        let guard = heap.lock_for_compile();
        let mut loaded = LoadedFiles::new();
        loaded.load("lib.abc", FILE);
        let mut methods = MethodTable::new();
        methods.add_method(FILE, MethodLiteral::new(MAIN, "lib", 0), 0).unwrap();
        let flags = CallMethodFlagMap::new();
        let recorder = PGOTypeRecorder::new(&store, &loaded, "lib", "lib", MAIN).unwrap();
        let env = CompilationEnv::new(&guard, Arc::new(recorder), &methods, &flags, FILE, MAIN);
        let stats = TypedBytecodeLowering::new(&mut circuit, &env, options).run_lowering().unwrap();
        (circuit, stats)
    }
}

fn point_class(model: &mut ObjectModel) -> HClassId {
    let mut class = HClass::new(JSType::JSObject, 4);
    class.append_property("x");
    model.add_hclass(class)
}

fn checks(circuit: &Circuit) -> Vec<(CheckKind, DeoptType)> {
    circuit
        .all_gates()
        .into_iter()
        .filter_map(|g| match circuit.op(g) {
            Ok(GateOp::Check { kind, deopt }) => Some((kind.clone(), *deopt)),
            _ => None,
        })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("jit_compiler=trace"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod pass_tests {
    use super::*;

    #[test]
    fn test_mixed_method_counts_and_rewrites() {
        let mut m = Method::new();
        let point = point_class(&mut m.model);
        let pt = ProfileType::class(m.abc, point);
        m.record(0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::Int)));
        m.record(2, PgoTypeRecord::RwOp(PGORWOpType::new(vec![PGOObjectInfo::own(pt)])));

        let a = m.circuit.arg(ArgKind::Param(0));
        let b = m.circuit.arg(ArgKind::Param(1));
        let add = m.push(BytecodeInfo::new(EcmaOpcode::Add2, 0), vec![a, b]);
        let load = m.push(BytecodeInfo::new(EcmaOpcode::LdObjByName, 2).with_key("x"), vec![a]);
        m.push(BytecodeInfo::new(EcmaOpcode::Jmp, 4), vec![]);
        let (circuit, stats) = m.compile(LoweringOptions::new());

        assert!(!circuit.is_live(add));
        assert!(!circuit.is_live(load));
        assert_eq!(stats.all_typed_op_count, 2);
        assert_eq!(stats.all_non_typed_op_count, 1);
        assert_eq!(stats.hit_typed_op_count, 2);
        assert!(checks(&circuit).contains(&(CheckKind::ObjectType { hclass: point }, DeoptType::InconsistentHClass5)));
    }

    #[test]
    fn test_missing_profile_leaves_circuit_untouched() {
        let mut m = Method::new();
        let a = m.circuit.arg(ArgKind::Param(0));
        let b = m.circuit.arg(ArgKind::Param(1));
        let add = m.push(BytecodeInfo::new(EcmaOpcode::Mul2, 0), vec![a, b]);
        let before = m.circuit.gate_count();
        let (circuit, stats) = m.compile(LoweringOptions::new());

        assert!(circuit.is_live(add));
        assert_eq!(circuit.gate_count(), before);
        assert_eq!(stats.hit_typed_op_count, 0);
    }

    #[test]
    fn test_unchecked_string_concat_emits_no_guards() {
        let mut m = Method::new();
        m.record(0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::String)));
        let a = m.circuit.arg(ArgKind::Param(0));
        let b = m.circuit.arg(ArgKind::Param(1));
        let add = m.push(BytecodeInfo::new(EcmaOpcode::Add2, 0), vec![a, b]);
        let (circuit, _) = m.compile(LoweringOptions { no_check: true, ..LoweringOptions::new() });

        assert!(!circuit.is_live(add));
        assert!(checks(&circuit).is_empty());
    }

    #[test]
    fn test_stale_class_of_unloaded_file_is_not_speculated() {
        let mut m = Method::new();
        let point = point_class(&mut m.model);
        let other = m.store.add_abc("other.abc");
        let pt = ProfileType::class(other, point);
        m.record(0, PgoTypeRecord::RwOp(PGORWOpType::new(vec![PGOObjectInfo::own(pt)])));
        let a = m.circuit.arg(ArgKind::Param(0));
        let load = m.push(BytecodeInfo::new(EcmaOpcode::LdObjByName, 0).with_key("x"), vec![a]);
        let (circuit, _) = m.compile(LoweringOptions::new());
        assert!(circuit.is_live(load));
    }

    #[test]
    fn test_logging_options_do_not_change_the_result() {
        init_tracing();
        let build = || {
            let mut m = Method::new();
            m.record(0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::Double)));
            let a = m.circuit.arg(ArgKind::Param(0));
            let b = m.circuit.arg(ArgKind::Param(1));
            m.push(BytecodeInfo::new(EcmaOpcode::Mul2, 0), vec![a, b]);
            m.push(BytecodeInfo::new(EcmaOpcode::Jmp, 2), vec![]);
            m
        };
        let (quiet, quiet_stats) = build().compile(LoweringOptions::new());
        let logged_options = LoweringOptions { enable_log: true, enable_type_log: true, ..LoweringOptions::new() };
        let (logged, logged_stats) = build().compile(logged_options);

        assert_eq!(quiet, logged);
        assert_eq!(quiet_stats.hit_typed_op_count, logged_stats.hit_typed_op_count);
        assert_eq!(logged_stats.hits(EcmaOpcode::Mul2), 1);
    }
}
