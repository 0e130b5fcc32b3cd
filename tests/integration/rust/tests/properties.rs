//! Structural properties of the lowering observed through execution

use bytecode_system::{EcmaOpcode, MethodId, MethodLiteral};
use core_types::{JSType, Value};
use integration_tests::{CompileUnit, EvalError, FILE};
use jit_compiler::circuit::{BytecodeInfo, GateOp};
use jit_compiler::{DeoptType, LoweringOptions};
use object_model::{HClass, HClassId, ObjectId, ObjectKind};
use pgo_profiler::{PGOObjectInfo, PGOSampleType, ProfileType, SampleKind};

/// `n` shapes that all hold `x`, each at a different in-object offset.
fn shapes_with_x(unit: &CompileUnit, n: usize) -> Vec<(HClassId, ObjectId)> {
    let mut heap = unit.heap_mut();
    (0..n)
        .map(|i| {
            let mut hc = HClass::new(JSType::JSObject, 8);
            for pad in 0..i {
                hc.append_property(&format!("pad{pad}"));
            }
            hc.append_property("x");
            let hc = heap.add_hclass(hc);
            let obj = heap.new_object(hc, ObjectKind::Plain).unwrap();
            heap.set_property(obj, "x", Value::Smi(i as i32 * 10)).unwrap();
            (hc, obj)
        })
        .collect()
}

fn load_x(unit: &mut CompileUnit) {
    let obj = unit.param(0);
    let load = unit.bytecode(BytecodeInfo::new(EcmaOpcode::LdObjByName, 0).with_key("x"), vec![obj]).unwrap();
    unit.ret(load);
}

#[test]
fn test_dispatch_executes_exactly_one_load_per_profiled_shape() {
    for n in 2..=4 {
        let mut unit = CompileUnit::new(1);
        let mut shapes = shapes_with_x(&unit, n + 1);
        let (_, unprofiled) = shapes.pop().unwrap();
        let infos = shapes.iter().map(|(hc, _)| PGOObjectInfo::own(unit.class(*hc))).collect();
        unit.rw(0, infos).unwrap();
        load_x(&mut unit);
        unit.compile(LoweringOptions::new()).unwrap();

        for (i, (_, obj)) in shapes.iter().enumerate() {
            let run = unit.evaluate(&[obj.to_value()]).unwrap();
            assert_eq!(run.returned(), Some(&Value::Smi(i as i32 * 10)), "shape {i} of {n}");
            assert_eq!(run.count(|op| matches!(op, GateOp::LoadProperty { .. })), 1);
        }
        let run = unit.evaluate(&[unprofiled.to_value()]).unwrap();
        assert_eq!(run.deopt(), Some(DeoptType::InconsistentHClass1), "{n} candidates");
    }
}

#[test]
fn test_mono_load_deopts_once_receiver_shape_changes() {
    let mut unit = CompileUnit::new(1);
    let (hc, obj) = shapes_with_x(&unit, 1)[0];
    unit.rw(0, vec![PGOObjectInfo::own(unit.class(hc))]).unwrap();
    load_x(&mut unit);
    unit.compile(LoweringOptions::new()).unwrap();
    assert_eq!(unit.evaluate(&[obj.to_value()]).unwrap().returned(), Some(&Value::Smi(0)));

    unit.heap_mut().set_property(obj, "y", Value::Null).unwrap();
    let run = unit.evaluate(&[obj.to_value()]).unwrap();
    assert_eq!(run.deopt(), Some(DeoptType::InconsistentHClass5));
}

#[test]
fn test_proto_load_deopts_once_prototype_gains_a_property() {
    let mut unit = CompileUnit::new(1);
    let (child_hc, proto_hc, proto, child) = {
        let mut heap = unit.heap_mut();
        let mut proto_hc = HClass::new(JSType::JSObject, 4);
        proto_hc.append_property("x");
        let proto_hc = heap.add_hclass(proto_hc);
        let proto = heap.new_object(proto_hc, ObjectKind::Plain).unwrap();
        heap.set_property(proto, "x", Value::Smi(42)).unwrap();
        let proto_hc = heap.make_prototype(proto).unwrap();
        let child_hc = heap.add_hclass(HClass::new(JSType::JSObject, 4).with_prototype(Some(proto)));
        let child = heap.new_object(child_hc, ObjectKind::Plain).unwrap();
        (child_hc, proto_hc, proto, child)
    };
    unit.rw(0, vec![PGOObjectInfo::on_proto(unit.class(child_hc), unit.class(proto_hc))]).unwrap();
    load_x(&mut unit);
    unit.compile(LoweringOptions::new()).unwrap();

    let run = unit.evaluate(&[child.to_value()]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Smi(42)));
    assert_eq!(run.count(|op| matches!(op, GateOp::MonoLoadPropertyOnProto { .. })), 1);

    unit.heap_mut().set_property(proto, "z", Value::Smi(1)).unwrap();
    let run = unit.evaluate(&[child.to_value()]).unwrap();
    assert_eq!(run.deopt(), Some(DeoptType::PrototypeChanged1));
}

#[test]
fn test_second_run_over_lowered_circuit_changes_nothing() {
    let mut unit = CompileUnit::new(2);
    unit.sample(0, PGOSampleType::sample(SampleKind::Int)).unwrap();
    let (a, b) = (unit.param(0), unit.param(1));
    let sub = unit.bytecode(BytecodeInfo::new(EcmaOpcode::Sub2, 0), vec![a, b]).unwrap();
    let mul = unit.bytecode(BytecodeInfo::new(EcmaOpcode::Mul2, 2), vec![sub, b]).unwrap();
    unit.ret(mul);

    unit.compile(LoweringOptions::new()).unwrap();
    let lowered = unit.circuit.clone();
    let stats = unit.compile(LoweringOptions::new()).unwrap();

    assert_eq!(unit.circuit, lowered);
    assert_eq!(stats.hit_typed_op_count, 0);
    assert_eq!(stats.visits(EcmaOpcode::Mul2), 1);
}

#[test]
fn test_unprofiled_method_compiles_to_itself() {
    let mut unit = CompileUnit::new(2);
    let (a, b) = (unit.param(0), unit.param(1));
    let div = unit.bytecode(BytecodeInfo::new(EcmaOpcode::Div2, 0), vec![a, b]).unwrap();
    unit.ret(div);
    let before = unit.circuit.clone();

    let stats = unit.compile(LoweringOptions::new()).unwrap();
    assert_eq!(unit.circuit, before);
    assert_eq!(stats.all_typed_op_count, 1);
    assert_eq!(stats.hit_typed_op_count, 0);
    assert!(matches!(unit.evaluate(&[Value::Smi(1), Value::Smi(2)]), Err(EvalError::Generic(EcmaOpcode::Div2))));
}

#[test]
fn test_call_with_wrong_arity_stays_generic() {
    const CALLEE: MethodId = MethodId(5);
    let mut unit = CompileUnit::new(3);
    let literal = MethodLiteral::new(CALLEE, "three", 3).with_typed_call(true).with_fast_call(true);
    unit.methods.add_method(FILE, literal, 0).unwrap();
    unit.flags.set_compiled(FILE, CALLEE, true, false);
    unit.sample(0, PGOSampleType::Profile(ProfileType::method(unit.abc, CALLEE))).unwrap();

    let (a, b, f) = (unit.param(0), unit.param(1), unit.param(2));
    let call = unit.bytecode(BytecodeInfo::new(EcmaOpcode::CallArgs2, 0), vec![a, b, f]).unwrap();
    unit.ret(call);
    let stats = unit.compile(LoweringOptions::new()).unwrap();

    assert_eq!(stats.hits(EcmaOpcode::CallArgs2), 0);
    assert!(unit.circuit.is_live(call));
    let result = unit.evaluate(&[Value::Smi(1), Value::Smi(2), Value::Undefined]);
    assert!(matches!(result, Err(EvalError::Generic(EcmaOpcode::CallArgs2))));
}
