//! End-to-end scenarios: compile a method against a profile, run the typed
//! code, then mutate the heap the way a program would and watch the guards
//! fire.

use bytecode_system::{EcmaOpcode, MethodId, MethodLiteral};
use core_types::{ElementsKind, JSType, Value};
use integration_tests::{CompileUnit, Outcome, FILE};
use jit_compiler::circuit::{BytecodeInfo, GateOp};
use jit_compiler::{DeoptType, LoweringOptions};
use object_model::{FunctionData, HClass, ObjectKind, ProtoOrHClass};
use pgo_profiler::{PGOObjectInfo, PGOSampleType, ProfileType, SampleKind};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn deopt(reason: DeoptType, pc_offset: u32) -> Outcome {
    Outcome::Deopt { reason, pc_offset }
}

#[test]
fn test_number_add_computes_and_guards_operands() {
    init_tracing();
    let mut unit = CompileUnit::new(2);
    unit.sample(4, PGOSampleType::sample(SampleKind::Number)).unwrap();
    let (a, b) = (unit.param(0), unit.param(1));
    let add = unit.bytecode(BytecodeInfo::new(EcmaOpcode::Add2, 4), vec![a, b]).unwrap();
    unit.ret(add);

    let stats = unit.compile(LoweringOptions::new()).unwrap();
    assert_eq!(stats.hits(EcmaOpcode::Add2), 1);

    let run = unit.evaluate(&[Value::Smi(1), Value::Double(2.5)]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Double(3.5)));
    assert_eq!(run.count(|op| matches!(op, GateOp::TypedBinaryOp { .. })), 1);

    let run = unit.evaluate(&[Value::Smi(i32::MAX), Value::Smi(1)]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Double(2147483648.0)));

    let run = unit.evaluate(&[Value::Smi(1), Value::from("2")]).unwrap();
    assert_eq!(run.outcome, deopt(DeoptType::NotNumber2, 4));
}

#[test]
fn test_string_plus_number_converts_the_number() {
    let mut unit = CompileUnit::new(1);
    unit.sample(2, PGOSampleType::sample(SampleKind::NumberOrString)).unwrap();
    let prefix = unit.constant(Value::from("n="));
    let x = unit.param(0);
    let add = unit.bytecode(BytecodeInfo::new(EcmaOpcode::Add2, 2), vec![prefix, x]).unwrap();
    unit.ret(add);
    unit.compile(LoweringOptions::new()).unwrap();

    let run = unit.evaluate(&[Value::Smi(5)]).unwrap();
    assert_eq!(run.returned(), Some(&Value::from("n=5")));
    assert_eq!(run.count(|op| *op == GateOp::NumberToString), 1);

    let run = unit.evaluate(&[Value::Double(1.5)]).unwrap();
    assert_eq!(run.returned(), Some(&Value::from("n=1.5")));

    let run = unit.evaluate(&[Value::from("x")]).unwrap();
    assert_eq!(run.returned(), Some(&Value::from("n=x")));
    assert_eq!(run.count(|op| *op == GateOp::NumberToString), 0);

    let run = unit.evaluate(&[Value::Boolean(true)]).unwrap();
    assert_eq!(run.outcome, deopt(DeoptType::NotString2, 2));
}

#[test]
fn test_polymorphic_load_own_and_inherited_shapes() {
    init_tracing();
    let mut unit = CompileUnit::new(1);
    let (own_hc, child_hc, proto_hc, own, child, stranger) = {
        let mut heap = unit.heap_mut();
        let mut own_hc = HClass::new(JSType::JSObject, 4);
        own_hc.append_property("x");
        let own_hc = heap.add_hclass(own_hc);
        let own = heap.new_object(own_hc, ObjectKind::Plain).unwrap();
        heap.set_property(own, "x", Value::Smi(1)).unwrap();

        let mut proto_hc = HClass::new(JSType::JSObject, 4);
        proto_hc.append_property("x");
        let proto_hc = heap.add_hclass(proto_hc);
        let proto = heap.new_object(proto_hc, ObjectKind::Plain).unwrap();
        heap.set_property(proto, "x", Value::Smi(2)).unwrap();
        let proto_hc = heap.make_prototype(proto).unwrap();
        let child_hc = heap.add_hclass(HClass::new(JSType::JSObject, 4).with_prototype(Some(proto)));
        let child = heap.new_object(child_hc, ObjectKind::Plain).unwrap();

        let mut other_hc = HClass::new(JSType::JSObject, 4);
        other_hc.append_property("y");
        other_hc.append_property("x");
        let other_hc = heap.add_hclass(other_hc);
        let stranger = heap.new_object(other_hc, ObjectKind::Plain).unwrap();
        heap.set_property(stranger, "x", Value::Smi(3)).unwrap();
        (own_hc, child_hc, proto_hc, own, child, stranger)
    };
    let infos = vec![
        PGOObjectInfo::own(unit.class(own_hc)),
        PGOObjectInfo::on_proto(unit.class(child_hc), unit.class(proto_hc)),
    ];
    unit.rw(6, infos).unwrap();
    let obj = unit.param(0);
    let load = unit.bytecode(BytecodeInfo::new(EcmaOpcode::LdObjByName, 6).with_key("x"), vec![obj]).unwrap();
    unit.ret(load);
    unit.compile(LoweringOptions::new()).unwrap();

    let is_load = |op: &GateOp| matches!(op, GateOp::LoadProperty { .. });
    let run = unit.evaluate(&[own.to_value()]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Smi(1)));
    assert_eq!(run.count(is_load), 1);

    let run = unit.evaluate(&[child.to_value()]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Smi(2)));
    assert_eq!(run.count(is_load), 1);
    assert_eq!(run.count(|op| *op == GateOp::LoadPrototype), 1);

    let run = unit.evaluate(&[stranger.to_value()]).unwrap();
    assert_eq!(run.outcome, deopt(DeoptType::InconsistentHClass1, 6));
    assert_eq!(run.count(is_load), 0);

    let run = unit.evaluate(&[Value::Smi(7)]).unwrap();
    assert_eq!(run.deopt(), Some(DeoptType::NotHeapObject1));
}

#[test]
fn test_array_length_until_prototype_swap() {
    let mut unit = CompileUnit::new(1);
    let arr = {
        let mut heap = unit.heap_mut();
        let arr_hc = heap.add_hclass(HClass::new(JSType::JSArray, 0).with_elements_kind(ElementsKind::INT));
        heap.new_array(arr_hc, vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]).unwrap()
    };
    let array = ProfileType::builtins_array(ElementsKind::INT, ElementsKind::INT);
    unit.rw(0, vec![PGOObjectInfo::own(array)]).unwrap();
    let obj = unit.param(0);
    let load = unit.bytecode(BytecodeInfo::new(EcmaOpcode::LdObjByName, 0).with_key("length"), vec![obj]).unwrap();
    unit.ret(load);
    unit.compile(LoweringOptions::new()).unwrap();

    let run = unit.evaluate(&[arr.to_value()]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Smi(3)));

    {
        let mut heap = unit.heap_mut();
        let plain = heap.add_hclass(HClass::new(JSType::JSObject, 0));
        let other = heap.new_object(plain, ObjectKind::Plain).unwrap();
        heap.set_prototype(arr, Some(other)).unwrap();
    }
    let run = unit.evaluate(&[arr.to_value()]).unwrap();
    assert_eq!(run.outcome, deopt(DeoptType::NotStableArray1, 0));
}

#[test]
fn test_fast_call_until_callee_is_replaced() {
    const CALLEE: MethodId = MethodId(7);
    let mut unit = CompileUnit::new(2);
    let literal = MethodLiteral::new(CALLEE, "callee", 1).with_typed_call(true).with_fast_call(true);
    unit.methods.add_method(FILE, literal, 0).unwrap();
    unit.flags.set_compiled(FILE, CALLEE, true, false);
    let index = unit.methods.method_index(FILE, CALLEE).unwrap();
    let profile = ProfileType::method(unit.abc, CALLEE);
    unit.sample(8, PGOSampleType::Profile(profile)).unwrap();
    let func = {
        let mut heap = unit.heap_mut();
        let fn_hc = heap.add_hclass(HClass::new(JSType::JSFunction, 0));
        heap.new_object(fn_hc, ObjectKind::Function(FunctionData::new(FILE, CALLEE, index))).unwrap()
    };

    let (a, f) = (unit.param(0), unit.param(1));
    let call = unit.bytecode(BytecodeInfo::new(EcmaOpcode::CallArg1, 8), vec![a, f]).unwrap();
    unit.ret(call);
    let stats = unit.compile(LoweringOptions::new()).unwrap();
    assert_eq!(stats.hits(EcmaOpcode::CallArg1), 1);

    let args = [Value::Smi(1), func.to_value()];
    let run = unit.evaluate(&args).unwrap();
    assert_eq!(run.returned(), Some(&Value::Undefined));
    assert_eq!(run.count(|op| matches!(op, GateOp::TypedCall { fast: true, .. })), 1);

    {
        let mut heap = unit.heap_mut();
        let data = heap.function_data_mut(func).unwrap();
        data.method = MethodId(8);
        data.method_index = index + 1;
    }
    let run = unit.evaluate(&args).unwrap();
    assert_eq!(run.outcome, deopt(DeoptType::NotJsFastCallTgt1, 8));
    assert_eq!(run.count(|op| matches!(op, GateOp::TypedCall { .. })), 0);
}

#[test]
fn test_instance_of_until_prototype_reassignment() {
    let mut unit = CompileUnit::new(2);
    let (ctor_hc, ctor, instance, stranger) = {
        let mut heap = unit.heap_mut();
        let plain = heap.add_hclass(HClass::new(JSType::JSObject, 0));
        let proto = heap.new_object(plain, ObjectKind::Plain).unwrap();
        heap.make_prototype(proto).unwrap();

        let ctor_hc = heap.add_hclass(HClass::new(JSType::JSFunction, 0));
        let ctor = heap
            .new_object(ctor_hc, ObjectKind::Function(FunctionData::new(FILE, MethodId(9), 0)))
            .unwrap();
        heap.function_data_mut(ctor).unwrap().proto_or_hclass = ProtoOrHClass::Prototype(proto);

        let instance_hc = heap.add_hclass(HClass::new(JSType::JSObject, 0).with_prototype(Some(proto)));
        let instance = heap.new_object(instance_hc, ObjectKind::Plain).unwrap();
        let stranger = heap.new_object(plain, ObjectKind::Plain).unwrap();
        (ctor_hc, ctor, instance, stranger)
    };
    unit.rw(3, vec![PGOObjectInfo::own(unit.class(ctor_hc))]).unwrap();
    let (obj, target) = (unit.param(0), unit.param(1));
    let test = unit.bytecode(BytecodeInfo::new(EcmaOpcode::InstanceOf, 3), vec![obj, target]).unwrap();
    unit.ret(test);
    unit.compile(LoweringOptions::new()).unwrap();

    let run = unit.evaluate(&[instance.to_value(), ctor.to_value()]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Boolean(true)));
    let run = unit.evaluate(&[stranger.to_value(), ctor.to_value()]).unwrap();
    assert_eq!(run.returned(), Some(&Value::Boolean(false)));

    {
        let mut heap = unit.heap_mut();
        let plain = heap.add_hclass(HClass::new(JSType::JSObject, 0));
        let replacement = heap.new_object(plain, ObjectKind::Plain).unwrap();
        heap.set_function_prototype(ctor, replacement).unwrap();
    }
    let run = unit.evaluate(&[instance.to_value(), ctor.to_value()]).unwrap();
    assert_eq!(run.outcome, deopt(DeoptType::PrototypeChanged4, 3));
}
