//! Unit tests for the object model's runtime mutators

use bytecode_system::{FileId, MethodId};
use core_types::{BuiltinTypeId, ElementsKind, JSType, Value};
use object_model::{FunctionData, HClass, ObjectKind, ObjectModel, ProtoOrHClass, SharedObjectModel};

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_function_prototype_assignment_marks_function_hclass() {
        let mut model = ObjectModel::new();
        let fn_hc = model.add_hclass(HClass::new(JSType::JSFunction, 0));
        let obj_hc = model.add_hclass(HClass::new(JSType::JSObject, 0));
        let ctor = model
            .new_object(fn_hc, ObjectKind::Function(FunctionData::new(FileId(1), MethodId(4), 0)))
            .unwrap();
        let proto = model.new_object(obj_hc, ObjectKind::Plain).unwrap();
        model.set_function_prototype(ctor, proto).unwrap();
        assert!(model.hclass(fn_hc).unwrap().proto_changed);
        assert_eq!(
            model.function_of(&ctor.to_value()).unwrap().proto_or_hclass,
            ProtoOrHClass::Prototype(proto)
        );
    }

    #[test]
    fn test_set_function_prototype_rejects_plain_objects() {
        let mut model = ObjectModel::new();
        let obj_hc = model.add_hclass(HClass::new(JSType::JSObject, 0));
        let a = model.new_object(obj_hc, ObjectKind::Plain).unwrap();
        let b = model.new_object(obj_hc, ObjectKind::Plain).unwrap();
        assert!(model.set_function_prototype(a, b).is_err());
    }

    #[test]
    fn test_elements_kind_change_moves_hclass() {
        let mut model = ObjectModel::new();
        let arr_hc = model.add_hclass(HClass::new(JSType::JSArray, 0).with_elements_kind(ElementsKind::INT));
        let arr = model.new_array(arr_hc, vec![Value::Smi(1)]).unwrap();
        model.set_elements_kind(arr, ElementsKind::TAGGED).unwrap();
        let hc = model.object(arr).unwrap().hclass;
        assert_ne!(hc, arr_hc);
        assert_eq!(model.hclass(hc).unwrap().elements_kind, ElementsKind::TAGGED);
    }

    #[test]
    fn test_builtin_prototype_table() {
        let mut model = ObjectModel::new();
        let obj_hc = model.add_hclass(HClass::new(JSType::JSObject, 0));
        let proto = model.new_object(obj_hc, ObjectKind::Plain).unwrap();
        model.set_builtin_prototype(BuiltinTypeId::Array, proto).unwrap();
        let phc = model.builtin_prototype_hclass(BuiltinTypeId::Array).unwrap();
        assert!(model.hclass(phc).unwrap().is_prototype);
        assert_ne!(phc, obj_hc);
    }

    #[test]
    fn test_global_boxes_invalidate_to_hole() {
        let mut model = ObjectModel::new();
        let box_hc = model.add_hclass(HClass::new(JSType::JSObject, 0));
        let cell = model.set_global("g", Value::Smi(3), box_hc).unwrap();
        model.invalidate_global("g").unwrap();
        assert_eq!(model.object(cell).unwrap().kind, ObjectKind::PropertyBox(Value::Hole));
        assert!(model.global_box("g").is_none());
    }

    #[test]
    fn test_accessor_definition() {
        let mut model = ObjectModel::new();
        let obj_hc = model.add_hclass(HClass::new(JSType::JSObject, 2));
        let pair_hc = model.add_hclass(HClass::new(JSType::AccessorData, 0));
        let obj = model.new_object(obj_hc, ObjectKind::Plain).unwrap();
        model.define_accessor(obj, "v", None, None, pair_hc).unwrap();
        let hc = model.object(obj).unwrap().hclass;
        assert!(model.lookup_property(hc, "v").is_accessor);
        assert!(model.set_property(obj, "v", Value::Smi(1)).is_err());
    }

    #[test]
    fn test_make_unstable_moves_array_off_its_hclass() {
        let mut model = ObjectModel::new();
        let arr_hc = model.add_hclass(HClass::new(JSType::JSArray, 0).with_elements_kind(ElementsKind::INT));
        let arr = model.new_array(arr_hc, vec![Value::Smi(1)]).unwrap();
        assert!(model.hclass(arr_hc).unwrap().is_stable_elements);
        model.make_unstable(arr).unwrap();
        let hc = model.object(arr).unwrap().hclass;
        assert_ne!(hc, arr_hc);
        assert!(!model.hclass(hc).unwrap().is_stable_elements);
    }

    #[test]
    fn test_function_instance_hclass_replaces_prototype() {
        let mut model = ObjectModel::new();
        let fn_hc = model.add_hclass(HClass::new(JSType::JSFunction, 0));
        let obj_hc = model.add_hclass(HClass::new(JSType::JSObject, 0));
        let ctor = model
            .new_object(fn_hc, ObjectKind::Function(FunctionData::new(FileId(1), MethodId(4), 0)))
            .unwrap();
        model.set_function_instance_hclass(ctor, obj_hc).unwrap();
        assert_eq!(model.function_of(&ctor.to_value()).unwrap().proto_or_hclass, ProtoOrHClass::HClass(obj_hc));

        let plain = model.new_object(obj_hc, ObjectKind::Plain).unwrap();
        assert!(model.set_function_instance_hclass(plain, obj_hc).is_err());
    }

    #[test]
    fn test_global_constant_table_indexes_in_push_order() {
        let mut model = ObjectModel::new();
        let a = model.add_hclass(HClass::new(JSType::JSObject, 0));
        let b = model.add_hclass(HClass::new(JSType::JSObject, 0));
        assert_eq!(model.push_global_const_hclass(a), 0);
        assert_eq!(model.push_global_const_hclass(b), 1);
        assert_eq!(model.global_const_hclass(1), Some(b));
        assert_eq!(model.global_const_hclass(2), None);
    }

    #[test]
    fn test_shared_model_round_trip() {
        let heap = SharedObjectModel::new(ObjectModel::new());
        let hc = heap.lock_mut().add_hclass(HClass::new(JSType::JSObject, 0));
        assert_eq!(heap.lock_for_compile().hclass(hc).unwrap().object_type, JSType::JSObject);
    }
}
