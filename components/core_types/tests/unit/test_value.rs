//! Unit tests for the Value enum

use core_types::{ParamType, Value};

#[cfg(test)]
mod value_canonical_tests {
    use super::*;

    #[test]
    fn test_from_f64_int_range_edges() {
        assert_eq!(Value::from_f64(i32::MAX as f64), Value::Smi(i32::MAX));
        assert_eq!(Value::from_f64(i32::MIN as f64), Value::Smi(i32::MIN));
        assert_eq!(Value::from_f64(i32::MAX as f64 + 1.0), Value::Double(2147483648.0));
    }

    #[test]
    fn test_from_f64_keeps_negative_zero_as_double() {
        match Value::from_f64(-0.0) {
            Value::Double(d) => assert!(d.is_sign_negative()),
            other => panic!("expected double, got {:?}", other),
        }
    }

    #[test]
    fn test_from_f64_nan_and_infinity() {
        assert!(matches!(Value::from_f64(f64::NAN), Value::Double(d) if d.is_nan()));
        assert_eq!(Value::from_f64(f64::INFINITY), Value::Double(f64::INFINITY));
    }
}

#[cfg(test)]
mod value_is_truthy_tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        for v in [
            Value::Undefined,
            Value::Null,
            Value::Hole,
            Value::Boolean(false),
            Value::Smi(0),
            Value::Double(-0.0),
            Value::Double(f64::NAN),
            Value::from(""),
        ] {
            assert!(!v.is_truthy(), "{:?}", v);
        }
    }

    #[test]
    fn test_truthy_values() {
        for v in [
            Value::Boolean(true),
            Value::Smi(-1),
            Value::Double(0.1),
            Value::from("0"),
            Value::Symbol(1),
            Value::HeapObject(0),
        ] {
            assert!(v.is_truthy(), "{:?}", v);
        }
    }
}

#[cfg(test)]
mod value_type_of_tests {
    use super::*;

    #[test]
    fn test_primitive_type_of() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Boolean(true).type_of(), "boolean");
        assert_eq!(Value::Smi(1).type_of(), "number");
        assert_eq!(Value::Double(1.5).type_of(), "number");
        assert_eq!(Value::from("s").type_of(), "string");
        assert_eq!(Value::Symbol(3).type_of(), "symbol");
    }

    #[test]
    fn test_param_type_agrees_with_type_of() {
        let samples = [
            (ParamType::Number, Value::Double(2.5)),
            (ParamType::Int, Value::Smi(2)),
            (ParamType::Boolean, Value::Boolean(false)),
            (ParamType::String, Value::from("x")),
            (ParamType::Undefined, Value::Undefined),
            (ParamType::Null, Value::Null),
        ];
        for (param, value) in samples {
            assert!(param.accepts(&value));
            assert_eq!(param.type_of_string(), Some(value.type_of()));
        }
    }
}

#[cfg(test)]
mod value_accessor_tests {
    use super::*;

    #[test]
    fn test_as_f64() {
        assert_eq!(Value::Smi(3).as_f64(), Some(3.0));
        assert_eq!(Value::Double(0.25).as_f64(), Some(0.25));
        assert_eq!(Value::from("3").as_f64(), None);
    }

    #[test]
    fn test_as_heap_object() {
        assert_eq!(Value::HeapObject(9).as_heap_object(), Some(9));
        assert_eq!(Value::Null.as_heap_object(), None);
    }

    #[test]
    fn test_same_value() {
        assert!(Value::Smi(1).same_value(&Value::Double(1.0)));
        assert!(!Value::Smi(1).same_value(&Value::from("1")));
        assert!(Value::from("a").same_value(&Value::from("a")));
    }
}
