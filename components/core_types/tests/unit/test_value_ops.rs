//! Unit tests for the primitive operation reference semantics

use core_types::value_ops::{
    generic_binary, generic_unary, number_to_string, to_js_string, to_number, typed_binary,
    typed_unary,
};
use core_types::{ParamType, TypedBinOp, TypedUnOp, Value};

#[cfg(test)]
mod conversion_tests {
    use super::*;

    #[test]
    fn test_number_to_string_integers_and_fractions() {
        assert_eq!(number_to_string(0.0), "0");
        assert_eq!(number_to_string(-17.0), "-17");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(-0.25), "-0.25");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_to_js_string_primitives() {
        assert_eq!(to_js_string(&Value::Undefined), "undefined");
        assert_eq!(to_js_string(&Value::Null), "null");
        assert_eq!(to_js_string(&Value::Boolean(true)), "true");
        assert_eq!(to_js_string(&Value::Double(2.5)), "2.5");
    }

    #[test]
    fn test_to_number_strings() {
        assert_eq!(to_number(&Value::from("")), 0.0);
        assert_eq!(to_number(&Value::from("0x10")), 16.0);
        assert_eq!(to_number(&Value::from("-Infinity")), f64::NEG_INFINITY);
        assert!(to_number(&Value::from("12px")).is_nan());
        assert_eq!(to_number(&Value::from("1e3")), 1000.0);
    }
}

#[cfg(test)]
mod generic_binary_tests {
    use super::*;

    #[test]
    fn test_add_concatenates_when_either_side_is_string() {
        assert_eq!(
            generic_binary(TypedBinOp::Add, &Value::Smi(1), &Value::from("a")),
            Value::from("1a")
        );
        assert_eq!(
            generic_binary(TypedBinOp::Add, &Value::from("a"), &Value::Double(0.5)),
            Value::from("a0.5")
        );
    }

    #[test]
    fn test_add_numbers_overflows_to_double() {
        let v = generic_binary(TypedBinOp::Add, &Value::Smi(i32::MAX), &Value::Smi(1));
        assert_eq!(v, Value::Double(2147483648.0));
    }

    #[test]
    fn test_strict_equality_nan() {
        let nan = Value::Double(f64::NAN);
        assert_eq!(generic_binary(TypedBinOp::StrictEq, &nan, &nan), Value::Boolean(false));
        assert_eq!(generic_binary(TypedBinOp::StrictNotEq, &nan, &nan), Value::Boolean(true));
    }

    #[test]
    fn test_string_comparison() {
        assert_eq!(
            generic_binary(TypedBinOp::Less, &Value::from("a"), &Value::from("b")),
            Value::Boolean(true)
        );
        assert_eq!(
            generic_binary(TypedBinOp::Less, &Value::from("10"), &Value::from("9")),
            Value::Boolean(true)
        );
    }
}

#[cfg(test)]
mod typed_tests {
    use super::*;

    #[test]
    fn test_typed_number_ops_reject_non_numbers() {
        assert_eq!(typed_binary(TypedBinOp::Sub, ParamType::Number, &Value::from("1"), &Value::Smi(1)), None);
        assert_eq!(typed_unary(TypedUnOp::Neg, ParamType::Number, &Value::Null), None);
    }

    #[test]
    fn test_typed_string_add() {
        let v = typed_binary(TypedBinOp::Add, ParamType::String, &Value::from("ab"), &Value::from("cd"));
        assert_eq!(v, Some(Value::from("abcd")));
    }

    #[test]
    fn test_typed_equality_against_undefined() {
        let v = typed_binary(TypedBinOp::Eq, ParamType::Any, &Value::Null, &Value::Undefined);
        assert_eq!(v, Some(Value::Boolean(true)));
        let v = typed_binary(TypedBinOp::StrictEq, ParamType::Any, &Value::Null, &Value::Undefined);
        assert_eq!(v, Some(Value::Boolean(false)));
    }

    #[test]
    fn test_typed_unary_matches_generic_on_numbers() {
        let inputs = [Value::Smi(0), Value::Smi(-7), Value::Double(2.5), Value::Double(f64::NAN)];
        for op in [TypedUnOp::Neg, TypedUnOp::Not, TypedUnOp::Inc, TypedUnOp::Dec, TypedUnOp::IsTrue] {
            for v in &inputs {
                let typed = typed_unary(op, ParamType::Number, v).expect("numeric input");
                assert!(typed.same_value(&generic_unary(op, v)), "{:?} {:?}", op, v);
            }
        }
    }
}
