//! Reference semantics of primitive operations.
//!
//! Two families live here:
//!
//! - `generic_*` functions implement the full dynamic semantics that the
//!   interpreter (and the unlowered graph) would apply to any pair of
//!   primitive values.
//! - `typed_*` functions implement what a typed operation computes once its
//!   guards have passed. They return `None` when handed values outside
//!   their speculated domain, which is exactly the case a guard exists to
//!   rule out.
//!
//! Heap objects are treated as opaque here; operations that need their
//! layout go through the object model instead.

use crate::{ParamType, TypedBinOp, TypedUnOp, Value};

/// `ToNumber` for primitive values.
///
/// # Examples
///
/// ```
/// use core_types::{value_ops::to_number, Value};
///
/// assert_eq!(to_number(&Value::from(" 12 ")), 12.0);
/// assert_eq!(to_number(&Value::Null), 0.0);
/// assert!(to_number(&Value::Undefined).is_nan());
/// assert!(to_number(&Value::from("inf")).is_nan());
/// ```
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined | Value::Hole => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Smi(n) => f64::from(*n),
        Value::Double(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Symbol(_) | Value::HeapObject(_) => f64::NAN,
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    let well_formed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !well_formed {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `ToInt32`.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32 as i32
}

/// `ToUint32`.
pub fn to_uint32(n: f64) -> u32 {
    to_int32(n) as u32
}

/// `Number::toString(10)`.
///
/// # Examples
///
/// ```
/// use core_types::value_ops::number_to_string;
///
/// assert_eq!(number_to_string(42.0), "42");
/// assert_eq!(number_to_string(-0.0), "0");
/// assert_eq!(number_to_string(0.5), "0.5");
/// assert_eq!(number_to_string(1e21), "1e+21");
/// assert_eq!(number_to_string(f64::NAN), "NaN");
/// ```
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{}", n as i128);
    }
    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format_finite(n);
    match formatted.find('e') {
        Some(pos) if !formatted[pos + 1..].starts_with('-') => {
            format!("{}e+{}", &formatted[..pos], &formatted[pos + 1..])
        }
        _ => formatted.to_string(),
    }
}

/// `ToString` for primitive values.
pub fn to_js_string(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Hole => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Smi(n) => n.to_string(),
        Value::Double(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        Value::Symbol(_) => "Symbol()".to_string(),
        Value::HeapObject(_) => "[object Object]".to_string(),
    }
}

/// `IsStrictlyEqual`.
pub fn strict_equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => match (lhs, rhs) {
            (Value::Undefined | Value::Hole, Value::Undefined | Value::Hole) => true,
            _ => lhs == rhs,
        },
        _ => false,
    }
}

/// `IsLooselyEqual` restricted to primitives and object identity.
pub fn loose_equals(lhs: &Value, rhs: &Value) -> bool {
    if lhs.is_undefined_or_null() || matches!(lhs, Value::Hole) {
        return rhs.is_undefined_or_null() || matches!(rhs, Value::Hole);
    }
    if rhs.is_undefined_or_null() || matches!(rhs, Value::Hole) {
        return false;
    }
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::HeapObject(a), Value::HeapObject(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Symbol(_), _) | (_, Value::Symbol(_)) => false,
        (Value::HeapObject(_), _) | (_, Value::HeapObject(_)) => false,
        _ => to_number(lhs) == to_number(rhs),
    }
}

fn compare_values(op: TypedBinOp, lhs: &Value, rhs: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (lhs, rhs) {
        let ord = a.encode_utf16().cmp(b.encode_utf16());
        return match op {
            TypedBinOp::Less => ord.is_lt(),
            TypedBinOp::LessEq => ord.is_le(),
            TypedBinOp::Greater => ord.is_gt(),
            _ => ord.is_ge(),
        };
    }
    compare_numbers(op, to_number(lhs), to_number(rhs))
}

fn compare_numbers(op: TypedBinOp, a: f64, b: f64) -> bool {
    match op {
        TypedBinOp::Less => a < b,
        TypedBinOp::LessEq => a <= b,
        TypedBinOp::Greater => a > b,
        _ => a >= b,
    }
}

fn numeric_binary(op: TypedBinOp, a: f64, b: f64) -> Value {
    match op {
        TypedBinOp::Add => Value::from_f64(a + b),
        TypedBinOp::Sub => Value::from_f64(a - b),
        TypedBinOp::Mul => Value::from_f64(a * b),
        TypedBinOp::Div => Value::from_f64(a / b),
        TypedBinOp::Mod => Value::from_f64(a % b),
        TypedBinOp::Less | TypedBinOp::LessEq | TypedBinOp::Greater | TypedBinOp::GreaterEq => {
            Value::Boolean(compare_numbers(op, a, b))
        }
        TypedBinOp::Eq | TypedBinOp::StrictEq => Value::Boolean(a == b),
        TypedBinOp::NotEq | TypedBinOp::StrictNotEq => Value::Boolean(a != b),
        TypedBinOp::Shl => {
            Value::from_f64(f64::from(to_int32(a).wrapping_shl(to_uint32(b) & 0x1f)))
        }
        TypedBinOp::Shr => Value::from_f64(f64::from(to_uint32(a) >> (to_uint32(b) & 0x1f))),
        TypedBinOp::Ashr => Value::from_f64(f64::from(to_int32(a) >> (to_uint32(b) & 0x1f))),
        TypedBinOp::And => Value::from_f64(f64::from(to_int32(a) & to_int32(b))),
        TypedBinOp::Or => Value::from_f64(f64::from(to_int32(a) | to_int32(b))),
        TypedBinOp::Xor => Value::from_f64(f64::from(to_int32(a) ^ to_int32(b))),
    }
}

/// Dynamic semantics of a binary operator over primitive values.
///
/// # Examples
///
/// ```
/// use core_types::{value_ops::generic_binary, TypedBinOp, Value};
///
/// let s = generic_binary(TypedBinOp::Add, &Value::from("n="), &Value::Smi(3));
/// assert_eq!(s, Value::from("n=3"));
/// let b = generic_binary(TypedBinOp::Less, &Value::Double(f64::NAN), &Value::Smi(1));
/// assert_eq!(b, Value::Boolean(false));
/// ```
pub fn generic_binary(op: TypedBinOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        TypedBinOp::Add if lhs.is_string() || rhs.is_string() => {
            Value::String(to_js_string(lhs) + &to_js_string(rhs))
        }
        TypedBinOp::Less | TypedBinOp::LessEq | TypedBinOp::Greater | TypedBinOp::GreaterEq => {
            Value::Boolean(compare_values(op, lhs, rhs))
        }
        TypedBinOp::Eq => Value::Boolean(loose_equals(lhs, rhs)),
        TypedBinOp::NotEq => Value::Boolean(!loose_equals(lhs, rhs)),
        TypedBinOp::StrictEq => Value::Boolean(strict_equals(lhs, rhs)),
        TypedBinOp::StrictNotEq => Value::Boolean(!strict_equals(lhs, rhs)),
        _ => numeric_binary(op, to_number(lhs), to_number(rhs)),
    }
}

/// Dynamic semantics of a unary operator over primitive values.
pub fn generic_unary(op: TypedUnOp, value: &Value) -> Value {
    match op {
        TypedUnOp::Neg => Value::from_f64(-to_number(value)),
        TypedUnOp::Not => Value::from_f64(f64::from(!to_int32(to_number(value)))),
        TypedUnOp::Inc => Value::from_f64(to_number(value) + 1.0),
        TypedUnOp::Dec => Value::from_f64(to_number(value) - 1.0),
        TypedUnOp::IsTrue => Value::Boolean(value.is_truthy()),
        TypedUnOp::IsFalse => Value::Boolean(!value.is_truthy()),
    }
}

fn int_binary(op: TypedBinOp, a: i32, b: i32) -> Option<Value> {
    let (a, b) = (i64::from(a), i64::from(b));
    let wide = match op {
        TypedBinOp::Add => a + b,
        TypedBinOp::Sub => a - b,
        TypedBinOp::Mul => {
            let product = a * b;
            if product == 0 && (a < 0 || b < 0) {
                return Some(Value::Double(-0.0));
            }
            product
        }
        _ => return None,
    };
    Some(Value::from_f64(wide as f64))
}

/// Result of a typed binary operation whose guards have passed.
///
/// Returns `None` when an operand lies outside the speculated domain.
///
/// # Examples
///
/// ```
/// use core_types::{value_ops::typed_binary, ParamType, TypedBinOp, Value};
///
/// let r = typed_binary(TypedBinOp::Add, ParamType::Number, &Value::Double(0.5), &Value::Smi(1));
/// assert_eq!(r, Some(Value::Double(1.5)));
/// assert_eq!(typed_binary(TypedBinOp::Add, ParamType::Number, &Value::Null, &Value::Smi(1)), None);
/// ```
pub fn typed_binary(op: TypedBinOp, param: ParamType, lhs: &Value, rhs: &Value) -> Option<Value> {
    if param.is_number_type() {
        if let (Value::Smi(a), Value::Smi(b)) = (lhs, rhs) {
            if let Some(v) = int_binary(op, *a, *b) {
                return Some(v);
            }
        }
        return Some(numeric_binary(op, lhs.as_f64()?, rhs.as_f64()?));
    }
    if param.is_string_type() {
        let (Value::String(a), Value::String(b)) = (lhs, rhs) else {
            return None;
        };
        return match op {
            TypedBinOp::Add => Some(Value::String(format!("{}{}", a, b))),
            TypedBinOp::Eq | TypedBinOp::StrictEq => Some(Value::Boolean(a == b)),
            TypedBinOp::NotEq | TypedBinOp::StrictNotEq => Some(Value::Boolean(a != b)),
            _ if op.is_comparison() => Some(Value::Boolean(compare_values(op, lhs, rhs))),
            _ => None,
        };
    }
    if op.is_equality() {
        let equal = match op {
            TypedBinOp::Eq | TypedBinOp::NotEq => loose_equals(lhs, rhs),
            _ => strict_equals(lhs, rhs),
        };
        let negate = matches!(op, TypedBinOp::NotEq | TypedBinOp::StrictNotEq);
        return Some(Value::Boolean(equal != negate));
    }
    None
}

/// Result of a typed unary operation whose guards have passed.
pub fn typed_unary(op: TypedUnOp, param: ParamType, value: &Value) -> Option<Value> {
    match op {
        TypedUnOp::IsTrue | TypedUnOp::IsFalse => {
            if !(param.is_boolean_type() || param.is_number_type()) || !param.accepts(value) {
                return None;
            }
            let truthy = match value {
                Value::Boolean(b) => *b,
                _ => {
                    let n = value.as_f64()?;
                    n != 0.0 && !n.is_nan()
                }
            };
            Some(Value::Boolean(if op == TypedUnOp::IsTrue { truthy } else { !truthy }))
        }
        _ => {
            let n = value.as_f64()?;
            let v = match op {
                TypedUnOp::Neg => {
                    if let Value::Smi(0) = value {
                        Value::Double(-0.0)
                    } else {
                        Value::from_f64(-n)
                    }
                }
                TypedUnOp::Not => Value::Smi(!to_int32(n)),
                TypedUnOp::Inc => Value::from_f64(n + 1.0),
                _ => Value::from_f64(n - 1.0),
            };
            Some(v)
        }
    }
}
