//! Speculated operand types.

use crate::Value;

/// The runtime type a typed operation speculates on.
///
/// Produced by the type info accessors from static gate types and profile
/// samples; consumed when selecting the variant and numeric semantics of
/// a typed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// No usable speculation
    #[default]
    Any,
    /// int32 values; results that overflow are deoptimized upstream
    Int,
    /// int32 inputs whose result may leave the int32 range
    IntOverflow,
    /// double values
    Double,
    /// Any number (int32 or double)
    Number,
    /// Boolean values
    Boolean,
    /// String values
    String,
    /// Interned strings (pointer equality is value equality)
    InternString,
    /// BigInt values
    BigInt,
    /// The undefined value
    Undefined,
    /// The null value
    Null,
}

impl ParamType {
    /// True for every numeric speculation.
    pub fn is_number_type(self) -> bool {
        matches!(
            self,
            ParamType::Int | ParamType::IntOverflow | ParamType::Double | ParamType::Number
        )
    }

    /// True when the speculation allows int32 overflow.
    pub fn is_int_overflow_type(self) -> bool {
        self == ParamType::IntOverflow
    }

    /// True for string and interned string speculations.
    pub fn is_string_type(self) -> bool {
        matches!(self, ParamType::String | ParamType::InternString)
    }

    /// True for interned string speculation.
    pub fn is_intern_string_type(self) -> bool {
        self == ParamType::InternString
    }

    /// True for boolean speculation.
    pub fn is_boolean_type(self) -> bool {
        self == ParamType::Boolean
    }

    /// Whether a runtime value satisfies this speculation.
    ///
    /// This is the predicate evaluated by primitive type guards.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{ParamType, Value};
    ///
    /// assert!(ParamType::Number.accepts(&Value::Double(0.5)));
    /// assert!(!ParamType::Int.accepts(&Value::Double(0.5)));
    /// assert!(ParamType::Any.accepts(&Value::Null));
    /// ```
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Int | ParamType::IntOverflow => value.is_int(),
            ParamType::Double => value.is_double(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::String | ParamType::InternString => value.is_string(),
            ParamType::BigInt => false,
            ParamType::Undefined => matches!(value, Value::Undefined),
            ParamType::Null => matches!(value, Value::Null),
        }
    }

    /// The `typeof` result every value of this type shares, if any.
    pub fn type_of_string(self) -> Option<&'static str> {
        match self {
            ParamType::Int | ParamType::IntOverflow | ParamType::Double | ParamType::Number => {
                Some("number")
            }
            ParamType::Boolean => Some("boolean"),
            ParamType::String | ParamType::InternString => Some("string"),
            ParamType::BigInt => Some("bigint"),
            ParamType::Undefined => Some("undefined"),
            ParamType::Null => Some("object"),
            ParamType::Any => None,
        }
    }
}
