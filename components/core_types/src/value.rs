//! Runtime value representation using tagged variants.
//!
//! This module provides the `Value` enum that the object model and the
//! reference evaluator use for every slot, register and constant.

/// Represents any runtime value.
///
/// Primitive values are stored inline, while objects are referenced by ID
/// into the object heap.
///
/// # Tagged Representation
///
/// In the VM these are tagged words:
/// - Small integers (Smi) carry the int32 payload inline
/// - Doubles are boxed as NaN-tagged words
/// - Heap objects are pointers
///
/// `Hole` is the internal marker for a missing array element or an
/// uninitialised in-object slot; it never escapes to user code.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.5);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert!(float.is_number());
/// assert_eq!(number.type_of(), "number");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The undefined value
    Undefined,
    /// The null value
    Null,
    /// Missing element / uninitialised slot marker
    Hole,
    /// Boolean (true or false)
    Boolean(bool),
    /// Small integer (fits in 32 bits)
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// String value
    String(String),
    /// Symbol, identified by its registry id
    Symbol(u32),
    /// Heap-allocated object (referenced by ID)
    HeapObject(usize),
}

impl Value {
    /// Builds the canonical number value for `n`.
    ///
    /// Integral values in int32 range (excluding `-0`) become `Smi`,
    /// everything else stays a `Double`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::from_f64(7.0), Value::Smi(7));
    /// assert!(matches!(Value::from_f64(-0.0), Value::Double(_)));
    /// assert!(matches!(Value::from_f64(0.5), Value::Double(_)));
    /// ```
    pub fn from_f64(n: f64) -> Self {
        let fits_int = n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64;
        if fits_int && !(n == 0.0 && n.is_sign_negative()) {
            Value::Smi(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// Returns whether this value is truthy.
    ///
    /// The falsy values are undefined, null, false, 0, -0, NaN and the
    /// empty string. The hole reads as undefined.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null | Value::Hole => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Symbol(_) | Value::HeapObject(_) => true,
        }
    }

    /// Returns the `typeof` string for this value.
    ///
    /// Heap objects report `"object"`; callable objects are classified by
    /// the object model, which knows their layout.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined | Value::Hole => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::HeapObject(_) => "object",
        }
    }

    /// True for `Smi` and `Double`.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Smi(_) | Value::Double(_))
    }

    /// True for `Smi` only.
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Smi(_))
    }

    /// True for `Double` only.
    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    /// True for strings.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// True for booleans.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    /// True for heap object references.
    pub fn is_heap_object(&self) -> bool {
        matches!(self, Value::HeapObject(_))
    }

    /// True for `undefined` or `null`.
    pub fn is_undefined_or_null(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Numeric payload of a number value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Object id of a heap object reference.
    pub fn as_heap_object(&self) -> Option<usize> {
        match self {
            Value::HeapObject(id) => Some(*id),
            _ => None,
        }
    }

    /// `SameValue` comparison: NaN equals NaN and `+0` differs from `-0`.
    ///
    /// Numbers compare by numeric value regardless of `Smi`/`Double`
    /// representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(Value::Double(f64::NAN).same_value(&Value::Double(f64::NAN)));
    /// assert!(!Value::Double(-0.0).same_value(&Value::Smi(0)));
    /// assert!(Value::Double(3.0).same_value(&Value::Smi(3)));
    /// ```
    pub fn same_value(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b && a.is_sign_negative() == b.is_sign_negative()
            }
            (None, None) => self == other,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
