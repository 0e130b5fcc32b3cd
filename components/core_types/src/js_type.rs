//! Object layout families and builtin receiver identities.

/// Layout family of a heap object, as recorded in its hidden class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JSType {
    /// Ordinary object
    JSObject,
    /// Array exotic object
    JSArray,
    /// Function object
    JSFunction,
    /// Accessor pair holder (getter/setter)
    AccessorData,
    /// Heap string
    String,
    /// Map collection
    JSMap,
    /// Set collection
    JSSet,
    /// Array iterator
    JSArrayIterator,
    /// Wrapper object for a primitive (`new Number(1)`)
    JSPrimitiveRef,
    /// The global object
    JSGlobalObject,
    /// Int8Array
    JSInt8Array,
    /// Uint8Array
    JSUint8Array,
    /// Uint8ClampedArray
    JSUint8ClampedArray,
    /// Int16Array
    JSInt16Array,
    /// Uint16Array
    JSUint16Array,
    /// Int32Array
    JSInt32Array,
    /// Uint32Array
    JSUint32Array,
    /// Float32Array
    JSFloat32Array,
    /// Float64Array
    JSFloat64Array,
}

impl JSType {
    /// All typed array layouts, in element-kind order.
    pub const TYPED_ARRAYS: [JSType; 9] = [
        JSType::JSInt8Array,
        JSType::JSUint8Array,
        JSType::JSUint8ClampedArray,
        JSType::JSInt16Array,
        JSType::JSUint16Array,
        JSType::JSInt32Array,
        JSType::JSUint32Array,
        JSType::JSFloat32Array,
        JSType::JSFloat64Array,
    ];

    /// True for the nine typed array layouts.
    pub fn is_typed_array(self) -> bool {
        Self::TYPED_ARRAYS.contains(&self)
    }

    /// Normalizes a stored element into the typed array's domain.
    ///
    /// Integer kinds wrap modulo their width, `Uint8Clamped` saturates and
    /// rounds half to even, `Float32` rounds to single precision. Returns
    /// `None` for non typed array layouts.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::JSType;
    ///
    /// assert_eq!(JSType::JSInt8Array.coerce_element(130.0), Some(-126.0));
    /// assert_eq!(JSType::JSUint8ClampedArray.coerce_element(300.0), Some(255.0));
    /// assert_eq!(JSType::JSArray.coerce_element(1.0), None);
    /// ```
    pub fn coerce_element(self, n: f64) -> Option<f64> {
        let int = |n: f64| -> f64 {
            if n.is_finite() {
                n.trunc()
            } else {
                0.0
            }
        };
        let wrapped = |n: f64, modulo: f64| int(n).rem_euclid(modulo);
        let v = match self {
            JSType::JSInt8Array => f64::from(wrapped(n, 256.0) as u8 as i8),
            JSType::JSUint8Array => wrapped(n, 256.0),
            JSType::JSUint8ClampedArray => {
                if n.is_nan() {
                    0.0
                } else {
                    let clamped = n.clamp(0.0, 255.0);
                    let rounded = clamped.round();
                    // round half to even
                    if (clamped - clamped.trunc() - 0.5).abs() < f64::EPSILON && rounded % 2.0 != 0.0 {
                        rounded - 1.0
                    } else {
                        rounded
                    }
                }
            }
            JSType::JSInt16Array => f64::from(wrapped(n, 65536.0) as u16 as i16),
            JSType::JSUint16Array => wrapped(n, 65536.0),
            JSType::JSInt32Array => f64::from(wrapped(n, 4294967296.0) as u32 as i32),
            JSType::JSUint32Array => wrapped(n, 4294967296.0),
            JSType::JSFloat32Array => f64::from(n as f32),
            JSType::JSFloat64Array => n,
            _ => return None,
        };
        Some(v)
    }
}

/// Builtin receiver or global a profile can name instead of a user hidden
/// class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTypeId {
    /// Array instances
    Array,
    /// Array iterators
    ArrayIterator,
    /// The shared iterator prototype
    Iterator,
    /// Strings
    String,
    /// Map instances
    Map,
    /// Set instances
    Set,
    /// The Math namespace object
    Math,
    /// The Object constructor
    Object,
    /// The Number constructor
    Number,
    /// The Boolean constructor
    Boolean,
    /// The Function prototype family
    Function,
    /// Int8Array instances
    Int8Array,
    /// Uint8Array instances
    Uint8Array,
    /// Uint8ClampedArray instances
    Uint8ClampedArray,
    /// Int16Array instances
    Int16Array,
    /// Uint16Array instances
    Uint16Array,
    /// Int32Array instances
    Int32Array,
    /// Uint32Array instances
    Uint32Array,
    /// Float32Array instances
    Float32Array,
    /// Float64Array instances
    Float64Array,
}

impl BuiltinTypeId {
    /// Instance layout for builtins that describe receivers.
    pub fn to_js_type(self) -> Option<JSType> {
        let ty = match self {
            BuiltinTypeId::Array => JSType::JSArray,
            BuiltinTypeId::ArrayIterator => JSType::JSArrayIterator,
            BuiltinTypeId::String => JSType::String,
            BuiltinTypeId::Map => JSType::JSMap,
            BuiltinTypeId::Set => JSType::JSSet,
            BuiltinTypeId::Int8Array => JSType::JSInt8Array,
            BuiltinTypeId::Uint8Array => JSType::JSUint8Array,
            BuiltinTypeId::Uint8ClampedArray => JSType::JSUint8ClampedArray,
            BuiltinTypeId::Int16Array => JSType::JSInt16Array,
            BuiltinTypeId::Uint16Array => JSType::JSUint16Array,
            BuiltinTypeId::Int32Array => JSType::JSInt32Array,
            BuiltinTypeId::Uint32Array => JSType::JSUint32Array,
            BuiltinTypeId::Float32Array => JSType::JSFloat32Array,
            BuiltinTypeId::Float64Array => JSType::JSFloat64Array,
            BuiltinTypeId::Iterator
            | BuiltinTypeId::Math
            | BuiltinTypeId::Object
            | BuiltinTypeId::Number
            | BuiltinTypeId::Boolean
            | BuiltinTypeId::Function => return None,
        };
        Some(ty)
    }

    /// True for the typed array receivers.
    pub fn is_typed_array(self) -> bool {
        self.to_js_type().is_some_and(JSType::is_typed_array)
    }

    /// Global binding name of the builtin.
    pub fn global_name(self) -> &'static str {
        match self {
            BuiltinTypeId::Array => "Array",
            BuiltinTypeId::ArrayIterator => "ArrayIterator",
            BuiltinTypeId::Iterator => "Iterator",
            BuiltinTypeId::String => "String",
            BuiltinTypeId::Map => "Map",
            BuiltinTypeId::Set => "Set",
            BuiltinTypeId::Math => "Math",
            BuiltinTypeId::Object => "Object",
            BuiltinTypeId::Number => "Number",
            BuiltinTypeId::Boolean => "Boolean",
            BuiltinTypeId::Function => "Function",
            BuiltinTypeId::Int8Array => "Int8Array",
            BuiltinTypeId::Uint8Array => "Uint8Array",
            BuiltinTypeId::Uint8ClampedArray => "Uint8ClampedArray",
            BuiltinTypeId::Int16Array => "Int16Array",
            BuiltinTypeId::Uint16Array => "Uint16Array",
            BuiltinTypeId::Int32Array => "Int32Array",
            BuiltinTypeId::Uint32Array => "Uint32Array",
            BuiltinTypeId::Float32Array => "Float32Array",
            BuiltinTypeId::Float64Array => "Float64Array",
        }
    }

    /// Builtins that may be loaded directly from the global object by name.
    pub const GLOBAL_BUILTINS: [BuiltinTypeId; 8] = [
        BuiltinTypeId::Math,
        BuiltinTypeId::Object,
        BuiltinTypeId::Number,
        BuiltinTypeId::Boolean,
        BuiltinTypeId::Array,
        BuiltinTypeId::Map,
        BuiltinTypeId::Float32Array,
        BuiltinTypeId::Float64Array,
    ];

    /// Index of a global builtin by binding name.
    pub fn global_index_of(name: &str) -> Option<usize> {
        Self::GLOBAL_BUILTINS.iter().position(|b| b.global_name() == name)
    }
}
