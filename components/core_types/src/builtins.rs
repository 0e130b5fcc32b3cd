//! Builtin functions with typed fast paths.

/// Identity of a builtin function the compiler can call directly.
///
/// Profiles record these ids for call sites whose observed callee was a
/// builtin; the numeric encoding is the enum discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BuiltinsStubId {
    /// `Math.sqrt`
    MathSqrt = 1,
    /// `Math.abs`
    MathAbs,
    /// `Math.floor`
    MathFloor,
    /// `Math.sin`
    MathSin,
    /// `Number.isNaN`
    NumberIsNaN,
    /// `Number.isFinite`
    NumberIsFinite,
    /// `Number.isInteger`
    NumberIsInteger,
    /// `Number.parseFloat`
    NumberParseFloat,
    /// `Number.parseInt`
    NumberParseInt,
    /// global `isFinite`
    GlobalIsFinite,
    /// global `isNaN`
    GlobalIsNan,
    /// `Array.prototype.values` / `[Symbol.iterator]`
    ArrayValues,
    /// `Array.prototype.pop`
    ArrayPop,
    /// `Array.prototype.push`
    ArrayPush,
    /// `Array.prototype.includes`
    ArrayIncludes,
    /// `Array.prototype.indexOf`
    ArrayIndexOf,
    /// `Array.prototype.slice`
    ArraySlice,
    /// `Array.prototype.fill`
    ArrayFill,
    /// `String.prototype.charCodeAt`
    StringCharCodeAt,
    /// `String.prototype.substring`
    StringSubstring,
    /// `String.prototype[Symbol.iterator]`
    StringIterator,
    /// `Map.prototype.get`
    MapGet,
    /// `Map.prototype.has`
    MapHas,
    /// `Map.prototype.clear`
    MapClear,
    /// `Map.prototype.set`
    MapSet,
    /// `Object` constructor
    ObjectConstructor,
    /// `Boolean` constructor
    BooleanConstructor,
    /// `Number` constructor
    NumberConstructor,
    /// `Array` constructor
    ArrayConstructor,
    /// `Float32Array` constructor
    Float32ArrayConstructor,
    /// `Map` constructor
    MapConstructor,
}

impl BuiltinsStubId {
    const ALL: [BuiltinsStubId; 31] = [
        BuiltinsStubId::MathSqrt,
        BuiltinsStubId::MathAbs,
        BuiltinsStubId::MathFloor,
        BuiltinsStubId::MathSin,
        BuiltinsStubId::NumberIsNaN,
        BuiltinsStubId::NumberIsFinite,
        BuiltinsStubId::NumberIsInteger,
        BuiltinsStubId::NumberParseFloat,
        BuiltinsStubId::NumberParseInt,
        BuiltinsStubId::GlobalIsFinite,
        BuiltinsStubId::GlobalIsNan,
        BuiltinsStubId::ArrayValues,
        BuiltinsStubId::ArrayPop,
        BuiltinsStubId::ArrayPush,
        BuiltinsStubId::ArrayIncludes,
        BuiltinsStubId::ArrayIndexOf,
        BuiltinsStubId::ArraySlice,
        BuiltinsStubId::ArrayFill,
        BuiltinsStubId::StringCharCodeAt,
        BuiltinsStubId::StringSubstring,
        BuiltinsStubId::StringIterator,
        BuiltinsStubId::MapGet,
        BuiltinsStubId::MapHas,
        BuiltinsStubId::MapClear,
        BuiltinsStubId::MapSet,
        BuiltinsStubId::ObjectConstructor,
        BuiltinsStubId::BooleanConstructor,
        BuiltinsStubId::NumberConstructor,
        BuiltinsStubId::ArrayConstructor,
        BuiltinsStubId::Float32ArrayConstructor,
        BuiltinsStubId::MapConstructor,
    ];

    /// Decodes a profiled builtin id.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::BuiltinsStubId;
    ///
    /// let id = BuiltinsStubId::ArrayPush as u32;
    /// assert_eq!(BuiltinsStubId::from_u32(id), Some(BuiltinsStubId::ArrayPush));
    /// assert_eq!(BuiltinsStubId::from_u32(0), None);
    /// ```
    pub fn from_u32(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| *id as u32 == raw)
    }

    /// `Number.*` functions with a typed lowering.
    pub fn is_typed_builtins_number_id(self) -> bool {
        matches!(
            self,
            BuiltinsStubId::NumberIsNaN
                | BuiltinsStubId::NumberIsFinite
                | BuiltinsStubId::NumberIsInteger
                | BuiltinsStubId::NumberParseFloat
                | BuiltinsStubId::NumberParseInt
        )
    }

    /// Global functions with a typed lowering.
    pub fn is_typed_builtins_global_id(self) -> bool {
        matches!(self, BuiltinsStubId::GlobalIsFinite | BuiltinsStubId::GlobalIsNan)
    }

    /// Builtins inlined by a later pass rather than called.
    pub fn is_typed_inline_builtin(self) -> bool {
        matches!(
            self,
            BuiltinsStubId::MathSqrt
                | BuiltinsStubId::MathAbs
                | BuiltinsStubId::MathFloor
                | BuiltinsStubId::MathSin
                | BuiltinsStubId::NumberIsNaN
                | BuiltinsStubId::NumberIsFinite
                | BuiltinsStubId::NumberIsInteger
                | BuiltinsStubId::GlobalIsFinite
                | BuiltinsStubId::GlobalIsNan
        )
    }

    /// Receiver-only builtin methods (`recv.m()`).
    pub fn is_call_this0(self) -> bool {
        matches!(
            self,
            BuiltinsStubId::ArrayValues
                | BuiltinsStubId::ArrayPop
                | BuiltinsStubId::StringIterator
                | BuiltinsStubId::MapClear
        )
    }

    /// Builtin methods taking one argument.
    pub fn is_call_this1(self) -> bool {
        matches!(
            self,
            BuiltinsStubId::ArrayPush
                | BuiltinsStubId::ArrayIncludes
                | BuiltinsStubId::ArrayIndexOf
                | BuiltinsStubId::StringCharCodeAt
                | BuiltinsStubId::MapGet
                | BuiltinsStubId::MapHas
        )
    }

    /// Builtin methods taking two arguments.
    pub fn is_call_this2(self) -> bool {
        matches!(
            self,
            BuiltinsStubId::StringSubstring | BuiltinsStubId::ArraySlice | BuiltinsStubId::MapSet
        )
    }

    /// Builtin methods taking three arguments.
    pub fn is_call_this3(self) -> bool {
        matches!(self, BuiltinsStubId::ArrayFill)
    }

    /// Iterator factories usable by `GETITERATOR`.
    pub fn is_iterator_method(self) -> bool {
        matches!(self, BuiltinsStubId::ArrayValues | BuiltinsStubId::StringIterator)
    }

    /// Builtins that can mutate their receiver or arguments.
    pub fn has_side_effect(self) -> bool {
        matches!(
            self,
            BuiltinsStubId::ArrayPop
                | BuiltinsStubId::ArrayPush
                | BuiltinsStubId::ArrayFill
                | BuiltinsStubId::MapClear
                | BuiltinsStubId::MapSet
        )
    }
}
