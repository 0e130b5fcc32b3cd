//! Array element representation lattice.
//!
//! Element kinds form a small bit lattice: every kind is a union of the
//! base representations it may hold plus an optional hole bit. Joining two
//! kinds is a bitwise or, so a transition only ever moves up the lattice.

use std::fmt;

/// Representation of the elements stored in an array.
///
/// # Examples
///
/// ```
/// use core_types::ElementsKind;
///
/// let k = ElementsKind::INT.merge(ElementsKind::NUMBER);
/// assert_eq!(k, ElementsKind::NUMBER);
/// assert!(ElementsKind::HOLE_INT.has_hole());
/// assert!(ElementsKind::GENERIC.is_generic());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementsKind(u8);

impl ElementsKind {
    /// No elements observed yet
    pub const NONE: ElementsKind = ElementsKind(0x00);
    /// Only holes
    pub const HOLE: ElementsKind = ElementsKind(0x01);
    /// int32 elements
    pub const INT: ElementsKind = ElementsKind(0x02);
    /// int32 or double elements
    pub const NUMBER: ElementsKind = ElementsKind(0x06);
    /// String elements
    pub const STRING: ElementsKind = ElementsKind(0x08);
    /// Heap object elements
    pub const OBJECT: ElementsKind = ElementsKind(0x10);
    /// Any tagged value
    pub const TAGGED: ElementsKind = ElementsKind(0x1E);
    /// int32 elements with holes
    pub const HOLE_INT: ElementsKind = ElementsKind(0x03);
    /// Number elements with holes
    pub const HOLE_NUMBER: ElementsKind = ElementsKind(0x07);
    /// String elements with holes
    pub const HOLE_STRING: ElementsKind = ElementsKind(0x09);
    /// Object elements with holes
    pub const HOLE_OBJECT: ElementsKind = ElementsKind(0x11);
    /// Tagged elements with holes
    pub const HOLE_TAGGED: ElementsKind = ElementsKind(0x1F);
    /// Top of the lattice
    pub const GENERIC: ElementsKind = ElementsKind(0x1F);

    const HOLE_BIT: u8 = 0x01;

    /// Raw lattice bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Builds a kind from raw bits, masking unknown bits away.
    pub fn from_bits(bits: u8) -> Self {
        ElementsKind(bits & Self::GENERIC.0)
    }

    /// Least upper bound of two kinds.
    pub fn merge(self, other: ElementsKind) -> Self {
        ElementsKind(self.0 | other.0)
    }

    /// True for `NONE`.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// True when holes may be present.
    pub fn has_hole(self) -> bool {
        self.0 & Self::HOLE_BIT != 0
    }

    /// The same kind without the hole bit.
    pub fn without_hole(self) -> Self {
        ElementsKind(self.0 & !Self::HOLE_BIT)
    }

    /// `INT` or `HOLE_INT`.
    pub fn is_int(self) -> bool {
        self.without_hole() == Self::INT
    }

    /// `NUMBER` or `HOLE_NUMBER`.
    pub fn is_number(self) -> bool {
        self.without_hole() == Self::NUMBER
    }

    /// `STRING` or `HOLE_STRING`.
    pub fn is_string(self) -> bool {
        self.without_hole() == Self::STRING
    }

    /// `OBJECT` or `HOLE_OBJECT`.
    pub fn is_object(self) -> bool {
        self.without_hole() == Self::OBJECT
    }

    /// Tagged kinds, with or without holes.
    pub fn is_tagged(self) -> bool {
        self.without_hole() == Self::TAGGED
    }

    /// True for the top of the lattice.
    pub fn is_generic(self) -> bool {
        self == Self::GENERIC
    }

    /// Smallest kind able to hold `value`.
    pub fn of_value(value: &crate::Value) -> Self {
        use crate::Value;
        match value {
            Value::Hole => Self::HOLE,
            Value::Smi(_) => Self::INT,
            Value::Double(_) => Self::NUMBER,
            Value::String(_) => Self::STRING,
            Value::HeapObject(_) => Self::OBJECT,
            _ => Self::TAGGED,
        }
    }

    /// Short upper-case name used in logs.
    pub fn name(self) -> &'static str {
        match self.0 {
            0x00 => "NONE",
            0x01 => "HOLE",
            0x02 => "INT",
            0x06 => "NUMBER",
            0x08 => "STRING",
            0x10 => "OBJECT",
            0x1E => "TAGGED",
            0x03 => "HOLE_INT",
            0x07 => "HOLE_NUMBER",
            0x09 => "HOLE_STRING",
            0x11 => "HOLE_OBJECT",
            0x1F => "GENERIC",
            _ => "MIXED",
        }
    }
}

impl Default for ElementsKind {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for ElementsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementsKind({})", self.name())
    }
}

impl fmt::Display for ElementsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
