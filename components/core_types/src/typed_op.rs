//! Operators of the typed operation vocabulary.

/// Binary operators a typed binary operation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedBinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<<`
    Shl,
    /// `>>>`
    Shr,
    /// `>>`
    Ashr,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
}

impl TypedBinOp {
    /// Comparison operators produce booleans.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TypedBinOp::Less
                | TypedBinOp::LessEq
                | TypedBinOp::Greater
                | TypedBinOp::GreaterEq
                | TypedBinOp::Eq
                | TypedBinOp::NotEq
                | TypedBinOp::StrictEq
                | TypedBinOp::StrictNotEq
        )
    }

    /// Equality family (loose and strict).
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            TypedBinOp::Eq | TypedBinOp::NotEq | TypedBinOp::StrictEq | TypedBinOp::StrictNotEq
        )
    }
}

/// Unary operators a typed unary operation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedUnOp {
    /// `-x`
    Neg,
    /// `~x`
    Not,
    /// `x + 1`
    Inc,
    /// `x - 1`
    Dec,
    /// `ToBoolean(x)`
    IsTrue,
    /// `!ToBoolean(x)`
    IsFalse,
}

/// Conditional jump flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedJumpOp {
    /// Jump when the condition is false / zero
    Jeqz,
    /// Jump when the condition is true / non-zero
    Jnez,
}
