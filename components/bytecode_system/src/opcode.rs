//! Ecma bytecode opcodes as seen by the optimizing compiler.
//!
//! Each bytecode of a method becomes one `JsBytecode` gate in the circuit.
//! The declaration order below is the canonical opcode ordering; debugging
//! ranges that disable speculation index into it.

macro_rules! ecma_opcodes {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)*) => {
        /// Bytecode opcodes of the dynamic-language VM
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EcmaOpcode {
            $($(#[$doc])* $variant,)*
        }

        impl EcmaOpcode {
            /// Every opcode in canonical order.
            pub const ALL: &'static [EcmaOpcode] = &[$(EcmaOpcode::$variant,)*];

            /// Assembly mnemonic of the opcode.
            pub fn name(self) -> &'static str {
                match self {
                    $(EcmaOpcode::$variant => $name,)*
                }
            }
        }
    };
}

ecma_opcodes! {
    /// Load undefined into the accumulator
    LdUndefined => "LDUNDEFINED",
    /// Load null into the accumulator
    LdNull => "LDNULL",
    /// Load true into the accumulator
    LdTrue => "LDTRUE",
    /// Load false into the accumulator
    LdFalse => "LDFALSE",
    /// Load a string from the constant pool
    LdaStr => "LDA_STR_ID16",
    /// Load an int32 immediate
    Ldai => "LDAI_IMM32",
    /// Load a double immediate
    Fldai => "FLDAI_IMM64",
    /// Load a lexical variable
    LdLexVar => "LDLEXVAR_IMM4_IMM4",
    /// Define a closure
    DefineFunc => "DEFINEFUNC_IMM8_ID16_IMM8",
    /// Create `[]`
    CreateEmptyArray => "CREATEEMPTYARRAY_IMM8",
    /// Create `{}`
    CreateEmptyObject => "CREATEEMPTYOBJECT",
    /// Create an object from a literal buffer
    CreateObjectWithBuffer => "CREATEOBJECTWITHBUFFER_IMM8_ID16",
    /// `lhs + acc`
    Add2 => "ADD2_IMM8_V8",
    /// `lhs - acc`
    Sub2 => "SUB2_IMM8_V8",
    /// `lhs * acc`
    Mul2 => "MUL2_IMM8_V8",
    /// `lhs / acc`
    Div2 => "DIV2_IMM8_V8",
    /// `lhs % acc`
    Mod2 => "MOD2_IMM8_V8",
    /// `lhs == acc`
    Eq => "EQ_IMM8_V8",
    /// `lhs != acc`
    NotEq => "NOTEQ_IMM8_V8",
    /// `lhs < acc`
    Less => "LESS_IMM8_V8",
    /// `lhs <= acc`
    LessEq => "LESSEQ_IMM8_V8",
    /// `lhs > acc`
    Greater => "GREATER_IMM8_V8",
    /// `lhs >= acc`
    GreaterEq => "GREATEREQ_IMM8_V8",
    /// `lhs << acc`
    Shl2 => "SHL2_IMM8_V8",
    /// `lhs >>> acc`
    Shr2 => "SHR2_IMM8_V8",
    /// `lhs >> acc`
    Ashr2 => "ASHR2_IMM8_V8",
    /// `lhs & acc`
    And2 => "AND2_IMM8_V8",
    /// `lhs | acc`
    Or2 => "OR2_IMM8_V8",
    /// `lhs ^ acc`
    Xor2 => "XOR2_IMM8_V8",
    /// `typeof acc`
    TypeOf => "TYPEOF_IMM8",
    /// `ToNumeric(acc)`
    ToNumeric => "TONUMERIC_IMM8",
    /// `-acc`
    Neg => "NEG_IMM8",
    /// `~acc`
    Not => "NOT_IMM8",
    /// `acc + 1`
    Inc => "INC_IMM8",
    /// `acc - 1`
    Dec => "DEC_IMM8",
    /// `lhs instanceof acc`
    InstanceOf => "INSTANCEOF_IMM8_V8",
    /// `lhs !== acc`
    StrictNotEq => "STRICTNOTEQ_IMM8_V8",
    /// `lhs === acc`
    StrictEq => "STRICTEQ_IMM8_V8",
    /// `ToBoolean(acc)`
    IsTrue => "ISTRUE",
    /// profiled `ToBoolean(acc)`
    CallRuntimeIsTrue => "CALLRUNTIME_ISTRUE_PREF_IMM8",
    /// `!ToBoolean(acc)`
    IsFalse => "ISFALSE",
    /// profiled `!ToBoolean(acc)`
    CallRuntimeIsFalse => "CALLRUNTIME_ISFALSE_PREF_IMM8",
    /// `acc()`
    CallArg0 => "CALLARG0_IMM8",
    /// `acc(a0)`
    CallArg1 => "CALLARG1_IMM8_V8",
    /// `acc(a0, a1)`
    CallArgs2 => "CALLARGS2_IMM8_V8_V8",
    /// `acc(a0, a1, a2)`
    CallArgs3 => "CALLARGS3_IMM8_V8_V8_V8",
    /// `acc(...range)`
    CallRange => "CALLRANGE_IMM8_IMM8_V8",
    /// `this.acc()`
    CallThis0 => "CALLTHIS0_IMM8_V8",
    /// `this.acc(a0)`
    CallThis1 => "CALLTHIS1_IMM8_V8_V8",
    /// `this.acc(a0, a1)`
    CallThis2 => "CALLTHIS2_IMM8_V8_V8_V8",
    /// `this.acc(a0, a1, a2)`
    CallThis3 => "CALLTHIS3_IMM8_V8_V8_V8_V8",
    /// `this.acc(...range)`
    CallThisRange => "CALLTHISRANGE_IMM8_IMM8_V8",
    /// Class field initializer call
    CallRuntimeCallInit => "CALLRUNTIME_CALLINIT_PREF_IMM8_V8",
    /// `super(...range)`
    SuperCallThisRange => "SUPERCALLTHISRANGE_IMM8_IMM8_V8",
    /// `super(...range)` with a 16-bit range
    WideSuperCallThisRange => "WIDE_SUPERCALLTHISRANGE_PREF_IMM16_V8",
    /// `new ctor(...range)`
    NewObjRange => "NEWOBJRANGE_IMM8_IMM8_V8",
    /// `new ctor(...range)` with a 16-bit range
    WideNewObjRange => "WIDE_NEWOBJRANGE_PREF_IMM16_V8",
    /// `obj.#x = acc`
    StPrivateProperty => "STPRIVATEPROPERTY_IMM8_IMM16_IMM16_V8",
    /// `obj.#x`
    LdPrivateProperty => "LDPRIVATEPROPERTY_IMM8_IMM16_IMM16",
    /// `acc.name`
    LdObjByName => "LDOBJBYNAME_IMM8_ID16",
    /// `this.name`
    LdThisByName => "LDTHISBYNAME_IMM8_ID16",
    /// `obj.name = acc`
    StObjByName => "STOBJBYNAME_IMM8_ID16_V8",
    /// `this.name = acc`
    StThisByName => "STTHISBYNAME_IMM8_ID16",
    /// Class field definition
    DefineFieldByName => "DEFINEFIELDBYNAME_IMM8_ID16_V8",
    /// Own data property definition
    DefinePropertyByName => "DEFINEPROPERTYBYNAME_IMM8_ID16_V8",
    /// `obj[key]`
    LdObjByValue => "LDOBJBYVALUE_IMM8_V8",
    /// `this[key]`
    LdThisByValue => "LDTHISBYVALUE_IMM8",
    /// `obj[key] = acc`
    StObjByValue => "STOBJBYVALUE_IMM8_V8_V8",
    /// Own element definition in a literal
    StOwnByValue => "STOWNBYVALUE_IMM8_V8_V8",
    /// `acc[imm]`
    LdObjByIndex => "LDOBJBYINDEX_IMM8_IMM16",
    /// `acc[imm32]`
    WideLdObjByIndex => "WIDE_LDOBJBYINDEX_PREF_IMM32",
    /// `obj[imm] = acc`
    StObjByIndex => "STOBJBYINDEX_IMM8_V8_IMM16",
    /// `obj[imm32] = acc`
    WideStObjByIndex => "WIDE_STOBJBYINDEX_PREF_V8_IMM32",
    /// Global lookup that throws on a miss
    TryLdGlobalByName => "TRYLDGLOBALBYNAME_IMM8_ID16",
    /// Own named property definition in a literal
    StOwnByName => "STOWNBYNAME_IMM8_ID16_V8",
    /// Jump if the accumulator is falsy
    Jeqz => "JEQZ_IMM8",
    /// Jump if the accumulator is truthy
    Jnez => "JNEZ_IMM8",
    /// `acc[Symbol.iterator]()`
    GetIterator => "GETITERATOR_IMM8",
    /// Unconditional jump
    Jmp => "JMP_IMM8",
    /// Return the accumulator
    Return => "RETURN",
    /// Throw the accumulator
    Throw => "THROW_PREF_NONE",
}

impl EcmaOpcode {
    /// Position in the canonical ordering.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytecode_system::EcmaOpcode;
    ///
    /// assert_eq!(EcmaOpcode::LdUndefined.index(), 0);
    /// assert_eq!(EcmaOpcode::ALL[EcmaOpcode::Add2.index()], EcmaOpcode::Add2);
    /// ```
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|op| *op == self).unwrap_or(Self::ALL.len())
    }

    /// Call opcodes whose receiver is an explicit `this` input.
    pub fn is_this_call(self) -> bool {
        matches!(
            self,
            EcmaOpcode::CallThis0
                | EcmaOpcode::CallThis1
                | EcmaOpcode::CallThis2
                | EcmaOpcode::CallThis3
                | EcmaOpcode::CallThisRange
                | EcmaOpcode::CallRuntimeCallInit
        )
    }

    /// Plain call opcodes (`undefined` receiver).
    pub fn is_plain_call(self) -> bool {
        matches!(
            self,
            EcmaOpcode::CallArg0
                | EcmaOpcode::CallArg1
                | EcmaOpcode::CallArgs2
                | EcmaOpcode::CallArgs3
                | EcmaOpcode::CallRange
        )
    }

    /// Every opcode that invokes a callee.
    pub fn is_call(self) -> bool {
        self.is_this_call()
            || self.is_plain_call()
            || matches!(
                self,
                EcmaOpcode::NewObjRange
                    | EcmaOpcode::WideNewObjRange
                    | EcmaOpcode::SuperCallThisRange
                    | EcmaOpcode::WideSuperCallThisRange
            )
    }

    /// Binary operators taking `(lhs, acc)`.
    pub fn is_binary_op(self) -> bool {
        matches!(
            self,
            EcmaOpcode::Add2
                | EcmaOpcode::Sub2
                | EcmaOpcode::Mul2
                | EcmaOpcode::Div2
                | EcmaOpcode::Mod2
                | EcmaOpcode::Eq
                | EcmaOpcode::NotEq
                | EcmaOpcode::Less
                | EcmaOpcode::LessEq
                | EcmaOpcode::Greater
                | EcmaOpcode::GreaterEq
                | EcmaOpcode::Shl2
                | EcmaOpcode::Shr2
                | EcmaOpcode::Ashr2
                | EcmaOpcode::And2
                | EcmaOpcode::Or2
                | EcmaOpcode::Xor2
                | EcmaOpcode::StrictEq
                | EcmaOpcode::StrictNotEq
        )
    }

    /// Opcodes that end a basic block.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            EcmaOpcode::Jeqz
                | EcmaOpcode::Jnez
                | EcmaOpcode::Jmp
                | EcmaOpcode::Return
                | EcmaOpcode::Throw
        )
    }
}

impl std::fmt::Display for EcmaOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
