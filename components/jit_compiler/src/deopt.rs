//! Deoptimization reasons
//!
//! Every guard the lowering pass inserts carries exactly one [`DeoptType`].
//! When the guard fails at run time, execution leaves the optimized code and
//! resumes in the interpreter at the guard's frame state; the reason tells
//! the deoptimizer which speculation was wrong. Guards within one
//! specialization use distinct reasons so a failure can be traced back to
//! the invariant that broke.

macro_rules! deopt_types {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)*) => {
        /// Reason a guard deoptimizes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum DeoptType {
            $($(#[$doc])* $variant,)*
        }

        impl DeoptType {
            /// Every reason in declaration order.
            pub const ALL: &'static [DeoptType] = &[$(DeoptType::$variant,)*];

            /// Name reported by deoptimization traces.
            pub fn name(self) -> &'static str {
                match self {
                    $(DeoptType::$variant => $name,)*
                }
            }
        }
    };
}

deopt_types! {
    /// Operand is not an int32
    NotInt1 => "NOTINT1",
    /// Operand is not an int32
    NotInt2 => "NOTINT2",
    /// Operand is not an int32
    NotInt3 => "NOTINT3",
    /// Operand is not a double
    NotDouble1 => "NOTDOUBLE1",
    /// Operand is not a double
    NotDouble2 => "NOTDOUBLE2",
    /// Operand is not a double
    NotDouble3 => "NOTDOUBLE3",
    /// Operand is not a number
    NotNumber1 => "NOTNUMBER1",
    /// Operand is not a number
    NotNumber2 => "NOTNUMBER2",
    /// Operand is not a number
    NotNumber3 => "NOTNUMBER3",
    /// Operand is not a boolean
    NotBool1 => "NOTBOOL1",
    /// Operand is not a boolean
    NotBool2 => "NOTBOOL2",
    /// Operand is not a boolean
    NotBool3 => "NOTBOOL3",
    /// Operand is not a string
    NotString1 => "NOTSTRING1",
    /// Operand is not a string
    NotString2 => "NOTSTRING2",
    /// Operand is not a string
    NotString3 => "NOTSTRING3",
    /// Operand is not an interned string
    NotInternString1 => "NOTINTERNSTRING1",
    /// Operand is not an interned string
    NotInternString2 => "NOTINTERNSTRING2",
    /// Value is not a heap object
    NotHeapObject1 => "NOTHEAPOBJECT1",
    /// Value is not a heap object
    NotHeapObject2 => "NOTHEAPOBJECT2",
    /// Value is not a heap object
    NotHeapObject3 => "NOTHEAPOBJECT3",
    /// Last polymorphic load candidate does not match
    InconsistentHClass1 => "INCONSISTENTHCLASS1",
    /// Prototype walk of a load reached the end of the chain
    InconsistentHClass2 => "INCONSISTENTHCLASS2",
    /// Last polymorphic store candidate does not match
    InconsistentHClass3 => "INCONSISTENTHCLASS3",
    /// Prototype walk of a store reached the end of the chain
    InconsistentHClass4 => "INCONSISTENTHCLASS4",
    /// Monomorphic receiver shape mismatch
    InconsistentHClass5 => "INCONSISTENTHCLASS5",
    /// `instanceof` target shape mismatch
    InconsistentHClass6 => "INCONSISTENTHCLASS6",
    /// Private field receiver shape mismatch
    InconsistentHClass7 => "INCONSISTENTHCLASS7",
    /// Monomorphic prototype load reached the end of the chain
    InconsistentHClass8 => "INCONSISTENTHCLASS8",
    /// Monomorphic prototype setter walk reached the end of the chain
    InconsistentHClass9 => "INCONSISTENTHCLASS9",
    /// Global constant shape mismatch
    InconsistentHClass11 => "INCONSISTENTHCLASS11",
    /// Global environment object shape mismatch
    InconsistentHClass12 => "INCONSISTENTHCLASS12",
    /// Prototype chain of a load changed
    PrototypeChanged1 => "PROTOTYPECHANGED1",
    /// Prototype chain of a store changed
    PrototypeChanged2 => "PROTOTYPECHANGED2",
    /// Transition store on an object that became a prototype
    PrototypeChanged3 => "PROTOTYPECHANGED3",
    /// Prototype of an `instanceof` target changed
    PrototypeChanged4 => "PROTOTYPECHANGED4",
    /// Array elements are not stable
    NotStableArray1 => "NOTSTABLEARRAY1",
    /// Array receiver of a builtin method is not stable
    NotStableArray2 => "NOTSTABLEARRAY2",
    /// Array elements kind differs from the profile
    InconsistentElementsKind1 => "INCONSISTENTELEMENTSKIND1",
    /// Index out of bounds
    NotLegalIdx1 => "NOTLEGALIDX1",
    /// Store into copy-on-write elements
    CowArray1 => "COWARRAY1",
    /// Receiver is not the profiled typed array
    NotTypedArray1 => "NOTTYPEDARRAY1",
    /// Receiver is not a map
    NotJsMap1 => "NOTJSMAP1",
    /// `Math` object shape changed
    BuiltinHClassMismatch1 => "BUILTINHCLASSMISMATCH1",
    /// Builtin prototype shape changed
    BuiltinPrototypeHClassMismatch1 => "BUILTINPROTOHCLASSMISMATCH1",
    /// Callee is not the profiled builtin
    NotCallTarget1 => "NOTCALLTARGET1",
    /// Callee of a plain call changed
    NotJsCallTgt1 => "NOTJSCALLTGT1",
    /// Callee of a `this` call changed
    NotJsCallTgt2 => "NOTJSCALLTGT2",
    /// Callee of a no-GC `this` call changed
    NotJsCallTgt3 => "NOTJSCALLTGT3",
    /// Fast-call callee of a plain call changed
    NotJsFastCallTgt1 => "NOTJSFASTCALLTGT1",
    /// Fast-call callee of a `this` call changed
    NotJsFastCallTgt2 => "NOTJSFASTCALLTGT2",
    /// Fast-call callee of a no-GC `this` call changed
    NotJsFastCallTgt3 => "NOTJSFASTCALLTGT3",
    /// Constructor of `new` changed
    NotJsNewCallTgt1 => "NOTJSNEWCALLTGT1",
    /// Callee is not the heap constant compiled against
    NotCallTargetHeapObject => "NOTCALLTARGETHEAPOBJECT",
    /// Callee defined in this method has no compiled code
    CallTargetNotCompiled => "CALLTARGETNOTCOMPILED",
    /// Constructor instance shape differs from the allocated one
    NotNewObj2 => "NOTNEWOBJ2",
    /// `Object` constructor changed
    NewBuiltinCtorObject => "NEWBUILTINCTOROBJECT",
    /// `Boolean` constructor changed
    NewBuiltinCtorBoolean => "NEWBUILTINCTORBOOLEAN",
    /// `Float32Array` constructor changed
    NewBuiltinCtorFloat32Array => "NEWBUILTINCTORFLOAT32ARRAY",
    /// Other builtin constructor changed
    NewBuiltinCtorFail1 => "NEWBUILTINCTORFAIL1",
    /// Private accessor is not a function
    NotJsFunction => "NOTJSFUNCTION",
    /// Private key is not a symbol
    NotSymbol => "NOTSYMBOL",
    /// Global property box was invalidated
    PropertyBoxInvalid => "PROPERTYBOXINVALID",
    /// `typeof` operand type differs from the profile
    InconsistentType1 => "INCONSISTENTTYPE1",
}

impl DeoptType {
    /// Reason for a failed primitive type check on operand `index` (0-based).
    ///
    /// Operands past the third share the third reason.
    pub fn for_primitive(param: core_types::ParamType, index: usize) -> Option<DeoptType> {
        use core_types::ParamType;
        let family: [DeoptType; 3] = match param {
            ParamType::Int | ParamType::IntOverflow => {
                [DeoptType::NotInt1, DeoptType::NotInt2, DeoptType::NotInt3]
            }
            ParamType::Double => [DeoptType::NotDouble1, DeoptType::NotDouble2, DeoptType::NotDouble3],
            ParamType::Number => [DeoptType::NotNumber1, DeoptType::NotNumber2, DeoptType::NotNumber3],
            ParamType::Boolean => [DeoptType::NotBool1, DeoptType::NotBool2, DeoptType::NotBool3],
            ParamType::String | ParamType::InternString => {
                [DeoptType::NotString1, DeoptType::NotString2, DeoptType::NotString3]
            }
            _ => return None,
        };
        Some(family[index.min(2)])
    }
}

impl std::fmt::Display for DeoptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
