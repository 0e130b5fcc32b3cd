//! Gate graph of one compiled method
//!
//! A [`Circuit`] is an arena of gates addressed by generation-checked
//! [`GateRef`] handles. Every gate has control (`state`), effect (`depend`)
//! and value inputs plus an optional frame state. Uses are not stored; they
//! are recovered by scanning the arena, which keeps edge rewrites a plain
//! index update.
//!
//! Bytecode gates enter the graph as [`GateOp::JsBytecode`]. The lowering
//! pass replaces some of them with typed sub-graphs through the `replace_*`
//! operations below.

use bytecode_system::EcmaOpcode;
use core_types::{
    BuiltinTypeId, BuiltinsStubId, ElementsKind, JSType, ParamType, TypedBinOp, TypedJumpOp,
    TypedUnOp, Value,
};
use object_model::{HClassId, ObjectId, PropertyLookupResult};

use crate::deopt::DeoptType;
use crate::error::{LoweringError, LoweringResult};

/// Generation-checked handle of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateRef {
    index: u32,
    generation: u32,
}

impl GateRef {
    /// Arena slot of the gate.
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Implicit function arguments available as gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// The running function
    Func,
    /// `new.target`
    NewTarget,
    /// `this`
    This,
    /// The lexical environment
    LexEnv,
    /// Declared parameter `n`
    Param(u32),
}

/// Constant payloads
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Tagged value
    Js(Value),
    /// Hidden class reference
    HClass(HClassId),
}

/// Branch probability hints of a conditional jump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchWeight {
    /// Weight of the taken edge
    pub true_weight: u32,
    /// Weight of the fall-through edge
    pub false_weight: u32,
}

impl Default for BranchWeight {
    fn default() -> Self {
        Self { true_weight: 1, false_weight: 1 }
    }
}

/// Bytecode payload of a [`GateOp::JsBytecode`] gate
#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeInfo {
    /// Opcode
    pub opcode: EcmaOpcode,
    /// Offset in the method; profile records are keyed by it
    pub pc_offset: u32,
    /// Property or string operand
    pub key: Option<String>,
    /// Immediate operands
    pub imms: Vec<u32>,
    /// Branch weight of conditional jumps
    pub weight: BranchWeight,
}

impl BytecodeInfo {
    /// Payload without operands.
    pub fn new(opcode: EcmaOpcode, pc_offset: u32) -> Self {
        Self { opcode, pc_offset, key: None, imms: Vec::new(), weight: BranchWeight::default() }
    }

    /// Sets the property or string operand.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the immediate operands.
    pub fn with_imms(mut self, imms: Vec<u32>) -> Self {
        self.imms = imms;
        self
    }

    /// Sets the branch weight.
    pub fn with_weight(mut self, weight: BranchWeight) -> Self {
        self.weight = weight;
        self
    }
}

/// Element access flavours of typed element loads and stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementAccessKind {
    /// Character of a string
    StringChar,
    /// Array of int32 elements
    ArrayInt,
    /// Array of number elements
    ArrayDouble,
    /// Array of object elements
    ArrayObject,
    /// Array of tagged elements
    ArrayTagged,
    /// Array of tagged elements with holes; holes read as `undefined`
    ArrayHoleTagged,
    /// Typed array of the given layout
    TypedArray(JSType),
}

impl ElementAccessKind {
    /// Access flavour for an array of `kind`.
    pub fn for_array(kind: ElementsKind) -> Self {
        if kind.has_hole() {
            ElementAccessKind::ArrayHoleTagged
        } else if kind.is_int() {
            ElementAccessKind::ArrayInt
        } else if kind.is_number() {
            ElementAccessKind::ArrayDouble
        } else if kind.is_object() {
            ElementAccessKind::ArrayObject
        } else {
            ElementAccessKind::ArrayTagged
        }
    }
}

/// Which identity a JS call target check compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallTargetKey {
    /// Method id of the callee (`this` calls)
    Method(bytecode_system::MethodId),
    /// Method index of the callee within its file
    MethodIndex(u32),
}

/// Runtime functions typed code may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeId {
    /// Refresh the layout of a prototype that gets a new property
    UpdateAOTHClass,
    /// Store past the out-of-line properties capacity
    PropertiesSetValue,
    /// Bytecode trace hook
    DebugAOTPrint,
    /// Optimized-code profiling hook
    ProfileOptimizedCode,
}

/// Guard flavours
#[derive(Debug, Clone, PartialEq)]
pub enum CheckKind {
    /// Value input is `true`
    Condition,
    /// Value satisfies a primitive speculation
    PrimitiveType(ParamType),
    /// Value is a heap object
    HeapObject,
    /// Value is a string
    EcmaString,
    /// Value is an interned string
    InternString,
    /// Object has exactly this hidden class
    ObjectType {
        /// Expected hidden class
        hclass: HClassId,
    },
    /// Prototype chain of the object is unchanged
    ProtoChangeMarker,
    /// Array with stable elements
    StableArray,
    /// Array with the given elements kind
    ElementsKind(ElementsKind),
    /// Array elements are not copy-on-write
    CowArray,
    /// Typed array of the given layout
    TypedArray(JSType),
    /// Map
    EcmaMap,
    /// `0 <= index < length`; yields the index
    Index,
    /// `Math` still has this hidden class
    MathHClassConsistency {
        /// Expected hidden class
        hclass: HClassId,
    },
    /// Builtin prototype of the receiver still has this hidden class
    BuiltinPrototypeHClass {
        /// Builtin family
        builtin: BuiltinTypeId,
        /// Expected prototype hidden class
        hclass: HClassId,
    },
    /// Callee is the given builtin
    CallTarget {
        /// Expected builtin
        builtin: BuiltinsStubId,
    },
    /// Callee is the profiled JS function
    JsCallTarget {
        /// Identity compared
        key: CallTargetKey,
        /// Fast-call convention
        fast: bool,
        /// Callee never collects
        no_gc: bool,
    },
    /// Callee has compiled code
    CallTargetIsCompiled,
    /// Callee is the given heap constant
    HeapConstant(ObjectId),
    /// Constructor is the given builtin
    BuiltinConstructor(BuiltinsStubId),
    /// Operand matches the `typeof` speculation
    TypeOf(ParamType),
}

/// Gate operations
#[derive(Debug, Clone, PartialEq)]
pub enum GateOp {
    /// Control entry
    StateEntry,
    /// Effect entry
    DependEntry,
    /// Placeholder for removed edges
    Dead,
    /// Implicit function argument
    Arg(ArgKind),
    /// Constant
    Constant(ConstValue),
    /// Interpreter resume point
    FrameState {
        /// Bytecode offset execution resumes at
        pc_offset: u32,
    },
    /// Effect marker carrying a frame state
    StateSplit,
    /// Generic bytecode
    JsBytecode(BytecodeInfo),

    /// Two-way branch on a boolean value
    IfBranch {
        /// Edge weights
        weight: BranchWeight,
    },
    /// Taken edge
    IfTrue,
    /// Fall-through edge
    IfFalse,
    /// Normal completion of a throwing gate
    IfSuccess,
    /// Exceptional completion of a throwing gate
    IfException,
    /// Control merge
    Merge,
    /// Loop header; the second state input is the back edge
    LoopBegin,
    /// Loop back edge
    LoopBack,
    /// Effect entry of a branch edge
    DependRelay,
    /// Effect phi
    DependSelector,
    /// Value phi
    ValueSelector,
    /// Return the value input
    Return,

    /// Guard that deoptimizes on failure
    Check {
        /// Guarded property
        kind: CheckKind,
        /// Reason reported on failure
        deopt: DeoptType,
    },

    /// `a == b` on raw values
    Equal,
    /// Boolean negation
    BoolNot,
    /// Value is not `null`
    TaggedIsNotNull,
    /// Value is a symbol
    TaggedIsSymbol,
    /// Value is a number
    TaggedIsNumber,
    /// Value is not a hole
    TaggedIsNotHole,
    /// Value is a function
    IsJSFunction,
    /// Hidden class describes a prototype
    IsPrototypeHClass,
    /// int32 `<`
    Int32LessThan,
    /// Hidden class of an object
    LoadHClass,
    /// Prototype recorded in a hidden class, `null` when absent
    LoadPrototype,
    /// Prototype-or-instance-hclass field of a constructor
    LoadProtoOrHClass,
    /// Capacity of the out-of-line properties array
    PropertiesCapacity,
    /// Value of a global property box
    LoadPropertyBoxValue,
    /// Pending exception flag
    HasPendingException,

    /// Typed binary operation
    TypedBinaryOp {
        /// Operator
        op: TypedBinOp,
        /// Speculated operand type
        param: ParamType,
    },
    /// Typed unary operation
    TypedUnaryOp {
        /// Operator
        op: TypedUnOp,
        /// Speculated operand type
        param: ParamType,
    },
    /// Typed conditional jump
    TypedConditionJump {
        /// Jump flavour
        op: TypedJumpOp,
        /// Speculated condition type
        param: ParamType,
        /// Edge weights
        weight: BranchWeight,
    },
    /// `ToNumber` of a primitive
    PrimitiveToNumber,
    /// `typeof` with a known result
    TypedTypeOf(ParamType),
    /// Number to string conversion
    NumberToString,

    /// Own slot load
    LoadProperty {
        /// Slot
        plr: PropertyLookupResult,
    },
    /// Own slot store
    StoreProperty {
        /// Slot
        plr: PropertyLookupResult,
    },
    /// Getter call; inputs `[receiver, holder]`
    CallGetter {
        /// Accessor slot
        plr: PropertyLookupResult,
    },
    /// Setter call; inputs `[receiver, holder, value]`
    CallSetter {
        /// Accessor slot
        plr: PropertyLookupResult,
    },
    /// Slot load from the prototype holding `holder`'s layout
    MonoLoadPropertyOnProto {
        /// Slot
        plr: PropertyLookupResult,
        /// Holder hidden class
        holder: HClassId,
        /// Reason when the chain ends first
        deopt: DeoptType,
    },
    /// Getter call on the prototype holding `holder`'s layout
    MonoCallGetterOnProto {
        /// Accessor slot
        plr: PropertyLookupResult,
        /// Holder hidden class
        holder: HClassId,
        /// Reason when the chain ends first
        deopt: DeoptType,
    },
    /// Setter call on the prototype holding `holder`'s layout
    MonoStorePropertyLookUpProto {
        /// Accessor slot
        plr: PropertyLookupResult,
        /// Holder hidden class
        holder: HClassId,
        /// Reason when the chain ends first
        deopt: DeoptType,
    },
    /// Store adding a property through a transition
    MonoStoreProperty {
        /// Slot in the new layout
        plr: PropertyLookupResult,
        /// Hidden class after the transition
        new_hclass: HClassId,
        /// Receiver is a prototype
        is_prototype: bool,
    },
    /// Installs a new hidden class; inputs `[receiver, hclass]`
    TransitionHClass,
    /// Runtime call
    CallRuntime(RuntimeId),

    /// Private key from the lexical environment
    GetKeyFromLexicalEnv {
        /// Environment depth
        level: u32,
        /// Slot in the environment
        slot: u32,
    },
    /// Private getter call; inputs `[receiver, accessor]`
    CallPrivateGetter,
    /// Private setter call; inputs `[receiver, accessor, value]`
    CallPrivateSetter,

    /// `instanceof` on a validated target; inputs `[object, target]`
    OrdinaryHasInstance,
    /// Global builtin object
    LoadBuiltinObject {
        /// Index in [`BuiltinTypeId::GLOBAL_BUILTINS`]
        index: usize,
    },
    /// Array length
    LoadArrayLength,
    /// Typed array length
    LoadTypedArrayLength,
    /// String length
    LoadStringLength,
    /// Map size
    LoadMapSize,
    /// Element load; inputs `[receiver, index]`
    LoadElement(ElementAccessKind),
    /// Element store; inputs `[receiver, index, value]`
    StoreElement(ElementAccessKind),

    /// Call of a profiled JS function; inputs `[func, this, args...]`
    TypedCall {
        /// Fast-call convention
        fast: bool,
        /// Callee never collects
        no_gc: bool,
    },
    /// Direct builtin call; inputs `[receiver?, args...]`
    CallBuiltin {
        /// Builtin
        id: BuiltinsStubId,
        /// Builtin may have side effects
        side_effect: bool,
    },
    /// Call timer hook around typed calls
    CallTimer {
        /// Start or end of the call
        start: bool,
    },

    /// `new Number(x)`; inputs `[ctor, value]`
    NewNumber,
    /// Inline builtin construction; inputs `[ctor, args...]`
    BuiltinConstructor(BuiltinsStubId),
    /// Builtin construction through the runtime; inputs `[ctor, args...]`
    CallNewBuiltin(BuiltinsStubId),
    /// Allocation of `this` for a constructor; inputs `[ctor]`
    TypedNewAllocateThis {
        /// Instance hidden class
        hclass: HClassId,
    },
    /// Constructor call; inputs `[ctor, new_target, this, args...]`
    CallNew {
        /// Argument count differs from the declared one
        need_push_argv: bool,
    },
    /// Super constructor of a derived constructor; inputs `[func]`
    GetSuperConstructor,
    /// Allocation of `this` for a super call; inputs `[super_ctor, new_target]`
    TypedSuperAllocateThis,
    /// Super constructor call; inputs `[super_ctor, new_target, this, args...]`
    Construct,
    /// `{}`
    CreateEmptyObject {
        /// Initial hidden class
        hclass: HClassId,
    },
    /// Object literal with baked slot values; inputs are the in-object slots
    TypedCreateObjWithBuffer {
        /// Literal hidden class
        hclass: HClassId,
    },
}

impl GateOp {
    /// Opcode of a bytecode gate.
    pub fn bytecode(&self) -> Option<&BytecodeInfo> {
        match self {
            GateOp::JsBytecode(info) => Some(info),
            _ => None,
        }
    }

    /// Ops that move control along a branch or merge.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            GateOp::StateEntry
                | GateOp::IfBranch { .. }
                | GateOp::IfTrue
                | GateOp::IfFalse
                | GateOp::IfSuccess
                | GateOp::IfException
                | GateOp::Merge
                | GateOp::LoopBegin
                | GateOp::LoopBack
        )
    }

    /// Ops that join or relay effects rather than perform one.
    pub fn is_selector(&self) -> bool {
        matches!(self, GateOp::DependRelay | GateOp::DependSelector | GateOp::ValueSelector)
    }
}

/// Gate: operation plus input edges
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    /// Operation
    pub op: GateOp,
    /// Control inputs
    pub state_in: Vec<GateRef>,
    /// Effect inputs
    pub depend_in: Vec<GateRef>,
    /// Value inputs
    pub value_in: Vec<GateRef>,
    /// Resume point for guards and throwing operations
    pub frame_state: Option<GateRef>,
}

/// Input list an edge belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Control edge
    State,
    /// Effect edge
    Depend,
    /// Value edge
    Value,
    /// Frame state edge
    FrameState,
}

/// One use of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Use {
    /// Gate holding the edge
    pub user: GateRef,
    /// Edge list
    pub kind: EdgeKind,
    /// Position in the list
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    generation: u32,
    gate: Option<Gate>,
}

/// Gate arena of one method
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    slots: Vec<Slot>,
    state_entry: GateRef,
    depend_entry: GateRef,
    dead: GateRef,
}

impl Circuit {
    /// Circuit holding only the entry and dead gates.
    pub fn new() -> Self {
        let mut circuit = Self {
            slots: Vec::new(),
            state_entry: GateRef { index: 0, generation: 0 },
            depend_entry: GateRef { index: 0, generation: 0 },
            dead: GateRef { index: 0, generation: 0 },
        };
        circuit.state_entry = circuit.new_gate(GateOp::StateEntry, vec![], vec![], vec![]);
        circuit.depend_entry = circuit.new_gate(GateOp::DependEntry, vec![], vec![], vec![]);
        circuit.dead = circuit.new_gate(GateOp::Dead, vec![], vec![], vec![]);
        circuit
    }

    /// Control entry gate.
    pub fn state_entry(&self) -> GateRef {
        self.state_entry
    }

    /// Effect entry gate.
    pub fn depend_entry(&self) -> GateRef {
        self.depend_entry
    }

    /// Dead gate.
    pub fn dead(&self) -> GateRef {
        self.dead
    }

    /// Adds a gate.
    pub fn new_gate(
        &mut self,
        op: GateOp,
        state_in: Vec<GateRef>,
        depend_in: Vec<GateRef>,
        value_in: Vec<GateRef>,
    ) -> GateRef {
        let gate = Gate { op, state_in, depend_in, value_in, frame_state: None };
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, gate: Some(gate) });
        GateRef { index, generation: 0 }
    }

    /// Adds a constant gate.
    pub fn constant(&mut self, value: Value) -> GateRef {
        self.new_gate(GateOp::Constant(ConstValue::Js(value)), vec![], vec![], vec![])
    }

    /// Adds a hidden class constant gate.
    pub fn hclass_constant(&mut self, hclass: HClassId) -> GateRef {
        self.new_gate(GateOp::Constant(ConstValue::HClass(hclass)), vec![], vec![], vec![])
    }

    /// Argument gate of `kind`, created on first request.
    pub fn arg(&mut self, kind: ArgKind) -> GateRef {
        match self.find_arg(kind) {
            Some(g) => g,
            None => self.new_gate(GateOp::Arg(kind), vec![], vec![], vec![]),
        }
    }

    /// Argument gate of `kind`, if one exists.
    pub fn find_arg(&self, kind: ArgKind) -> Option<GateRef> {
        self.all_gates()
            .into_iter()
            .find(|g| self.get(*g).is_some_and(|gate| gate.op == GateOp::Arg(kind)))
    }

    /// Gate behind a live handle.
    pub fn get(&self, gate: GateRef) -> Option<&Gate> {
        let slot = self.slots.get(gate.index as usize)?;
        if slot.generation != gate.generation {
            return None;
        }
        slot.gate.as_ref()
    }

    /// Gate behind a live handle, or [`LoweringError::InvalidGate`].
    pub fn gate(&self, gate: GateRef) -> LoweringResult<&Gate> {
        self.get(gate).ok_or(LoweringError::InvalidGate(gate))
    }

    /// Mutable gate behind a live handle.
    pub fn gate_mut(&mut self, gate: GateRef) -> LoweringResult<&mut Gate> {
        let slot = self
            .slots
            .get_mut(gate.index as usize)
            .filter(|s| s.generation == gate.generation)
            .ok_or(LoweringError::InvalidGate(gate))?;
        slot.gate.as_mut().ok_or(LoweringError::InvalidGate(gate))
    }

    /// Whether the handle refers to a live gate.
    pub fn is_live(&self, gate: GateRef) -> bool {
        self.get(gate).is_some()
    }

    /// Operation of a gate.
    pub fn op(&self, gate: GateRef) -> LoweringResult<&GateOp> {
        self.gate(gate).map(|g| &g.op)
    }

    /// Every live gate in creation order.
    pub fn all_gates(&self) -> Vec<GateRef> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.gate.is_some())
            .map(|(i, s)| GateRef { index: i as u32, generation: s.generation })
            .collect()
    }

    /// Number of live gates.
    pub fn gate_count(&self) -> usize {
        self.slots.iter().filter(|s| s.gate.is_some()).count()
    }

    /// Every edge pointing at `gate`.
    pub fn uses(&self, gate: GateRef) -> Vec<Use> {
        let mut uses = Vec::new();
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(g) = &slot.gate else { continue };
            let user = GateRef { index: i as u32, generation: slot.generation };
            let lists = [
                (EdgeKind::State, &g.state_in),
                (EdgeKind::Depend, &g.depend_in),
                (EdgeKind::Value, &g.value_in),
            ];
            for (kind, list) in lists {
                for (index, input) in list.iter().enumerate() {
                    if *input == gate {
                        uses.push(Use { user, kind, index });
                    }
                }
            }
            if g.frame_state == Some(gate) {
                uses.push(Use { user, kind: EdgeKind::FrameState, index: 0 });
            }
        }
        uses
    }

    /// Points the edge `u` at `new_input`.
    pub fn replace_input(&mut self, u: Use, new_input: GateRef) -> LoweringResult<()> {
        let gate = self.gate_mut(u.user)?;
        let slot = match u.kind {
            EdgeKind::State => gate.state_in.get_mut(u.index),
            EdgeKind::Depend => gate.depend_in.get_mut(u.index),
            EdgeKind::Value => gate.value_in.get_mut(u.index),
            EdgeKind::FrameState => gate.frame_state.as_mut(),
        };
        if let Some(slot) = slot {
            *slot = new_input;
        }
        Ok(())
    }

    /// Sets the frame state of a gate.
    pub fn set_frame_state(&mut self, gate: GateRef, frame_state: GateRef) -> LoweringResult<()> {
        self.gate_mut(gate)?.frame_state = Some(frame_state);
        Ok(())
    }

    /// Sets effect input `index`.
    pub fn set_depend(&mut self, gate: GateRef, index: usize, depend: GateRef) -> LoweringResult<()> {
        let g = self.gate_mut(gate)?;
        match g.depend_in.get_mut(index) {
            Some(slot) => *slot = depend,
            None => g.depend_in.push(depend),
        }
        Ok(())
    }

    /// Removes a gate; outstanding handles become stale.
    pub fn delete_gate(&mut self, gate: GateRef) -> LoweringResult<()> {
        self.gate(gate)?;
        let slot = &mut self.slots[gate.index as usize];
        slot.gate = None;
        slot.generation = slot.generation.wrapping_add(1);
        Ok(())
    }

    /// Nearest frame state dominating `gate`: its own, or the first one
    /// found walking the effect chain upwards.
    pub fn find_nearest_frame_state(&self, gate: GateRef) -> Option<GateRef> {
        let mut current = gate;
        loop {
            let g = self.get(current)?;
            if let Some(fs) = g.frame_state {
                return Some(fs);
            }
            current = *g.depend_in.first()?;
        }
    }

    /// Value input `index` of a gate.
    pub fn value_in(&self, gate: GateRef, index: usize) -> LoweringResult<GateRef> {
        self.gate(gate)?
            .value_in
            .get(index)
            .copied()
            .ok_or(LoweringError::InvalidGate(gate))
    }

    /// Number of value inputs.
    pub fn num_value_in(&self, gate: GateRef) -> LoweringResult<usize> {
        Ok(self.gate(gate)?.value_in.len())
    }

    /// Rewires the users of a bytecode gate to the lowered region and
    /// deletes it.
    ///
    /// `IfSuccess` users are bypassed and deleted; `IfException` users lose
    /// their inputs to the dead gate since the region cannot throw there.
    pub fn replace_hir_and_delete_if_exception(
        &mut self,
        hir: GateRef,
        state: GateRef,
        depend: GateRef,
        value: Option<GateRef>,
    ) -> LoweringResult<()> {
        let dead = self.dead;
        for u in self.uses(hir) {
            // A projection reached through both edges is gone after the first.
            if !self.is_live(u.user) {
                continue;
            }
            match u.kind {
                EdgeKind::State => match self.op(u.user)? {
                    GateOp::IfSuccess => self.bypass_projection(u.user, state, depend)?,
                    GateOp::IfException => {
                        let exception = self.gate_mut(u.user)?;
                        exception.state_in.iter_mut().for_each(|s| *s = dead);
                        exception.depend_in.iter_mut().for_each(|d| *d = dead);
                    }
                    _ => self.replace_input(u, state)?,
                },
                EdgeKind::Depend => {
                    let target = if matches!(self.op(u.user)?, GateOp::IfException) { dead } else { depend };
                    self.replace_input(u, target)?
                }
                EdgeKind::Value => self.replace_input(u, value.unwrap_or(dead))?,
                EdgeKind::FrameState => {}
            }
        }
        self.delete_gate(hir)
    }

    /// Moves the state and depend users of a control projection onto
    /// `state` and `depend`, then deletes it.
    fn bypass_projection(&mut self, projection: GateRef, state: GateRef, depend: GateRef) -> LoweringResult<()> {
        for inner in self.uses(projection) {
            match inner.kind {
                EdgeKind::State => self.replace_input(inner, state)?,
                EdgeKind::Depend => self.replace_input(inner, depend)?,
                EdgeKind::Value | EdgeKind::FrameState => {}
            }
        }
        self.delete_gate(projection)
    }

    /// Rewires a bytecode gate whose lowering branches on a pending
    /// exception: normal users go to `success`, the users of its
    /// `IfException` go to `exception`.
    pub fn replace_hir_with_if_branch(
        &mut self,
        hir: GateRef,
        success: (GateRef, GateRef),
        exception: (GateRef, GateRef),
        value: Option<GateRef>,
    ) -> LoweringResult<()> {
        let dead = self.dead;
        for u in self.uses(hir) {
            // A projection reached through both edges is gone after the first.
            if !self.is_live(u.user) {
                continue;
            }
            match u.kind {
                EdgeKind::State => match self.op(u.user)? {
                    GateOp::IfSuccess => self.bypass_projection(u.user, success.0, success.1)?,
                    GateOp::IfException => self.bypass_projection(u.user, exception.0, exception.1)?,
                    _ => self.replace_input(u, success.0)?,
                },
                EdgeKind::Depend => match self.op(u.user)? {
                    // Rewired with its state edge.
                    GateOp::IfSuccess | GateOp::IfException => {}
                    _ => self.replace_input(u, success.1)?,
                },
                EdgeKind::Value => self.replace_input(u, value.unwrap_or(dead))?,
                EdgeKind::FrameState => {}
            }
        }
        if self.is_live(hir) {
            self.delete_gate(hir)?;
        }
        Ok(())
    }

    /// Replaces every use of `gate` by `state`, `depend` or `value` by edge
    /// kind and deletes it.
    pub fn replace_gate(
        &mut self,
        gate: GateRef,
        state: GateRef,
        depend: GateRef,
        value: Option<GateRef>,
    ) -> LoweringResult<()> {
        let dead = self.dead;
        for u in self.uses(gate) {
            match u.kind {
                EdgeKind::State => self.replace_input(u, state)?,
                EdgeKind::Depend => self.replace_input(u, depend)?,
                EdgeKind::Value => self.replace_input(u, value.unwrap_or(dead))?,
                EdgeKind::FrameState => {}
            }
        }
        self.delete_gate(gate)
    }

    /// Statically known type of a value gate, `Any` when unknown.
    pub fn trusted_type(&self, gate: GateRef) -> ParamType {
        let Some(g) = self.get(gate) else {
            return ParamType::Any;
        };
        match &g.op {
            GateOp::Constant(ConstValue::Js(v)) => match v {
                Value::Smi(_) => ParamType::Int,
                Value::Double(_) => ParamType::Double,
                Value::Boolean(_) => ParamType::Boolean,
                Value::String(_) => ParamType::String,
                Value::Undefined => ParamType::Undefined,
                Value::Null => ParamType::Null,
                _ => ParamType::Any,
            },
            GateOp::JsBytecode(info) => match info.opcode {
                EcmaOpcode::LdaStr | EcmaOpcode::TypeOf => ParamType::String,
                EcmaOpcode::Ldai => ParamType::Int,
                EcmaOpcode::Fldai => ParamType::Double,
                EcmaOpcode::LdTrue
                | EcmaOpcode::LdFalse
                | EcmaOpcode::Eq
                | EcmaOpcode::NotEq
                | EcmaOpcode::StrictEq
                | EcmaOpcode::StrictNotEq
                | EcmaOpcode::Less
                | EcmaOpcode::LessEq
                | EcmaOpcode::Greater
                | EcmaOpcode::GreaterEq
                | EcmaOpcode::IsTrue
                | EcmaOpcode::IsFalse
                | EcmaOpcode::CallRuntimeIsTrue
                | EcmaOpcode::CallRuntimeIsFalse
                | EcmaOpcode::InstanceOf => ParamType::Boolean,
                EcmaOpcode::LdUndefined => ParamType::Undefined,
                EcmaOpcode::LdNull => ParamType::Null,
                _ => ParamType::Any,
            },
            GateOp::TypedBinaryOp { op, param } => {
                if op.is_comparison() || op.is_equality() {
                    ParamType::Boolean
                } else if param.is_string_type() {
                    ParamType::String
                } else if param.is_number_type() {
                    ParamType::Number
                } else {
                    ParamType::Any
                }
            }
            GateOp::TypedUnaryOp { op, .. } => match op {
                TypedUnOp::IsTrue | TypedUnOp::IsFalse => ParamType::Boolean,
                _ => ParamType::Number,
            },
            GateOp::PrimitiveToNumber => ParamType::Number,
            GateOp::NumberToString | GateOp::TypedTypeOf(_) => ParamType::String,
            GateOp::LoadArrayLength
            | GateOp::LoadTypedArrayLength
            | GateOp::LoadStringLength
            | GateOp::LoadMapSize => ParamType::Int,
            GateOp::Check { kind: CheckKind::PrimitiveType(p), .. } => *p,
            GateOp::Check { kind: CheckKind::EcmaString, .. } => ParamType::String,
            GateOp::Check { kind: CheckKind::InternString, .. } => ParamType::InternString,
            _ => ParamType::Any,
        }
    }

    /// Statically proven string.
    pub fn is_trusted_string(&self, gate: GateRef) -> bool {
        self.trusted_type(gate).is_string_type()
    }

    /// Statically proven number.
    pub fn is_trusted_number(&self, gate: GateRef) -> bool {
        self.trusted_type(gate).is_number_type()
    }

    /// Statically proven boolean.
    pub fn is_trusted_boolean(&self, gate: GateRef) -> bool {
        self.trusted_type(gate).is_boolean_type()
    }

    /// Statically proven `undefined` or `null`.
    pub fn is_undefined_or_null(&self, gate: GateRef) -> bool {
        matches!(self.trusted_type(gate), ParamType::Undefined | ParamType::Null)
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}
