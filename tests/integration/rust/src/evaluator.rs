//! Reference execution of lowered circuits
//!
//! Control is followed from the state entry. At every control node the
//! effect gates hanging off it run in effect-chain order, then the single
//! successor is taken: the matching projection of an `IfBranch`, or the
//! next merge, loop edge, `Return` or leftover bytecode. Entering a merge or
//! loop header from predecessor `k` first assigns every value selector its
//! `k`-th input, all at once.
//!
//! Pure gates are recomputed on every read, so loop-carried values always
//! reflect the current iteration. A failing guard ends the run with the
//! guard's deopt reason and the pc of its frame state.

use std::collections::HashMap;

use bytecode_system::EcmaOpcode;
use core_types::{value_ops, BuiltinTypeId, BuiltinsStubId, JSType, Value};
use jit_compiler::circuit::{ArgKind, CallTargetKey, CheckKind, ConstValue, EdgeKind, ElementAccessKind, Gate, GateOp};
use jit_compiler::{Circuit, DeoptType, GateRef};
use object_model::{HClassId, ObjectId, ObjectKind, ObjectModel, ProtoOrHClass};
use thiserror::Error;
use tracing::trace;

/// Control steps before a run is considered divergent.
pub const STEP_LIMIT: usize = 10_000;

/// Machine word produced by a gate
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    /// Tagged JS value
    Tagged(Value),
    /// Raw hidden class pointer
    HClass(HClassId),
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The method returned a value
    Returned(Value),
    /// A guard failed
    Deopt {
        /// Reason of the failing guard
        reason: DeoptType,
        /// Bytecode offset execution resumes at
        pc_offset: u32,
    },
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct Execution {
    /// How the run ended
    pub outcome: Outcome,
    /// Every effect gate that executed, in order
    pub executed: Vec<GateOp>,
}

impl Execution {
    /// Number of executed effects matching `pred`.
    pub fn count(&self, pred: impl Fn(&GateOp) -> bool) -> usize {
        self.executed.iter().filter(|op| pred(op)).count()
    }

    /// Returned value, if the run did not deoptimize.
    pub fn returned(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Returned(v) => Some(v),
            Outcome::Deopt { .. } => None,
        }
    }

    /// Deopt reason, if a guard failed.
    pub fn deopt(&self) -> Option<DeoptType> {
        match self.outcome {
            Outcome::Deopt { reason, .. } => Some(reason),
            Outcome::Returned(_) => None,
        }
    }
}

/// Errors of the reference execution
#[derive(Debug, Error)]
pub enum EvalError {
    /// The gate has no execution rule here
    #[error("no execution rule for {op:?} at gate {gate:?}")]
    Unsupported {
        /// Gate
        gate: GateRef,
        /// Its operation
        op: GateOp,
    },

    /// Control reached a bytecode the pass left generic
    #[error("generic bytecode {0:?} reached")]
    Generic(EcmaOpcode),

    /// A value was read before being produced
    #[error("gate {0:?} has no value")]
    MissingValue(GateRef),

    /// A control node has no successor to continue at
    #[error("control node {0:?} has no successor")]
    NoSuccessor(GateRef),

    /// A typed operation ran on operands outside its domain
    #[error("operands of gate {0:?} are outside its speculation")]
    Domain(GateRef),

    /// The run did not terminate
    #[error("step limit of {0} exceeded")]
    StepLimit(usize),
}

/// Executes `circuit` with `args` as its declared parameters.
pub fn evaluate(circuit: &Circuit, heap: &ObjectModel, args: &[Value]) -> Result<Execution, EvalError> {
    let mut machine = Machine { circuit, heap, args, values: HashMap::new(), executed: Vec::new() };
    let outcome = machine.run()?;
    Ok(Execution { outcome, executed: machine.executed })
}

struct Machine<'a> {
    circuit: &'a Circuit,
    heap: &'a ObjectModel,
    args: &'a [Value],
    values: HashMap<GateRef, Word>,
    executed: Vec<GateOp>,
}

fn is_successor(op: &GateOp) -> bool {
    matches!(
        op,
        GateOp::IfBranch { .. }
            | GateOp::IfSuccess
            | GateOp::Merge
            | GateOp::LoopBegin
            | GateOp::LoopBack
            | GateOp::Return
            | GateOp::JsBytecode(_)
    )
}

fn is_effect(op: &GateOp) -> bool {
    !op.is_control() && !op.is_selector() && !matches!(op, GateOp::Return | GateOp::JsBytecode(_))
}

impl Machine<'_> {
    fn gate(&self, gate: GateRef) -> Result<&Gate, EvalError> {
        self.circuit.get(gate).ok_or(EvalError::MissingValue(gate))
    }

    fn unsupported(&self, gate: GateRef) -> EvalError {
        match self.circuit.get(gate) {
            Some(g) => EvalError::Unsupported { gate, op: g.op.clone() },
            None => EvalError::MissingValue(gate),
        }
    }

    fn run(&mut self) -> Result<Outcome, EvalError> {
        let mut current = self.circuit.state_entry();
        let mut previous = None;
        let circuit = self.circuit;
        for _ in 0..STEP_LIMIT {
            let gate = circuit.get(current).ok_or(EvalError::MissingValue(current))?;
            match &gate.op {
                GateOp::Merge | GateOp::LoopBegin => {
                    let from = previous
                        .and_then(|p| gate.state_in.iter().position(|s| *s == p))
                        .ok_or(EvalError::NoSuccessor(current))?;
                    self.enter_merge(current, from)?;
                }
                GateOp::JsBytecode(info) => return Err(EvalError::Generic(info.opcode)),
                GateOp::Return => {
                    let value = *gate.value_in.first().ok_or(EvalError::MissingValue(current))?;
                    return Ok(Outcome::Returned(self.tagged(value)?));
                }
                _ => {}
            }
            if let Some(deopt) = self.run_effects(current)? {
                return Ok(deopt);
            }
            previous = Some(current);
            current = self.successor(current)?;
        }
        Err(EvalError::StepLimit(STEP_LIMIT))
    }

    fn enter_merge(&mut self, merge: GateRef, from: usize) -> Result<(), EvalError> {
        let selectors: Vec<GateRef> = self
            .circuit
            .uses(merge)
            .into_iter()
            .filter(|u| u.kind == EdgeKind::State)
            .map(|u| u.user)
            .filter(|g| matches!(self.circuit.get(*g).map(|g| &g.op), Some(GateOp::ValueSelector)))
            .collect();
        let mut incoming = Vec::with_capacity(selectors.len());
        for selector in &selectors {
            let input = *self.gate(*selector)?.value_in.get(from).ok_or(EvalError::MissingValue(*selector))?;
            incoming.push(self.word(input)?);
        }
        for (selector, word) in selectors.into_iter().zip(incoming) {
            self.values.insert(selector, word);
        }
        Ok(())
    }

    /// Effects attached to `control`, ordered along their effect edges.
    fn effects_of(&self, control: GateRef) -> Vec<GateRef> {
        let mut pending: Vec<GateRef> = self
            .circuit
            .uses(control)
            .into_iter()
            .filter(|u| u.kind == EdgeKind::State && u.index == 0)
            .map(|u| u.user)
            .filter(|g| self.circuit.get(*g).is_some_and(|g| is_effect(&g.op)))
            .collect();
        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|g| {
                self.circuit
                    .get(*g)
                    .is_some_and(|gate| gate.depend_in.iter().all(|d| !pending.contains(d)))
            });
            // A cycle cannot come out of the builder; fall back to creation order.
            let index = ready.unwrap_or(0);
            ordered.push(pending.remove(index));
        }
        ordered
    }

    fn run_effects(&mut self, control: GateRef) -> Result<Option<Outcome>, EvalError> {
        for effect in self.effects_of(control) {
            if let Some(outcome) = self.execute(effect)? {
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }

    fn successor(&self, control: GateRef) -> Result<GateRef, EvalError> {
        let gate = self.gate(control)?;
        let users: Vec<GateRef> = self
            .circuit
            .uses(control)
            .into_iter()
            .filter(|u| u.kind == EdgeKind::State)
            .map(|u| u.user)
            .collect();
        if let GateOp::IfBranch { .. } = gate.op {
            let condition = *gate.value_in.first().ok_or(EvalError::MissingValue(control))?;
            let taken = self.truthy(condition)?;
            return users
                .into_iter()
                .find(|u| match self.circuit.get(*u).map(|g| &g.op) {
                    Some(GateOp::IfTrue) => taken,
                    Some(GateOp::IfFalse) => !taken,
                    _ => false,
                })
                .ok_or(EvalError::NoSuccessor(control));
        }
        users
            .into_iter()
            .find(|u| self.circuit.get(*u).is_some_and(|g| is_successor(&g.op)))
            .ok_or(EvalError::NoSuccessor(control))
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn word(&self, gate: GateRef) -> Result<Word, EvalError> {
        if let Some(word) = self.values.get(&gate) {
            return Ok(word.clone());
        }
        let g = self.gate(gate)?;
        let value = |i: usize| -> Result<GateRef, EvalError> { g.value_in.get(i).copied().ok_or(EvalError::MissingValue(gate)) };
        let tagged = |v: Value| -> Result<Word, EvalError> { Ok(Word::Tagged(v)) };
        match &g.op {
            GateOp::Constant(ConstValue::Js(v)) => tagged(v.clone()),
            GateOp::Constant(ConstValue::HClass(h)) => Ok(Word::HClass(*h)),
            GateOp::Arg(ArgKind::Param(i)) => tagged(self.args.get(*i as usize).cloned().unwrap_or(Value::Undefined)),
            GateOp::Arg(_) => tagged(Value::Undefined),
            GateOp::Equal => tagged(Value::Boolean(self.word(value(0)?)? == self.word(value(1)?)?)),
            GateOp::BoolNot => tagged(Value::Boolean(!self.truthy(value(0)?)?)),
            GateOp::TaggedIsNotNull => tagged(Value::Boolean(self.tagged(value(0)?)? != Value::Null)),
            GateOp::TaggedIsNumber => tagged(Value::Boolean(self.tagged(value(0)?)?.is_number())),
            GateOp::TaggedIsNotHole => tagged(Value::Boolean(self.tagged(value(0)?)? != Value::Hole)),
            GateOp::TaggedIsSymbol => tagged(Value::Boolean(matches!(self.tagged(value(0)?)?, Value::Symbol(_)))),
            GateOp::IsJSFunction => tagged(Value::Boolean(self.heap.function_of(&self.tagged(value(0)?)?).is_some())),
            GateOp::IsPrototypeHClass => {
                let hclass = self.hclass(value(0)?)?;
                tagged(Value::Boolean(self.heap.hclass(hclass).is_some_and(|h| h.is_prototype)))
            }
            GateOp::Int32LessThan => {
                let (a, b) = (self.tagged(value(0)?)?, self.tagged(value(1)?)?);
                match (a, b) {
                    (Value::Smi(a), Value::Smi(b)) => tagged(Value::Boolean(a < b)),
                    _ => Err(EvalError::Domain(gate)),
                }
            }
            GateOp::TypedTypeOf(param) => {
                let name = param.type_of_string().ok_or(EvalError::Domain(gate))?;
                tagged(Value::String(name.to_string()))
            }
            _ => Err(EvalError::MissingValue(gate)),
        }
    }

    fn tagged(&self, gate: GateRef) -> Result<Value, EvalError> {
        match self.word(gate)? {
            Word::Tagged(v) => Ok(v),
            Word::HClass(_) => Err(EvalError::Domain(gate)),
        }
    }

    fn hclass(&self, gate: GateRef) -> Result<HClassId, EvalError> {
        match self.word(gate)? {
            Word::HClass(h) => Ok(h),
            Word::Tagged(_) => Err(EvalError::Domain(gate)),
        }
    }

    fn truthy(&self, gate: GateRef) -> Result<bool, EvalError> {
        Ok(self.tagged(gate)?.is_truthy())
    }

    fn object_kind(&self, value: &Value) -> Option<&ObjectKind> {
        ObjectId::from_value(value).and_then(|id| self.heap.object(id)).map(|o| &o.kind)
    }

    fn object_type(&self, value: &Value) -> Option<JSType> {
        self.heap.hclass_ref_of(value).map(|h| h.object_type)
    }

    fn pc_of(&self, gate: GateRef) -> u32 {
        self.circuit
            .find_nearest_frame_state(gate)
            .and_then(|fs| match self.circuit.get(fs).map(|g| &g.op) {
                Some(GateOp::FrameState { pc_offset }) => Some(*pc_offset),
                _ => None,
            })
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    fn execute(&mut self, gate: GateRef) -> Result<Option<Outcome>, EvalError> {
        let g = self.gate(gate)?.clone();
        trace!(gate = gate.index(), op = ?g.op, "execute");
        let input = |i: usize| -> Result<GateRef, EvalError> { g.value_in.get(i).copied().ok_or(EvalError::MissingValue(gate)) };

        let result = match &g.op {
            GateOp::Check { kind, deopt } => {
                if !self.check(kind, &g.value_in)? {
                    self.executed.push(g.op.clone());
                    return Ok(Some(Outcome::Deopt { reason: *deopt, pc_offset: self.pc_of(gate) }));
                }
                Some(self.word(input(0)?)?)
            }
            GateOp::StateSplit | GateOp::CallRuntime(_) | GateOp::CallTimer { .. } => None,
            GateOp::HasPendingException => Some(Word::Tagged(Value::Boolean(false))),
            GateOp::LoadHClass => {
                let object = self.tagged(input(0)?)?;
                Some(Word::HClass(self.heap.hclass_of(&object).ok_or(EvalError::Domain(gate))?))
            }
            GateOp::LoadPrototype => {
                let proto = self.heap.prototype_of(self.hclass(input(0)?)?);
                Some(Word::Tagged(proto.map(ObjectId::to_value).unwrap_or(Value::Null)))
            }
            GateOp::LoadProperty { plr } => {
                let holder = ObjectId::from_value(&self.tagged(input(0)?)?).ok_or(EvalError::Domain(gate))?;
                let object = self.heap.object(holder).ok_or(EvalError::Domain(gate))?;
                Some(Word::Tagged(object.load_slot(plr)))
            }
            GateOp::MonoLoadPropertyOnProto { plr, holder, deopt } => {
                let receiver = ObjectId::from_value(&self.tagged(input(0)?)?).ok_or(EvalError::Domain(gate))?;
                let Some(object) = self.heap.holder_object(receiver, *holder).and_then(|h| self.heap.object(h)) else {
                    self.executed.push(g.op.clone());
                    return Ok(Some(Outcome::Deopt { reason: *deopt, pc_offset: self.pc_of(gate) }));
                };
                Some(Word::Tagged(object.load_slot(plr)))
            }
            GateOp::TypedBinaryOp { op, param } => {
                let (l, r) = (self.tagged(input(0)?)?, self.tagged(input(1)?)?);
                let v = value_ops::typed_binary(*op, *param, &l, &r).ok_or(EvalError::Domain(gate))?;
                Some(Word::Tagged(v))
            }
            GateOp::TypedUnaryOp { op, param } => {
                let v = value_ops::typed_unary(*op, *param, &self.tagged(input(0)?)?).ok_or(EvalError::Domain(gate))?;
                Some(Word::Tagged(v))
            }
            GateOp::NumberToString => {
                let n = self.tagged(input(0)?)?.as_f64().ok_or(EvalError::Domain(gate))?;
                Some(Word::Tagged(Value::String(value_ops::number_to_string(n))))
            }
            GateOp::PrimitiveToNumber => {
                let v = self.tagged(input(0)?)?;
                Some(Word::Tagged(Value::from_f64(value_ops::to_number(&v))))
            }
            GateOp::LoadArrayLength => {
                let v = self.tagged(input(0)?)?;
                let len = match self.object_kind(&v) {
                    Some(ObjectKind::Array { elements, .. }) => elements.len(),
                    _ => return Err(EvalError::Domain(gate)),
                };
                Some(Word::Tagged(Value::Smi(len as i32)))
            }
            GateOp::LoadTypedArrayLength => {
                let v = self.tagged(input(0)?)?;
                let len = match self.object_kind(&v) {
                    Some(ObjectKind::TypedArray { elements }) => elements.len(),
                    _ => return Err(EvalError::Domain(gate)),
                };
                Some(Word::Tagged(Value::Smi(len as i32)))
            }
            GateOp::LoadMapSize => {
                let v = self.tagged(input(0)?)?;
                let len = match self.object_kind(&v) {
                    Some(ObjectKind::Map { entries }) => entries.len(),
                    _ => return Err(EvalError::Domain(gate)),
                };
                Some(Word::Tagged(Value::Smi(len as i32)))
            }
            GateOp::LoadStringLength => match self.tagged(input(0)?)? {
                Value::String(s) => Some(Word::Tagged(Value::Smi(s.encode_utf16().count() as i32))),
                _ => return Err(EvalError::Domain(gate)),
            },
            GateOp::LoadElement(kind) => Some(Word::Tagged(self.load_element(gate, *kind, input(0)?, input(1)?)?)),
            GateOp::LoadBuiltinObject { index } => {
                let object = BuiltinTypeId::GLOBAL_BUILTINS
                    .get(*index)
                    .and_then(|id| self.heap.builtin_object(*id))
                    .ok_or(EvalError::Domain(gate))?;
                Some(Word::Tagged(object.to_value()))
            }
            GateOp::OrdinaryHasInstance => {
                let (object, target) = (self.tagged(input(0)?)?, self.tagged(input(1)?)?);
                Some(Word::Tagged(Value::Boolean(self.ordinary_has_instance(&object, &target))))
            }
            // Callees are not executed; their results read as undefined.
            GateOp::TypedCall { .. } | GateOp::CallBuiltin { .. } => Some(Word::Tagged(Value::Undefined)),
            _ => return Err(self.unsupported(gate)),
        };

        self.executed.push(g.op);
        if let Some(word) = result {
            self.values.insert(gate, word);
        }
        Ok(None)
    }

    fn load_element(&self, gate: GateRef, kind: ElementAccessKind, receiver: GateRef, index: GateRef) -> Result<Value, EvalError> {
        let receiver = self.tagged(receiver)?;
        let Value::Smi(index) = self.tagged(index)? else {
            return Err(EvalError::Domain(gate));
        };
        let index = usize::try_from(index).map_err(|_| EvalError::Domain(gate))?;
        let loaded = match (kind, &receiver) {
            (ElementAccessKind::StringChar, Value::String(s)) => {
                let unit = s.encode_utf16().nth(index).ok_or(EvalError::Domain(gate))?;
                Value::String(String::from_utf16_lossy(&[unit]))
            }
            (ElementAccessKind::TypedArray(_), _) => match self.object_kind(&receiver) {
                Some(ObjectKind::TypedArray { elements }) => {
                    Value::from_f64(*elements.get(index).ok_or(EvalError::Domain(gate))?)
                }
                _ => return Err(EvalError::Domain(gate)),
            },
            (_, _) => match self.object_kind(&receiver) {
                Some(ObjectKind::Array { elements, .. }) => match elements.get(index) {
                    Some(Value::Hole) if kind == ElementAccessKind::ArrayHoleTagged => Value::Undefined,
                    Some(v) => v.clone(),
                    None => return Err(EvalError::Domain(gate)),
                },
                _ => return Err(EvalError::Domain(gate)),
            },
        };
        Ok(loaded)
    }

    fn ordinary_has_instance(&self, object: &Value, target: &Value) -> bool {
        let Some(function) = self.heap.function_of(target) else {
            return false;
        };
        let prototype = match function.proto_or_hclass {
            ProtoOrHClass::Prototype(p) => Some(p),
            ProtoOrHClass::HClass(h) => self.heap.prototype_of(h),
            ProtoOrHClass::None => None,
        };
        match (prototype, self.heap.hclass_of(object)) {
            (Some(p), Some(hclass)) => self.heap.chain_contains(hclass, p),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    fn check(&self, kind: &CheckKind, inputs: &[GateRef]) -> Result<bool, EvalError> {
        let first = *inputs.first().ok_or(EvalError::MissingValue(self.circuit.dead()))?;
        let value = self.word(first)?;
        let Word::Tagged(value) = value else {
            return Err(EvalError::Domain(first));
        };
        let heap = self.heap;
        let hclass = heap.hclass_ref_of(&value);
        let passed = match kind {
            CheckKind::Condition => value == Value::Boolean(true),
            CheckKind::PrimitiveType(param) | CheckKind::TypeOf(param) => param.accepts(&value),
            CheckKind::HeapObject => value.is_heap_object(),
            CheckKind::EcmaString | CheckKind::InternString => value.is_string(),
            CheckKind::ObjectType { hclass: expected } | CheckKind::MathHClassConsistency { hclass: expected } => {
                heap.hclass_of(&value) == Some(*expected)
            }
            CheckKind::ProtoChangeMarker => hclass.is_some_and(|h| !h.proto_changed),
            CheckKind::StableArray => hclass.is_some_and(|h| h.object_type == JSType::JSArray && h.is_stable_elements),
            CheckKind::ElementsKind(kind) => hclass.is_some_and(|h| h.elements_kind == *kind),
            CheckKind::CowArray => matches!(self.object_kind(&value), Some(ObjectKind::Array { is_cow: false, .. })),
            CheckKind::TypedArray(js_type) => self.object_type(&value) == Some(*js_type),
            CheckKind::EcmaMap => self.object_type(&value) == Some(JSType::JSMap),
            CheckKind::Index => {
                let length = inputs.get(1).ok_or(EvalError::MissingValue(first))?;
                match (value, self.tagged(*length)?) {
                    (Value::Smi(i), Value::Smi(len)) => 0 <= i && i < len,
                    _ => false,
                }
            }
            CheckKind::BuiltinPrototypeHClass { builtin, hclass: expected } => heap
                .builtin_prototype(*builtin)
                .and_then(|p| heap.object(p))
                .is_some_and(|p| p.hclass == *expected),
            CheckKind::CallTarget { builtin } => self.builtin_of(&value) == Some(*builtin),
            CheckKind::JsCallTarget { key, .. } => heap.function_of(&value).is_some_and(|f| match key {
                CallTargetKey::Method(method) => f.method == *method,
                CallTargetKey::MethodIndex(index) => f.method_index == *index,
            }),
            CheckKind::CallTargetIsCompiled => heap.function_of(&value).is_some_and(|f| f.is_compiled),
            CheckKind::HeapConstant(object) => ObjectId::from_value(&value) == Some(*object),
            CheckKind::BuiltinConstructor(id) => heap.function_of(&value).is_some_and(|f| f.builtin == Some(*id)),
        };
        Ok(passed)
    }

    /// Builtin a callee resolves to. Iterator targets are the receivers
    /// themselves, which resolve to their `Symbol.iterator` method.
    fn builtin_of(&self, value: &Value) -> Option<BuiltinsStubId> {
        if value.is_string() {
            return Some(BuiltinsStubId::StringIterator);
        }
        if let Some(function) = self.heap.function_of(value) {
            return function.builtin;
        }
        match self.object_type(value) {
            Some(JSType::JSArray) => Some(BuiltinsStubId::ArrayValues),
            _ => None,
        }
    }
}
