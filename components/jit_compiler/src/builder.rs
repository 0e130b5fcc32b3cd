//! Structured construction of lowered regions
//!
//! A [`CircuitBuilder`] is positioned at one bytecode gate and appends the
//! typed region that replaces it. It tracks the current control and effect
//! gates, so strategies emit straight-line code and let labels, variables
//! and loops produce the merges and selectors.
//!
//! Variables are written on each path and read after a label is bound; the
//! builder inserts a value selector at a merge only when the incoming
//! values differ. Loops are graph-encoded: [`CircuitBuilder::loop_begin`]
//! creates the header with open back-edge slots that
//! [`CircuitBuilder::loop_end`] patches.

use core_types::Value;
use object_model::HClassId;

use crate::circuit::{BranchWeight, CheckKind, Circuit, GateOp, GateRef};
use crate::deopt::DeoptType;
use crate::error::{LoweringError, LoweringResult};

/// Handle of a builder variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable(usize);

/// Handle of a builder label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Clone)]
struct Predecessor {
    state: GateRef,
    depend: GateRef,
    vars: Vec<GateRef>,
}

#[derive(Debug, Clone)]
struct LoopHeader {
    begin: GateRef,
    depend_selector: GateRef,
    value_selectors: Vec<GateRef>,
}

#[derive(Debug, Clone, Default)]
struct LabelData {
    preds: Vec<Predecessor>,
    header: Option<LoopHeader>,
}

/// Appends typed gates in place of one bytecode gate
#[derive(Debug)]
pub struct CircuitBuilder<'c> {
    circuit: &'c mut Circuit,
    anchor: GateRef,
    state: GateRef,
    depend: GateRef,
    frame_state: Option<GateRef>,
    vars: Vec<GateRef>,
    labels: Vec<LabelData>,
}

impl<'c> CircuitBuilder<'c> {
    /// Builder positioned at the inputs of `gate`.
    pub fn at(circuit: &'c mut Circuit, gate: GateRef) -> LoweringResult<Self> {
        let g = circuit.gate(gate)?;
        let state = g.state_in.first().copied().unwrap_or_else(|| circuit.state_entry());
        let depend = g.depend_in.first().copied().unwrap_or_else(|| circuit.depend_entry());
        let frame_state = circuit.find_nearest_frame_state(gate);
        Ok(Self {
            circuit,
            anchor: gate,
            state,
            depend,
            frame_state,
            vars: Vec::new(),
            labels: Vec::new(),
        })
    }

    /// The circuit being edited.
    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    /// Mutable access to the circuit being edited.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        self.circuit
    }

    /// Gate being lowered.
    pub fn anchor(&self) -> GateRef {
        self.anchor
    }

    /// Current control and effect gates.
    pub fn state_depend(&self) -> (GateRef, GateRef) {
        (self.state, self.depend)
    }

    /// Frame state guards attach to.
    pub fn frame_state(&self) -> LoweringResult<GateRef> {
        self.frame_state.ok_or(LoweringError::MissingFrameState(self.anchor))
    }

    // ------------------------------------------------------------------
    // Constants
    // ------------------------------------------------------------------

    /// Tagged constant.
    pub fn constant(&mut self, value: Value) -> GateRef {
        self.circuit.constant(value)
    }

    /// Hidden class constant.
    pub fn hclass_constant(&mut self, hclass: HClassId) -> GateRef {
        self.circuit.hclass_constant(hclass)
    }

    /// Boolean constant.
    pub fn boolean(&mut self, value: bool) -> GateRef {
        self.circuit.constant(Value::Boolean(value))
    }

    /// `undefined`.
    pub fn undefined(&mut self) -> GateRef {
        self.circuit.constant(Value::Undefined)
    }

    /// Hole.
    pub fn hole(&mut self) -> GateRef {
        self.circuit.constant(Value::Hole)
    }

    // ------------------------------------------------------------------
    // Gates
    // ------------------------------------------------------------------

    /// Gate without control or effect inputs.
    pub fn pure(&mut self, op: GateOp, values: Vec<GateRef>) -> GateRef {
        self.circuit.new_gate(op, vec![], vec![], values)
    }

    /// Effectful gate appended to the effect chain.
    pub fn effect(&mut self, op: GateOp, values: Vec<GateRef>) -> GateRef {
        let gate = self.circuit.new_gate(op, vec![self.state], vec![self.depend], values);
        self.depend = gate;
        gate
    }

    /// Effectful gate that may deoptimize or throw; it carries the frame
    /// state.
    pub fn effect_with_frame_state(&mut self, op: GateOp, values: Vec<GateRef>) -> LoweringResult<GateRef> {
        let frame_state = self.frame_state()?;
        let gate = self.effect(op, values);
        self.circuit.set_frame_state(gate, frame_state)?;
        Ok(gate)
    }

    /// Guard of `kind` over `values`; the gate yields its first value input.
    pub fn check(&mut self, kind: CheckKind, values: Vec<GateRef>, deopt: DeoptType) -> LoweringResult<GateRef> {
        self.effect_with_frame_state(GateOp::Check { kind, deopt }, values)
    }

    /// Deoptimizes unless `condition` holds.
    pub fn deopt_check(&mut self, condition: GateRef, deopt: DeoptType) -> LoweringResult<GateRef> {
        self.check(CheckKind::Condition, vec![condition], deopt)
    }

    /// Hidden class of an object.
    pub fn load_hclass(&mut self, object: GateRef) -> GateRef {
        self.effect(GateOp::LoadHClass, vec![object])
    }

    /// Prototype recorded in a hidden class.
    pub fn load_prototype(&mut self, hclass: GateRef) -> GateRef {
        self.effect(GateOp::LoadPrototype, vec![hclass])
    }

    /// `a == b` on raw values.
    pub fn equal(&mut self, a: GateRef, b: GateRef) -> GateRef {
        self.pure(GateOp::Equal, vec![a, b])
    }

    // ------------------------------------------------------------------
    // Variables and labels
    // ------------------------------------------------------------------

    /// Declares a variable holding `init`.
    pub fn new_variable(&mut self, init: GateRef) -> Variable {
        self.vars.push(init);
        Variable(self.vars.len() - 1)
    }

    /// Current value of a variable.
    pub fn read(&self, var: Variable) -> GateRef {
        self.vars[var.0]
    }

    /// Assigns a variable on the current path.
    pub fn write(&mut self, var: Variable, value: GateRef) {
        self.vars[var.0] = value;
    }

    /// Fresh unbound label.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(LabelData::default());
        Label(self.labels.len() - 1)
    }

    fn snapshot(&self) -> Predecessor {
        Predecessor { state: self.state, depend: self.depend, vars: self.vars.clone() }
    }

    fn unreachable(&mut self) {
        self.state = self.circuit.dead();
        self.depend = self.circuit.dead();
    }

    /// Ends the current path at `label`.
    pub fn jump(&mut self, label: Label) {
        let pred = self.snapshot();
        self.labels[label.0].preds.push(pred);
        self.unreachable();
    }

    /// Ends the current path with a two-way branch on `condition`.
    pub fn branch(&mut self, condition: GateRef, if_true: Label, if_false: Label, weight: BranchWeight) {
        let branch = self.circuit.new_gate(GateOp::IfBranch { weight }, vec![self.state], vec![], vec![condition]);
        for (op, label) in [(GateOp::IfTrue, if_true), (GateOp::IfFalse, if_false)] {
            let edge = self.circuit.new_gate(op, vec![branch], vec![], vec![]);
            let relay = self.circuit.new_gate(GateOp::DependRelay, vec![edge], vec![self.depend], vec![]);
            let pred = Predecessor { state: edge, depend: relay, vars: self.vars.clone() };
            self.labels[label.0].preds.push(pred);
        }
        self.unreachable();
    }

    /// Continues at `label`, merging its incoming paths.
    pub fn bind(&mut self, label: Label) {
        let preds = std::mem::take(&mut self.labels[label.0].preds);
        match preds.len() {
            0 => self.unreachable(),
            1 => {
                let pred = &preds[0];
                self.state = pred.state;
                self.depend = pred.depend;
                self.vars = pred.vars.clone();
            }
            _ => {
                let states = preds.iter().map(|p| p.state).collect();
                let merge = self.circuit.new_gate(GateOp::Merge, states, vec![], vec![]);
                let depends = preds.iter().map(|p| p.depend).collect();
                self.depend = self.circuit.new_gate(GateOp::DependSelector, vec![merge], depends, vec![]);
                self.state = merge;
                let width = preds.iter().map(|p| p.vars.len()).min().unwrap_or(0);
                let mut vars = preds[0].vars.clone();
                vars.truncate(width);
                for (i, var) in vars.iter_mut().enumerate() {
                    let incoming: Vec<GateRef> = preds.iter().map(|p| p.vars[i]).collect();
                    if incoming.iter().any(|v| *v != incoming[0]) {
                        *var = self.circuit.new_gate(GateOp::ValueSelector, vec![merge], vec![], incoming);
                    }
                }
                self.vars = vars;
            }
        }
    }

    /// Opens a loop at `label`, which must have exactly the pre-header as
    /// predecessor. Every variable becomes a loop selector.
    pub fn loop_begin(&mut self, label: Label) {
        let preds = std::mem::take(&mut self.labels[label.0].preds);
        let entry = match preds.into_iter().next() {
            Some(pred) => pred,
            None => self.snapshot(),
        };
        let dead = self.circuit.dead();
        let begin = self.circuit.new_gate(GateOp::LoopBegin, vec![entry.state, dead], vec![], vec![]);
        let depend_selector =
            self.circuit.new_gate(GateOp::DependSelector, vec![begin], vec![entry.depend, dead], vec![]);
        let value_selectors: Vec<GateRef> = entry
            .vars
            .iter()
            .map(|v| self.circuit.new_gate(GateOp::ValueSelector, vec![begin], vec![], vec![*v, dead]))
            .collect();
        self.state = begin;
        self.depend = depend_selector;
        self.vars = value_selectors.clone();
        self.labels[label.0].header = Some(LoopHeader { begin, depend_selector, value_selectors });
    }

    /// Closes the loop opened at `label` with a back edge from the current
    /// path.
    pub fn loop_end(&mut self, label: Label) -> LoweringResult<()> {
        let Some(header) = self.labels[label.0].header.clone() else {
            return Err(LoweringError::InvalidGate(self.anchor));
        };
        let back = self.circuit.new_gate(GateOp::LoopBack, vec![self.state], vec![], vec![]);
        self.circuit.gate_mut(header.begin)?.state_in[1] = back;
        self.circuit.gate_mut(header.depend_selector)?.depend_in[1] = self.depend;
        for (selector, value) in header.value_selectors.iter().zip(self.vars.clone()) {
            self.circuit.gate_mut(*selector)?.value_in[1] = value;
        }
        self.unreachable();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    /// Replaces the anchor gate with the region built so far.
    pub fn replace_hir(self, value: Option<GateRef>) -> LoweringResult<()> {
        self.circuit
            .replace_hir_and_delete_if_exception(self.anchor, self.state, self.depend, value)
    }

    /// Replaces the anchor gate with the region built so far, branching on
    /// a pending exception: the success side continues the region, the
    /// exception side feeds the anchor's exception users.
    pub fn replace_with_pending_exception(mut self, value: Option<GateRef>) -> LoweringResult<()> {
        let pending = self.effect(GateOp::HasPendingException, vec![]);
        let branch = self.circuit.new_gate(
            GateOp::IfBranch { weight: BranchWeight { true_weight: 0, false_weight: 1 } },
            vec![self.state],
            vec![],
            vec![pending],
        );
        let if_true = self.circuit.new_gate(GateOp::IfTrue, vec![branch], vec![], vec![]);
        let true_relay = self.circuit.new_gate(GateOp::DependRelay, vec![if_true], vec![self.depend], vec![]);
        let if_false = self.circuit.new_gate(GateOp::IfFalse, vec![branch], vec![], vec![]);
        let false_relay = self.circuit.new_gate(GateOp::DependRelay, vec![if_false], vec![self.depend], vec![]);
        self.circuit
            .replace_hir_with_if_branch(self.anchor, (if_false, false_relay), (if_true, true_relay), value)
    }
}
