//! Calls, `new`, `super(...)` and `GETITERATOR`
//!
//! A JS callee is only specialized when it is hot, typed-callable, declared
//! with exactly the passed argument count and compiled from the caller's
//! constant pool. The callee identity is then pinned by one of three
//! guards: a heap constant comparison under JIT, a compiled-code check for
//! functions defined in the method, or a method identity check otherwise.
//! Builtin callees become direct builtin calls.

use core_types::BuiltinsStubId;

use super::TypedBytecodeLowering;
use crate::builder::CircuitBuilder;
use crate::circuit::{ArgKind, CallTargetKey, CheckKind, GateOp, GateRef};
use crate::deopt::DeoptType;
use crate::error::LoweringResult;
use crate::type_info_accessors::{
    CallTypeInfoAccessor, GetIteratorTypeInfoAccessor, NewObjRangeTypeInfoAccessor, SuperCallTypeInfoAccessor,
};

/// Builtins callable without a receiver.
fn is_plain_builtin(id: BuiltinsStubId) -> bool {
    id.is_typed_inline_builtin() || id.is_typed_builtins_number_id() || id.is_typed_builtins_global_id()
}

/// Builtin methods whose arity matches `argc`.
fn is_this_builtin(id: BuiltinsStubId, argc: usize) -> bool {
    match argc {
        0 => id.is_call_this0(),
        1 => id.is_call_this1(),
        2 => id.is_call_this2(),
        3 => id.is_call_this3(),
        _ => false,
    }
}

/// Deopt reason of a method identity check.
fn js_call_target_deopt(is_this_call: bool, fast: bool, no_gc: bool) -> DeoptType {
    match (is_this_call, fast, no_gc) {
        (false, false, _) => DeoptType::NotJsCallTgt1,
        (false, true, _) => DeoptType::NotJsFastCallTgt1,
        (true, false, false) => DeoptType::NotJsCallTgt2,
        (true, true, false) => DeoptType::NotJsFastCallTgt2,
        (true, false, true) => DeoptType::NotJsCallTgt3,
        (true, true, true) => DeoptType::NotJsFastCallTgt3,
    }
}

/// Constructors with a dedicated allocation path, and the reason their
/// identity check reports.
fn builtin_constructor_deopt(id: BuiltinsStubId) -> Option<DeoptType> {
    match id {
        BuiltinsStubId::ObjectConstructor => Some(DeoptType::NewBuiltinCtorObject),
        BuiltinsStubId::BooleanConstructor => Some(DeoptType::NewBuiltinCtorBoolean),
        BuiltinsStubId::Float32ArrayConstructor => Some(DeoptType::NewBuiltinCtorFloat32Array),
        BuiltinsStubId::ArrayConstructor | BuiltinsStubId::MapConstructor | BuiltinsStubId::NumberConstructor => {
            Some(DeoptType::NewBuiltinCtorFail1)
        }
        _ => None,
    }
}

impl TypedBytecodeLowering<'_, '_> {
    /// `CALLARG*` and `CALLRANGE`.
    pub(super) fn lower_typed_call(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = CallTypeInfoAccessor::new(self.env, self.circuit, gate, self.options.jit_compile)?;
        if let Some(id) = acc.builtin_id() {
            if is_plain_builtin(id) {
                return self.lower_builtin_call(gate, &acc, id);
            }
            return Ok(());
        }
        self.lower_js_call(gate, &acc)
    }

    /// `CALLTHIS*`, `CALLTHISRANGE` and `CALLRUNTIME_CALLINIT`.
    pub(super) fn lower_typed_call_this(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = CallTypeInfoAccessor::new(self.env, self.circuit, gate, self.options.jit_compile)?;
        if let Some(id) = acc.builtin_id() {
            if is_this_builtin(id, acc.argc()) {
                return self.lower_builtin_call(gate, &acc, id);
            }
            return Ok(());
        }
        self.lower_js_call(gate, &acc)
    }

    /// Direct builtin call. The identity check is dropped for callees read
    /// straight off a global builtin object.
    fn lower_builtin_call(&mut self, gate: GateRef, acc: &CallTypeInfoAccessor, id: BuiltinsStubId) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let skip_check = self.no_check() || acc.func_is_from_global();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        if !skip_check {
            b.check(CheckKind::CallTarget { builtin: id }, vec![acc.func()], DeoptType::NotCallTarget1)?;
        }
        let inputs: Vec<GateRef> = acc.this().into_iter().chain(acc.args().iter().copied()).collect();
        let result = b.effect_with_frame_state(GateOp::CallBuiltin { id, side_effect: id.has_side_effect() }, inputs)?;
        b.replace_with_pending_exception(Some(result))
    }

    fn lower_js_call(&mut self, gate: GateRef, acc: &CallTypeInfoAccessor) -> LoweringResult<()> {
        if !acc.is_hot() || !acc.is_valid_call_method_id() || !acc.is_typed_call() {
            return Ok(());
        }
        if !acc.arity_matches() || !acc.in_same_const_pool() {
            return Ok(());
        }
        let is_this_call = acc.opcode().is_this_call();
        let (fast, no_gc) = (acc.can_fast_call(), acc.is_no_gc());
        let target_check = if let Some(object) = acc.heap_constant() {
            (CheckKind::HeapConstant(object), DeoptType::NotCallTargetHeapObject)
        } else if acc.func_is_define_func() {
            (CheckKind::CallTargetIsCompiled, DeoptType::CallTargetNotCompiled)
        } else {
            // Method table loads compare the method itself; other callees
            // compare their index in the file.
            let key = match (acc.func_is_load_vtable(), acc.method_id(), acc.method_index()) {
                (true, Some(method), _) => CallTargetKey::Method(method),
                (false, _, Some(index)) => CallTargetKey::MethodIndex(index),
                _ => return Ok(()),
            };
            (CheckKind::JsCallTarget { key, fast, no_gc }, js_call_target_deopt(is_this_call, fast, no_gc))
        };

        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let timed = self.options.profiling;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let func = acc.func();
        if !no_check {
            let (kind, deopt) = target_check;
            b.check(kind, vec![func], deopt)?;
        }
        let this = match acc.this() {
            Some(this) => this,
            None => b.undefined(),
        };
        let mut inputs = vec![func, this];
        inputs.extend_from_slice(acc.args());

        if timed {
            b.effect(GateOp::CallTimer { start: true }, vec![func]);
        }
        let result = b.effect_with_frame_state(GateOp::TypedCall { fast, no_gc }, inputs)?;
        if timed {
            b.effect(GateOp::CallTimer { start: false }, vec![func]);
        }
        b.replace_with_pending_exception(Some(result))
    }

    /// `NEWOBJRANGE`.
    pub(super) fn lower_new_obj_range(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = NewObjRangeTypeInfoAccessor::new(self.env, self.circuit, gate, self.options.jit_compile)?;
        if self.try_lower_new_number(gate, &acc)? {
            return Ok(());
        }
        if let Some(id) = acc.builtin_id() {
            return self.lower_new_builtin(gate, &acc, id);
        }

        let (Some(hclass), Some(method)) = (acc.hclass(), acc.method_id()) else {
            return Ok(());
        };
        if !acc.is_valid_call_method_id() {
            return Ok(());
        }
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let need_push_argv = acc.num_args().is_some_and(|n| n as usize != acc.args().len());
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let ctor = acc.ctor();
        if !no_check {
            match acc.heap_constant() {
                Some(object) => b.check(CheckKind::HeapConstant(object), vec![ctor], DeoptType::NotCallTargetHeapObject)?,
                None => b.check(
                    CheckKind::JsCallTarget { key: CallTargetKey::Method(method), fast: false, no_gc: false },
                    vec![ctor],
                    DeoptType::NotJsNewCallTgt1,
                )?,
            };
        }
        // The instance layout is only valid while the constructor still
        // hands it out.
        let proto_or_hclass = b.effect(GateOp::LoadProtoOrHClass, vec![ctor]);
        let expected = b.hclass_constant(hclass);
        let same = b.equal(expected, proto_or_hclass);
        b.deopt_check(same, DeoptType::NotNewObj2)?;

        let this = b.effect_with_frame_state(GateOp::TypedNewAllocateThis { hclass }, vec![ctor])?;
        let mut inputs = vec![ctor, ctor, this];
        inputs.extend_from_slice(acc.args());
        let result = b.effect_with_frame_state(GateOp::CallNew { need_push_argv }, inputs)?;
        b.replace_with_pending_exception(Some(result))
    }

    /// `new Number(x)` of a number.
    fn try_lower_new_number(&mut self, gate: GateRef, acc: &NewObjRangeTypeInfoAccessor) -> LoweringResult<bool> {
        if !acc.is_new_number() {
            return Ok(false);
        }
        let &[value] = acc.args() else {
            return Ok(false);
        };
        if !self.circuit.is_trusted_number(value) {
            return Ok(false);
        }
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let result = b.effect(GateOp::NewNumber, vec![acc.ctor(), value]);
        b.replace_hir(Some(result))?;
        Ok(true)
    }

    /// `new` of a builtin constructor. `Object` and `Boolean` allocate
    /// inline; the rest call the builtin.
    fn lower_new_builtin(&mut self, gate: GateRef, acc: &NewObjRangeTypeInfoAccessor, id: BuiltinsStubId) -> LoweringResult<()> {
        let Some(deopt) = builtin_constructor_deopt(id) else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let ctor = acc.ctor();
        if !no_check {
            b.check(CheckKind::BuiltinConstructor(id), vec![ctor], deopt)?;
        }
        let mut inputs = vec![ctor];
        inputs.extend_from_slice(acc.args());
        match id {
            BuiltinsStubId::ObjectConstructor | BuiltinsStubId::BooleanConstructor => {
                let result = b.effect(GateOp::BuiltinConstructor(id), inputs);
                b.replace_hir(Some(result))
            }
            _ => {
                let result = b.effect_with_frame_state(GateOp::CallNewBuiltin(id), inputs)?;
                b.replace_with_pending_exception(Some(result))
            }
        }
    }

    /// `SUPERCALLTHISRANGE`.
    pub(super) fn lower_super_call(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = SuperCallTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if !acc.is_valid_call_method_id() {
            return Ok(());
        }
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let func = b.circuit_mut().arg(ArgKind::Func);
        let new_target = b.circuit_mut().arg(ArgKind::NewTarget);
        let super_ctor = b.effect(GateOp::GetSuperConstructor, vec![func]);
        let this = b.effect_with_frame_state(GateOp::TypedSuperAllocateThis, vec![super_ctor, new_target])?;
        let mut inputs = vec![super_ctor, new_target, this];
        inputs.extend_from_slice(acc.args());
        let result = b.effect_with_frame_state(GateOp::Construct, inputs)?;
        b.replace_with_pending_exception(Some(result))
    }

    /// `GETITERATOR` of a receiver whose iterator factory was a builtin.
    pub(super) fn lower_get_iterator(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = GetIteratorTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let Some(id) = acc.iterator_builtin() else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let object = acc.object();
        if !no_check {
            b.check(CheckKind::CallTarget { builtin: id }, vec![object], DeoptType::NotCallTarget1)?;
        }
        let result = b.effect_with_frame_state(GateOp::CallBuiltin { id, side_effect: false }, vec![object])?;
        b.replace_with_pending_exception(Some(result))
    }
}
