//! Named, private and global property accesses
//!
//! A named access with profiled receiver shapes becomes either a single
//! hidden class guard followed by a fixed-slot access (monomorphic), or a
//! chain of hidden class comparisons dispatching to one access per shape
//! (polymorphic). Receivers profiled as builtins take fixed-function paths
//! instead: `length` of arrays, strings and typed arrays, `size` of maps,
//! methods of builtin prototypes and the properties of global objects.

use core_types::{BuiltinTypeId, Value};
use object_model::{HClassId, PropertyLookupResult};
use pgo_profiler::GlobalsKind;

use super::TypedBytecodeLowering;
use crate::builder::{CircuitBuilder, Label};
use crate::circuit::{ArgKind, BranchWeight, CheckKind, GateOp, GateRef, RuntimeId};
use crate::deopt::DeoptType;
use crate::error::LoweringResult;
use crate::type_info_accessors::{
    AccessInfo, AccessKind, LoadBuiltinObjTypeInfoAccessor, LoadGlobalTypeInfoAccessor,
    LoadObjPropertyTypeInfoAccessor, LoadPrivatePropertyTypeInfoAccessor, StoreObjByNameTypeInfoAccessor,
    StorePrivatePropertyTypeInfoAccessor,
};

/// Deopt reasons of one polymorphic dispatch.
#[derive(Clone, Copy)]
struct PolyDeopts {
    not_heap_object: DeoptType,
    last_candidate: DeoptType,
    chain_end: DeoptType,
    proto_changed: DeoptType,
}

const POLY_LOAD: PolyDeopts = PolyDeopts {
    not_heap_object: DeoptType::NotHeapObject1,
    last_candidate: DeoptType::InconsistentHClass1,
    chain_end: DeoptType::InconsistentHClass2,
    proto_changed: DeoptType::PrototypeChanged1,
};

const POLY_STORE: PolyDeopts = PolyDeopts {
    not_heap_object: DeoptType::NotHeapObject2,
    last_candidate: DeoptType::InconsistentHClass3,
    chain_end: DeoptType::InconsistentHClass4,
    proto_changed: DeoptType::PrototypeChanged2,
};

/// Branches to `target` when `hclass` is one of `expected`. Yields the label
/// the next candidate is tested under, which the caller binds once the
/// candidate's access is emitted. The final comparison of the dispatch
/// deoptimizes instead and yields no label.
fn dispatch_on_hclass(
    b: &mut CircuitBuilder<'_>,
    hclass: GateRef,
    expected: &[HClassId],
    target: Label,
    is_last: bool,
    deopt: DeoptType,
) -> LoweringResult<Option<Label>> {
    let mut fall_through = None;
    for (i, &candidate) in expected.iter().enumerate() {
        if let Some(next) = fall_through.take() {
            b.bind(next);
        }
        let candidate = b.hclass_constant(candidate);
        let matches = b.equal(hclass, candidate);
        if is_last && i + 1 == expected.len() {
            b.deopt_check(matches, deopt)?;
            b.jump(target);
        } else {
            let next = b.new_label();
            b.branch(matches, target, next, BranchWeight::default());
            fall_through = Some(next);
        }
    }
    Ok(fall_through)
}

/// Walks the prototype chain above `receiver_hclass` to the first object
/// laid out as `holder` and yields it. Reaching the end of the chain
/// deoptimizes.
fn walk_to_holder(
    b: &mut CircuitBuilder<'_>,
    receiver_hclass: GateRef,
    holder: HClassId,
    chain_end: DeoptType,
) -> LoweringResult<GateRef> {
    let first = b.load_prototype(receiver_hclass);
    let current = b.new_variable(first);
    let (header, found, next) = (b.new_label(), b.new_label(), b.new_label());
    b.jump(header);
    b.loop_begin(header);

    let proto = b.read(current);
    let not_null = b.pure(GateOp::TaggedIsNotNull, vec![proto]);
    b.deopt_check(not_null, chain_end)?;
    let proto_hclass = b.load_hclass(proto);
    let expected = b.hclass_constant(holder);
    let is_holder = b.equal(proto_hclass, expected);
    b.branch(is_holder, found, next, BranchWeight::default());

    b.bind(next);
    let up = b.load_prototype(proto_hclass);
    b.write(current, up);
    b.loop_end(header)?;

    b.bind(found);
    Ok(b.read(current))
}

/// Slot load or getter call on `holder`. The flag reports a call.
fn build_named_load(
    b: &mut CircuitBuilder<'_>,
    receiver: GateRef,
    holder: GateRef,
    plr: PropertyLookupResult,
) -> LoweringResult<(GateRef, bool)> {
    if plr.is_accessor {
        let result = b.effect_with_frame_state(GateOp::CallGetter { plr }, vec![receiver, holder])?;
        return Ok((result, true));
    }
    Ok((b.effect(GateOp::LoadProperty { plr }, vec![holder]), false))
}

/// Slot store or setter call on `holder`. The flag reports a call.
fn build_named_store(
    b: &mut CircuitBuilder<'_>,
    receiver: GateRef,
    holder: GateRef,
    value: GateRef,
    plr: PropertyLookupResult,
) -> LoweringResult<bool> {
    if plr.is_accessor {
        b.effect_with_frame_state(GateOp::CallSetter { plr }, vec![receiver, holder, value])?;
        return Ok(true);
    }
    // Function-typed slots only ever held objects.
    let value = if plr.is_function {
        b.check(CheckKind::HeapObject, vec![value], DeoptType::NotHeapObject3)?
    } else {
        value
    };
    b.effect(GateOp::StoreProperty { plr }, vec![receiver, value]);
    Ok(false)
}

/// Guards that the receiver is not a prototype, or refreshes the compiled
/// layout when it is one, ahead of a transitioning store.
fn guard_transition(
    b: &mut CircuitBuilder<'_>,
    receiver_hclass: GateRef,
    info: &AccessInfo,
) -> LoweringResult<()> {
    if info.receiver_is_prototype {
        let old = b.hclass_constant(info.receiver);
        let new = b.hclass_constant(info.transition);
        b.effect(GateOp::CallRuntime(RuntimeId::UpdateAOTHClass), vec![old, new]);
        return Ok(());
    }
    let is_prototype = b.pure(GateOp::IsPrototypeHClass, vec![receiver_hclass]);
    let not_prototype = b.pure(GateOp::BoolNot, vec![is_prototype]);
    b.deopt_check(not_prototype, DeoptType::PrototypeChanged3)?;
    Ok(())
}

/// Transitioning store inside a polymorphic dispatch. An out-of-line slot
/// past the properties capacity is left to the runtime, which grows the
/// array.
fn build_transition_store(
    b: &mut CircuitBuilder<'_>,
    receiver: GateRef,
    receiver_hclass: GateRef,
    value: GateRef,
    info: &AccessInfo,
) -> LoweringResult<()> {
    guard_transition(b, receiver_hclass, info)?;
    let plr = info.plr;
    let new_hclass = b.hclass_constant(info.transition);
    if plr.in_object {
        b.effect(GateOp::TransitionHClass, vec![receiver, new_hclass]);
        b.effect(GateOp::StoreProperty { plr }, vec![receiver, value]);
        return Ok(());
    }

    let capacity = b.effect(GateOp::PropertiesCapacity, vec![receiver]);
    let index = b.constant(Value::Smi(plr.offset as i32));
    let fits = b.pure(GateOp::Int32LessThan, vec![index, capacity]);
    let (inline, grow, done) = (b.new_label(), b.new_label(), b.new_label());
    b.branch(fits, inline, grow, BranchWeight::default());

    b.bind(inline);
    b.effect(GateOp::TransitionHClass, vec![receiver, new_hclass]);
    b.effect(GateOp::StoreProperty { plr }, vec![receiver, value]);
    b.jump(done);

    b.bind(grow);
    b.effect(GateOp::CallRuntime(RuntimeId::PropertiesSetValue), vec![receiver, value, new_hclass, index]);
    b.jump(done);

    b.bind(done);
    Ok(())
}

impl TypedBytecodeLowering<'_, '_> {
    /// `LDOBJBYNAME` and `LDTHISBYNAME`.
    pub(super) fn lower_ld_obj_by_name(&mut self, gate: GateRef) -> LoweringResult<()> {
        if self.try_lower_ld_from_global_builtin(gate)? || self.try_lower_ld_for_builtin(gate)? {
            return Ok(());
        }

        let acc = LoadObjPropertyTypeInfoAccessor::new(self.env, self.circuit, gate, self.options.merge_poly)?;
        if acc.types_is_empty() || acc.has_illegal_type() {
            return Ok(());
        }
        let Some(receiver) = acc.receiver() else {
            return Ok(());
        };
        if acc.is_mono() {
            self.lower_mono_ld_obj_by_name(gate, receiver, &acc.access_infos()[0])
        } else {
            self.lower_poly_ld_obj_by_name(gate, receiver, acc.access_infos())
        }
    }

    fn lower_mono_ld_obj_by_name(&mut self, gate: GateRef, receiver: GateRef, info: &AccessInfo) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = b.check(
            CheckKind::ObjectType { hclass: info.receiver },
            vec![receiver],
            DeoptType::InconsistentHClass5,
        )?;

        let plr = info.plr;
        let (result, is_call) = if info.kind() == AccessKind::OnProto {
            b.check(CheckKind::ProtoChangeMarker, vec![receiver], DeoptType::PrototypeChanged1)?;
            let holder = info.holder;
            let deopt = DeoptType::InconsistentHClass8;
            if plr.is_accessor {
                let op = GateOp::MonoCallGetterOnProto { plr, holder, deopt };
                (b.effect_with_frame_state(op, vec![receiver])?, true)
            } else {
                let op = GateOp::MonoLoadPropertyOnProto { plr, holder, deopt };
                (b.effect_with_frame_state(op, vec![receiver])?, false)
            }
        } else {
            build_named_load(&mut b, receiver, receiver, plr)?
        };

        if is_call {
            b.replace_with_pending_exception(Some(result))
        } else {
            b.replace_hir(Some(result))
        }
    }

    fn lower_poly_ld_obj_by_name(&mut self, gate: GateRef, receiver: GateRef, infos: &[AccessInfo]) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let deopts = POLY_LOAD;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = b.check(CheckKind::HeapObject, vec![receiver], deopts.not_heap_object)?;
        let receiver_hclass = b.load_hclass(receiver);
        let init = b.undefined();
        let result = b.new_variable(init);
        let exit = b.new_label();

        let mut any_call = false;
        for (i, info) in infos.iter().enumerate() {
            let load = b.new_label();
            let next =
                dispatch_on_hclass(&mut b, receiver_hclass, &info.expected, load, i + 1 == infos.len(), deopts.last_candidate)?;
            b.bind(load);
            let holder = match info.kind() {
                AccessKind::OnProto => {
                    b.check(CheckKind::ProtoChangeMarker, vec![receiver], deopts.proto_changed)?;
                    walk_to_holder(&mut b, receiver_hclass, info.holder, deopts.chain_end)?
                }
                _ => receiver,
            };
            let (value, is_call) = build_named_load(&mut b, receiver, holder, info.plr)?;
            any_call |= is_call;
            b.write(result, value);
            b.jump(exit);
            if let Some(next) = next {
                b.bind(next);
            }
        }

        b.bind(exit);
        let value = b.read(result);
        if any_call {
            b.replace_with_pending_exception(Some(value))
        } else {
            b.replace_hir(Some(value))
        }
    }

    /// `Math.<constant>` read off the global builtin object. Only data
    /// properties of the object itself qualify.
    fn try_lower_ld_from_global_builtin(&mut self, gate: GateRef) -> LoweringResult<bool> {
        let acc = LoadBuiltinObjTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let (Some(receiver), Some(key)) = (acc.receiver(), acc.key()) else {
            return Ok(false);
        };
        let index = match self.circuit.op(receiver)? {
            GateOp::LoadBuiltinObject { index } => *index,
            _ => return Ok(false),
        };
        if BuiltinTypeId::GLOBAL_BUILTINS.get(index) != Some(&BuiltinTypeId::Math) {
            return Ok(false);
        }
        let heap = self.env.heap();
        let Some(hclass) = heap.builtin_object(BuiltinTypeId::Math).and_then(|m| heap.object(m)).map(|o| o.hclass)
        else {
            return Ok(false);
        };
        let plr = heap.lookup_property(hclass, key);
        if !plr.found || plr.is_accessor {
            return Ok(false);
        }

        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = b.check(
            CheckKind::MathHClassConsistency { hclass },
            vec![receiver],
            DeoptType::BuiltinHClassMismatch1,
        )?;
        let result = b.effect(GateOp::LoadProperty { plr }, vec![receiver]);
        b.replace_hir(Some(result))?;
        Ok(true)
    }

    /// Named loads whose receivers were profiled as builtins.
    fn try_lower_ld_for_builtin(&mut self, gate: GateRef) -> LoweringResult<bool> {
        let acc = LoadBuiltinObjTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if acc.has_no_type() {
            return Ok(false);
        }
        let (Some(receiver), Some(key)) = (acc.receiver(), acc.key().map(str::to_owned)) else {
            return Ok(false);
        };
        if let Some((kind, index)) = acc.globals_id() {
            return self.lower_ld_from_globals(gate, receiver, &key, kind, index as usize);
        }
        let Some(builtin) = acc.builtin_type() else {
            return Ok(false);
        };

        match key.as_str() {
            "length" if acc.is_builtins_array() => {
                self.add_profiling(gate)?;
                let no_check = self.no_check();
                let mut b = CircuitBuilder::at(self.circuit, gate)?;
                let array = if no_check || acc.receiver_is_create_array() {
                    receiver
                } else {
                    b.check(CheckKind::StableArray, vec![receiver], DeoptType::NotStableArray1)?
                };
                let length = b.effect(GateOp::LoadArrayLength, vec![array]);
                b.replace_hir(Some(length))?;
                Ok(true)
            }
            "length" if acc.is_builtins_string() => {
                self.lower_guarded_length(gate, receiver, CheckKind::EcmaString, DeoptType::NotString1, GateOp::LoadStringLength)
            }
            "length" if acc.is_builtins_typed_array() => {
                let Some(js_type) = acc.builtins_js_type() else {
                    return Ok(false);
                };
                self.lower_guarded_length(
                    gate,
                    receiver,
                    CheckKind::TypedArray(js_type),
                    DeoptType::NotTypedArray1,
                    GateOp::LoadTypedArrayLength,
                )
            }
            "size" if acc.is_builtins_map() => {
                self.lower_guarded_length(gate, receiver, CheckKind::EcmaMap, DeoptType::NotJsMap1, GateOp::LoadMapSize)
            }
            _ => self.lower_ld_builtin_prototype_property(gate, &acc, receiver, &key, builtin),
        }
    }

    fn lower_guarded_length(
        &mut self,
        gate: GateRef,
        receiver: GateRef,
        kind: CheckKind,
        deopt: DeoptType,
        load: GateOp,
    ) -> LoweringResult<bool> {
        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = if no_check { receiver } else { b.check(kind, vec![receiver], deopt)? };
        let length = b.effect(load, vec![receiver]);
        b.replace_hir(Some(length))?;
        Ok(true)
    }

    /// A method such as `arr.push` read off a builtin prototype: the
    /// receiver family guard plus the prototype's shape pin the slot.
    fn lower_ld_builtin_prototype_property(
        &mut self,
        gate: GateRef,
        acc: &LoadBuiltinObjTypeInfoAccessor,
        receiver: GateRef,
        key: &str,
        builtin: BuiltinTypeId,
    ) -> LoweringResult<bool> {
        let family = if acc.is_builtins_array() {
            (!acc.receiver_is_create_array()).then_some((CheckKind::StableArray, DeoptType::NotStableArray2))
        } else if acc.is_builtins_string() {
            Some((CheckKind::EcmaString, DeoptType::NotString1))
        } else if acc.is_builtins_map() {
            Some((CheckKind::EcmaMap, DeoptType::NotJsMap1))
        } else if let (true, Some(js_type)) = (acc.is_builtins_typed_array(), acc.builtins_js_type()) {
            Some((CheckKind::TypedArray(js_type), DeoptType::NotTypedArray1))
        } else {
            return Ok(false);
        };

        let heap = self.env.heap();
        let (Some(proto), Some(proto_hclass)) = (heap.builtin_prototype(builtin), heap.builtin_prototype_hclass(builtin))
        else {
            return Ok(false);
        };
        let plr = heap.lookup_property(proto_hclass, key);
        if !plr.found || plr.is_accessor {
            return Ok(false);
        }

        self.add_profiling(gate)?;
        let no_check = self.no_check();
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = match family {
            Some((kind, deopt)) if !no_check => b.check(kind, vec![receiver], deopt)?,
            _ => receiver,
        };
        b.check(
            CheckKind::BuiltinPrototypeHClass { builtin, hclass: proto_hclass },
            vec![receiver],
            DeoptType::BuiltinPrototypeHClassMismatch1,
        )?;
        let holder = b.constant(proto.to_value());
        let result = b.effect(GateOp::LoadProperty { plr }, vec![holder]);
        b.replace_hir(Some(result))?;
        Ok(true)
    }

    /// Property of a global-constant or global-environment object.
    fn lower_ld_from_globals(
        &mut self,
        gate: GateRef,
        receiver: GateRef,
        key: &str,
        kind: GlobalsKind,
        index: usize,
    ) -> LoweringResult<bool> {
        let heap = self.env.heap();
        let (hclass, deopt) = match kind {
            GlobalsKind::Constant => (heap.global_const_hclass(index), DeoptType::InconsistentHClass11),
            GlobalsKind::Env => (heap.global_env_hclass(index), DeoptType::InconsistentHClass12),
        };
        let Some(hclass) = hclass else {
            return Ok(false);
        };
        let plr = heap.lookup_property(hclass, key);
        if !plr.found || plr.is_accessor {
            return Ok(false);
        }

        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = b.check(CheckKind::ObjectType { hclass }, vec![receiver], deopt)?;
        let result = b.effect(GateOp::LoadProperty { plr }, vec![receiver]);
        b.replace_hir(Some(result))?;
        Ok(true)
    }

    /// `STOBJBYNAME`, `STTHISBYNAME`, `STOWNBYNAME` and `DEFINE*BYNAME`.
    pub(super) fn lower_st_obj_by_name(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = StoreObjByNameTypeInfoAccessor::new(self.env, self.circuit, gate, self.options.merge_poly)?;
        if acc.types_is_empty() || acc.has_illegal_type() {
            return Ok(());
        }
        let Some(receiver) = acc.receiver() else {
            return Ok(());
        };
        if acc.is_mono() {
            self.lower_mono_st_obj_by_name(gate, receiver, acc.value(), &acc.access_infos()[0])
        } else {
            self.lower_poly_st_obj_by_name(gate, receiver, acc.value(), acc.access_infos())
        }
    }

    fn lower_mono_st_obj_by_name(
        &mut self,
        gate: GateRef,
        receiver: GateRef,
        value: GateRef,
        info: &AccessInfo,
    ) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = b.check(
            CheckKind::ObjectType { hclass: info.receiver },
            vec![receiver],
            DeoptType::InconsistentHClass5,
        )?;

        let plr = info.plr;
        let is_call = match info.kind() {
            AccessKind::Own => build_named_store(&mut b, receiver, receiver, value, plr)?,
            AccessKind::OnProto => {
                b.check(CheckKind::ProtoChangeMarker, vec![receiver], DeoptType::PrototypeChanged2)?;
                let op = GateOp::MonoStorePropertyLookUpProto {
                    plr,
                    holder: info.holder,
                    deopt: DeoptType::InconsistentHClass9,
                };
                b.effect_with_frame_state(op, vec![receiver, value])?;
                true
            }
            AccessKind::Transition => {
                let receiver_hclass = b.hclass_constant(info.receiver);
                guard_transition(&mut b, receiver_hclass, info)?;
                let op = GateOp::MonoStoreProperty {
                    plr,
                    new_hclass: info.transition,
                    is_prototype: info.receiver_is_prototype,
                };
                b.effect_with_frame_state(op, vec![receiver, value])?;
                false
            }
        };

        if is_call {
            b.replace_with_pending_exception(None)
        } else {
            b.replace_hir(None)
        }
    }

    fn lower_poly_st_obj_by_name(
        &mut self,
        gate: GateRef,
        receiver: GateRef,
        value: GateRef,
        infos: &[AccessInfo],
    ) -> LoweringResult<()> {
        self.add_profiling(gate)?;
        let deopts = POLY_STORE;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let receiver = b.check(CheckKind::HeapObject, vec![receiver], deopts.not_heap_object)?;
        let receiver_hclass = b.load_hclass(receiver);
        let exit = b.new_label();

        let mut any_call = false;
        for (i, info) in infos.iter().enumerate() {
            let store = b.new_label();
            let next =
                dispatch_on_hclass(&mut b, receiver_hclass, &info.expected, store, i + 1 == infos.len(), deopts.last_candidate)?;
            b.bind(store);
            match info.kind() {
                AccessKind::Own => {
                    any_call |= build_named_store(&mut b, receiver, receiver, value, info.plr)?;
                }
                AccessKind::OnProto => {
                    b.check(CheckKind::ProtoChangeMarker, vec![receiver], deopts.proto_changed)?;
                    let holder = walk_to_holder(&mut b, receiver_hclass, info.holder, deopts.chain_end)?;
                    any_call |= build_named_store(&mut b, receiver, holder, value, info.plr)?;
                }
                AccessKind::Transition => {
                    build_transition_store(&mut b, receiver, receiver_hclass, value, info)?;
                }
            }
            b.jump(exit);
            if let Some(next) = next {
                b.bind(next);
            }
        }

        b.bind(exit);
        if any_call {
            b.replace_with_pending_exception(None)
        } else {
            b.replace_hir(None)
        }
    }

    /// Loads the private key from the lexical environment and guards it:
    /// a function for accessor members, a symbol for fields.
    fn private_key(b: &mut CircuitBuilder<'_>, level: u32, slot: u32, is_accessor: bool) -> LoweringResult<GateRef> {
        let env = b.circuit_mut().arg(ArgKind::LexEnv);
        let key = b.effect(GateOp::GetKeyFromLexicalEnv { level, slot }, vec![env]);
        let key = b.check(CheckKind::HeapObject, vec![key], DeoptType::NotHeapObject1)?;
        let (test, deopt) = if is_accessor {
            (GateOp::IsJSFunction, DeoptType::NotJsFunction)
        } else {
            (GateOp::TaggedIsSymbol, DeoptType::NotSymbol)
        };
        let cond = b.pure(test, vec![key]);
        b.deopt_check(cond, deopt)?;
        Ok(key)
    }

    /// `LDPRIVATEPROPERTY`.
    pub(super) fn lower_ld_private_property(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = LoadPrivatePropertyTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let Some(info) = acc.access_info().cloned() else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let key = Self::private_key(&mut b, acc.level(), acc.slot(), acc.is_accessor())?;
        if acc.is_accessor() {
            let result = b.effect_with_frame_state(GateOp::CallPrivateGetter, vec![acc.receiver(), key])?;
            return b.replace_with_pending_exception(Some(result));
        }
        let receiver = b.check(
            CheckKind::ObjectType { hclass: info.receiver },
            vec![acc.receiver()],
            DeoptType::InconsistentHClass7,
        )?;
        let result = b.effect(GateOp::LoadProperty { plr: info.plr }, vec![receiver]);
        b.replace_hir(Some(result))
    }

    /// `STPRIVATEPROPERTY`.
    pub(super) fn lower_st_private_property(&mut self, gate: GateRef) -> LoweringResult<()> {
        let acc = StorePrivatePropertyTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        let Some(info) = acc.access_info().cloned() else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let key = Self::private_key(&mut b, acc.level(), acc.slot(), acc.is_accessor())?;
        if acc.is_accessor() {
            b.effect_with_frame_state(GateOp::CallPrivateSetter, vec![acc.receiver(), key, acc.value()])?;
            return b.replace_with_pending_exception(None);
        }
        let receiver = b.check(
            CheckKind::ObjectType { hclass: info.receiver },
            vec![acc.receiver()],
            DeoptType::InconsistentHClass7,
        )?;
        b.effect(GateOp::StoreProperty { plr: info.plr }, vec![receiver, acc.value()]);
        b.replace_hir(None)
    }

    /// `TRYLDGLOBALBYNAME`: global builtins become a table load; under JIT a
    /// global variable reads its property box directly.
    pub(super) fn lower_try_ld_global_by_name(&mut self, gate: GateRef) -> LoweringResult<()> {
        if !self.options.enable_lowering_builtin {
            return Ok(());
        }
        let acc = LoadGlobalTypeInfoAccessor::new(self.env, self.circuit, gate)?;
        if let Some(index) = acc.builtin_index() {
            self.add_profiling(gate)?;
            let mut b = CircuitBuilder::at(self.circuit, gate)?;
            let object = b.effect(GateOp::LoadBuiltinObject { index }, vec![]);
            return b.replace_hir(Some(object));
        }
        let Some(cell) = acc.property_box().filter(|_| self.options.jit_compile) else {
            return Ok(());
        };
        self.add_profiling(gate)?;
        let mut b = CircuitBuilder::at(self.circuit, gate)?;
        let cell = b.constant(cell.to_value());
        let value = b.effect(GateOp::LoadPropertyBoxValue, vec![cell]);
        let valid = b.pure(GateOp::TaggedIsNotHole, vec![value]);
        b.deopt_check(valid, DeoptType::PropertyBoxInvalid)?;
        b.replace_hir(Some(value))
    }
}
