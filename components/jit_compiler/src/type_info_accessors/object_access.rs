//! Accessors of named and private property accesses
//!
//! Each profiled receiver shape is resolved against the locked heap into an
//! [`AccessInfo`]: where the property lives relative to the receiver and
//! which slot holds it. A candidate that cannot be resolved makes the whole
//! access illegal, since dispatching on a subset of the profiled shapes
//! would turn the missing ones into deopts.

use arrayvec::ArrayVec;
use bytecode_system::EcmaOpcode;
use object_model::{HClassId, ObjectModel, PropertyLookupResult};
use pgo_profiler::{PGOObjectInfo, ProfileType};

use super::{bytecode_info, receiver_of, TypeInfoAccessor, MAX_POLY_CANDIDATES};
use crate::circuit::{Circuit, GateRef};
use crate::compilation_env::CompilationEnv;
use crate::error::LoweringResult;

/// Where a property lives relative to the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Own slot of the receiver
    Own,
    /// Slot of an object on the prototype chain
    OnProto,
    /// Store adding the property through a hidden class transition
    Transition,
}

/// Resolved access for one or more receiver shapes
#[derive(Debug, Clone, PartialEq)]
pub struct AccessInfo {
    /// First receiver shape
    pub receiver: HClassId,
    /// Shape of the object holding the property
    pub holder: HClassId,
    /// Receiver shape after a transitioning store; `holder` otherwise
    pub transition: HClassId,
    /// Resolved slot
    pub plr: PropertyLookupResult,
    /// Every receiver shape sharing this access
    pub expected: ArrayVec<HClassId, MAX_POLY_CANDIDATES>,
    /// Receivers of this shape are prototypes
    pub receiver_is_prototype: bool,
}

impl AccessInfo {
    fn new(receiver: HClassId, holder: HClassId, transition: HClassId, plr: PropertyLookupResult, heap: &ObjectModel) -> Self {
        let mut expected = ArrayVec::new();
        expected.push(receiver);
        Self {
            receiver,
            holder,
            transition,
            plr,
            expected,
            receiver_is_prototype: heap.hclass(receiver).is_some_and(|h| h.is_prototype),
        }
    }

    /// Where the property lives.
    pub fn kind(&self) -> AccessKind {
        if self.transition != self.holder {
            AccessKind::Transition
        } else if self.receiver != self.holder {
            AccessKind::OnProto
        } else {
            AccessKind::Own
        }
    }

    fn can_merge(&self, other: &AccessInfo) -> bool {
        self.kind() == other.kind()
            && self.holder == other.holder
            && self.transition == other.transition
            && self.plr == other.plr
    }
}

fn class_of(env: &CompilationEnv<'_>, pt: &ProfileType) -> Option<HClassId> {
    if !env.recorder().is_valid_pt(pt) {
        return None;
    }
    pt.hclass()
}

/// Resolved candidates of one access site.
#[derive(Debug, Clone, Default)]
struct Candidates {
    infos: Vec<AccessInfo>,
    count: usize,
    illegal: bool,
}

impl Candidates {
    fn collect(
        env: &CompilationEnv<'_>,
        object_infos: &[PGOObjectInfo],
        merge_poly: bool,
        resolve: impl Fn(&ObjectModel, HClassId, HClassId, HClassId) -> Option<AccessInfo>,
    ) -> Self {
        let mut candidates = Candidates { count: object_infos.len(), ..Default::default() };
        if object_infos.len() > MAX_POLY_CANDIDATES {
            candidates.illegal = true;
            return candidates;
        }
        for info in object_infos {
            let classes = (
                class_of(env, &info.receiver),
                class_of(env, &info.holder),
                class_of(env, &info.holder_transition),
            );
            let (Some(receiver), Some(holder), Some(transition)) = classes else {
                candidates.illegal = true;
                return candidates;
            };
            let Some(access) = resolve(env.heap(), receiver, holder, transition) else {
                candidates.illegal = true;
                return candidates;
            };
            candidates.push(access, merge_poly);
        }
        candidates
    }

    fn push(&mut self, access: AccessInfo, merge_poly: bool) {
        if let Some(existing) = self.infos.iter_mut().find(|i| i.can_merge(&access)) {
            if existing.expected.contains(&access.receiver) {
                return;
            }
            if merge_poly && !existing.expected.is_full() {
                existing.expected.push(access.receiver);
                return;
            }
        }
        self.infos.push(access);
    }

    fn is_mono(&self) -> bool {
        self.infos.len() == 1 && self.infos[0].expected.len() == 1
    }
}

fn resolve_load(heap: &ObjectModel, key: &str, receiver: HClassId, holder: HClassId) -> Option<AccessInfo> {
    let (found, depth, plr) = heap.find_holder(receiver, key)?;
    if found != holder || (depth == 0) != (receiver == holder) {
        return None;
    }
    Some(AccessInfo::new(receiver, holder, holder, plr, heap))
}

fn resolve_store(
    heap: &ObjectModel,
    key: &str,
    receiver: HClassId,
    holder: HClassId,
    transition: HClassId,
) -> Option<AccessInfo> {
    if holder == transition {
        let (found, depth, plr) = heap.find_holder(receiver, key)?;
        if found != holder || (depth == 0) != (receiver == holder) {
            return None;
        }
        // Stores only reach a prototype through its setter.
        if receiver != holder && !plr.is_accessor {
            return None;
        }
        if !plr.is_accessor && !plr.writable {
            return None;
        }
        return Some(AccessInfo::new(receiver, holder, transition, plr, heap));
    }
    if receiver != holder || heap.lookup_property(receiver, key).found {
        return None;
    }
    if heap.transition_target(receiver, key) != Some(transition) {
        return None;
    }
    let plr = heap.lookup_property(transition, key);
    if !plr.found || plr.is_accessor {
        return None;
    }
    Some(AccessInfo::new(receiver, holder, transition, plr, heap))
}

macro_rules! candidate_queries {
    () => {
        /// No shape was profiled.
        pub fn types_is_empty(&self) -> bool {
            self.candidates.count == 0
        }

        /// Some profiled shape cannot be resolved, or there are too many.
        pub fn has_illegal_type(&self) -> bool {
            self.candidates.illegal || self.candidates.infos.is_empty()
        }

        /// Exactly one receiver shape.
        pub fn is_mono(&self) -> bool {
            self.candidates.is_mono()
        }

        /// Number of resolved accesses after merging.
        pub fn type_count(&self) -> usize {
            self.candidates.infos.len()
        }

        /// Resolved access `i`.
        pub fn access_info(&self, i: usize) -> Option<&AccessInfo> {
            self.candidates.infos.get(i)
        }

        /// Every resolved access.
        pub fn access_infos(&self) -> &[AccessInfo] {
            &self.candidates.infos
        }

        /// Property key.
        pub fn key(&self) -> &str {
            &self.key
        }
    };
}

/// Named property load
#[derive(Debug, Clone)]
pub struct LoadObjPropertyTypeInfoAccessor {
    gate: GateRef,
    receiver: Option<GateRef>,
    key: String,
    candidates: Candidates,
}

impl LoadObjPropertyTypeInfoAccessor {
    /// Reads a `LDOBJBYNAME`/`LDTHISBYNAME` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef, merge_poly: bool) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let receiver = receiver_of(circuit, gate, info.opcode)?;
        let key = info.key.clone().unwrap_or_default();
        let candidates = match env.recorder().rw_type(info.pc_offset) {
            Some(rw) if !key.is_empty() => Candidates::collect(env, rw.infos(), merge_poly, |heap, r, h, _| {
                resolve_load(heap, &key, r, h)
            }),
            _ => Candidates::default(),
        };
        Ok(Self { gate, receiver, key, candidates })
    }

    /// Receiver operand, absent for a `this` load without a `this` argument.
    pub fn receiver(&self) -> Option<GateRef> {
        self.receiver
    }

    candidate_queries!();
}

impl TypeInfoAccessor for LoadObjPropertyTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// Named property store
#[derive(Debug, Clone)]
pub struct StoreObjByNameTypeInfoAccessor {
    gate: GateRef,
    receiver: Option<GateRef>,
    value: GateRef,
    key: String,
    candidates: Candidates,
}

impl StoreObjByNameTypeInfoAccessor {
    /// Reads a `STOBJBYNAME`, `STTHISBYNAME`, `STOWNBYNAME` or
    /// `DEFINE*BYNAME` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef, merge_poly: bool) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let receiver = receiver_of(circuit, gate, info.opcode)?;
        let value_index = if info.opcode == EcmaOpcode::StThisByName { 0 } else { 1 };
        let value = circuit.value_in(gate, value_index)?;
        let key = info.key.clone().unwrap_or_default();
        let candidates = match env.recorder().rw_type(info.pc_offset) {
            Some(rw) if !key.is_empty() => Candidates::collect(env, rw.infos(), merge_poly, |heap, r, h, t| {
                resolve_store(heap, &key, r, h, t)
            }),
            _ => Candidates::default(),
        };
        Ok(Self { gate, receiver, value, key, candidates })
    }

    /// Receiver operand.
    pub fn receiver(&self) -> Option<GateRef> {
        self.receiver
    }

    /// Stored value.
    pub fn value(&self) -> GateRef {
        self.value
    }

    candidate_queries!();
}

impl TypeInfoAccessor for StoreObjByNameTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// Private field site shared by loads and stores.
#[derive(Debug, Clone)]
struct PrivateSite {
    receiver: GateRef,
    level: u32,
    slot: u32,
    access: Option<AccessInfo>,
}

impl PrivateSite {
    fn read(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let info = bytecode_info(circuit, gate)?;
        let receiver = circuit.value_in(gate, 0)?;
        let level = info.imms.first().copied().unwrap_or(0);
        let slot = info.imms.get(1).copied().unwrap_or(0);
        let access = match (env.recorder().rw_type(info.pc_offset), info.key.as_deref()) {
            (Some(rw), Some(name)) if rw.count() == 1 => rw.object_info(0).and_then(|object_info| {
                let receiver = class_of(env, &object_info.receiver)?;
                let holder = class_of(env, &object_info.holder)?;
                if receiver != holder {
                    return None;
                }
                let plr = env.heap().lookup_property(receiver, name);
                plr.found.then(|| AccessInfo::new(receiver, holder, holder, plr, env.heap()))
            }),
            _ => None,
        };
        Ok(Self { receiver, level, slot, access })
    }
}

macro_rules! private_queries {
    () => {
        /// Receiver operand.
        pub fn receiver(&self) -> GateRef {
            self.site.receiver
        }

        /// Lexical environment depth of the private key.
        pub fn level(&self) -> u32 {
            self.site.level
        }

        /// Lexical environment slot of the private key.
        pub fn slot(&self) -> u32 {
            self.site.slot
        }

        /// Private members are only lowered for a single resolved shape.
        pub fn has_illegal_type(&self) -> bool {
            self.site.access.is_none()
        }

        /// The member is an accessor pair.
        pub fn is_accessor(&self) -> bool {
            self.site.access.as_ref().is_some_and(|a| a.plr.is_accessor)
        }

        /// Resolved access of the single shape.
        pub fn access_info(&self) -> Option<&AccessInfo> {
            self.site.access.as_ref()
        }
    };
}

/// Private field load
#[derive(Debug, Clone)]
pub struct LoadPrivatePropertyTypeInfoAccessor {
    gate: GateRef,
    site: PrivateSite,
}

impl LoadPrivatePropertyTypeInfoAccessor {
    /// Reads a `LDPRIVATEPROPERTY` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        Ok(Self { gate, site: PrivateSite::read(env, circuit, gate)? })
    }

    private_queries!();
}

impl TypeInfoAccessor for LoadPrivatePropertyTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}

/// Private field store
#[derive(Debug, Clone)]
pub struct StorePrivatePropertyTypeInfoAccessor {
    gate: GateRef,
    value: GateRef,
    site: PrivateSite,
}

impl StorePrivatePropertyTypeInfoAccessor {
    /// Reads a `STPRIVATEPROPERTY` gate.
    pub fn new(env: &CompilationEnv<'_>, circuit: &Circuit, gate: GateRef) -> LoweringResult<Self> {
        let site = PrivateSite::read(env, circuit, gate)?;
        Ok(Self { gate, value: circuit.value_in(gate, 1)?, site })
    }

    /// Stored value.
    pub fn value(&self) -> GateRef {
        self.value
    }

    private_queries!();
}

impl TypeInfoAccessor for StorePrivatePropertyTypeInfoAccessor {
    fn gate(&self) -> GateRef {
        self.gate
    }
}
