//! Per-method view of profile records, keyed by bytecode offset.

use std::collections::{HashMap, HashSet};

use bytecode_system::MethodId;
use core_types::ElementsKind;
use tracing::debug;

use crate::decoder::ProfileDecoder;
use crate::error::ProfileError;
use crate::loaded_files::{normalize_file_desc, LoadedFiles};
use crate::profile_type::{
    PGODefineOpType, PGORWOpType, PGOSampleType, PgoTypeRef, ProfileKind, ProfileType,
};

/// Profile records of one compiled method.
///
/// Built once when compilation of the method starts and read-only
/// afterwards; compilations share it as an `Arc` snapshot.
#[derive(Debug, Default, Clone)]
pub struct PGOTypeRecorder {
    samples: HashMap<u32, PGOSampleType>,
    rw_types: HashMap<u32, PGORWOpType>,
    define_types: HashMap<u32, PGODefineOpType>,
    valid_abc_ids: HashSet<u32>,
}

impl PGOTypeRecorder {
    /// Collects the records of `method` from `decoder`.
    ///
    /// Fails on a record kind other than sample, read/write or define.
    pub fn new(
        decoder: &dyn ProfileDecoder,
        loaded: &LoadedFiles,
        file: &str,
        record_name: &str,
        method: MethodId,
    ) -> Result<Self, ProfileError> {
        let mut recorder = Self::default();
        let mut first_error = None;
        decoder.get_type_info(file, record_name, method, &mut |offset, ty| {
            if first_error.is_some() {
                return;
            }
            match ty {
                PgoTypeRef::Sample(s) => {
                    recorder.samples.insert(offset, *s);
                }
                PgoTypeRef::RwOp(rw) => {
                    recorder.rw_types.insert(offset, rw.clone());
                }
                PgoTypeRef::DefineOp(d) => {
                    recorder.define_types.insert(offset, *d);
                }
                other => {
                    first_error = Some(ProfileError::UnknownTypeKind { offset, kind: other.kind_name() });
                }
            }
        });
        if let Some(err) = first_error {
            return Err(err);
        }

        let abc_ids: HashSet<u32> = recorder.all_profile_types().map(|pt| pt.abc_id).collect();
        for abc_id in abc_ids {
            let valid = decoder
                .abc_name_by_id(abc_id)
                .is_some_and(|name| loaded.is_loaded(normalize_file_desc(name)));
            if valid {
                recorder.valid_abc_ids.insert(abc_id);
            }
        }

        debug!(
            method = method.0,
            samples = recorder.samples.len(),
            rw = recorder.rw_types.len(),
            define = recorder.define_types.len(),
            "pgo type recorder built"
        );
        Ok(recorder)
    }

    fn all_profile_types(&self) -> impl Iterator<Item = ProfileType> + '_ {
        let samples = self.samples.values().filter_map(|s| s.profile_type().copied());
        let rw = self
            .rw_types
            .values()
            .flat_map(|rw| rw.infos().iter())
            .flat_map(|i| [i.receiver, i.holder, i.holder_transition]);
        let define = self.define_types.values().flat_map(|d| [d.profile_type, d.ctor]);
        samples.chain(rw).chain(define)
    }

    /// Record at `offset`, if any.
    pub fn get_pgo_type(&self, offset: u32) -> Option<PgoTypeRef<'_>> {
        if let Some(s) = self.samples.get(&offset) {
            return Some(PgoTypeRef::Sample(s));
        }
        if let Some(rw) = self.rw_types.get(&offset) {
            return Some(PgoTypeRef::RwOp(rw));
        }
        self.define_types.get(&offset).map(PgoTypeRef::DefineOp)
    }

    /// Scalar record at `offset`.
    pub fn sample_type(&self, offset: u32) -> Option<&PGOSampleType> {
        self.samples.get(&offset)
    }

    /// Read/write record at `offset`.
    pub fn rw_type(&self, offset: u32) -> Option<&PGORWOpType> {
        self.rw_types.get(&offset)
    }

    /// Definition record at `offset`.
    pub fn define_type(&self, offset: u32) -> Option<&PGODefineOpType> {
        self.define_types.get(&offset)
    }

    /// Elements kinds of the array receivers at a use site, before any
    /// transition. `[GENERIC]` when nothing was recorded.
    pub fn elements_kinds_for_user(&self, offset: u32) -> Vec<ElementsKind> {
        self.array_kinds(offset, ProfileType::elements_kind_before_transition)
    }

    /// Elements kinds of the array receivers at a use site, after the
    /// observed transition. `[GENERIC]` when nothing was recorded.
    pub fn transition_elements_kinds_for_user(&self, offset: u32) -> Vec<ElementsKind> {
        self.array_kinds(offset, ProfileType::elements_kind_after_transition)
    }

    fn array_kinds(&self, offset: u32, pick: fn(&ProfileType) -> ElementsKind) -> Vec<ElementsKind> {
        match self.rw_types.get(&offset) {
            Some(rw) if rw.count() > 0 => rw
                .infos()
                .iter()
                .filter(|info| info.receiver.is_builtins_array())
                .map(|info| pick(&info.receiver))
                .collect(),
            _ => vec![ElementsKind::GENERIC],
        }
    }

    /// Elements kind of arrays created at `offset`.
    pub fn elements_kind_for_creator(&self, offset: u32) -> ElementsKind {
        self.define_types.get(&offset).map_or(ElementsKind::NONE, |d| d.elements_kind)
    }

    /// Length of arrays created at `offset`.
    pub fn elements_length(&self, offset: u32) -> u32 {
        self.define_types.get(&offset).map_or(0, |d| d.elements_length)
    }

    /// Whether a profiled identity still refers to a loaded file.
    ///
    /// Builtin and global identities do not depend on a file.
    pub fn is_valid_pt(&self, pt: &ProfileType) -> bool {
        match pt.kind {
            ProfileKind::Class(_) | ProfileKind::Method(_) => self.valid_abc_ids.contains(&pt.abc_id),
            ProfileKind::None
            | ProfileKind::BuiltinFunctionId(_)
            | ProfileKind::Builtins { .. }
            | ProfileKind::Globals { .. } => true,
        }
    }

    /// No records at all.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.rw_types.is_empty() && self.define_types.is_empty()
    }
}
