//! Profile decoder interface and the in-memory profile store.

use std::collections::{BTreeMap, HashMap};

use bytecode_system::MethodId;

use crate::error::ProfileError;
use crate::profile_type::{PgoTypeRecord, PgoTypeRef};

/// Source of profile records for compiled methods.
pub trait ProfileDecoder: Send + Sync {
    /// Invokes `callback` with every `(bytecode offset, record)` pair
    /// recorded for `method` of `record_name` in `file`.
    fn get_type_info(
        &self,
        file: &str,
        record_name: &str,
        method: MethodId,
        callback: &mut dyn FnMut(u32, PgoTypeRef<'_>),
    );

    /// File name registered for a profile file id.
    fn abc_name_by_id(&self, abc_id: u32) -> Option<&str>;
}

type MethodKey = (String, String, MethodId);

/// Profile decoder backed by records held in memory.
///
/// # Examples
///
/// ```
/// use bytecode_system::MethodId;
/// use pgo_profiler::{PGOSampleType, PgoTypeRecord, ProfileDecoder, ProfileStore, SampleKind};
///
/// let mut store = ProfileStore::new();
/// let abc = store.add_abc("app.abc");
/// store
///     .record("app.abc", "main", MethodId(16), 4, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::Int)))
///     .unwrap();
///
/// let mut seen = Vec::new();
/// store.get_type_info("app.abc", "main", MethodId(16), &mut |offset, _| seen.push(offset));
/// assert_eq!(seen, vec![4]);
/// assert_eq!(store.abc_name_by_id(abc), Some("app.abc"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct ProfileStore {
    abc_names: Vec<String>,
    methods: HashMap<MethodKey, BTreeMap<u32, PgoTypeRecord>>,
}

impl ProfileStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file in the profile's file table and returns its id.
    /// Ids start at 1; registering a name twice returns the first id.
    pub fn add_abc(&mut self, name: &str) -> u32 {
        if let Some(pos) = self.abc_names.iter().position(|n| n == name) {
            return pos as u32 + 1;
        }
        self.abc_names.push(name.to_string());
        self.abc_names.len() as u32
    }

    /// Stores `record` at `offset`, replacing any earlier record there.
    ///
    /// Fails when the record names a file id that was never registered.
    pub fn record(
        &mut self,
        file: &str,
        record_name: &str,
        method: MethodId,
        offset: u32,
        record: PgoTypeRecord,
    ) -> Result<(), ProfileError> {
        for pt in record.profile_types() {
            if pt.is_file_bound() && self.abc_name_by_id(pt.abc_id).is_none() {
                return Err(ProfileError::UnknownAbcId(pt.abc_id));
            }
        }
        self.methods
            .entry((file.to_string(), record_name.to_string(), method))
            .or_default()
            .insert(offset, record);
        Ok(())
    }

    /// Number of records held for a method.
    pub fn record_count(&self, file: &str, record_name: &str, method: MethodId) -> usize {
        self.methods
            .get(&(file.to_string(), record_name.to_string(), method))
            .map_or(0, BTreeMap::len)
    }
}

impl ProfileDecoder for ProfileStore {
    fn get_type_info(
        &self,
        file: &str,
        record_name: &str,
        method: MethodId,
        callback: &mut dyn FnMut(u32, PgoTypeRef<'_>),
    ) {
        let key = (file.to_string(), record_name.to_string(), method);
        if let Some(records) = self.methods.get(&key) {
            for (offset, record) in records {
                callback(*offset, record.as_type_ref());
            }
        }
    }

    fn abc_name_by_id(&self, abc_id: u32) -> Option<&str> {
        let index = abc_id.checked_sub(1)? as usize;
        self.abc_names.get(index).map(String::as_str)
    }
}
