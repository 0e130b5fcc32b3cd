//! Unit tests for building type recorders from a profile store

use bytecode_system::{FileId, MethodId};
use core_types::{BuiltinsStubId, ElementsKind};
use object_model::HClassId;
use pgo_profiler::{
    LoadedFiles, PGODefineOpType, PGOObjectInfo, PGORWOpType, PGOSampleType, PGOTypeRecorder,
    PgoTypeRecord, ProfileStore, ProfileType, SampleKind,
};

#[cfg(test)]
mod recorder_tests {
    use super::*;

    const METHOD: MethodId = MethodId(64);

    #[test]
    fn test_records_are_scoped_to_method() {
        let mut store = ProfileStore::new();
        store.add_abc("lib.abc");
        store
            .record("lib", "lib", METHOD, 0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::Double)))
            .unwrap();
        store
            .record("lib", "lib", MethodId(65), 0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::String)))
            .unwrap();

        let rec = PGOTypeRecorder::new(&store, &LoadedFiles::new(), "lib", "lib", METHOD).unwrap();
        let sample = rec.sample_type(0).unwrap();
        assert!(sample.is_number());
        assert!(!sample.is_string());
    }

    #[test]
    fn test_missing_method_gives_empty_recorder() {
        let store = ProfileStore::new();
        let rec = PGOTypeRecorder::new(&store, &LoadedFiles::new(), "x", "x", METHOD).unwrap();
        assert!(rec.is_empty());
    }

    #[test]
    fn test_define_record_queries() {
        let mut store = ProfileStore::new();
        store.add_abc("lib.abc");
        let define = PGODefineOpType {
            profile_type: ProfileType::builtins_array(ElementsKind::NUMBER, ElementsKind::NUMBER),
            elements_kind: ElementsKind::NUMBER,
            elements_length: 12,
            ..Default::default()
        };
        store.record("lib", "lib", METHOD, 20, PgoTypeRecord::DefineOp(define)).unwrap();
        let rec = PGOTypeRecorder::new(&store, &LoadedFiles::new(), "lib", "lib", METHOD).unwrap();
        assert_eq!(rec.elements_kind_for_creator(20), ElementsKind::NUMBER);
        assert_eq!(rec.elements_length(20), 12);
    }

    #[test]
    fn test_unloading_a_file_invalidates_its_classes() {
        let mut store = ProfileStore::new();
        let abc = store.add_abc("/data/lib.abc");
        let class = ProfileType::class(abc, HClassId(3));
        store
            .record(
                "lib",
                "lib",
                METHOD,
                4,
                PgoTypeRecord::RwOp(PGORWOpType::new(vec![PGOObjectInfo::own(class)])),
            )
            .unwrap();

        let mut loaded = LoadedFiles::new();
        loaded.load("lib.abc", FileId(1));
        let live = PGOTypeRecorder::new(&store, &loaded, "lib", "lib", METHOD).unwrap();
        assert!(live.is_valid_pt(&class));

        loaded.unload("lib");
        let stale = PGOTypeRecorder::new(&store, &loaded, "lib", "lib", METHOD).unwrap();
        assert!(!stale.is_valid_pt(&class));
        assert!(stale.is_valid_pt(&ProfileType::builtin_function(BuiltinsStubId::MathSqrt)));
    }
}
