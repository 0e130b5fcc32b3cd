//! Profile-guided type feedback for the speculative compiler.
//!
//! Profiles are recorded while methods run in the interpreter. This crate
//! holds the record vocabulary, the decoder interface the compiler pulls
//! records through, and [`PGOTypeRecorder`], the per-method view the
//! lowering pass consults.
//!
//! # Examples
//!
//! ```
//! use bytecode_system::{FileId, MethodId};
//! use pgo_profiler::{
//!     LoadedFiles, PGOSampleType, PGOTypeRecorder, PgoTypeRecord, ProfileStore, SampleKind,
//! };
//!
//! let mut store = ProfileStore::new();
//! store.add_abc("main.abc");
//! store
//!     .record("main", "main", MethodId(1), 0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::Number)))
//!     .unwrap();
//!
//! let mut loaded = LoadedFiles::new();
//! loaded.load("main.abc", FileId(1));
//!
//! let recorder = PGOTypeRecorder::new(&store, &loaded, "main", "main", MethodId(1)).unwrap();
//! assert!(recorder.sample_type(0).unwrap().is_number());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod decoder;
mod error;
mod loaded_files;
mod profile_type;
mod recorder;

pub use decoder::{ProfileDecoder, ProfileStore};
pub use error::ProfileError;
pub use loaded_files::{normalize_file_desc, LoadedFiles};
pub use profile_type::{
    GlobalsKind, PGODefineOpType, PGOObjectInfo, PGOProtoTransitionType, PGORWOpType,
    PGOSampleType, PgoTypeRecord, PgoTypeRef, ProfileKind, ProfileType, SampleKind,
};
pub use recorder::PGOTypeRecorder;
