//! Profile-guided typed lowering for the optimizing JIT tier
//!
//! This crate provides:
//! - Circuit: the sea-of-nodes graph a method is compiled on
//! - Type info accessors: typed views of bytecode gates backed by profile
//!   feedback and the heap's hidden classes
//! - TypedBytecodeLowering: rewrites generic bytecode gates into typed
//!   operations guarded by deoptimizing checks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytecode_system::{CallMethodFlagMap, EcmaOpcode, FileId, MethodId, MethodLiteral, MethodTable};
//! use jit_compiler::circuit::{ArgKind, BytecodeInfo, GateOp};
//! use jit_compiler::{Circuit, CompilationEnv, LoweringOptions, TypedBytecodeLowering};
//! use object_model::{ObjectModel, SharedObjectModel};
//! use pgo_profiler::{LoadedFiles, PGOSampleType, PGOTypeRecorder, PgoTypeRecord, ProfileStore, SampleKind};
//!
//! let mut store = ProfileStore::new();
//! store.add_abc("app.abc");
//! store
//!     .record("app", "main", MethodId(1), 0, PgoTypeRecord::Sample(PGOSampleType::sample(SampleKind::Int)))
//!     .unwrap();
//! let mut loaded = LoadedFiles::new();
//! loaded.load("app.abc", FileId(1));
//! let mut methods = MethodTable::new();
//! methods.add_method(FileId(1), MethodLiteral::new(MethodId(1), "main", 2), 0).unwrap();
//! let flags = CallMethodFlagMap::new();
//!
//! // a + b
//! let mut circuit = Circuit::new();
//! let (state, depend) = (circuit.state_entry(), circuit.depend_entry());
//! let a = circuit.arg(ArgKind::Param(0));
//! let b = circuit.arg(ArgKind::Param(1));
//! let add = circuit.new_gate(
//!     GateOp::JsBytecode(BytecodeInfo::new(EcmaOpcode::Add2, 0)),
//!     vec![state],
//!     vec![depend],
//!     vec![a, b],
//! );
//! let frame_state = circuit.new_gate(GateOp::FrameState { pc_offset: 0 }, vec![], vec![], vec![]);
//! circuit.set_frame_state(add, frame_state).unwrap();
//!
//! let heap = SharedObjectModel::new(ObjectModel::new());
//! let guard = heap.lock_for_compile();
//! let recorder = PGOTypeRecorder::new(&store, &loaded, "app", "main", MethodId(1)).unwrap();
//! let env = CompilationEnv::new(&guard, Arc::new(recorder), &methods, &flags, FileId(1), MethodId(1));
//! let stats = TypedBytecodeLowering::new(&mut circuit, &env, LoweringOptions::new()).run_lowering().unwrap();
//!
//! assert_eq!(stats.hits(EcmaOpcode::Add2), 1);
//! assert!(!circuit.is_live(add));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod circuit;
pub mod compilation_env;
pub mod deopt;
pub mod error;
pub mod lowering;
pub mod options;
pub mod stats;
pub mod type_info_accessors;

// Re-export main types at crate root
pub use builder::CircuitBuilder;
pub use circuit::{Circuit, GateRef};
pub use compilation_env::CompilationEnv;
pub use deopt::DeoptType;
pub use error::{LoweringError, LoweringResult};
pub use lowering::{BytecodeShape, TypedBytecodeLowering};
pub use options::{parse_opt_bc_range, LoweringOptions, OptBcRange};
pub use stats::LoweringStats;
