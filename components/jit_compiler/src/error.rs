//! Fatal lowering errors.
//!
//! Missing or insufficient profile evidence is never an error; strategies
//! simply leave the gate untouched. The variants below abort the compilation
//! of the whole unit.

use bytecode_system::EcmaOpcode;
use pgo_profiler::ProfileError;
use thiserror::Error;

use crate::circuit::GateRef;

/// Errors that abandon the compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    /// The profile could not be read
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    /// A strategy was handed an opcode it does not lower
    #[error("{strategy} lowering invoked for {opcode}")]
    UnownedOpcode {
        /// Offending opcode
        opcode: EcmaOpcode,
        /// Strategy that rejected it
        strategy: &'static str,
    },

    /// Argument count requested for a non-call opcode
    #[error("call argc requested for non-call opcode {0}")]
    UnsupportedCallArgc(EcmaOpcode),

    /// A gate handle outlived its gate
    #[error("stale or unknown gate {0:?}")]
    InvalidGate(GateRef),

    /// No frame state dominates a gate that needs a guard
    #[error("no frame state reachable from gate {0:?}")]
    MissingFrameState(GateRef),
}

/// Result type of the lowering pass
pub type LoweringResult<T> = Result<T, LoweringError>;
