//! Profile consumption errors.

use thiserror::Error;

/// Errors raised while turning profile records into a type recorder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A record of a kind the recorder does not classify
    #[error("unknown profile type kind {kind} at bytecode offset {offset}")]
    UnknownTypeKind {
        /// Bytecode offset of the record
        offset: u32,
        /// Name of the record kind
        kind: &'static str,
    },
    /// A profile type names a file id the decoder never registered
    #[error("unknown abc id {0}")]
    UnknownAbcId(u32),
}
