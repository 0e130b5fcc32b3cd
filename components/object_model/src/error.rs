//! Errors of runtime-side heap mutations.

use thiserror::Error;

use crate::{HClassId, ObjectId};

/// Errors raised by object model mutators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectModelError {
    /// No object with this id exists
    #[error("invalid object id {0:?}")]
    InvalidObject(ObjectId),
    /// No hidden class with this id exists
    #[error("invalid hclass id {0:?}")]
    InvalidHClass(HClassId),
    /// The object does not have the layout the operation needs
    #[error("object {object:?} is not a {expected}")]
    WrongKind {
        /// Offending object
        object: ObjectId,
        /// Layout the operation expected
        expected: &'static str,
    },
}
