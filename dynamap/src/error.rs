//! Error taxonomy for the data-access layer.
//!
//! Request-construction failures (`UnknownAttribute`, `NonKeyCondition`,
//! `IncompleteKey`, `DuplicateAttribute`) are raised before any store call.
//! Store failures pass through unmodified; this layer never retries and never
//! masks one as an empty result.

use crate::client::StoreError;
use crate::codec::TypeMismatch;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A condition or assignment referenced an attribute the table does not
    /// declare.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A table definition declared the same attribute name twice.
    #[error("duplicate attribute in table definition: {0}")]
    DuplicateAttribute(String),

    /// A query condition referenced a declared attribute that is not part of
    /// the primary key.
    #[error("query conditions may only reference key attributes, got: {0}")]
    NonKeyCondition(String),

    /// An update's `matching` block does not pin down the full primary key.
    #[error("condition does not determine key attribute: {0}")]
    IncompleteKey(String),

    /// An update assigned a value to a key attribute. Keys are immutable;
    /// the backing store rejects such writes, so they fail at build time.
    #[error("cannot assign to key attribute: {0}")]
    KeyAssignment(String),

    /// An update carried no `set` assignments.
    #[error("update contains no assignments")]
    EmptyUpdate,

    /// A native value's tag did not match the attribute's declared type.
    #[error("type mismatch for attribute `{attribute}`: {source}")]
    TypeMismatch {
        attribute: String,
        source: TypeMismatch,
    },

    /// Failure reported by the backing store, passed through unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn mismatch(attribute: impl Into<String>, source: TypeMismatch) -> Self {
        Error::TypeMismatch {
            attribute: attribute.into(),
            source,
        }
    }
}
