use crate::record::RecordId;
use crate::value::FieldKind;
use thiserror::Error;

/// Errors raised while declaring or building indices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field '{field}' is already part of the index specification")]
    DuplicateField { field: String },

    #[error("field '{field}' of kind {kind} supports neither equality nor ordering and cannot be indexed")]
    UnindexableField { field: String, kind: FieldKind },
}

/// Errors raised by the observable source collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("record {0} is not present in the collection")]
    UnknownRecord(RecordId),

    #[error("record {id} has no field '{field}'")]
    UnknownField { id: RecordId, field: String },

    #[error("collection is full: record ids are exhausted")]
    CapacityExceeded,
}
