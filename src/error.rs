use std::io;
use thiserror::Error;

use crate::model::NodeId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure taxonomy for persistent collection operations.
///
/// Every variant except backend I/O is a hard failure: the caller is
/// expected to propagate it out of the enclosing unit of work, discarding
/// all buffered writes. Recoverable conditions (a duplicate-value tree
/// insert) are reported as `Ok(false)`, not as errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A stored byte sequence failed to decode.
    #[error("corruption detected: {0}")]
    Corruption(String),
    /// A removal target is absent from the structure.
    #[error("value not found")]
    ValueNotFound,
    /// A caller-supplied identifier is not in the node table.
    #[error("unknown identifier: {0}")]
    UnknownId(NodeId),
    /// An insert reused an identifier already present in the node table.
    #[error("identifier already in use: {0}")]
    DuplicateId(NodeId),
    /// Malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
