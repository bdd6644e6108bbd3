#![forbid(unsafe_code)]

//! Identifier newtypes and the crate error type.

use std::fmt;

/// Vertex identifier. Any `u64` is valid.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u64);
/// Interned relationship type code.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Code handed out for relationship type names the store has never seen.
    ///
    /// No stored edge carries it, so a filter containing only this code
    /// matches nothing.
    pub const UNMAPPED: TypeId = TypeId(u32::MAX);
}

/// Faults that fail a k-hop call.
///
/// Bad arguments (distance below one, unknown start node, unknown type names)
/// are not errors; they produce `Ok(None)` or an empty filter instead.
#[derive(thiserror::Error, Debug)]
pub enum KhopsError {
    /// Underlying IO failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// The store could not produce adjacency data.
    #[error("storage: {0}")]
    Storage(String),
    /// A parallel worker panicked or could not be started.
    #[error("worker failed: {0}")]
    WorkerFailed(String),
    /// The configured per-call deadline passed.
    #[error("traversal deadline exceeded")]
    DeadlineExceeded,
    /// The caller's cancel flag was tripped.
    #[error("traversal cancelled")]
    Cancelled,
    /// Internal misuse, such as an unbalanced barrier arrival.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, KhopsError>;

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u64 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<u32> for TypeId {
    fn from(value: u32) -> Self {
        TypeId(value)
    }
}

impl From<TypeId> for u32 {
    fn from(value: TypeId) -> Self {
        value.0
    }
}
