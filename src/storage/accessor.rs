//! Boundary between the traversal engines and the graph store.

use crate::types::{NodeId, Result};

use super::adjacency::TypeFilter;

/// Read-only view of a graph store as seen by the k-hop engines.
///
/// Engines never inspect properties; they only resolve relationship type
/// names once per call, check that the start node exists and stream
/// neighbor ids through read sessions.
pub trait GraphAccessor: Sync {
    /// Per-task read resource (cursor state, read transaction).
    type Session<'a>: NeighborRead
    where
        Self: 'a;

    /// Resolves relationship type names to a filter.
    ///
    /// Names the store does not know map to [`crate::types::TypeId::UNMAPPED`]
    /// so they match zero edges instead of failing the call. An empty slice
    /// yields an unrestricted filter.
    fn resolve_type_codes<S: AsRef<str>>(&self, names: &[S]) -> TypeFilter;

    /// Whether `node` is present in the store.
    fn node_exists(&self, node: NodeId) -> Result<bool>;

    /// Opens a read session. Each engine task opens its own and drops it at
    /// the end of its round; sessions are never shared between threads.
    fn begin_read(&self) -> Result<Self::Session<'_>>;
}

/// Neighbor production for a single read session.
pub trait NeighborRead {
    /// Lazy, finite, non-restartable sequence of neighbor ids.
    type Neighbors<'s>: Iterator<Item = Result<NodeId>>
    where
        Self: 's;

    /// Streams the far end of every edge incident to `node` in either
    /// direction whose type passes `filter`.
    ///
    /// Output is per edge, so parallel edges repeat their far end. A
    /// self-loop yields `node` once.
    fn neighbors_of<'s>(
        &'s mut self,
        node: NodeId,
        filter: &'s TypeFilter,
    ) -> Result<Self::Neighbors<'s>>;
}
