//! Graph storage boundary and the in-memory store.
//!
//! The traversal engines only see [`GraphAccessor`] and [`NeighborRead`].
//! [`MemGraph`] implements both over forward and reverse adjacency lists.

mod accessor;
mod adjacency;
mod catalog;
mod memory;
mod metrics;

/// Store boundary consumed by the k-hop engines.
pub use accessor::{GraphAccessor, NeighborRead};

/// Adjacency records and relationship type filters.
pub use adjacency::{Neighbor, TypeFilter};

/// Relationship type dictionary.
pub use catalog::TypeDict;

/// In-memory reference store.
pub use memory::{MemGraph, MemNeighbors, MemSession};

/// Metrics and profiling.
pub use metrics::{default_metrics, CounterMetrics, MetricsSnapshot, NoopMetrics, StorageMetrics};
