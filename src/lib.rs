//! Exact k-hop neighborhood counts over a graph store.
//!
//! Given a start node, a hop distance and an optional set of relationship
//! types, the engines in [`traversal`] count the distinct nodes reachable
//! within that many hops over incoming and outgoing edges. The sequential
//! engine runs on the calling thread; the parallel engine splits every BFS
//! level across a fixed worker pool and must agree with it exactly.

#![warn(missing_docs)]

pub mod cli;
pub mod frontier;
pub mod primitives;
pub mod storage;
pub mod traversal;
pub mod types;

pub use frontier::FrontierSet;
pub use storage::{GraphAccessor, MemGraph, NeighborRead, TypeFilter};
pub use traversal::{
    khops, khops_parallel, EngineKind, HopOutcome, KhopsOptions, KhopsRequest,
    ParallelHopEngine, SequentialHopEngine,
};
pub use types::{KhopsError, NodeId, Result, TypeId};
