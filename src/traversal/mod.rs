//! k-hop neighborhood counting.
//!
//! [`khops`] and [`khops_parallel`] count the distinct nodes reachable from a
//! start node within `distance` hops, over incoming and outgoing edges,
//! optionally restricted to a set of relationship types. Both return
//! `Ok(None)` for input-shape problems (distance below one, unknown start
//! node) and only fail for real storage or runtime faults.

mod options;
mod parallel;
mod sequential;

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::frontier::FrontierSet;
use crate::primitives::concurrency::CancelFlag;
use crate::storage::{GraphAccessor, NeighborRead, TypeFilter};
use crate::types::{KhopsError, NodeId, Result};

pub use options::{KhopsOptions, DEFAULT_PARALLELISM};
pub use parallel::ParallelHopEngine;
pub use sequential::SequentialHopEngine;

/// Final state of one engine run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HopOutcome {
    /// Cardinality of the visited set, start node included.
    pub visited: u64,
    /// Level the traversal stopped at.
    pub levels: u32,
}

impl HopOutcome {
    /// Reported count: visited nodes minus the seeded start node.
    pub fn count(&self) -> i64 {
        i64::try_from(self.visited.saturating_sub(1)).unwrap_or(i64::MAX)
    }
}

/// Engine selection for a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineKind {
    /// Single-threaded BFS on the calling thread.
    #[default]
    Sequential,
    /// Level-partitioned BFS over [`KhopsOptions::parallelism`] workers.
    Parallel,
}

/// A k-hop count request.
#[derive(Clone, Debug)]
pub struct KhopsRequest {
    /// Node the traversal starts from.
    pub start: NodeId,
    /// Maximum hop count; values below one produce no result.
    pub distance: i64,
    /// Relationship type names to follow; empty means every type.
    pub relationship_types: Vec<String>,
}

impl KhopsRequest {
    /// Request for the one-hop neighborhood of `start` over every type.
    pub fn new(start: NodeId) -> Self {
        Self {
            start,
            distance: 1,
            relationship_types: Vec::new(),
        }
    }

    /// Sets the hop distance.
    pub fn distance(mut self, distance: i64) -> Self {
        self.distance = distance;
        self
    }

    /// Restricts the traversal to edges of the named types.
    pub fn relationship_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationship_types = names.into_iter().map(Into::into).collect();
        self
    }

    /// Runs the request on the chosen engine.
    pub fn run<G: GraphAccessor>(
        &self,
        graph: &G,
        engine: EngineKind,
        options: &KhopsOptions,
    ) -> Result<Option<i64>> {
        let Some((distance, filter)) =
            prepare(graph, self.start, self.distance, &self.relationship_types)?
        else {
            return Ok(None);
        };
        let started = Instant::now();
        let outcome = match engine {
            EngineKind::Sequential => {
                SequentialHopEngine::new(options).traverse(graph, self.start, distance, &filter)?
            }
            EngineKind::Parallel => {
                ParallelHopEngine::new(options).traverse(graph, self.start, distance, &filter)?
            }
        };
        debug!(
            start = %self.start,
            distance,
            engine = ?engine,
            levels = outcome.levels,
            count = outcome.count(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "khops.completed"
        );
        Ok(Some(outcome.count()))
    }
}

/// Counts nodes within `distance` hops of `start` on the sequential engine.
pub fn khops<G, S>(
    graph: &G,
    start: NodeId,
    distance: i64,
    relationship_types: &[S],
    options: &KhopsOptions,
) -> Result<Option<i64>>
where
    G: GraphAccessor,
    S: AsRef<str>,
{
    request(start, distance, relationship_types).run(graph, EngineKind::Sequential, options)
}

/// Same as [`khops`], computed on the parallel engine.
pub fn khops_parallel<G, S>(
    graph: &G,
    start: NodeId,
    distance: i64,
    relationship_types: &[S],
    options: &KhopsOptions,
) -> Result<Option<i64>>
where
    G: GraphAccessor,
    S: AsRef<str>,
{
    request(start, distance, relationship_types).run(graph, EngineKind::Parallel, options)
}

fn request<S: AsRef<str>>(start: NodeId, distance: i64, names: &[S]) -> KhopsRequest {
    KhopsRequest::new(start)
        .distance(distance)
        .relationship_types(names.iter().map(|name| name.as_ref().to_owned()))
}

/// Validates arguments and resolves the type filter.
///
/// Returns `None` when the call should produce no result.
fn prepare<G: GraphAccessor, S: AsRef<str>>(
    graph: &G,
    start: NodeId,
    distance: i64,
    names: &[S],
) -> Result<Option<(u32, TypeFilter)>> {
    if distance < 1 {
        debug!(distance, "khops.invalid_distance");
        return Ok(None);
    }
    if !graph.node_exists(start)? {
        debug!(start = %start, "khops.missing_start");
        return Ok(None);
    }
    let filter = graph.resolve_type_codes(names);
    if filter.matches_nothing() {
        debug!(types = names.len(), "khops.unknown_relationship_types");
    }
    Ok(Some((u32::try_from(distance).unwrap_or(u32::MAX), filter)))
}

/// Streams every neighbor of `node` into `sink`.
pub(crate) fn expand_into<R: NeighborRead>(
    session: &mut R,
    node: NodeId,
    filter: &TypeFilter,
    sink: &mut FrontierSet,
) -> Result<()> {
    for neighbor in session.neighbors_of(node, filter)? {
        sink.insert(neighbor?);
    }
    Ok(())
}

/// Deadline and caller cancellation for one call.
#[derive(Clone, Debug)]
pub(crate) struct CallBudget {
    deadline: Option<Instant>,
    cancel: Option<Arc<CancelFlag>>,
}

impl CallBudget {
    pub(crate) fn start(options: &KhopsOptions) -> Self {
        Self {
            deadline: options
                .deadline
                .and_then(|budget| Instant::now().checked_add(budget)),
            cancel: options.cancel.clone(),
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|flag| flag.is_cancelled()) {
            return Err(KhopsError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(KhopsError::DeadlineExceeded);
        }
        Ok(())
    }
}
