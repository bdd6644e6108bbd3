//! In-memory adjacency store.
//!
//! [`MemGraph`] keeps a forward and a reverse adjacency list per node plus a
//! relationship type dictionary. It is the store behind the CLI and the
//! reference [`GraphAccessor`] for tests and benches.

use std::fmt;
use std::slice;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::types::{NodeId, Result, TypeId};

use super::accessor::{GraphAccessor, NeighborRead};
use super::adjacency::{Neighbor, TypeFilter};
use super::catalog::TypeDict;
use super::metrics::{default_metrics, StorageMetrics};

#[derive(Default)]
struct NodeAdjacency {
    out: Vec<Neighbor>,
    inc: Vec<Neighbor>,
}

/// Directed multigraph held entirely in memory.
pub struct MemGraph {
    adjacency: FxHashMap<NodeId, NodeAdjacency>,
    types: TypeDict,
    metrics: Arc<dyn StorageMetrics>,
}

impl MemGraph {
    /// Creates an empty graph with no-op metrics.
    pub fn new() -> Self {
        Self::with_metrics(default_metrics())
    }

    /// Creates an empty graph reporting read activity to `metrics`.
    pub fn with_metrics(metrics: Arc<dyn StorageMetrics>) -> Self {
        Self {
            adjacency: FxHashMap::default(),
            types: TypeDict::new(),
            metrics,
        }
    }

    /// Builds a graph from `(src, dst, type)` triples.
    pub fn from_edges<I, S>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, u64, S)>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for (src, dst, ty) in edges {
            graph.add_edge(NodeId(src), NodeId(dst), ty.as_ref())?;
        }
        Ok(graph)
    }

    /// Adds an isolated node. Returns `false` if it already existed.
    pub fn add_node(&mut self, node: NodeId) -> bool {
        if self.adjacency.contains_key(&node) {
            return false;
        }
        self.adjacency.insert(node, NodeAdjacency::default());
        true
    }

    /// Adds a directed edge `src -> dst`, creating either endpoint if needed.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, ty: &str) -> Result<()> {
        let ty = self.types.intern(ty)?;
        self.adjacency.entry(src).or_default().out.push(Neighbor {
            neighbor: dst,
            ty,
        });
        self.adjacency.entry(dst).or_default().inc.push(Neighbor {
            neighbor: src,
            ty,
        });
        Ok(())
    }

    /// Number of distinct nodes, isolated ones included.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Relationship types seen so far.
    pub fn types(&self) -> &TypeDict {
        &self.types
    }
}

impl Default for MemGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemGraph")
            .field("nodes", &self.node_count())
            .field("types", &self.types.len())
            .finish()
    }
}

impl GraphAccessor for MemGraph {
    type Session<'a> = MemSession<'a>;

    fn resolve_type_codes<S: AsRef<str>>(&self, names: &[S]) -> TypeFilter {
        TypeFilter::of(names.iter().map(|name| {
            self.types
                .lookup(name.as_ref())
                .unwrap_or(TypeId::UNMAPPED)
        }))
    }

    fn node_exists(&self, node: NodeId) -> Result<bool> {
        Ok(self.adjacency.contains_key(&node))
    }

    fn begin_read(&self) -> Result<MemSession<'_>> {
        self.metrics.session_opened();
        Ok(MemSession { graph: self })
    }
}

/// Read session over a [`MemGraph`].
pub struct MemSession<'a> {
    graph: &'a MemGraph,
}

impl<'a> NeighborRead for MemSession<'a> {
    type Neighbors<'s> = MemNeighbors<'s> where Self: 's;

    fn neighbors_of<'s>(
        &'s mut self,
        node: NodeId,
        filter: &'s TypeFilter,
    ) -> Result<MemNeighbors<'s>> {
        let graph: &'s MemGraph = self.graph;
        graph.metrics.node_expanded();
        let (out, inc) = match graph.adjacency.get(&node) {
            Some(adj) if !filter.matches_nothing() => {
                graph.metrics.adjacency_scan("out");
                graph.metrics.adjacency_scan("in");
                (adj.out.iter(), adj.inc.iter())
            }
            _ => ([].iter(), [].iter()),
        };
        Ok(MemNeighbors {
            node,
            out,
            inc,
            filter,
        })
    }
}

/// Lazy neighbor stream produced by [`MemSession`].
pub struct MemNeighbors<'s> {
    node: NodeId,
    out: slice::Iter<'s, Neighbor>,
    inc: slice::Iter<'s, Neighbor>,
    filter: &'s TypeFilter,
}

impl Iterator for MemNeighbors<'_> {
    type Item = Result<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        if let Some(hit) = self.out.by_ref().find(|n| filter.matches(n.ty)) {
            return Some(Ok(hit.neighbor));
        }
        // Self-loops were already produced from the outgoing side.
        let node = self.node;
        self.inc
            .by_ref()
            .find(|n| n.neighbor != node && filter.matches(n.ty))
            .map(|hit| Ok(hit.neighbor))
    }
}
