use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking read-path activity of a graph store.
///
/// Implementations collect statistics about read sessions and adjacency
/// scans issued by the k-hop engines. This information can be used for
/// monitoring and for checking that engines open sessions the way they
/// claim to.
pub trait StorageMetrics: Send + Sync {
    /// Records a new read session.
    fn session_opened(&self);

    /// Records an adjacency scan operation.
    ///
    /// # Parameters
    /// * `direction` - The direction of the scan: "out" for outgoing edges, "in" for incoming edges.
    fn adjacency_scan(&self, direction: &'static str);

    /// Records a node that was expanded through a session.
    fn node_expanded(&self);
}

/// A no-op implementation of [`StorageMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl StorageMetrics for NoopMetrics {
    fn session_opened(&self) {}
    fn adjacency_scan(&self, _direction: &'static str) {}
    fn node_expanded(&self) {}
}

/// A thread-safe counter-based implementation of [`StorageMetrics`].
///
/// All counters are atomics and may be read while sessions are live.
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of read sessions opened.
    pub sessions_opened: AtomicU64,

    /// Number of outgoing adjacency scans performed.
    pub adjacency_scans_out: AtomicU64,

    /// Number of incoming adjacency scans performed.
    pub adjacency_scans_in: AtomicU64,

    /// Number of nodes expanded.
    pub nodes_expanded: AtomicU64,
}

impl StorageMetrics for CounterMetrics {
    fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    fn adjacency_scan(&self, direction: &'static str) {
        match direction {
            "out" => {
                self.adjacency_scans_out.fetch_add(1, Ordering::Relaxed);
            }
            "in" => {
                self.adjacency_scans_in.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn node_expanded(&self) {
        self.nodes_expanded.fetch_add(1, Ordering::Relaxed);
    }
}

impl CounterMetrics {
    /// Current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            adjacency_scans_out: self.adjacency_scans_out.load(Ordering::Relaxed),
            adjacency_scans_in: self.adjacency_scans_in.load(Ordering::Relaxed),
            nodes_expanded: self.nodes_expanded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Read sessions opened.
    pub sessions_opened: u64,
    /// Outgoing adjacency scans.
    pub adjacency_scans_out: u64,
    /// Incoming adjacency scans.
    pub adjacency_scans_in: u64,
    /// Nodes expanded through a session.
    pub nodes_expanded: u64,
}

/// Returns the default metrics sink used when none is configured.
pub fn default_metrics() -> Arc<dyn StorageMetrics> {
    Arc::new(NoopMetrics)
}
