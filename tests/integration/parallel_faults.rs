//! Failure handling: storage errors, worker panics, deadlines and
//! cancellation must fail the call promptly instead of hanging the barrier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sombra_khops::primitives::concurrency::CancelFlag;
use sombra_khops::storage::{MemNeighbors, MemSession};
use sombra_khops::{
    GraphAccessor, KhopsError, KhopsOptions, MemGraph, NeighborRead, NodeId, ParallelHopEngine,
    Result, SequentialHopEngine, TypeFilter,
};

#[derive(Clone, Copy, Debug)]
enum Fault {
    None,
    Error(u64),
    Panic(u64),
    Slow(Duration),
    FailSessionsAfter(usize),
}

/// Wraps a [`MemGraph`] and misbehaves on demand.
struct FaultyGraph {
    inner: MemGraph,
    fault: Fault,
    sessions: AtomicUsize,
}

impl FaultyGraph {
    fn new(inner: MemGraph, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            sessions: AtomicUsize::new(0),
        }
    }
}

struct FaultySession<'a> {
    inner: MemSession<'a>,
    fault: Fault,
}

impl GraphAccessor for FaultyGraph {
    type Session<'a> = FaultySession<'a>;

    fn resolve_type_codes<S: AsRef<str>>(&self, names: &[S]) -> TypeFilter {
        self.inner.resolve_type_codes(names)
    }

    fn node_exists(&self, node: NodeId) -> Result<bool> {
        self.inner.node_exists(node)
    }

    fn begin_read(&self) -> Result<FaultySession<'_>> {
        let opened = self.sessions.fetch_add(1, Ordering::SeqCst);
        if let Fault::FailSessionsAfter(limit) = self.fault {
            if opened >= limit {
                return Err(KhopsError::Storage("read session refused".into()));
            }
        }
        Ok(FaultySession {
            inner: self.inner.begin_read()?,
            fault: self.fault,
        })
    }
}

impl<'a> NeighborRead for FaultySession<'a> {
    type Neighbors<'s> = MemNeighbors<'s> where Self: 's;

    fn neighbors_of<'s>(
        &'s mut self,
        node: NodeId,
        filter: &'s TypeFilter,
    ) -> Result<MemNeighbors<'s>> {
        match self.fault {
            Fault::Error(bad) if node.0 == bad => {
                return Err(KhopsError::Storage(format!("corrupt adjacency for {node}")))
            }
            Fault::Panic(bad) if node.0 == bad => panic!("poisoned vertex {node}"),
            Fault::Slow(delay) => thread::sleep(delay),
            _ => {}
        }
        self.inner.neighbors_of(node, filter)
    }
}

fn chain(length: u64) -> MemGraph {
    let edges: Vec<_> = (1..length).map(|i| (i - 1, i, "next")).collect();
    MemGraph::from_edges(edges).unwrap()
}

fn wide_graph() -> MemGraph {
    let mut edges = Vec::new();
    for hub in 1..=32u64 {
        edges.push((0, hub, "R"));
        for leaf in 0..32u64 {
            edges.push((hub, 1_000 + hub * 32 + leaf, "R"));
        }
    }
    MemGraph::from_edges(edges).unwrap()
}

/// Runs `f` on a helper thread and fails the test if it does not finish.
fn within<T: Send + 'static>(limit: Duration, f: impl FnOnce() -> T + Send + 'static) -> T {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(limit)
        .expect("traversal did not finish; barrier probably hung")
}

#[test]
fn storage_error_in_worker_fails_parallel_call() {
    let result = within(Duration::from_secs(10), || {
        let graph = FaultyGraph::new(chain(10), Fault::Error(3));
        let options = KhopsOptions::new().parallelism(3);
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 6, &TypeFilter::all())
    });
    match result {
        Err(KhopsError::Storage(message)) => assert!(message.contains("3"), "{message}"),
        other => panic!("expected storage error, got {other:?}"),
    }
}

#[test]
fn storage_error_fails_sequential_call() {
    let graph = FaultyGraph::new(chain(10), Fault::Error(3));
    let options = KhopsOptions::new();
    let result = SequentialHopEngine::new(&options).traverse(&graph, NodeId(0), 6, &TypeFilter::all());
    assert!(matches!(result, Err(KhopsError::Storage(_))), "{result:?}");
}

#[test]
fn fault_beyond_the_horizon_is_never_touched() -> Result<()> {
    let graph = FaultyGraph::new(chain(10), Fault::Error(8));
    let options = KhopsOptions::new().parallelism(2);
    // Node 8 is at hop 8 and only hops 0..k-1 get expanded.
    let outcome =
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 5, &TypeFilter::all())?;
    assert_eq!(outcome.visited, 6);
    let outcome =
        SequentialHopEngine::new(&options).traverse(&graph, NodeId(0), 5, &TypeFilter::all())?;
    assert_eq!(outcome.visited, 6);
    Ok(())
}

#[test]
fn worker_panic_becomes_worker_failed() {
    let result = within(Duration::from_secs(10), || {
        let graph = FaultyGraph::new(wide_graph(), Fault::Panic(7));
        let options = KhopsOptions::new().parallelism(4);
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 3, &TypeFilter::all())
    });
    match result {
        Err(KhopsError::WorkerFailed(message)) => {
            assert!(message.contains("poisoned vertex 7"), "{message}")
        }
        other => panic!("expected worker failure, got {other:?}"),
    }
}

#[test]
fn refused_worker_session_fails_the_call() {
    let result = within(Duration::from_secs(10), || {
        // The coordinator's seeding session succeeds, every worker session fails.
        let graph = FaultyGraph::new(wide_graph(), Fault::FailSessionsAfter(1));
        let options = KhopsOptions::new().parallelism(4);
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 3, &TypeFilter::all())
    });
    assert!(matches!(result, Err(KhopsError::Storage(_))), "{result:?}");
}

#[test]
fn storage_error_wins_over_cancellation_with_many_workers() {
    // With many jobs per round the coordinator is often still registering
    // parties when the first refusal trips cancellation.
    for round in 0..250 {
        let result = within(Duration::from_secs(10), || {
            let graph = FaultyGraph::new(wide_graph(), Fault::FailSessionsAfter(1));
            let options = KhopsOptions::new().parallelism(48);
            ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 3, &TypeFilter::all())
        });
        assert!(
            matches!(result, Err(KhopsError::Storage(_))),
            "round {round}: {result:?}"
        );
    }
}

#[test]
fn deadline_stops_a_slow_parallel_call() {
    let result = within(Duration::from_secs(10), || {
        let graph = FaultyGraph::new(wide_graph(), Fault::Slow(Duration::from_millis(5)));
        let options = KhopsOptions::new()
            .parallelism(2)
            .deadline(Duration::from_millis(40));
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 3, &TypeFilter::all())
    });
    assert!(matches!(result, Err(KhopsError::DeadlineExceeded)), "{result:?}");
}

#[test]
fn external_cancel_mid_call() {
    let flag = Arc::new(CancelFlag::new());
    let trip = flag.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        trip.cancel();
    });
    let result = within(Duration::from_secs(10), move || {
        let graph = FaultyGraph::new(wide_graph(), Fault::Slow(Duration::from_millis(5)));
        let options = KhopsOptions::new().parallelism(3).cancel_flag(flag);
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 3, &TypeFilter::all())
    });
    canceller.join().unwrap();
    assert!(matches!(result, Err(KhopsError::Cancelled)), "{result:?}");
}

#[test]
fn healthy_wrapper_matches_plain_store() -> Result<()> {
    let graph = FaultyGraph::new(wide_graph(), Fault::None);
    let options = KhopsOptions::new().parallelism(5);
    let wrapped =
        ParallelHopEngine::new(&options).traverse(&graph, NodeId(0), 3, &TypeFilter::all())?;
    let plain = ParallelHopEngine::new(&options).traverse(
        &graph.inner,
        NodeId(0),
        3,
        &TypeFilter::all(),
    )?;
    assert_eq!(wrapped.visited, plain.visited);
    assert_eq!(wrapped.visited, 1 + 32 + 32 * 32);
    Ok(())
}
