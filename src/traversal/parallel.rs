//! Thread-parallel level-synchronous BFS.
//!
//! Each level's frontier is split round-robin across a fixed number of jobs
//! that run on a rayon pool built for the call. Level boundaries are a
//! [`Phaser`] round: the coordinator registers one party per spawned job,
//! every job arrives-and-deregisters when it is done, and the coordinator
//! blocks in `arrive_and_await_advance` until the round completes. The
//! coordinator runs on the calling thread, never on a pool thread, so it is
//! the only party that ever blocks. Jobs park their output buffers in
//! per-worker slots before arriving, so the coordinator only reads a level's
//! output after every job has finished writing it.
//!
//! Any job failure (storage error, deadline, panic) records the first error,
//! trips the shared [`CancelFlag`] and forces the phaser open, which wakes the
//! coordinator and fails the whole call with that first error.

use std::any::Any;
use std::mem;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use rayon::{Scope, ThreadPoolBuilder};
use tracing::{debug, trace, warn};

use crate::frontier::FrontierSet;
use crate::primitives::concurrency::{CancelFlag, Phaser};
use crate::storage::{GraphAccessor, NeighborRead, TypeFilter};
use crate::types::{KhopsError, NodeId, Result};

use super::{expand_into, CallBudget, HopOutcome, KhopsOptions};

/// Frontier-partitioning BFS over a per-call worker pool.
#[derive(Clone, Debug)]
pub struct ParallelHopEngine {
    options: KhopsOptions,
}

/// One worker's assignment for a level.
struct Job {
    index: usize,
    level: u32,
    sources: FrontierSet,
    sink: FrontierSet,
}

/// Buffers handed back to the coordinator at the end of a round.
struct RoundOutput {
    sources: FrontierSet,
    sink: FrontierSet,
}

struct Shared<'g, G> {
    graph: &'g G,
    filter: &'g TypeFilter,
    budget: CallBudget,
    phaser: Phaser,
    cancel: CancelFlag,
    failure: Mutex<Option<KhopsError>>,
    slots: Vec<Mutex<Option<RoundOutput>>>,
}

impl<'g, G: GraphAccessor> Shared<'g, G> {
    fn new(graph: &'g G, filter: &'g TypeFilter, budget: CallBudget, workers: usize) -> Self {
        Self {
            graph,
            filter,
            budget,
            // The coordinator is the only party until jobs are spawned.
            phaser: Phaser::new(1),
            cancel: CancelFlag::new(),
            failure: Mutex::new(None),
            slots: (0..workers).map(|_| Mutex::new(None)).collect(),
        }
    }

    /// Records `err` if it is the first failure, then releases everyone.
    fn fail(&self, err: KhopsError) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                *failure = Some(err);
            }
        }
        if self.cancel.cancel() {
            let barrier = self.phaser.snapshot();
            warn!(
                phase = barrier.phase,
                parties = barrier.parties,
                arrived = barrier.arrived,
                "khops.parallel.cancelled"
            );
        }
        self.phaser.force_open();
    }

    /// The recorded job failure if there is one, otherwise `observed`.
    ///
    /// A failing job forces the phaser open before the coordinator notices, so
    /// the coordinator's own error is often just the resulting `Cancelled`.
    fn first_error(&self, observed: KhopsError) -> KhopsError {
        self.failure.lock().take().unwrap_or(observed)
    }

    fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(KhopsError::Cancelled);
        }
        self.budget.check()
    }
}

impl ParallelHopEngine {
    /// Creates an engine with `options.parallelism` workers per call.
    pub fn new(options: &KhopsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }

    /// Worker threads in each call's pool.
    pub fn workers(&self) -> usize {
        self.options.workers()
    }

    /// Counts `start` plus every node within `distance` hops of it.
    ///
    /// Produces the same count as [`super::SequentialHopEngine::traverse`]
    /// for the same graph state.
    pub fn traverse<G: GraphAccessor>(
        &self,
        graph: &G,
        start: NodeId,
        distance: u32,
        filter: &TypeFilter,
    ) -> Result<HopOutcome> {
        let workers = self.workers();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("khops-worker-{index}"))
            .build()
            .map_err(|err| KhopsError::WorkerFailed(format!("worker pool: {err}")))?;
        let shared = Shared::new(graph, filter, CallBudget::start(&self.options), workers);

        let outcome = pool.in_place_scope(|scope| {
            let outcome = coordinate(&shared, scope, start, distance);
            if outcome.is_err() {
                shared.cancel.cancel();
                shared.phaser.force_open();
            }
            outcome
        });
        // The scope has joined every job, so no failure can be recorded later.
        outcome.map_err(|err| shared.first_error(err))
    }
}

fn coordinate<'s, G: GraphAccessor>(
    shared: &'s Shared<'_, G>,
    scope: &Scope<'s>,
    start: NodeId,
    distance: u32,
) -> Result<HopOutcome> {
    let workers = shared.slots.len();
    let mut visited = FrontierSet::new();
    visited.insert(start);
    let mut current: Vec<FrontierSet> = (0..workers).map(|_| FrontierSet::new()).collect();
    let mut next: Vec<FrontierSet> = (0..workers).map(|_| FrontierSet::new()).collect();

    // Hop one has a single source, so its neighbor production is what gets
    // spread across the workers.
    {
        let mut session = shared.graph.begin_read()?;
        let neighbors = session.neighbors_of(start, shared.filter)?;
        for (index, neighbor) in neighbors.enumerate() {
            current[index % workers].insert(neighbor?);
        }
    }

    let mut level = 1u32;
    while level < distance {
        shared.check()?;
        if level == 1 {
            for buffer in current.iter_mut() {
                buffer.difference_with(&visited);
                visited.union_with(buffer);
            }
        } else {
            let mut combined = FrontierSet::new();
            for buffer in current.iter_mut() {
                combined.union_with(buffer);
                buffer.clear();
            }
            combined.difference_with(&visited);
            visited.union_with(&combined);
            for (index, node) in combined.iter().enumerate() {
                current[index % workers].insert(node);
            }
        }

        let frontier: u64 = current.iter().map(FrontierSet::len).sum();
        if frontier == 0 {
            trace!(level, "khops.parallel.exhausted");
            break;
        }

        dispatch(shared, scope, level, &mut current, &mut next)?;
        shared.phaser.arrive_and_await_advance()?;
        shared.check()?;
        for (index, slot) in shared.slots.iter().enumerate() {
            let output = slot.lock().take().ok_or_else(|| {
                KhopsError::WorkerFailed(format!(
                    "worker {index} finished level {level} without output"
                ))
            })?;
            current[index] = output.sink;
            next[index] = output.sources;
        }
        debug!(
            level,
            frontier,
            visited = visited.len(),
            workers,
            "khops.parallel.level"
        );
        level += 1;
    }

    for buffer in &current {
        visited.union_with(buffer);
    }
    shared.phaser.arrive_and_deregister();
    Ok(HopOutcome {
        visited: visited.len(),
        levels: level,
    })
}

fn dispatch<'s, G: GraphAccessor>(
    shared: &'s Shared<'_, G>,
    scope: &Scope<'s>,
    level: u32,
    current: &mut [FrontierSet],
    next: &mut [FrontierSet],
) -> Result<()> {
    for index in 0..current.len() {
        shared.phaser.register()?;
        let job = Job {
            index,
            level,
            sources: mem::take(&mut current[index]),
            sink: mem::take(&mut next[index]),
        };
        scope.spawn(move |_| run_job(shared, job));
    }
    Ok(())
}

fn run_job<G: GraphAccessor>(shared: &Shared<'_, G>, job: Job) {
    let (index, level) = (job.index, job.level);
    match panic::catch_unwind(AssertUnwindSafe(|| expand_round(shared, job))) {
        Ok(Ok(output)) => {
            *shared.slots[index].lock() = Some(output);
        }
        Ok(Err(err)) => {
            debug!(worker = index, level, error = %err, "khops.worker.failed");
            shared.fail(err);
        }
        Err(payload) => {
            let message = panic_message(payload);
            warn!(worker = index, level, %message, "khops.worker.panicked");
            shared.fail(KhopsError::WorkerFailed(message));
        }
    }
    shared.phaser.arrive_and_deregister();
}

fn expand_round<G: GraphAccessor>(shared: &Shared<'_, G>, job: Job) -> Result<RoundOutput> {
    let Job {
        sources, mut sink, ..
    } = job;
    sink.clear();
    let mut session = shared.graph.begin_read()?;
    for node in sources.iter() {
        shared.check()?;
        expand_into(&mut session, node, shared.filter, &mut sink)?;
    }
    drop(session);
    Ok(RoundOutput { sources, sink })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
