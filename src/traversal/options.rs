use std::sync::Arc;
use std::time::Duration;

use crate::primitives::concurrency::CancelFlag;

/// Worker count used when none is configured.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Configuration options supplied to the k-hop engines.
///
/// Nothing here is read from the runtime environment; callers that want a
/// hardware-derived worker count compute it themselves and pass it in.
#[derive(Clone, Debug)]
pub struct KhopsOptions {
    /// Number of workers used by the parallel engine (at least 1)
    pub parallelism: usize,
    /// Optional wall-clock budget for a single call
    pub deadline: Option<Duration>,
    /// Optional caller-owned cancellation signal
    pub cancel: Option<Arc<CancelFlag>>,
}

impl KhopsOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            deadline: None,
            cancel: None,
        }
    }

    /// Sets the parallel worker count. Zero is treated as one.
    pub fn parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers.max(1);
        self
    }

    /// Fails calls that run longer than `budget`.
    pub fn deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(budget);
        self
    }

    /// Attaches a cancellation flag the caller can trip from another thread.
    pub fn cancel_flag(mut self, flag: Arc<CancelFlag>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub(crate) fn workers(&self) -> usize {
        self.parallelism.max(1)
    }
}

impl Default for KhopsOptions {
    fn default() -> Self {
        Self::new()
    }
}
