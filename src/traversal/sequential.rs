use tracing::{debug, trace};

use crate::frontier::FrontierSet;
use crate::storage::{GraphAccessor, TypeFilter};
use crate::types::{NodeId, Result};

use super::{expand_into, CallBudget, HopOutcome, KhopsOptions};

/// Single-threaded level-synchronous BFS over two alternating buffers.
#[derive(Clone, Debug)]
pub struct SequentialHopEngine {
    options: KhopsOptions,
}

impl SequentialHopEngine {
    /// Creates an engine that honors the deadline and cancel flag in `options`.
    pub fn new(options: &KhopsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }

    /// Counts `start` plus every node within `distance` hops of it.
    ///
    /// `distance` must be at least 1; argument recovery happens in
    /// [`super::khops`].
    pub fn traverse<G: GraphAccessor>(
        &self,
        graph: &G,
        start: NodeId,
        distance: u32,
        filter: &TypeFilter,
    ) -> Result<HopOutcome> {
        let budget = CallBudget::start(&self.options);
        let mut session = graph.begin_read()?;

        let mut visited = FrontierSet::new();
        visited.insert(start);
        let mut buffers = [FrontierSet::new(), FrontierSet::new()];
        expand_into(&mut session, start, filter, &mut buffers[0])?;

        let mut level = 1u32;
        while level < distance {
            let [even, odd] = &mut buffers;
            let (current, next) = if level % 2 == 1 {
                (even, odd)
            } else {
                (odd, even)
            };
            current.difference_with(&visited);
            if current.is_empty() {
                trace!(level, "khops.sequential.exhausted");
                break;
            }
            visited.union_with(current);
            next.clear();
            for node in current.iter() {
                budget.check()?;
                expand_into(&mut session, node, filter, next)?;
            }
            debug!(
                level,
                frontier = current.len(),
                visited = visited.len(),
                "khops.sequential.level"
            );
            level += 1;
        }

        let last = &buffers[((level - 1) % 2) as usize];
        visited.union_with(last);
        Ok(HopOutcome {
            visited: visited.len(),
            levels: level,
        })
    }
}
