//! Low-level primitives shared by the traversal engines.

/// Concurrency primitives and synchronization.
///
/// Level barrier and cooperative cancellation used by the parallel engine.
pub mod concurrency;
