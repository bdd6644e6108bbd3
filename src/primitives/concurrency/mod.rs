#![forbid(unsafe_code)]

//! Level barrier and cancellation flag shared by the parallel engine.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{KhopsError, Result};
use parking_lot::{Condvar, Mutex};

/// Reusable barrier whose party count changes as participants register and
/// deregister.
///
/// A round completes once every registered party has either arrived or
/// deregistered; the phase number then advances and all waiters wake. The
/// barrier can be forced open with [`Phaser::force_open`], after which every
/// blocked and future waiter returns [`KhopsError::Cancelled`].
pub struct Phaser {
    state: Mutex<PhaserState>,
    advanced: Condvar,
}

#[derive(Debug)]
struct PhaserState {
    parties: usize,
    arrived: usize,
    phase: u64,
    broken: bool,
}

impl PhaserState {
    fn advance(&mut self) {
        self.arrived = 0;
        self.phase = self.phase.wrapping_add(1);
    }
}

/// Snapshot of phaser state for observability.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaserSnapshot {
    /// Registered parties, arrived or not.
    pub parties: usize,
    /// Parties that arrived in the current phase.
    pub arrived: usize,
    /// Current phase number.
    pub phase: u64,
    /// Whether the phaser was forced open.
    pub broken: bool,
}

impl Phaser {
    /// Creates a phaser with `parties` pre-registered participants.
    pub fn new(parties: usize) -> Self {
        Self {
            state: Mutex::new(PhaserState {
                parties,
                arrived: 0,
                phase: 0,
                broken: false,
            }),
            advanced: Condvar::new(),
        }
    }

    /// Adds one party to the current phase and returns the phase number.
    pub fn register(&self) -> Result<u64> {
        let mut state = self.state.lock();
        if state.broken {
            return Err(KhopsError::Cancelled);
        }
        state.parties += 1;
        Ok(state.phase)
    }

    /// Arrives at the barrier and blocks until every other party of this
    /// phase has arrived or deregistered. Returns the new phase number.
    pub fn arrive_and_await_advance(&self) -> Result<u64> {
        let mut state = self.state.lock();
        if state.broken {
            return Err(KhopsError::Cancelled);
        }
        if state.arrived >= state.parties {
            return Err(KhopsError::Invalid("phaser arrival without a registered party"));
        }
        state.arrived += 1;
        let phase = state.phase;
        if state.arrived == state.parties {
            state.advance();
            self.advanced.notify_all();
            return Ok(state.phase);
        }
        while state.phase == phase && !state.broken {
            self.advanced.wait(&mut state);
        }
        if state.phase == phase {
            Err(KhopsError::Cancelled)
        } else {
            Ok(state.phase)
        }
    }

    /// Arrives without waiting and removes the caller from the party count.
    ///
    /// Returns the phase the arrival counted towards.
    pub fn arrive_and_deregister(&self) -> u64 {
        let mut state = self.state.lock();
        let phase = state.phase;
        if state.parties == 0 {
            return phase;
        }
        state.parties -= 1;
        if state.parties > 0 && state.arrived == state.parties {
            state.advance();
            self.advanced.notify_all();
        }
        phase
    }

    /// Releases every waiter with [`KhopsError::Cancelled`] and rejects
    /// further registrations and arrivals.
    pub fn force_open(&self) {
        let mut state = self.state.lock();
        state.broken = true;
        self.advanced.notify_all();
    }

    /// Current counters, reported when a call is torn down.
    pub fn snapshot(&self) -> PhaserSnapshot {
        let state = self.state.lock();
        PhaserSnapshot {
            parties: state.parties,
            arrived: state.arrived,
            phase: state.phase,
            broken: state.broken,
        }
    }
}

/// Shared cooperative cancellation signal.
#[derive(Debug, Default)]
pub struct CancelFlag {
    tripped: AtomicBool,
}

impl CancelFlag {
    /// Creates an untripped flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the flag. Returns `true` for the caller that tripped it first.
    pub fn cancel(&self) -> bool {
        !self.tripped.swap(true, Ordering::AcqRel)
    }

    /// Whether any caller has tripped the flag.
    pub fn is_cancelled(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}
