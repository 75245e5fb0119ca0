//! Connection state, written by stack callbacks, sampled by the poll loop.
//!
//! Two halves:
//!
//! - [`ConnectionFlag`] lives in the shared link and is flipped from the
//!   radio stack's callback context.
//! - [`ConnectionMonitor`] is owned by the poll loop and turns successive
//!   samples into edge [`Transition`]s.
//!
//! The flag also counts completed detaches, so a peer that attaches and
//! detaches between two polls still yields exactly one `JustDetached` edge.

use core::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Detached = 0,
    Attached = 1,
}

impl ConnectionState {
    pub fn is_attached(self) -> bool {
        self == Self::Attached
    }
}

/// An edge observed by [`ConnectionMonitor::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    JustAttached,
    JustDetached,
}

// ── Producer half ─────────────────────────────────────────────

/// Bit 0 of the word: peer attached.
const ATTACHED: u32 = 0b1;
/// Detach counter occupies bits 1..=31.
const DETACH_STEP: u32 = 0b10;

/// Attach flag and detach counter packed in one atomic word, so a single
/// load yields a consistent snapshot of both.
pub struct ConnectionFlag {
    word: AtomicU32,
}

impl Default for ConnectionFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionFlag {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    pub fn attach(&self) {
        self.word.fetch_or(ATTACHED, Ordering::AcqRel);
    }

    /// Mark detached. A detach without a prior attach is ignored.
    pub fn detach(&self) {
        let _ = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                (w & ATTACHED != 0).then(|| (w & !ATTACHED).wrapping_add(DETACH_STEP))
            });
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshot().0
    }

    /// Number of completed detaches since boot (wrapping).
    pub fn detach_seq(&self) -> u32 {
        self.snapshot().1
    }

    /// Current state and detach count from one load.
    pub fn snapshot(&self) -> (ConnectionState, u32) {
        let w = self.word.load(Ordering::Acquire);
        let state = if w & ATTACHED != 0 {
            ConnectionState::Attached
        } else {
            ConnectionState::Detached
        };
        (state, w >> 1)
    }
}

// ── Consumer half ─────────────────────────────────────────────

/// Previous-tick view of the connection, owned by the poll loop.
#[derive(Debug)]
pub struct ConnectionMonitor {
    last_state: ConnectionState,
    last_detach_seq: u32,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMonitor {
    pub const fn new() -> Self {
        Self {
            last_state: ConnectionState::Detached,
            last_detach_seq: 0,
        }
    }

    pub fn last_state(&self) -> ConnectionState {
        self.last_state
    }

    /// Compare a fresh sample with the previous one and report the edge,
    /// if any. Each physical detach is reported once.
    pub fn observe(&mut self, state: ConnectionState, detach_seq: u32) -> Option<Transition> {
        let detached_since_last = detach_seq != self.last_detach_seq;
        let edge = match (self.last_state, state) {
            (ConnectionState::Detached, ConnectionState::Attached) => Some(Transition::JustAttached),
            (ConnectionState::Attached, ConnectionState::Detached) => Some(Transition::JustDetached),
            // Attach and detach both happened between two samples.
            (ConnectionState::Detached, ConnectionState::Detached) if detached_since_last => {
                Some(Transition::JustDetached)
            }
            _ => None,
        };
        self.last_state = state;
        self.last_detach_seq = detach_seq;
        edge
    }

    /// Sample `flag` and report the edge, if any.
    pub fn poll(&mut self, flag: &ConnectionFlag) -> Option<Transition> {
        let (state, seq) = flag.snapshot();
        self.observe(state, seq)
    }
}
