//! Inbound byte queue from radio callback (producer) to application loop (consumer).
//!
//! A bounded `embassy-sync` channel of bytes guarded by a critical-section
//! mutex, so the Bluedroid task can push while the main loop drains. The
//! producer never blocks: a full queue drops the byte and counts it.
//!
//! ```text
//! ┌──────────────┐ push(u8) ┌──────────────────┐ read_line / flush ┌─────────────┐
//! │ GATTS write  │────────▶│  Channel<u8, N>   │─────────────────▶│  Main loop  │
//! │ (stack task) │          │  (bounded FIFO)  │                   │  (consumer) │
//! └──────────────┘          └──────────────────┘                   └─────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Fixed-capacity FIFO of bytes, safe for one producer context and one
/// consumer context running concurrently.
pub struct InboundByteQueue<const N: usize> {
    chan: Channel<CriticalSectionRawMutex, u8, N>,
    accepted: AtomicU32,
    dropped: AtomicU32,
}

impl<const N: usize> Default for InboundByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> InboundByteQueue<N> {
    /// Empty queue. A zero capacity is rejected at compile time.
    pub const fn new() -> Self {
        const { assert!(N > 0, "rx queue capacity must be non-zero") };
        Self {
            chan: Channel::new(),
            accepted: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.chan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chan.is_empty()
    }

    // ── Producer side ─────────────────────────────────────────

    /// Append one byte. Returns `false` and drops the byte if the queue
    /// is full; the caller must not retry.
    pub fn push(&self, byte: u8) -> bool {
        if self.chan.try_send(byte).is_ok() {
            self.accepted.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Append a payload in order. Returns how many bytes were accepted;
    /// the rest were dropped.
    pub fn push_slice(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.push(b)).count()
    }

    // ── Consumer side ─────────────────────────────────────────

    /// Remove the oldest byte without blocking.
    pub fn pop(&self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        self.take_after_check("read")
    }

    /// Pop bytes until `delimiter` is popped and return what came before
    /// it. If the queue runs dry first, the partial line is returned and
    /// the delimiter is simply absent.
    pub fn read_line(&self, delimiter: u8) -> heapless::Vec<u8, N> {
        let mut line = heapless::Vec::new();
        while !self.is_empty() && !line.is_full() {
            let Some(byte) = self.take_after_check("read_line") else {
                return line;
            };
            if byte == delimiter {
                return line;
            }
            // Cannot fail: fullness checked above.
            let _ = line.push(byte);
        }
        line
    }

    /// Discard everything currently queued.
    pub fn flush(&self) {
        while !self.is_empty() {
            if self.take_after_check("flush").is_none() {
                return;
            }
        }
    }

    /// Bytes accepted since boot.
    pub fn accepted(&self) -> u32 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Bytes dropped on a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Receive after the caller observed a non-empty queue. A failure here
    /// means another consumer drained it in between; treat as "no more".
    fn take_after_check(&self, op: &str) -> Option<u8> {
        match self.chan.try_receive() {
            Ok(byte) => Some(byte),
            Err(_) => {
                warn!("rx queue: {} found queue empty after length check", op);
                None
            }
        }
    }
}
