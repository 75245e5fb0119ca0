//! Outbound path helpers: notification pacing and the self-test payload.
//!
//! Bluedroid queues notifications internally and starts dropping (or
//! stalls the host task) when pushed too hard. [`NotifyPacer`] is a
//! token bucket in front of every notify; [`TestPattern`] produces the
//! `testN\n` payload used to exercise the path end to end.

use burster::Limiter;
use core::time::Duration;

/// Length of a self-test payload.
pub const TEST_PAYLOAD_LEN: usize = 6;

// ── Self-test payload ─────────────────────────────────────────

/// Rolling `test0\n` … `test9\n` generator.
#[derive(Debug, Default)]
pub struct TestPattern {
    counter: u8,
}

impl TestPattern {
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Digit the next payload will carry.
    pub fn peek_digit(&self) -> u8 {
        self.counter
    }

    /// Produce the next payload and advance the counter (wraps after 9).
    pub fn next_payload(&mut self) -> [u8; TEST_PAYLOAD_LEN] {
        let payload = [b't', b'e', b's', b't', b'0' + self.counter, b'\n'];
        self.counter = (self.counter + 1) % 10;
        payload
    }
}

// ── Notification pacing ───────────────────────────────────────

/// Token bucket limiting notifications per second.
pub struct NotifyPacer {
    bucket: burster::TokenBucket<fn() -> Duration>,
}

impl NotifyPacer {
    pub fn new(rate_per_sec: u64, burst: u64) -> Self {
        Self {
            bucket: burster::TokenBucket::new_with_time_provider(
                rate_per_sec,
                burst,
                platform_now as fn() -> Duration,
            ),
        }
    }

    /// Take one notification slot if available.
    pub fn try_acquire(&mut self) -> bool {
        self.bucket.try_consume(1).is_ok()
    }
}

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
