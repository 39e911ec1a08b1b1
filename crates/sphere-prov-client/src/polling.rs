//! # Cooperative Polling
//!
//! Registration is not awaited. The session calls `do_work`, pauses for
//! [`POLL_INTERVAL`], and repeats until the callback fires or the
//! [`PollBudget`] is spent.
//!
//! The budget is `timeout_ms / 100` ticks, clamped to at least one, so the
//! effective deadline is `max(1, ⌊timeout_ms / 100⌋) × 100 ms`. A timeout
//! below one interval still gets a single tick.

use std::time::Duration;

/// Fixed pause between `do_work` ticks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of `do_work` ticks one registration may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    ticks: u32,
}

impl PollBudget {
    /// Budget for a caller timeout in milliseconds.
    pub fn from_timeout_ms(timeout_ms: u32) -> Self {
        let per_tick = POLL_INTERVAL.as_millis() as u32;
        Self {
            ticks: (timeout_ms / per_tick).max(1),
        }
    }

    /// Total ticks allowed.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Wall-clock time the budget represents.
    pub fn deadline(&self) -> Duration {
        POLL_INTERVAL * self.ticks
    }
}

/// The pause between ticks.
pub trait Pacer {
    /// Block for `interval`.
    fn pause(&mut self, interval: Duration);
}

/// Sleeps the current thread.
///
/// `std::thread::sleep` resumes for the remaining time when a signal
/// interrupts it, so each pause lasts the full interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}
