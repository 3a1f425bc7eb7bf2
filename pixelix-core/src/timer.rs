//! Restartable countdown timer
//!
//! Driven by an externally supplied millisecond clock so it works the same
//! on the target (embassy-time) and in host tests. Wrapping arithmetic keeps
//! it correct across the u32 rollover.

/// Millisecond countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Countdown {
    started_at_ms: u32,
    duration_ms: u32,
    running: bool,
}

impl Countdown {
    /// Create a stopped timer
    pub const fn new() -> Self {
        Self {
            started_at_ms: 0,
            duration_ms: 0,
            running: false,
        }
    }

    /// Start the timer with a new duration
    pub fn start(&mut self, duration_ms: u32, now_ms: u32) {
        self.duration_ms = duration_ms;
        self.started_at_ms = now_ms;
        self.running = true;
    }

    /// Restart with the previous duration
    pub fn restart(&mut self, now_ms: u32) {
        self.started_at_ms = now_ms;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Change the duration without moving the start point
    pub fn set_duration(&mut self, duration_ms: u32) {
        self.duration_ms = duration_ms;
    }

    /// Elapsed time since the last (re)start
    pub fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.started_at_ms)
    }

    /// Check whether a running timer ran out
    ///
    /// A stopped timer is never expired.
    pub fn is_expired(&self, now_ms: u32) -> bool {
        self.running && self.elapsed_ms(now_ms) >= self.duration_ms
    }
}
