//! Indicator blink codes
//!
//! A fault is signalled as groups of `code` short pulses separated by a
//! long pause. Code 0 blinks continuously.

use super::machine::Fault;
use crate::config::{BLINK_LONG_OFF_MS, BLINK_ON_MS, BLINK_SHORT_OFF_MS};
use crate::timer::Countdown;

#[derive(Debug, Clone)]
pub struct BlinkPattern {
    pulses: u8,
    /// Pulses emitted in the current group
    count: u8,
    led_on: bool,
    timer: Countdown,
}

impl BlinkPattern {
    pub fn new(fault: Fault) -> Self {
        Self::with_pulses(fault.blink_count())
    }

    pub fn with_pulses(pulses: u8) -> Self {
        Self {
            pulses,
            count: 0,
            led_on: false,
            timer: Countdown::new(),
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.pulses == 0
    }

    pub fn is_on(&self) -> bool {
        self.led_on
    }

    /// Advance the pattern
    ///
    /// Returns the new LED level when it changes.
    pub fn update(&mut self, now_ms: u32) -> Option<bool> {
        if self.timer.is_running() && !self.timer.is_expired(now_ms) {
            return None;
        }

        if self.led_on {
            self.led_on = false;
            let pause = if self.is_continuous() || self.count < self.pulses {
                BLINK_SHORT_OFF_MS
            } else {
                self.count = 0;
                BLINK_LONG_OFF_MS
            };
            self.timer.start(pause, now_ms);
        } else {
            self.led_on = true;
            self.count = self.count.saturating_add(1);
            self.timer.start(BLINK_ON_MS, now_ms);
        }

        Some(self.led_on)
    }
}
