//! Button gesture detection
//!
//! Releases that follow a press shorter than the short-pulse threshold are
//! counted as triggers. Once no new press arrives within the threshold the
//! trigger count is reported. A button held longer than the threshold
//! reports `Held` repeatedly until it is released.

use super::button::{ButtonId, ButtonState, BUTTON_COUNT};
use crate::config::{HOLD_REPEAT_MS, SHORT_PULSE_THRESHOLD_MS};
use crate::timer::Countdown;

/// Detected gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    /// Number of short presses in a row
    Triggered(u8),
    /// Button held down (repeats)
    Held,
}

#[derive(Debug, Clone, Copy)]
struct PulseCounter {
    state: ButtonState,
    changed_at_ms: u32,
    triggers: u8,
    timer: Countdown,
    last_hold_ms: Option<u32>,
}

impl PulseCounter {
    const fn new() -> Self {
        Self {
            state: ButtonState::Unknown,
            changed_at_ms: 0,
            triggers: 0,
            timer: Countdown::new(),
            last_hold_ms: None,
        }
    }

    fn on_state(&mut self, state: ButtonState, now_ms: u32) {
        match (self.state, state) {
            (ButtonState::Pressed, ButtonState::Released) => {
                if now_ms.wrapping_sub(self.changed_at_ms) < SHORT_PULSE_THRESHOLD_MS {
                    self.triggers = self.triggers.saturating_add(1);
                }
                self.timer.start(SHORT_PULSE_THRESHOLD_MS, now_ms);
            }
            (_, ButtonState::Pressed) => {
                self.timer.start(SHORT_PULSE_THRESHOLD_MS, now_ms);
            }
            _ => {}
        }

        if state != ButtonState::Pressed {
            self.last_hold_ms = None;
        }
        self.state = state;
        self.changed_at_ms = now_ms;
    }

    fn poll(&mut self, now_ms: u32) -> Option<Gesture> {
        if !self.timer.is_expired(now_ms) {
            return None;
        }

        match self.state {
            ButtonState::Released => {
                self.timer.stop();
                let triggers = core::mem::take(&mut self.triggers);
                (triggers > 0).then_some(Gesture::Triggered(triggers))
            }
            // A hold only counts if it did not follow short presses
            ButtonState::Pressed if self.triggers == 0 => {
                let due = self
                    .last_hold_ms
                    .map(|last| now_ms.wrapping_sub(last) >= HOLD_REPEAT_MS)
                    .unwrap_or(true);
                if due {
                    self.last_hold_ms = Some(now_ms);
                    Some(Gesture::Held)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Gesture detection for all buttons
#[derive(Debug, Clone)]
pub struct ButtonHandler {
    counters: [PulseCounter; BUTTON_COUNT],
}

impl Default for ButtonHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonHandler {
    pub const fn new() -> Self {
        Self {
            counters: [PulseCounter::new(); BUTTON_COUNT],
        }
    }

    /// Feed a debounced state change
    pub fn on_state(&mut self, id: ButtonId, state: ButtonState, now_ms: u32) {
        self.counters[id.index()].on_state(state, now_ms);
    }

    /// Check for a completed gesture, at most one per call
    pub fn poll(&mut self, now_ms: u32) -> Option<(ButtonId, Gesture)> {
        ButtonId::ALL.iter().find_map(|&id| {
            self.counters[id.index()]
                .poll(now_ms)
                .map(|gesture| (id, gesture))
        })
    }

    /// Forget all partial gestures
    pub fn reset(&mut self) {
        self.counters = [PulseCounter::new(); BUTTON_COUNT];
    }
}
