//! Button debouncer
//!
//! Pin-change notifications re-arm a per-button timer to the full debounce
//! window. When a timer runs out without further changes the pin is read
//! once, and the observer is told only if the resulting state differs from
//! the stored one. Any burst of changes inside one window therefore
//! collapses into at most one notification.
//!
//! The caller drives `poll` at least every `queue_timeout_ms`, typically by
//! waiting on the pin-change queue with that timeout.

use super::button::{ButtonId, ButtonState, BUTTON_COUNT};
use crate::timer::Countdown;
use crate::traits::{ButtonObserver, ButtonPins};

#[derive(Debug, Clone, Copy)]
struct DebouncedButton {
    state: ButtonState,
    timer: Countdown,
}

/// Debouncer for all buttons
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u32,
    buttons: [DebouncedButton; BUTTON_COUNT],
}

impl Debouncer {
    /// Create the debouncer and arm every connected button
    ///
    /// Connected buttons start as `Unknown` and resolve after one window.
    /// Buttons without a pin are `NotConnected` for good.
    pub fn new<P: ButtonPins>(pins: &P, window_ms: u32, now_ms: u32) -> Self {
        let buttons = core::array::from_fn(|index| {
            let connected = ButtonId::from_index(index)
                .map(|id| pins.level(id).is_some())
                .unwrap_or(false);

            let mut timer = Countdown::new();
            let state = if connected {
                timer.start(window_ms, now_ms);
                ButtonState::Unknown
            } else {
                ButtonState::NotConnected
            };

            DebouncedButton { state, timer }
        });

        Self { window_ms, buttons }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// How long the driving task may wait for pin changes between polls
    pub fn queue_timeout_ms(&self) -> u32 {
        (self.window_ms / 4).max(1)
    }

    /// A pin change was seen, restart the button's debounce window
    pub fn notify_change(&mut self, id: ButtonId, now_ms: u32) {
        let button = &mut self.buttons[id.index()];
        if button.state != ButtonState::NotConnected {
            button.timer.start(self.window_ms, now_ms);
        }
    }

    /// Commit every button whose window closed
    ///
    /// Returns the number of notifications delivered.
    pub fn poll<P, O>(&mut self, now_ms: u32, pins: &P, observer: &mut O) -> usize
    where
        P: ButtonPins,
        O: ButtonObserver,
    {
        let mut notified = 0;

        for id in ButtonId::ALL {
            let button = &mut self.buttons[id.index()];
            if !button.timer.is_expired(now_ms) {
                continue;
            }
            button.timer.stop();

            let Some(level) = pins.level(id) else {
                continue;
            };

            let state = level.to_state();
            if state != button.state {
                button.state = state;
                observer.notify(id, state);
                notified += 1;
            }
        }

        notified
    }

    /// Replay the current state of every button to a new observer
    pub fn notify_all<O: ButtonObserver>(&self, observer: &mut O) {
        for id in ButtonId::ALL {
            observer.notify(id, self.buttons[id.index()].state);
        }
    }

    pub fn state(&self, id: ButtonId) -> ButtonState {
        self.buttons[id.index()].state
    }

    /// Check whether all buttons may be armed as wake sources
    ///
    /// Refused while any connected button is held (by debounced state or
    /// by the live pin level), since that would wake the device right away.
    pub fn arm_wake_sources<P: ButtonPins>(&self, pins: &P) -> bool {
        ButtonId::ALL.iter().all(|&id| {
            let button = &self.buttons[id.index()];
            match button.state {
                ButtonState::NotConnected => true,
                ButtonState::Released => pins
                    .level(id)
                    .map(|level| level.to_state() == ButtonState::Released)
                    .unwrap_or(true),
                ButtonState::Unknown | ButtonState::Pressed => false,
            }
        })
    }
}
