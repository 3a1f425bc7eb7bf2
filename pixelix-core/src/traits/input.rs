//! Button input collaborators

use crate::input::{ButtonId, ButtonState, PinLevel};

/// Raw pin access for the debouncer
pub trait ButtonPins {
    /// Current pin level, `None` if the button is not wired
    fn level(&self, id: ButtonId) -> Option<PinLevel>;
}

/// Receiver of debounced button state changes
///
/// Called synchronously from the debounce context, so implementations
/// must not block (typically they just enqueue into a message proxy).
pub trait ButtonObserver {
    fn notify(&mut self, id: ButtonId, state: ButtonState);
}

impl<F> ButtonObserver for F
where
    F: FnMut(ButtonId, ButtonState),
{
    fn notify(&mut self, id: ButtonId, state: ButtonState) {
        self(id, state)
    }
}
