//! Button input
//!
//! Debouncing, gesture detection (short-pulse counting and holds) and the
//! mapping of gestures to display actions.

pub mod actions;
pub mod button;
pub mod debounce;
pub mod handler;

pub use actions::{ButtonAction, ButtonActions, ButtonLayout};
pub use button::{ButtonEvent, ButtonId, ButtonState, PinLevel, BUTTON_COUNT};
pub use debounce::Debouncer;
pub use handler::{ButtonHandler, Gesture};
