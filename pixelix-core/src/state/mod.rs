//! System lifecycle
//!
//! Boot, network setup, connected/degraded operation, error, restart and
//! sleep. Transitions are a pure function of the current state and an
//! event; `Lifecycle` runs the per-state entry, process and exit hooks.

pub mod blink;
pub mod events;
pub mod lifecycle;
pub mod machine;

pub use blink::BlinkPattern;
pub use events::Event;
pub use lifecycle::{Lifecycle, SystemContext};
pub use machine::{Fault, SystemState};
