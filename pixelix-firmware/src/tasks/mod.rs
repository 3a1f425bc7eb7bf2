//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels, proxies
//! and the shared display manager.

pub mod buttons;
pub mod display;
pub mod lifecycle;
pub mod modem;
pub mod storage;

pub use buttons::{button_edge_task, debounce_task};
pub use display::display_task;
pub use lifecycle::lifecycle_task;
pub use modem::modem_task;
pub use storage::storage_task;

use embassy_time::Instant;

/// Milliseconds since boot, wrapping like the core timers expect
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
