//! Pixelix Hardware Abstraction Layer
//!
//! Traits the firmware needs from the chip-specific HAL:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pixelix-firmware                       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pixelix-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          ┌─────────────────────┐
//!          │ pixelix-hal-rp2040  │
//!          └─────────────────────┘
//! ```
//!
//! - [`flash::FlashStorage`] - Persistent key-value storage
//! - [`led::LedStrip`] - Addressable LED output

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod led;

pub use flash::{FlashError, FlashStorage, StorageKey};
pub use led::LedStrip;
pub use smart_leds::RGB8;
