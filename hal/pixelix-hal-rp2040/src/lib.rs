//! RP2040-specific HAL for the LED matrix firmware
//!
//! Implementations of the shared `pixelix-hal` traits:
//!
//! - Flash storage driver (implements `pixelix_hal::FlashStorage`)
//! - PIO-driven WS2812 output (implements `pixelix_hal::LedStrip`)

#![no_std]

pub mod flash;
pub mod ws2812;

pub use pixelix_hal::{FlashStorage as FlashStorageTrait, LedStrip, StorageKey};
