//! Hardware driver implementations
//!
//! Concrete implementations of the collaborator traits defined in
//! pixelix-core:
//!
//! - Button pins (edge waiting, level mirror shared with the debouncer)
//! - Status indicator LED
//! - LED matrix wiring and brightness scaling
//! - ESP-AT Wi-Fi modem on a serial port

#![no_std]
#![deny(unsafe_code)]

pub mod buttons;
pub mod esp_at;
pub mod indicator;
pub mod matrix;
