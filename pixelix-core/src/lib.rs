//! Board-agnostic coordination core for the LED matrix display firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Slot scheduler with fade transitions and the provider registry
//! - Cross-context message proxy
//! - Button debouncing, gesture detection and button actions
//! - System lifecycle state machine
//! - Collaborator traits (content providers, network, settings, indicator)
//! - Configuration types and timing policy

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod gfx;
pub mod input;
pub mod proxy;
pub mod scheduler;
pub mod state;
pub mod timer;
pub mod traits;
