//! Collaborator traits
//!
//! These traits define the interface between the coordination logic
//! and the content, network and board implementations.

pub mod input;
pub mod network;
pub mod platform;
pub mod provider;

pub use input::{ButtonObserver, ButtonPins};
pub use network::{Network, NetworkError};
pub use platform::{Indicator, Platform, SettingsError, SettingsStore, StatusDisplay};
pub use provider::{ContentProvider, ProviderError, ProviderUid};
