//! Board services used by the lifecycle

use crate::config::Settings;

/// Settings could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Underlying storage failed
    Storage,
    /// Stored data could not be decoded
    Corrupted,
}

/// Persistent settings source
pub trait SettingsStore {
    fn load(&mut self) -> Result<Settings, SettingsError>;
}

/// Display side of the lifecycle: status messages and power
pub trait StatusDisplay {
    /// Queue a transient status message
    fn show_message(&mut self, text: &str, duration_ms: u32) -> bool;

    /// Drop the message being shown and everything queued behind it
    fn clear_messages(&mut self);

    /// Forward the link state to the content providers
    fn set_network_status(&mut self, is_connected: bool);

    fn display_on(&mut self);

    fn display_off(&mut self);

    /// The scheduler is running and can show messages
    fn is_ready(&self) -> bool;
}

/// Single status LED used for blink codes
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Power management and reset
pub trait Platform {
    /// Arm the wake sources for sleep
    ///
    /// Returns false if a wake source is already active (e.g. a button is
    /// held), in which case sleeping is not possible right now.
    fn arm_wake_sources(&mut self) -> bool;

    /// Enter low-power sleep
    fn sleep(&mut self);

    /// A wake source fired since `sleep` was entered
    fn has_woken(&mut self) -> bool;

    /// Reset the device
    fn reboot(&mut self);
}
