//! Events that trigger lifecycle transitions

use super::machine::Fault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Boot events
    /// Boot button read as released after the logo
    BootButtonReleased,
    /// Boot button held during the logo, enter access point mode
    BootButtonPressed,

    // Network events
    /// Station link is up
    ConnectionEstablished,
    /// No SSID or passphrase configured
    NoCredentials,
    /// Station link dropped
    ConnectionLost,

    // Requests
    PowerOffRequested,
    RestartRequested,
    /// A wake source fired while sleeping
    WakeUp,

    /// Unrecoverable fault
    FaultDetected(Fault),
}
