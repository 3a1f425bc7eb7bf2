//! Wi-Fi network interface

/// Network operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkError {
    /// Interface not initialized or busy
    NotReady,
    /// Command rejected by the interface
    Rejected,
    /// Invalid SSID, passphrase or hostname
    InvalidParameter,
}

/// Station and access point control
///
/// All calls are non-blocking: they start an operation and the lifecycle
/// polls `is_connected` on later ticks.
pub trait Network {
    /// Start a connection attempt as station
    fn connect(&mut self, ssid: &str, passphrase: &str) -> Result<(), NetworkError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self);

    fn set_hostname(&mut self, hostname: &str) -> Result<(), NetworkError>;

    fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<(), NetworkError>;

    fn stop_access_point(&mut self);

    /// Current IPv4 address, if any
    fn address(&self) -> Option<[u8; 4]>;
}
