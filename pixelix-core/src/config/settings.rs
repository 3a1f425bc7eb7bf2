//! Persistent settings
//!
//! Read by the lifecycle at `Init`/`Connecting` entry only. Stored in
//! flash as postcard binary data; defaults apply when nothing is stored.

use heapless::String;

use super::timing::DEFAULT_SLOT_DURATION_MS;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current settings layout version
pub const SETTINGS_VERSION: u8 = 1;

/// Maximum hostname length
pub const MAX_HOSTNAME_LEN: usize = 32;

/// Maximum SSID length (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum passphrase length (WPA2 limit)
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Device settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    /// Layout version
    pub version: u8,
    /// Network hostname
    pub hostname: String<MAX_HOSTNAME_LEN>,
    /// Station SSID (empty = not configured)
    pub wifi_ssid: String<MAX_SSID_LEN>,
    /// Station passphrase (empty = not configured)
    pub wifi_passphrase: String<MAX_PASSPHRASE_LEN>,
    /// Access point SSID
    pub ap_ssid: String<MAX_SSID_LEN>,
    /// Access point passphrase
    pub ap_passphrase: String<MAX_PASSPHRASE_LEN>,
    /// Suppress connection status messages
    pub quiet_mode: bool,
    /// Ambient-light driven brightness
    pub auto_brightness: bool,
    /// Brightness at startup in percent
    pub brightness_percent: u8,
    /// Global default slot duration in ms
    pub slot_duration_ms: u32,
    /// Fade effect id (see `FadeEffect::from_u8`)
    pub fade_effect: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            hostname: str_or_empty("pixelix"),
            wifi_ssid: String::new(),
            wifi_passphrase: String::new(),
            ap_ssid: str_or_empty("pixelix"),
            ap_passphrase: str_or_empty("Luke, I am your father."),
            quiet_mode: false,
            auto_brightness: false,
            // Keep this low, USB supplies cannot feed a full white matrix.
            brightness_percent: 25,
            slot_duration_ms: DEFAULT_SLOT_DURATION_MS,
            fade_effect: 1,
        }
    }
}

impl Settings {
    /// Check whether station credentials are configured
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty() && !self.wifi_passphrase.is_empty()
    }

    /// Startup brightness scaled to the 0..=255 driver range
    pub fn brightness_level(&self) -> u8 {
        let percent = self.brightness_percent.min(100) as u16;
        (percent * 255 / 100) as u8
    }
}

fn str_or_empty<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_credentials() {
        let settings = Settings::default();
        assert!(!settings.has_wifi_credentials());
        assert_eq!(settings.hostname.as_str(), "pixelix");
        assert!(settings.ap_passphrase.len() >= 8);
    }

    #[test]
    fn test_credentials_need_ssid_and_passphrase() {
        let mut settings = Settings::default();
        let _ = settings.wifi_ssid.push_str("home");
        assert!(!settings.has_wifi_credentials());

        let _ = settings.wifi_passphrase.push_str("secret123");
        assert!(settings.has_wifi_credentials());
    }

    #[test]
    fn test_brightness_level_scaling() {
        let mut settings = Settings::default();
        settings.brightness_percent = 100;
        assert_eq!(settings.brightness_level(), 255);

        settings.brightness_percent = 0;
        assert_eq!(settings.brightness_level(), 0);

        // Out of range percentages are clamped
        settings.brightness_percent = 200;
        assert_eq!(settings.brightness_level(), 255);
    }
}
