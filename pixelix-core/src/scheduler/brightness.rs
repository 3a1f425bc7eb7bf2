//! Display brightness

use crate::config::{MAX_BRIGHTNESS, MIN_BRIGHTNESS};

/// Brightness level clamped to `[MIN_BRIGHTNESS, MAX_BRIGHTNESS]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brightness {
    level: u8,
    automatic: bool,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new(MIN_BRIGHTNESS)
    }
}

impl Brightness {
    pub fn new(level: u8) -> Self {
        let mut brightness = Self {
            level: MIN_BRIGHTNESS,
            automatic: false,
        };
        brightness.set(level);
        brightness
    }

    /// Set the level, returns the clamped value actually applied
    pub fn set(&mut self, level: u8) -> u8 {
        self.level = level.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        self.level
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn set_automatic(&mut self, enable: bool) {
        self.automatic = enable;
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic
    }
}
