//! Addressable LED output

use smart_leds::RGB8;

/// Chain of addressable LEDs, written one full frame at a time
pub trait LedStrip {
    /// Number of LEDs in the chain
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push `pixels` to the chain
    ///
    /// Extra pixels are ignored, missing ones are left unchanged.
    fn write(&mut self, pixels: &[RGB8]) -> impl core::future::Future<Output = ()>;
}
