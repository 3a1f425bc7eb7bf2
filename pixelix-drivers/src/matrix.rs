//! LED matrix wiring
//!
//! Maps frame coordinates to the position of the LED in the chain and
//! applies the global brightness on the way out.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use pixelix_core::gfx::Frame;
use smart_leds::RGB8;

/// How the LED chain runs through the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wiring {
    /// Every row left to right
    RowMajor,
    /// Even rows left to right, odd rows right to left
    SerpentineRows,
    /// Even columns top to bottom, odd columns bottom to top
    SerpentineColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout {
    width: usize,
    height: usize,
    wiring: Wiring,
}

impl MatrixLayout {
    pub const fn new(width: usize, height: usize, wiring: Wiring) -> Self {
        Self {
            width,
            height,
            wiring,
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chain index of the LED at (x, y)
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = match self.wiring {
            Wiring::RowMajor => y * self.width + x,
            Wiring::SerpentineRows if y % 2 == 0 => y * self.width + x,
            Wiring::SerpentineRows => y * self.width + (self.width - 1 - x),
            Wiring::SerpentineColumns if x % 2 == 0 => x * self.height + y,
            Wiring::SerpentineColumns => x * self.height + (self.height - 1 - y),
        };
        Some(index)
    }

    /// Convert a frame to chain order with `brightness` applied
    ///
    /// Pixels outside the layout are skipped.
    pub fn render<const W: usize, const H: usize>(
        &self,
        frame: &Frame<W, H>,
        brightness: u8,
        out: &mut [RGB8],
    ) {
        for (y, row) in frame.rows().iter().enumerate() {
            for (x, color) in row.iter().enumerate() {
                if let Some(led) = self.index(x, y).and_then(|i| out.get_mut(i)) {
                    *led = scale(*color, brightness);
                }
            }
        }
    }
}

fn scale(color: Rgb888, brightness: u8) -> RGB8 {
    let dim = |value: u8| ((value as u16 * (brightness as u16 + 1)) >> 8) as u8;
    RGB8::new(dim(color.r()), dim(color.g()), dim(color.b()))
}
