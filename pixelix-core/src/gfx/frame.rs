//! Matrix frame buffer
//!
//! Providers draw into a `Frame` through embedded-graphics; the display task
//! copies the scheduler's output frame to the LED strip.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;

use crate::config::{MATRIX_HEIGHT, MATRIX_WIDTH};

/// Frame buffer sized to the board's matrix
pub type MatrixFrame = Frame<MATRIX_WIDTH, MATRIX_HEIGHT>;

/// Row-major RGB frame buffer, `W` columns by `H` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<const W: usize, const H: usize>([[Rgb888; W]; H]);

impl<const W: usize, const H: usize> Frame<W, H> {
    /// Create a black frame
    #[must_use]
    pub const fn new() -> Self {
        Self([[Rgb888::BLACK; W]; H])
    }

    pub const fn width(&self) -> usize {
        W
    }

    pub const fn height(&self) -> usize {
        H
    }

    pub fn fill_screen(&mut self, color: Rgb888) {
        for row in self.0.iter_mut() {
            row.fill(color);
        }
    }

    pub fn clear(&mut self) {
        self.fill_screen(Rgb888::BLACK);
    }

    /// Set one pixel, coordinates outside the frame are ignored
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if x >= 0 && y >= 0 && (x as usize) < W && (y as usize) < H {
            self.0[y as usize][x as usize] = color;
        }
    }

    /// Read one pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb888> {
        self.0.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.0 = other.0;
    }

    pub fn rows(&self) -> &[[Rgb888; W]; H] {
        &self.0
    }
}

impl<const W: usize, const H: usize> Default for Frame<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> OriginDimensions for Frame<W, H> {
    fn size(&self) -> Size {
        Size::new(W as u32, H as u32)
    }
}

impl<const W: usize, const H: usize> DrawTarget for Frame<W, H> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.draw_pixel(coord.x, coord.y, color);
        }
        Ok(())
    }
}
