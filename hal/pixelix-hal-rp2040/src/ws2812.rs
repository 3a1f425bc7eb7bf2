//! WS2812 output on a PIO state machine
//!
//! Thin wrapper around embassy-rp's DMA-fed WS2812 program, sized to the
//! matrix at compile time.

use embassy_rp::dma::Channel;
use embassy_rp::pio::{Common, Instance, PioPin, StateMachine};
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::Peri;
use smart_leds::RGB8;

pub struct Ws2812Strip<'d, P: Instance, const S: usize, const N: usize> {
    driver: PioWs2812<'d, P, S, N>,
    buffer: [RGB8; N],
}

impl<'d, P: Instance, const S: usize, const N: usize> Ws2812Strip<'d, P, S, N> {
    pub fn new(
        common: &mut Common<'d, P>,
        sm: StateMachine<'d, P, S>,
        dma: Peri<'d, impl Channel>,
        pin: Peri<'d, impl PioPin>,
        program: &PioWs2812Program<'d, P>,
    ) -> Self {
        Self {
            driver: PioWs2812::new(common, sm, dma, pin, program),
            buffer: [RGB8::default(); N],
        }
    }
}

impl<P: Instance, const S: usize, const N: usize> pixelix_hal::LedStrip for Ws2812Strip<'_, P, S, N> {
    fn len(&self) -> usize {
        N
    }

    async fn write(&mut self, pixels: &[RGB8]) {
        for (dst, src) in self.buffer.iter_mut().zip(pixels) {
            *dst = *src;
        }
        self.driver.write(&self.buffer).await;
    }
}
