//! Display refresh task
//!
//! Runs the scheduler every update period and pushes the rendered frame to
//! the LED chain. The frame is copied out under the display lock; the slow
//! LED write happens outside it.

use defmt::*;
use embassy_rp::peripherals::PIO0;
use embassy_time::{Duration, Ticker};
use smart_leds::RGB8;

use pixelix_core::config::{MATRIX_HEIGHT, MATRIX_WIDTH, UPDATE_PERIOD_MS};
use pixelix_drivers::matrix::{MatrixLayout, Wiring};
use pixelix_hal_rp2040::ws2812::Ws2812Strip;
use pixelix_hal_rp2040::LedStrip;

use super::now_ms;
use crate::platform::SharedDisplay;

/// Number of LEDs in the chain
pub const LED_COUNT: usize = MATRIX_WIDTH * MATRIX_HEIGHT;

/// Matrix output on PIO0, state machine 0
pub type MatrixStrip = Ws2812Strip<'static, PIO0, 0, LED_COUNT>;

/// Display task - scheduler tick and LED refresh
#[embassy_executor::task]
pub async fn display_task(display: &'static SharedDisplay, mut strip: MatrixStrip) {
    info!("Display task started");

    let layout = MatrixLayout::new(MATRIX_WIDTH, MATRIX_HEIGHT, Wiring::SerpentineColumns);
    let mut pixels = [RGB8::default(); LED_COUNT];
    let mut ticker = Ticker::every(Duration::from_millis(UPDATE_PERIOD_MS as u64));

    loop {
        ticker.next().await;

        display.lock(|dm| {
            dm.tick(now_ms());
            layout.render(dm.frame(), dm.brightness(), &mut pixels);
        });

        strip.write(&pixels).await;
    }
}
