//! Pixelix - LED Matrix Display Firmware
//!
//! Main firmware binary for an RP2040 driving a 32x8 WS2812 matrix, with
//! an ESP-AT modem for Wi-Fi and up to three push buttons.
//!
//! Content rotates through a handful of slots, each hosting one content
//! provider. Status and error texts take over the display through the
//! system message slot.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{PIO0, UART0};
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::ws2812::PioWs2812Program;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pixelix_core::config::{Settings, MAX_SLOTS};
use pixelix_core::gfx::FadeEffect;
use pixelix_core::input::{ButtonId, ButtonLayout};
use pixelix_core::scheduler::{DisplayManager, ProviderRegistry, SYSTEM_MESSAGE_NAME};
use pixelix_core::state::{BlinkPattern, Fault};
use pixelix_core::traits::{Indicator, ProviderUid};
use pixelix_drivers::buttons::ButtonInput;
use pixelix_drivers::esp_at::EspAtModem;
use pixelix_drivers::indicator::LedIndicator;
use pixelix_hal_rp2040::flash::{FlashError, Rp2040FlashStorage};
use pixelix_hal_rp2040::ws2812::Ws2812Strip;

use crate::channels::PIN_LEVELS;
use crate::platform::SharedDisplay;
use crate::providers::{build_provider, Provider, Registry, JUST_TEXT_NAME};
use crate::settings::{ConfigError, ConfigPersistence, LoadedSettings};

mod channels;
mod network;
mod platform;
mod providers;
mod settings;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

/// Board button wiring: Left and Right on GPIO3/GPIO4, Ok on GPIO2
const BUTTON_LAYOUT: ButtonLayout = ButtonLayout::TwoButtons;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

static DISPLAY: StaticCell<SharedDisplay> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pixelix firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Status LED (Pico onboard LED on GPIO25)
    let mut indicator = LedIndicator::new(Output::new(p.PIN_25, Level::Low), false);

    // Settings and slot table
    let mut persistence = ConfigPersistence::new(Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0));
    let (settings, settings_error) = persistence.load_or_default().await;
    let slots = persistence.load_slots().await;

    if let (Some(_), Err(ConfigError::Flash(FlashError::Flash))) = (settings_error, &slots) {
        // Neither record readable, the flash itself is failing
        halt_with_fault(&mut indicator, Fault::BadFilesystem).await;
    }

    // Display manager with the system message slot and the stored providers
    let display: &'static SharedDisplay = DISPLAY.init(SharedDisplay::new(DisplayManager::new()));
    let mut registry: Registry =
        ProviderRegistry::new(build_provider as fn(&str, ProviderUid) -> Option<Provider>);

    let installed = display.lock(|dm| {
        apply_settings(dm, &settings);

        if registry.install(dm, SYSTEM_MESSAGE_NAME, Some(0)).is_none() {
            return false;
        }

        let restored = match &slots {
            Ok(configs) => registry.restore(dm, configs),
            Err(ConfigError::Flash(FlashError::NotFound)) => 0,
            Err(e) => {
                warn!("Failed to load slot configuration: {:?}", e);
                0
            }
        };

        if restored == 0 {
            info!("No stored providers, installing defaults");
            let _ = registry.install(dm, JUST_TEXT_NAME, None);
        }
        true
    });

    if !installed {
        halt_with_fault(&mut indicator, Fault::SystemMessage).await;
    }
    info!("Display manager ready");

    // WS2812 matrix on PIO0 (data on GPIO16)
    let Pio {
        mut common,
        sm0,
        ..
    } = Pio::new(p.PIO0, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let strip = Ws2812Strip::new(&mut common, sm0, p.DMA_CH1, p.PIN_16, &program);

    // ESP-AT modem on UART0 (TX GPIO0, RX GPIO1, 115200 baud)
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 512]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let modem = EspAtModem::new(uart.into_buffered(Irqs, tx_buf, rx_buf));
    info!("UART initialized for the Wi-Fi modem");

    // Buttons, active low with pull-ups
    let ok = button(ButtonId::Ok, Input::new(p.PIN_2, Pull::Up));
    let left = button(ButtonId::Left, Input::new(p.PIN_3, Pull::Up));
    let right = button(ButtonId::Right, Input::new(p.PIN_4, Pull::Up));

    // Spawn tasks
    spawner.spawn(tasks::button_edge_task(ok)).unwrap();
    spawner.spawn(tasks::button_edge_task(left)).unwrap();
    spawner.spawn(tasks::button_edge_task(right)).unwrap();
    spawner.spawn(tasks::debounce_task()).unwrap();
    spawner.spawn(tasks::display_task(display, strip)).unwrap();
    spawner.spawn(tasks::modem_task(modem)).unwrap();
    spawner
        .spawn(tasks::storage_task(display, registry, persistence, settings.clone()))
        .unwrap();
    spawner
        .spawn(tasks::lifecycle_task(
            display,
            LoadedSettings::new(settings, settings_error),
            indicator,
            BUTTON_LAYOUT,
        ))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Wrap a button pin, reading GPIO inputs cannot fail on the RP2040
fn button(id: ButtonId, pin: Input<'static>) -> ButtonInput<'static, Input<'static>> {
    match ButtonInput::new(id, pin, &PIN_LEVELS) {
        Ok(input) => input,
        Err(never) => match never {},
    }
}

/// Apply the stored display settings
fn apply_settings(dm: &mut DisplayManager<Provider, MAX_SLOTS>, settings: &Settings) {
    dm.set_brightness(settings.brightness_level());
    dm.set_automatic_brightness(settings.auto_brightness);
    dm.set_default_slot_duration(settings.slot_duration_ms);
    dm.set_fade_effect(FadeEffect::from_u8(settings.fade_effect));
}

/// Blink the fault code forever, never returns
///
/// Used for faults found before the scheduler runs, when no text can be
/// shown on the matrix.
async fn halt_with_fault(indicator: &mut LedIndicator<Output<'static>>, fault: Fault) {
    error!("Fatal: {} (code {})", fault.description(), fault.code());

    let mut pattern = BlinkPattern::new(fault);
    loop {
        if let Some(on) = pattern.update(tasks::now_ms()) {
            indicator.set(on);
        }
        Timer::after_millis(10).await;
    }
}
