//! Lifecycle task
//!
//! The main loop: steps the lifecycle state machine, feeds debounced
//! button states into gesture detection and executes button actions
//! against the display manager. Faults found by other tasks arrive
//! through `FAULTS`.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use pixelix_core::config::{LOOP_PERIOD_MS, STATUS_MESSAGE_DURATION_MS};
use pixelix_core::input::{ButtonAction, ButtonActions, ButtonHandler, ButtonId, ButtonLayout, ButtonState};
use pixelix_core::state::{Lifecycle, SystemContext};
use pixelix_core::traits::{Network, StatusDisplay};
use pixelix_drivers::esp_at::format_address;
use pixelix_drivers::indicator::LedIndicator;

use super::now_ms;
use crate::channels::{BUTTON_EVENTS, FAULTS};
use crate::network::ModemNetwork;
use crate::platform::{DisplayStatus, RpPlatform, SharedDisplay};
use crate::settings::LoadedSettings;

/// Lifecycle task - system state and button actions
#[embassy_executor::task]
pub async fn lifecycle_task(
    display: &'static SharedDisplay,
    mut settings: LoadedSettings,
    mut indicator: LedIndicator<Output<'static>>,
    layout: ButtonLayout,
) {
    info!("Lifecycle task started");

    let mut lifecycle = Lifecycle::new();
    let mut network = ModemNetwork;
    let mut status = DisplayStatus::new(display);
    let mut platform = RpPlatform;

    let mut handler = ButtonHandler::new();
    let mut actions = ButtonActions::new();
    let mut ok_button = ButtonState::Unknown;

    let mut ticker = Ticker::every(Duration::from_millis(LOOP_PERIOD_MS as u64));

    loop {
        ticker.next().await;
        let now = now_ms();

        if let Some(fault) = FAULTS.try_take() {
            lifecycle.report_fault(fault);
        }

        while let Some(event) = BUTTON_EVENTS.receive() {
            if event.id == ButtonId::Ok {
                ok_button = event.state;
            }
            handler.on_state(event.id, event.state, event.timestamp_ms);
        }

        let state = {
            let mut ctx = SystemContext {
                now_ms: now,
                ok_button,
                settings: &mut settings,
                network: &mut network,
                display: &mut status,
                indicator: &mut indicator,
                platform: &mut platform,
            };
            lifecycle.step(&mut ctx)
        };

        while let Some((id, gesture)) = handler.poll(now) {
            if !state.accepts_button_actions() {
                continue;
            }

            let Some(action) = layout.action(id, gesture) else {
                continue;
            };
            debug!("Button {:?} {:?} -> {:?}", id, gesture, action);

            if display.lock(|dm| actions.execute(action, dm)) {
                continue;
            }
            match action {
                ButtonAction::ShowIpAddress => show_address(&network, &mut status),
                ButtonAction::PowerOff => lifecycle.request_power_off(),
                ButtonAction::Restart => lifecycle.request_restart(),
                _ => {}
            }
        }
    }
}

fn show_address(network: &ModemNetwork, status: &mut DisplayStatus) {
    match network.address() {
        Some(octets) => {
            let address = format_address(octets);
            status.show_message(&address, STATUS_MESSAGE_DURATION_MS);
        }
        None => {
            status.show_message("No IP address", STATUS_MESSAGE_DURATION_MS);
        }
    }
}
