//! Storage task
//!
//! Writes the slot table back to flash when slots changed, and the
//! settings when the fade effect was switched with the buttons. Changes
//! are collected for a while so a burst of button presses costs one write.

use defmt::*;
use embassy_time::{Duration, Ticker};

use pixelix_core::config::Settings;

use crate::platform::SharedDisplay;
use crate::providers::Registry;
use crate::settings::ConfigPersistence;

/// Interval between checks for unsaved changes
const SAVE_INTERVAL_S: u64 = 10;

/// Storage task - persists slot table and settings changes
#[embassy_executor::task]
pub async fn storage_task(
    display: &'static SharedDisplay,
    registry: Registry,
    mut persistence: ConfigPersistence<'static>,
    mut settings: Settings,
) {
    info!("Storage task started");

    let mut ticker = Ticker::every(Duration::from_secs(SAVE_INTERVAL_S));

    loop {
        ticker.next().await;

        let (dirty, slots, fade_effect) = display.lock(|dm| {
            let dirty = dm.take_dirty_slots();
            let slots = (!dirty.is_empty()).then(|| registry.slot_configs(dm));
            (dirty, slots, dm.fade_effect().as_u8())
        });

        if let Some(slots) = slots {
            if let Err(e) = persistence.save_slots(&slots).await {
                warn!("Failed to save slot configuration: {:?}", e);
                // Retried on the next round
                display.lock(|dm| dm.mark_dirty(&dirty));
            }
        }

        if fade_effect != settings.fade_effect {
            let mut updated = settings.clone();
            updated.fade_effect = fade_effect;
            match persistence.save_settings(&updated).await {
                Ok(()) => settings = updated,
                Err(e) => warn!("Failed to save settings: {:?}", e),
            }
        }
    }
}
