//! Board services for the lifecycle
//!
//! Status texts go to the system message provider, power control goes
//! through flags shared with the button tasks.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use portable_atomic::Ordering;

use pixelix_core::config::MAX_SLOTS;
use pixelix_core::scheduler::{post_clear, post_text, SharedDisplayManager};
use pixelix_core::traits::{Platform, StatusDisplay};

use crate::channels::{SLEEPING, SYSTEM_INBOX, WAKE_READY, WOKEN};
use crate::providers::Provider;

/// The display manager shared by the display, lifecycle and storage tasks
pub type SharedDisplay = SharedDisplayManager<CriticalSectionRawMutex, Provider, MAX_SLOTS>;

pub struct DisplayStatus {
    display: &'static SharedDisplay,
}

impl DisplayStatus {
    pub fn new(display: &'static SharedDisplay) -> Self {
        Self { display }
    }
}

impl StatusDisplay for DisplayStatus {
    fn show_message(&mut self, text: &str, duration_ms: u32) -> bool {
        let posted = post_text(&SYSTEM_INBOX, text, duration_ms);
        if !posted {
            warn!("System message inbox full, dropping status text");
        }
        posted
    }

    fn clear_messages(&mut self) {
        if !post_clear(&SYSTEM_INBOX) {
            warn!("System message inbox full, clear dropped");
        }
    }

    fn set_network_status(&mut self, is_connected: bool) {
        self.display.lock(|dm| dm.set_network_status(is_connected));
    }

    fn display_on(&mut self) {
        self.display.lock(|dm| dm.display_on());
    }

    fn display_off(&mut self) {
        self.display.lock(|dm| dm.display_off());
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Sleep and reset control
///
/// Sleeping keeps the executor running: tasks idle in WFE while the
/// display is dark, and any button press raises `WOKEN`.
pub struct RpPlatform;

impl Platform for RpPlatform {
    fn arm_wake_sources(&mut self) -> bool {
        WAKE_READY.load(Ordering::Acquire)
    }

    fn sleep(&mut self) {
        info!("Sleeping until a button is pressed");
        WOKEN.store(false, Ordering::Release);
        SLEEPING.store(true, Ordering::Release);
    }

    fn has_woken(&mut self) -> bool {
        if WOKEN.swap(false, Ordering::AcqRel) {
            SLEEPING.store(false, Ordering::Release);
            info!("Woken up");
            true
        } else {
            false
        }
    }

    fn reboot(&mut self) {
        info!("Rebooting");
        cortex_m::peripheral::SCB::sys_reset();
    }
}
