//! Lifecycle runner
//!
//! Owns the current state and its per-state data. The main loop calls
//! `step` every tick with a `SystemContext` borrowing the board services.
//! Other contexts only post requests; the active state's process hook
//! turns them into events.

use core::fmt::Write;

use heapless::String;

use super::blink::BlinkPattern;
use super::events::Event;
use super::machine::{Fault, SystemState};
use crate::config::{
    Settings, AP_PASSPHRASE_MIN_LEN, INFINITE_DURATION_MS, RESTART_DELAY_MS, RETRY_DELAY_MS,
    SHOW_LOGO_DURATION_MS, STATUS_MESSAGE_DURATION_MS,
};
use crate::input::ButtonState;
use crate::timer::Countdown;
use crate::traits::{Indicator, Network, Platform, SettingsStore, StatusDisplay};

/// Board services and inputs for one lifecycle step
pub struct SystemContext<'a> {
    pub now_ms: u32,
    /// Debounced state of the boot button
    pub ok_button: ButtonState,
    pub settings: &'a mut dyn SettingsStore,
    pub network: &'a mut dyn Network,
    pub display: &'a mut dyn StatusDisplay,
    pub indicator: &'a mut dyn Indicator,
    pub platform: &'a mut dyn Platform,
}

impl SystemContext<'_> {
    /// Replace whatever is shown, including texts that never expire
    fn show_only(&mut self, text: &str, duration_ms: u32) {
        if self.display.is_ready() {
            self.display.clear_messages();
        }
        self.show(text, duration_ms);
    }

    fn show(&mut self, text: &str, duration_ms: u32) {
        if self.display.is_ready() && !self.display.show_message(text, duration_ms) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Status message dropped");
        }
    }
}

pub struct Lifecycle {
    state: SystemState,
    entered: bool,
    /// Event produced by an entry hook, handled on the next step
    pending: Option<Event>,
    settings: Option<Settings>,
    timer: Countdown,
    blink: Option<BlinkPattern>,
    sleeping: bool,
    restart_requested: bool,
    power_off_requested: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            state: SystemState::Init,
            entered: false,
            pending: None,
            settings: None,
            timer: Countdown::new(),
            blink: None,
            sleeping: false,
            restart_requested: false,
            power_off_requested: false,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Settings loaded when the network setup started
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    pub fn request_power_off(&mut self) {
        self.power_off_requested = true;
    }

    /// Report a fault detected outside the lifecycle
    pub fn report_fault(&mut self, fault: Fault) {
        self.pending = Some(Event::FaultDetected(fault));
    }

    /// Run one main-loop tick
    pub fn step(&mut self, ctx: &mut SystemContext<'_>) -> SystemState {
        if !self.entered {
            self.entered = true;
            self.entry(ctx);
        }

        let event = match self.pending.take() {
            Some(event) => Some(event),
            None => self.process(ctx),
        };

        if let Some(event) = event {
            self.handle(event, ctx);
        }

        self.state
    }

    fn handle(&mut self, event: Event, ctx: &mut SystemContext<'_>) {
        let next = self.state.transition(event);
        if next == self.state {
            return;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Lifecycle {} -> {} ({})", self.state, next, event);

        self.exit(ctx);
        self.state = next;
        self.entered = false;
    }

    fn load_settings(&mut self, ctx: &mut SystemContext<'_>) -> &Settings {
        self.settings.get_or_insert_with(|| match ctx.settings.load() {
            Ok(settings) => settings,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Settings unavailable ({}), using defaults", _e);
                Settings::default()
            }
        })
    }

    // ---- Entry ----

    fn entry(&mut self, ctx: &mut SystemContext<'_>) {
        match self.state {
            SystemState::Init => {
                self.timer.start(SHOW_LOGO_DURATION_MS, ctx.now_ms);
            }
            SystemState::Connecting => {
                self.timer.stop();
                if !self.load_settings(ctx).has_wifi_credentials() {
                    ctx.show("Set SSID/password via webserver.", STATUS_MESSAGE_DURATION_MS);
                    self.pending = Some(Event::NoCredentials);
                }
            }
            SystemState::Connected => {
                let settings = self.load_settings(ctx).clone();
                if ctx.network.set_hostname(&settings.hostname).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Setting hostname failed");
                    self.pending = Some(Event::FaultDetected(Fault::Service));
                    return;
                }
                ctx.display.set_network_status(true);

                if !settings.quiet_mode {
                    let mut text: String<96> = String::new();
                    let _ = write!(text, "Hostname: {}", settings.hostname);
                    if let Some([a, b, c, d]) = ctx.network.address() {
                        let _ = write!(text, " IP: {}.{}.{}.{}", a, b, c, d);
                    }
                    ctx.show(&text, STATUS_MESSAGE_DURATION_MS);
                }
            }
            SystemState::AccessPoint => {
                let settings = self.load_settings(ctx).clone();
                if settings.ap_passphrase.len() < AP_PASSPHRASE_MIN_LEN {
                    #[cfg(feature = "defmt")]
                    defmt::error!("AP passphrase too short");
                    self.pending = Some(Event::FaultDetected(Fault::Service));
                    return;
                }
                if ctx
                    .network
                    .start_access_point(&settings.ap_ssid, &settings.ap_passphrase)
                    .is_err()
                {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Starting access point failed");
                    self.pending = Some(Event::FaultDetected(Fault::Service));
                    return;
                }

                let mut text: String<48> = String::new();
                let _ = write!(text, "SSID: {}", settings.ap_ssid);
                ctx.show(&text, INFINITE_DURATION_MS);
            }
            SystemState::Error(fault) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Fault {} (code {})", fault, fault.code());
                if fault == Fault::Runtime {
                    ctx.show_only(fault.description(), INFINITE_DURATION_MS);
                } else {
                    let mut text: String<32> = String::new();
                    let _ = write!(text, "Error {}", fault.code());
                    ctx.show_only(&text, INFINITE_DURATION_MS);
                }
                self.blink = Some(BlinkPattern::new(fault));
            }
            SystemState::Off => {
                ctx.display.display_off();
                self.sleeping = false;
            }
            SystemState::Restart => {
                ctx.show_only("Restart", INFINITE_DURATION_MS);
                self.timer.start(RESTART_DELAY_MS, ctx.now_ms);
            }
        }
    }

    // ---- Process ----

    fn process(&mut self, ctx: &mut SystemContext<'_>) -> Option<Event> {
        match self.state {
            SystemState::Init => {
                if !self.timer.is_expired(ctx.now_ms) {
                    return None;
                }
                match ctx.ok_button {
                    ButtonState::Released => Some(Event::BootButtonReleased),
                    ButtonState::Pressed => Some(Event::BootButtonPressed),
                    // Wait for the first debounce window
                    ButtonState::Unknown => None,
                    ButtonState::NotConnected => Some(Event::FaultDetected(Fault::NoUserButton)),
                }
            }
            SystemState::Connecting => self.process_connecting(ctx),
            SystemState::Connected => self
                .take_request()
                .or_else(|| (!ctx.network.is_connected()).then_some(Event::ConnectionLost)),
            SystemState::AccessPoint => self.take_request(),
            SystemState::Error(_) => {
                if let Some(level) = self.blink.as_mut().and_then(|b| b.update(ctx.now_ms)) {
                    ctx.indicator.set(level);
                }
                None
            }
            SystemState::Off => {
                if !self.sleeping {
                    // Refused while a button is held, retried next tick
                    if !ctx.platform.arm_wake_sources() {
                        return None;
                    }
                    #[cfg(feature = "defmt")]
                    defmt::info!("Going to sleep");
                    self.sleeping = true;
                    ctx.platform.sleep();
                }
                ctx.platform.has_woken().then_some(Event::WakeUp)
            }
            SystemState::Restart => {
                if self.timer.is_expired(ctx.now_ms) {
                    self.timer.stop();
                    ctx.platform.reboot();
                }
                None
            }
        }
    }

    fn process_connecting(&mut self, ctx: &mut SystemContext<'_>) -> Option<Event> {
        if !self.timer.is_running() {
            let settings = self.load_settings(ctx).clone();
            if !settings.quiet_mode {
                let mut text: String<48> = String::new();
                let _ = write!(text, "Connecting to {}.", settings.wifi_ssid);
                ctx.show(&text, STATUS_MESSAGE_DURATION_MS);
            }

            #[cfg(feature = "defmt")]
            defmt::info!("Connecting to {}", settings.wifi_ssid.as_str());
            if let Err(_e) = ctx.network.connect(&settings.wifi_ssid, &settings.wifi_passphrase) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Connect attempt failed: {}", _e);
            }
            self.timer.start(RETRY_DELAY_MS, ctx.now_ms);
        }

        if ctx.network.is_connected() {
            return Some(Event::ConnectionEstablished);
        }

        if self.timer.is_expired(ctx.now_ms) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Connection timeout, retrying");
            ctx.network.disconnect();
            self.timer.stop();
        }
        None
    }

    fn take_request(&mut self) -> Option<Event> {
        if core::mem::take(&mut self.restart_requested) {
            Some(Event::RestartRequested)
        } else if core::mem::take(&mut self.power_off_requested) {
            Some(Event::PowerOffRequested)
        } else {
            None
        }
    }

    // ---- Exit ----

    fn exit(&mut self, ctx: &mut SystemContext<'_>) {
        match self.state {
            SystemState::Connecting | SystemState::Init | SystemState::Restart => {
                self.timer.stop();
            }
            SystemState::Connected => {
                ctx.network.disconnect();
                ctx.display.set_network_status(false);
            }
            SystemState::AccessPoint => {
                ctx.network.stop_access_point();
            }
            SystemState::Off => {
                self.sleeping = false;
                ctx.display.display_on();
            }
            SystemState::Error(_) => {}
        }
    }
}
