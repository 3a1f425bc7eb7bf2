//! Inter-task communication channels
//!
//! Defines the static channels, proxies and flags shared between Embassy
//! tasks. Flags are portable-atomic values, RP2040 has no native CAS.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU32};

use pixelix_core::config::BUTTON_QUEUE_SIZE;
use pixelix_core::input::{ButtonEvent, ButtonId};
use pixelix_core::proxy::MessageProxy;
use pixelix_core::scheduler::SystemMessageInbox;
use pixelix_core::state::Fault;
use pixelix_drivers::buttons::PinLevels;

use crate::network::ModemCommand;

/// Capacity of the modem command queue
const MODEM_COMMAND_QUEUE_SIZE: usize = 4;

/// Button ids whose pin changed level (edge tasks to debounce task)
pub static BUTTON_EDGES: Channel<CriticalSectionRawMutex, ButtonId, BUTTON_QUEUE_SIZE> = Channel::new();

/// Debounced button state changes (debounce task to lifecycle task)
pub static BUTTON_EVENTS: MessageProxy<CriticalSectionRawMutex, ButtonEvent, BUTTON_QUEUE_SIZE> =
    MessageProxy::new();

/// Texts for the system message provider
pub static SYSTEM_INBOX: SystemMessageInbox<CriticalSectionRawMutex> = SystemMessageInbox::new();

/// Requests for the Wi-Fi modem task
pub static MODEM_COMMANDS: Channel<CriticalSectionRawMutex, ModemCommand, MODEM_COMMAND_QUEUE_SIZE> =
    Channel::new();

/// Faults found by other tasks, raised by the lifecycle task
pub static FAULTS: Signal<CriticalSectionRawMutex, Fault> = Signal::new();

/// Last sampled button pin levels
pub static PIN_LEVELS: PinLevels = PinLevels::new();

/// Station link is up, updated by the modem task
pub static LINK_UP: AtomicBool = AtomicBool::new(false);

/// Station IPv4 address in network order, 0 = none
pub static ADDRESS: AtomicU32 = AtomicU32::new(0);

/// No button is held, the buttons may be armed as wake sources
pub static WAKE_READY: AtomicBool = AtomicBool::new(false);

/// Device is sleeping, the next button press wakes it
pub static SLEEPING: AtomicBool = AtomicBool::new(false);

/// A button was pressed while sleeping
pub static WOKEN: AtomicBool = AtomicBool::new(false);
