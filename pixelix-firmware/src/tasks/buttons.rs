//! Button tasks
//!
//! One edge task per wired button waits for pin changes and reports them;
//! the debounce task commits stable levels and publishes state changes.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration};
use portable_atomic::Ordering;

use pixelix_core::config::DEBOUNCE_WINDOW_MS;
use pixelix_core::input::{ButtonEvent, ButtonId, ButtonState, Debouncer, PinLevel};
use pixelix_drivers::buttons::ButtonInput;

use super::now_ms;
use crate::channels::{BUTTON_EDGES, BUTTON_EVENTS, PIN_LEVELS, SLEEPING, WAKE_READY, WOKEN};

/// Edge task - waits for level changes on one button pin
///
/// The wait is bounded by the debounce window. On timeout the pin is read
/// again, which catches edges that came in between two waits.
#[embassy_executor::task(pool_size = 3)]
pub async fn button_edge_task(mut input: ButtonInput<'static, Input<'static>>) {
    info!("Button {:?} edge task started", input.id());

    let window = Duration::from_millis(DEBOUNCE_WINDOW_MS as u64);

    loop {
        let level = match with_timeout(window, input.wait_for_edge()).await {
            Ok(Ok(level)) => level,
            Ok(Err(_)) => continue,
            Err(_) => match input.refresh() {
                Ok(Some(level)) => {
                    debug!("Button {:?} changed without an edge", input.id());
                    level
                }
                Ok(None) | Err(_) => continue,
            },
        };

        if level == PinLevel::Low && SLEEPING.load(Ordering::Acquire) {
            WOKEN.store(true, Ordering::Release);
        }

        if BUTTON_EDGES.try_send(input.id()).is_err() {
            warn!("Button edge queue full, dropping edge");
        }
    }
}

fn publish(id: ButtonId, state: ButtonState) {
    let event = ButtonEvent {
        id,
        state,
        timestamp_ms: now_ms(),
    };
    if !BUTTON_EVENTS.send(event) {
        warn!("Button event queue full, dropping {:?}", id);
    }
}

/// Debounce task - turns raw edges into debounced button states
#[embassy_executor::task]
pub async fn debounce_task() {
    info!("Debounce task started");

    let mut debouncer = Debouncer::new(&PIN_LEVELS, DEBOUNCE_WINDOW_MS, now_ms());
    let timeout = Duration::from_millis(debouncer.queue_timeout_ms() as u64);
    let mut observer = |id: ButtonId, state: ButtonState| publish(id, state);

    // Tell the lifecycle which buttons are wired
    debouncer.notify_all(&mut observer);

    loop {
        if let Ok(id) = with_timeout(timeout, BUTTON_EDGES.receive()).await {
            debouncer.notify_change(id, now_ms());
        }

        let changed = debouncer.poll(now_ms(), &PIN_LEVELS, &mut observer);
        if changed > 0 {
            trace!("{} button states changed", changed);
        }

        WAKE_READY.store(debouncer.arm_wake_sources(&PIN_LEVELS), Ordering::Release);
    }
}
