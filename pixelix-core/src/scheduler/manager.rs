//! Display manager
//!
//! Owns the slot table, the active-slot cursor and the fade state. All
//! mutators take `&mut self`; shared access from several tasks goes through
//! `SharedDisplayManager`.
//!
//! One `tick()` is one scheduler period:
//!
//! 1. every `PROCESS_PERIOD_MS` all installed providers get `process()` and
//!    their queued requests are applied,
//! 2. while no fade runs, pending fade-effect changes and slot activations
//!    are handled and the rotation timer is checked,
//! 3. the output frame is rendered: the active provider's `update()` when
//!    idle, otherwise one fade step. The incoming slot becomes active when
//!    the fade-out completes, so at most one provider is active at a time.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use heapless::Vec;

use super::brightness::Brightness;
use super::requests::{ProviderContext, SchedulerRequest};
use super::slot::{Slot, SlotId};
use crate::config::{
    DEFAULT_SLOT_DURATION_MS, INFINITE_DURATION_MS, MATRIX_HEIGHT, MATRIX_WIDTH, PROCESS_PERIOD_MS,
};
use crate::gfx::{compose, FadeEffect, FadePhase, FadeState, Fader, MatrixFrame};
use crate::timer::Countdown;
use crate::traits::{ContentProvider, ProviderUid};

/// Why a provider could not be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstallError {
    /// Slot id out of range
    InvalidSlot,
    /// Slot already holds a provider
    SlotOccupied,
    /// Slot is locked
    SlotLocked,
    /// No empty, unlocked slot left
    NoFreeSlot,
    /// A provider with the same UID is installed
    DuplicateUid,
}

/// Slot scheduler with `N` slots
pub struct DisplayManager<P, const N: usize> {
    slots: [Slot<P>; N],
    /// Slot whose provider is active
    selected: Option<SlotId>,
    /// Last slot that was active, rotation continues from here
    cursor: Option<SlotId>,
    /// Explicit activation waiting for the next idle tick
    requested: Option<SlotId>,
    /// Slot to activate once the running fade-out completes
    target: Option<SlotId>,
    slot_timer: Countdown,
    process_timer: Countdown,
    fader: Fader,
    content: MatrixFrame,
    output: MatrixFrame,
    default_duration_ms: u32,
    brightness: Brightness,
    display_on: bool,
    network_up: bool,
    now_ms: u32,
}

impl<P: ContentProvider, const N: usize> Default for DisplayManager<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ContentProvider, const N: usize> DisplayManager<P, N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot::empty()),
            selected: None,
            cursor: None,
            requested: None,
            target: None,
            slot_timer: Countdown::new(),
            process_timer: Countdown::new(),
            fader: Fader::default(),
            content: MatrixFrame::new(),
            output: MatrixFrame::new(),
            default_duration_ms: DEFAULT_SLOT_DURATION_MS,
            brightness: Brightness::default(),
            display_on: true,
            network_up: false,
            now_ms: 0,
        }
    }

    // ---- Installation ----

    /// Install a provider into `slot`, or the first empty unlocked slot
    ///
    /// On failure the provider is handed back. A provider whose `start()`
    /// fails stays installed, but its slot is degraded and shows a
    /// placeholder.
    pub fn install(&mut self, mut provider: P, slot: Option<SlotId>) -> Result<SlotId, (InstallError, P)> {
        if self.slot_id_by_uid(provider.uid()).is_some() {
            return Err((InstallError::DuplicateUid, provider));
        }

        let slot_id = match slot {
            Some(id) if id >= N => return Err((InstallError::InvalidSlot, provider)),
            Some(id) if self.slots[id].locked => return Err((InstallError::SlotLocked, provider)),
            Some(id) if !self.slots[id].is_empty() => {
                return Err((InstallError::SlotOccupied, provider))
            }
            Some(id) => id,
            None => match self.slots.iter().position(|s| s.is_empty() && !s.locked) {
                Some(id) => id,
                None => return Err((InstallError::NoFreeSlot, provider)),
            },
        };

        #[cfg(feature = "defmt")]
        defmt::info!("Start provider {} (UID {}) in slot {}", provider.name(), provider.uid(), slot_id);

        let degraded = match provider.start(MATRIX_WIDTH as u16, MATRIX_HEIGHT as u16) {
            Ok(()) => false,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Provider {} failed to start: {}, slot {} degraded", provider.name(), _e, slot_id);
                true
            }
        };

        let slot = &mut self.slots[slot_id];
        slot.duration_ms = provider.duration();
        slot.provider = Some(provider);
        slot.degraded = degraded;
        slot.dirty = true;

        Ok(slot_id)
    }

    /// Remove a provider and hand it back after `stop()`
    ///
    /// Fails if the UID is not installed or its slot is locked.
    pub fn uninstall(&mut self, uid: ProviderUid) -> Option<P> {
        let Some(slot_id) = self.slot_id_by_uid(uid) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Provider UID {} is not installed", uid);
            return None;
        };

        if self.slots[slot_id].locked {
            #[cfg(feature = "defmt")]
            defmt::warn!("Can not uninstall UID {}, slot {} is locked", uid, slot_id);
            return None;
        }

        if self.selected == Some(slot_id) {
            self.deselect();
        }
        if self.target == Some(slot_id) {
            self.target = None;
        }
        if self.requested == Some(slot_id) {
            self.requested = None;
        }

        let slot = &mut self.slots[slot_id];
        let mut provider = slot.provider.take()?;
        provider.stop();
        slot.duration_ms = 0;
        slot.degraded = false;
        slot.dirty = true;

        #[cfg(feature = "defmt")]
        defmt::info!("Provider {} (UID {}) removed from slot {}", provider.name(), uid, slot_id);

        Some(provider)
    }

    /// Swap the provider `uid` with the content of slot `slot_id`
    pub fn move_provider_to_slot(&mut self, uid: ProviderUid, slot_id: SlotId) -> bool {
        let Some(src) = self.slot_id_by_uid(uid) else {
            return false;
        };
        if slot_id >= N || src == slot_id || self.slots[src].locked || self.slots[slot_id].locked {
            #[cfg(feature = "defmt")]
            defmt::warn!("Can not move UID {} to slot {}", uid, slot_id);
            return false;
        }

        if self.selected == Some(src) || self.selected == Some(slot_id) {
            self.deselect();
        }
        self.target = None;
        self.requested = None;

        let (a, b) = if src < slot_id { (src, slot_id) } else { (slot_id, src) };
        let (left, right) = self.slots.split_at_mut(b);
        let (first, second) = (&mut left[a], &mut right[0]);
        core::mem::swap(&mut first.provider, &mut second.provider);
        core::mem::swap(&mut first.duration_ms, &mut second.duration_ms);
        core::mem::swap(&mut first.degraded, &mut second.degraded);
        first.dirty = true;
        second.dirty = true;

        true
    }

    // ---- Queries ----

    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot<P>> {
        self.slots.get(slot_id)
    }

    pub fn provider_in_slot(&self, slot_id: SlotId) -> Option<&P> {
        self.slots.get(slot_id).and_then(|slot| slot.provider.as_ref())
    }

    pub fn provider_in_slot_mut(&mut self, slot_id: SlotId) -> Option<&mut P> {
        self.slots.get_mut(slot_id).and_then(|slot| slot.provider.as_mut())
    }

    pub fn slot_id_by_uid(&self, uid: ProviderUid) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|slot| slot.provider.as_ref().map(|p| p.uid() == uid).unwrap_or(false))
    }

    /// Installed providers with their slot ids
    pub fn providers(&self) -> impl Iterator<Item = (SlotId, &P)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.provider.as_ref().map(|p| (id, p)))
    }

    /// Slot whose provider is active
    pub fn active_slot(&self) -> Option<SlotId> {
        self.selected
    }

    /// Rendered output frame
    pub fn frame(&self) -> &MatrixFrame {
        &self.output
    }

    pub fn fade_state(&self) -> FadeState {
        self.fader.state()
    }

    /// Slots whose configuration changed since the last call
    pub fn take_dirty_slots(&mut self) -> Vec<SlotId, N> {
        let mut dirty = Vec::new();
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if core::mem::take(&mut slot.dirty) {
                // Capacity is N, one entry per slot
                let _ = dirty.push(id);
            }
        }
        dirty
    }

    /// Flag slots as changed again, used when saving them failed
    pub fn mark_dirty(&mut self, slot_ids: &[SlotId]) {
        for &id in slot_ids {
            if let Some(slot) = self.slots.get_mut(id) {
                slot.dirty = true;
            }
        }
    }

    // ---- Navigation ----

    /// Next eligible slot after `from` (from the start if `None`), wrapping
    ///
    /// `from` itself is the last candidate.
    pub fn next_slot(&self, from: Option<SlotId>) -> Option<SlotId> {
        let start = from.map(|id| id + 1).unwrap_or(0);
        (0..N)
            .map(|k| (start + k) % N)
            .find(|&id| self.slots[id].is_eligible())
    }

    /// Previous eligible slot before `from`, wrapping
    pub fn previous_slot(&self, from: Option<SlotId>) -> Option<SlotId> {
        let start = from.map(|id| id + N - 1).unwrap_or(0);
        (0..N)
            .map(|k| (start + N - k) % N)
            .find(|&id| self.slots[id].is_eligible())
    }

    /// Slot that navigation starts from
    fn navigation_cursor(&self) -> Option<SlotId> {
        self.requested.or(self.target).or(self.selected).or(self.cursor)
    }

    pub fn activate_next_slot(&mut self) {
        let cursor = self.navigation_cursor();
        if let Some(next) = self.next_slot(cursor) {
            if Some(next) != cursor {
                self.activate_slot(next);
            }
        }
    }

    pub fn activate_previous_slot(&mut self) {
        let cursor = self.navigation_cursor();
        if let Some(previous) = self.previous_slot(cursor) {
            if Some(previous) != cursor {
                self.activate_slot(previous);
            }
        }
    }

    /// Request explicit activation of a slot
    ///
    /// Takes effect on the next idle tick. Re-activating the active slot
    /// restarts its duration timer.
    pub fn activate_slot(&mut self, slot_id: SlotId) -> bool {
        match self.slots.get(slot_id) {
            Some(slot) if slot.is_eligible() => {
                self.requested = Some(slot_id);
                true
            }
            _ => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Slot {} can not be activated", slot_id);
                false
            }
        }
    }

    /// Let the active provider skip to its next content
    pub fn skip_active_content(&mut self) -> bool {
        if !self.fader.is_idle() {
            return false;
        }
        match self.selected {
            Some(id) if !self.slots[id].degraded => self.slots[id]
                .provider
                .as_mut()
                .map(|provider| provider.skip_content())
                .unwrap_or(false),
            _ => false,
        }
    }

    // ---- Slot configuration ----

    /// Set the slot duration, 0 = global default
    ///
    /// `persist` marks the slot configuration for saving.
    pub fn set_slot_duration(&mut self, slot_id: SlotId, duration_ms: u32, persist: bool) -> bool {
        let Some(slot) = self.slots.get_mut(slot_id) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Invalid slot id {}", slot_id);
            return false;
        };

        if slot.duration_ms != duration_ms {
            slot.duration_ms = duration_ms;
            if persist {
                slot.dirty = true;
            }
        }

        if self.selected == Some(slot_id) {
            self.refresh_slot_timer(false);
        }
        true
    }

    /// Effective slot duration: the stored value, or the global default if
    /// 0 is stored or the id is invalid
    pub fn slot_duration(&self, slot_id: SlotId) -> u32 {
        match self.slots.get(slot_id) {
            Some(slot) if slot.duration_ms != 0 => slot.duration_ms,
            _ => self.default_duration_ms,
        }
    }

    /// Duration as configured (0 = default), `None` for an invalid id
    pub fn configured_slot_duration(&self, slot_id: SlotId) -> Option<u32> {
        self.slots.get(slot_id).map(|slot| slot.duration_ms)
    }

    /// Global default duration, 0 disables automatic rotation
    pub fn set_default_slot_duration(&mut self, duration_ms: u32) {
        self.default_duration_ms = duration_ms;
        if self.selected.is_some() {
            self.refresh_slot_timer(false);
        }
    }

    pub fn default_slot_duration(&self) -> u32 {
        self.default_duration_ms
    }

    /// Prevent automatic rotation away from a slot
    pub fn lock_slot(&mut self, slot_id: SlotId) -> bool {
        let Some(slot) = self.slots.get_mut(slot_id) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Invalid slot id {}", slot_id);
            return false;
        };
        slot.locked = true;

        if self.selected == Some(slot_id) {
            self.slot_timer.stop();
        }
        true
    }

    pub fn unlock_slot(&mut self, slot_id: SlotId) -> bool {
        let Some(slot) = self.slots.get_mut(slot_id) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Invalid slot id {}", slot_id);
            return false;
        };
        slot.locked = false;

        if self.selected == Some(slot_id) {
            self.refresh_slot_timer(true);
        }
        true
    }

    pub fn is_slot_locked(&self, slot_id: SlotId) -> bool {
        self.slots.get(slot_id).map(|slot| slot.locked).unwrap_or(false)
    }

    pub fn set_slot_enabled(&mut self, slot_id: SlotId, enabled: bool) -> bool {
        match self.slots.get_mut(slot_id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Invalid slot id {}", slot_id);
                false
            }
        }
    }

    // ---- Display ----

    pub fn set_brightness(&mut self, level: u8) -> u8 {
        self.brightness.set(level)
    }

    pub fn brightness(&self) -> u8 {
        self.brightness.level()
    }

    pub fn set_automatic_brightness(&mut self, enable: bool) {
        self.brightness.set_automatic(enable);
    }

    pub fn is_automatic_brightness(&self) -> bool {
        self.brightness.is_automatic()
    }

    pub fn display_on(&mut self) {
        self.display_on = true;
    }

    pub fn display_off(&mut self) {
        self.display_on = false;
        self.output.clear();
    }

    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    /// Cycle the fade effect, effective at the next rotation
    pub fn activate_next_fade_effect(&mut self) {
        let next = self.fader.selected_effect().next();
        self.fader.request_effect(next);
    }

    /// Select a fade effect, effective at the next rotation
    pub fn set_fade_effect(&mut self, effect: FadeEffect) {
        self.fader.request_effect(effect);
    }

    pub fn fade_effect(&self) -> FadeEffect {
        self.fader.selected_effect()
    }

    pub fn set_network_status(&mut self, is_connected: bool) {
        self.network_up = is_connected;
    }

    pub fn is_network_connected(&self) -> bool {
        self.network_up
    }

    // ---- Tick ----

    /// Run one scheduler period
    pub fn tick(&mut self, now_ms: u32) {
        self.now_ms = now_ms;

        if !self.process_timer.is_running() || self.process_timer.is_expired(now_ms) {
            self.process_timer.start(PROCESS_PERIOD_MS, now_ms);
            self.process_providers();
        }

        // A provider that became ineligible while fading in is dropped now
        if let Some(selected) = self.selected {
            if !self.slots[selected].is_eligible() && !self.fader.is_idle() {
                self.deselect();
            }
        }

        if self.fader.is_idle() {
            if self.fader.apply_pending() {
                #[cfg(feature = "defmt")]
                defmt::info!("Fade effect {}", self.fader.effect());
            }
            self.schedule();
        }

        self.render();

        if !self.display_on {
            self.output.clear();
        }
    }

    fn process_providers(&mut self) {
        for id in 0..N {
            let Some(provider) = self.slots[id].provider.as_mut() else {
                continue;
            };

            let mut ctx = ProviderContext::new(self.now_ms, id, self.selected);
            provider.process(self.network_up, &mut ctx);

            for request in ctx.requests() {
                self.apply_request(id, *request);
            }
        }
    }

    fn apply_request(&mut self, slot_id: SlotId, request: SchedulerRequest) {
        match request {
            SchedulerRequest::LockSlot => {
                self.lock_slot(slot_id);
            }
            SchedulerRequest::UnlockSlot => {
                self.unlock_slot(slot_id);
            }
            SchedulerRequest::ActivateSlot => {
                self.activate_slot(slot_id);
            }
            SchedulerRequest::SetSlotDuration(duration_ms) => {
                self.set_slot_duration(slot_id, duration_ms, false);
            }
            SchedulerRequest::SetBrightness(level) => {
                self.set_brightness(level);
            }
            SchedulerRequest::DisplayOn => self.display_on(),
            SchedulerRequest::DisplayOff => self.display_off(),
        }
    }

    /// Decide about slot changes, only called while no fade runs
    fn schedule(&mut self) {
        if let Some(requested) = self.requested.take() {
            if !self.slots[requested].is_eligible() {
                #[cfg(feature = "defmt")]
                defmt::warn!("Requested slot {} is not eligible", requested);
            } else if self.selected == Some(requested) {
                // Duration may have changed
                self.refresh_slot_timer(true);
                return;
            } else {
                self.begin_transition(Some(requested));
                return;
            }
        }

        match self.selected {
            Some(selected) if !self.slots[selected].is_eligible() => {
                self.begin_transition(None);
            }
            Some(selected) => {
                if self.slots[selected].locked || !self.slot_timer.is_expired(self.now_ms) {
                    return;
                }
                match self.next_slot(Some(selected)) {
                    Some(next) if next != selected => self.begin_transition(Some(next)),
                    _ => self.slot_timer.restart(self.now_ms),
                }
            }
            None => {
                if let Some(next) = self.next_slot(self.cursor) {
                    self.commit(next);
                    self.fader.start_fade_in();
                }
            }
        }
    }

    /// Leave the active slot and start fading out
    ///
    /// `target` = `None` picks the next eligible slot when the fade-out
    /// completes.
    fn begin_transition(&mut self, target: Option<SlotId>) {
        if let Some(selected) = self.selected {
            if self.slots[selected].locked {
                #[cfg(feature = "defmt")]
                defmt::info!("Slot {} unlocked by rotation", selected);
                self.slots[selected].locked = false;
            }
        }
        self.deselect();
        self.target = target;
        self.fader.start_fade_out();
    }

    /// Deactivate the active provider, if any
    fn deselect(&mut self) {
        if let Some(selected) = self.selected.take() {
            let slot = &mut self.slots[selected];
            if !slot.degraded {
                if let Some(provider) = slot.provider.as_mut() {
                    provider.inactive();
                }
            }
            self.cursor = Some(selected);
        }
        self.slot_timer.stop();
        if matches!(self.fader.state(), FadeState::FadingIn(_)) {
            self.fader.reset();
        }
    }

    /// Make a slot the active one
    fn commit(&mut self, slot_id: SlotId) {
        self.selected = Some(slot_id);
        self.cursor = Some(slot_id);
        self.content.clear();

        let slot = &mut self.slots[slot_id];
        if slot.degraded {
            draw_placeholder(&mut self.content);
        } else if let Some(provider) = slot.provider.as_mut() {
            provider.active(&mut self.content);
            #[cfg(feature = "defmt")]
            defmt::info!("Slot {} ({}) now active", slot_id, provider.name());
        }

        self.refresh_slot_timer(true);
    }

    /// Start or adjust the rotation timer of the active slot
    fn refresh_slot_timer(&mut self, restart: bool) {
        let Some(selected) = self.selected else {
            return;
        };
        let duration = self.slot_duration(selected);

        if self.slots[selected].locked || duration == 0 || duration == INFINITE_DURATION_MS {
            self.slot_timer.stop();
        } else if restart || !self.slot_timer.is_running() {
            self.slot_timer.start(duration, self.now_ms);
        } else {
            self.slot_timer.set_duration(duration);
        }
    }

    fn update_content(&mut self) {
        let Some(selected) = self.selected else {
            self.content.clear();
            return;
        };
        let slot = &mut self.slots[selected];
        if slot.degraded {
            draw_placeholder(&mut self.content);
        } else if let Some(provider) = slot.provider.as_mut() {
            provider.update(&mut self.content);
        }
    }

    fn render(&mut self) {
        let state = self.fader.state();
        match state {
            FadeState::Idle => {
                self.update_content();
                self.output.copy_from(&self.content);
            }
            FadeState::FadingOut(_) => {
                // Outgoing content stays frozen while it fades
                compose(self.fader.effect(), state, &self.content, &mut self.output);
                if self.fader.advance() == Some(FadePhase::Out) {
                    let next = match self.target.take() {
                        Some(target) if self.slots[target].is_eligible() => Some(target),
                        _ => self.next_slot(self.cursor),
                    };
                    match next {
                        Some(next) => self.commit(next),
                        None => self.content.clear(),
                    }
                }
            }
            FadeState::FadingIn(_) => {
                self.update_content();
                compose(self.fader.effect(), state, &self.content, &mut self.output);
                self.fader.advance();
            }
        }
    }
}

/// Shown instead of a provider that failed to start
fn draw_placeholder(frame: &mut MatrixFrame) {
    frame.clear();
    let size = frame.height().min(frame.width()) as i32;
    let offset = (frame.width() as i32 - size) / 2;
    for i in 0..size {
        frame.draw_pixel(offset + i, i, Rgb888::RED);
        frame.draw_pixel(offset + size - 1 - i, i, Rgb888::RED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FADE_MAX, FADE_STEP, UPDATE_PERIOD_MS};
    use crate::scheduler::mock::{Hook, MockProvider};
    use proptest::prelude::*;

    type Manager = DisplayManager<MockProvider, 4>;

    /// Ticks needed for a complete fade (out + in)
    const FADE_TICKS: u32 = 2 * ((FADE_MAX / FADE_STEP) as u32 + 1);

    fn run(dm: &mut Manager, now: &mut u32, ticks: u32) {
        for _ in 0..ticks {
            dm.tick(*now);
            *now += UPDATE_PERIOD_MS;
        }
    }

    fn run_until_idle(dm: &mut Manager, now: &mut u32) {
        for _ in 0..1000 {
            dm.tick(*now);
            *now += UPDATE_PERIOD_MS;
            if dm.fade_state().is_idle() {
                return;
            }
        }
        panic!("fade never finished");
    }

    fn installed(uids: &[u16]) -> Manager {
        let mut dm = Manager::new();
        for uid in uids {
            dm.install(MockProvider::new(*uid), None).unwrap();
        }
        dm
    }

    #[test]
    fn test_install_first_free_slot() {
        let mut dm = installed(&[1, 2]);
        assert_eq!(dm.slot_id_by_uid(1), Some(0));
        assert_eq!(dm.slot_id_by_uid(2), Some(1));
        assert_eq!(dm.provider_in_slot(0).unwrap().count(Hook::Start), 1);

        assert_eq!(dm.install(MockProvider::new(3), Some(3)).unwrap(), 3);
        assert_eq!(dm.install(MockProvider::new(4), None).unwrap(), 2);
    }

    #[test]
    fn test_install_rejections() {
        let mut dm = installed(&[1]);

        let (err, provider) = dm.install(MockProvider::new(2), Some(0)).unwrap_err();
        assert_eq!(err, InstallError::SlotOccupied);
        assert_eq!(provider.uid, 2);

        let (err, _) = dm.install(MockProvider::new(2), Some(4)).unwrap_err();
        assert_eq!(err, InstallError::InvalidSlot);

        let (err, _) = dm.install(MockProvider::new(1), None).unwrap_err();
        assert_eq!(err, InstallError::DuplicateUid);

        dm.lock_slot(1);
        let (err, _) = dm.install(MockProvider::new(2), Some(1)).unwrap_err();
        assert_eq!(err, InstallError::SlotLocked);

        // Locked slots are skipped when searching
        assert_eq!(dm.install(MockProvider::new(2), None).unwrap(), 2);
        dm.install(MockProvider::new(3), None).unwrap();
        let (err, _) = dm.install(MockProvider::new(4), None).unwrap_err();
        assert_eq!(err, InstallError::NoFreeSlot);
    }

    #[test]
    fn test_failed_start_degrades_slot() {
        let mut dm = Manager::new();
        let mut provider = MockProvider::new(1);
        provider.fail_start = true;
        assert_eq!(dm.install(provider, None).unwrap(), 0);
        assert!(dm.slot(0).unwrap().is_degraded());

        let mut now = 0;
        run(&mut dm, &mut now, FADE_TICKS + 2);
        assert_eq!(dm.active_slot(), Some(0));
        // No rendering hooks on a degraded provider
        let provider = dm.provider_in_slot(0).unwrap();
        assert_eq!(provider.count(Hook::Active), 0);
        assert_eq!(provider.count(Hook::Update), 0);
        assert_ne!(dm.frame(), &MatrixFrame::new());
    }

    #[test]
    fn test_first_tick_activates_first_slot() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        dm.tick(now);
        assert_eq!(dm.active_slot(), Some(0));
        assert!(matches!(dm.fade_state(), FadeState::FadingIn(_)));
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.frame().pixel(0, 0), Some(Rgb888::new(1, 0, 0)));
    }

    #[test]
    fn test_empty_manager_stays_blank() {
        let mut dm = Manager::new();
        let mut now = 0;
        run(&mut dm, &mut now, 10);
        assert_eq!(dm.active_slot(), None);
        assert_eq!(dm.frame(), &MatrixFrame::new());
    }

    #[test]
    fn test_rotation_after_duration() {
        let mut dm = installed(&[1, 2, 3]);
        assert!(dm.set_slot_duration(1, 5000, false));
        dm.uninstall(1);
        dm.uninstall(3);
        // Only slot 1 (uid 2) and nothing else: rotation restarts the timer
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(1));
        run(&mut dm, &mut now, 300);
        assert_eq!(dm.active_slot(), Some(1));
        assert!(dm.fade_state().is_idle());
    }

    #[test]
    fn test_fade_begins_when_duration_expires() {
        // Provider in slot 2 of 4 with 5000 ms, another in slot 3
        let mut dm = Manager::new();
        dm.install(MockProvider::new(7), Some(2)).unwrap();
        dm.install(MockProvider::new(8), Some(3)).unwrap();
        assert!(dm.set_slot_duration(2, 5000, true));

        let mut now = 0;
        dm.tick(now);
        assert_eq!(dm.active_slot(), Some(2));
        run_until_idle(&mut dm, &mut now);

        let activated_at = 0;
        while now < activated_at + 5000 {
            dm.tick(now);
            assert!(dm.fade_state().is_idle(), "fade started early at {}", now);
            now += UPDATE_PERIOD_MS;
        }
        dm.tick(now);
        assert!(matches!(dm.fade_state(), FadeState::FadingOut(_)));
        assert_eq!(dm.active_slot(), None);

        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(3));
    }

    #[test]
    fn test_locked_slot_is_not_rotated_by_timeout() {
        let mut dm = installed(&[1, 2]);
        dm.set_default_slot_duration(1000);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(0));

        dm.lock_slot(0);
        run(&mut dm, &mut now, 500);
        assert_eq!(dm.active_slot(), Some(0));

        dm.unlock_slot(0);
        run(&mut dm, &mut now, 1000 / UPDATE_PERIOD_MS + 1);
        assert_ne!(dm.fade_state(), FadeState::Idle);
    }

    #[test]
    fn test_explicit_navigation_unlocks() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        dm.lock_slot(0);

        dm.activate_next_slot();
        run_until_idle(&mut dm, &mut now);
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(1));
        assert!(!dm.is_slot_locked(0));
    }

    #[test]
    fn test_active_inactive_once_per_edge() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);

        for _ in 0..3 {
            dm.activate_next_slot();
            dm.tick(now);
            run_until_idle(&mut dm, &mut now);
        }

        assert_eq!(dm.active_slot(), Some(1));
        let first = dm.provider_in_slot(0).unwrap();
        let second = dm.provider_in_slot(1).unwrap();
        assert_eq!(first.count(Hook::Active), 2);
        assert_eq!(first.count(Hook::Inactive), 2);
        assert_eq!(second.count(Hook::Active), 2);
        assert_eq!(second.count(Hook::Inactive), 1);
    }

    #[test]
    fn test_previous_wraps() {
        let mut dm = installed(&[1, 2, 3]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(0));

        dm.activate_previous_slot();
        dm.tick(now);
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(2));
    }

    #[test]
    fn test_navigation_skips_disabled() {
        let mut dm = installed(&[1, 2, 3]);
        dm.provider_in_slot_mut(1).unwrap().enabled = false;
        dm.set_slot_enabled(2, false);

        assert_eq!(dm.next_slot(Some(0)), Some(0));
        assert_eq!(dm.previous_slot(Some(0)), Some(0));

        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        dm.activate_next_slot();
        run(&mut dm, &mut now, 5);
        assert!(dm.fade_state().is_idle());
        assert_eq!(dm.active_slot(), Some(0));
    }

    #[test]
    fn test_reactivating_active_slot_keeps_it() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        assert!(dm.activate_slot(0));
        dm.tick(now);
        assert!(dm.fade_state().is_idle());
        assert_eq!(dm.provider_in_slot(0).unwrap().count(Hook::Inactive), 0);
    }

    #[test]
    fn test_activate_invalid_slot() {
        let mut dm = installed(&[1]);
        assert!(!dm.activate_slot(3));
        assert!(!dm.activate_slot(9));
    }

    #[test]
    fn test_uninstall_active_provider() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);

        let provider = dm.uninstall(1).unwrap();
        assert_eq!(provider.count(Hook::Inactive), 1);
        assert_eq!(provider.count(Hook::Stop), 1);
        assert_eq!(dm.active_slot(), None);

        dm.tick(now);
        assert_eq!(dm.active_slot(), Some(1));
    }

    #[test]
    fn test_uninstall_refused() {
        let mut dm = installed(&[1]);
        assert!(dm.uninstall(9).is_none());
        dm.lock_slot(0);
        assert!(dm.uninstall(1).is_none());
        dm.unlock_slot(0);
        assert!(dm.uninstall(1).is_some());
    }

    #[test]
    fn test_slot_duration_round_trip() {
        let mut dm = installed(&[1]);
        assert!(dm.set_slot_duration(0, 1234, true));
        assert_eq!(dm.slot_duration(0), 1234);

        assert!(dm.set_slot_duration(0, 0, true));
        assert_eq!(dm.slot_duration(0), DEFAULT_SLOT_DURATION_MS);
        assert_eq!(dm.configured_slot_duration(0), Some(0));

        assert!(!dm.set_slot_duration(4, 1000, true));
        assert_eq!(dm.slot_duration(4), DEFAULT_SLOT_DURATION_MS);
    }

    #[test]
    fn test_dirty_slots() {
        let mut dm = installed(&[1, 2]);
        assert_eq!(dm.take_dirty_slots().as_slice(), &[0, 1]);
        assert!(dm.take_dirty_slots().is_empty());

        dm.set_slot_duration(1, 100, false);
        assert!(dm.take_dirty_slots().is_empty());
        dm.set_slot_duration(1, 200, true);
        assert_eq!(dm.take_dirty_slots().as_slice(), &[1]);
    }

    #[test]
    fn test_failed_save_keeps_slots_dirty() {
        let mut dm = installed(&[1, 2]);
        let dirty = dm.take_dirty_slots();
        assert!(dm.take_dirty_slots().is_empty());

        dm.mark_dirty(&dirty);
        dm.mark_dirty(&[9]);
        assert_eq!(dm.take_dirty_slots().as_slice(), &[0, 1]);
    }

    #[test]
    fn test_disabled_while_fading_in_is_left_at_once() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        dm.tick(now);
        now += UPDATE_PERIOD_MS;
        assert_eq!(dm.active_slot(), Some(0));
        assert!(matches!(dm.fade_state(), FadeState::FadingIn(_)));

        dm.provider_in_slot_mut(0).unwrap().enabled = false;
        dm.tick(now);
        assert_eq!(dm.active_slot(), Some(1));

        let first = dm.provider_in_slot(0).unwrap();
        assert_eq!(first.count(Hook::Active), first.count(Hook::Inactive));
    }

    #[test]
    fn test_infinite_default_disables_rotation() {
        let mut dm = installed(&[1, 2]);
        dm.set_default_slot_duration(0);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        run(&mut dm, &mut now, 5000);
        assert_eq!(dm.active_slot(), Some(0));
    }

    #[test]
    fn test_move_provider_swaps() {
        let mut dm = installed(&[1, 2]);
        dm.set_slot_duration(0, 1111, true);
        assert!(dm.move_provider_to_slot(1, 3));
        assert_eq!(dm.slot_id_by_uid(1), Some(3));
        assert_eq!(dm.configured_slot_duration(3), Some(1111));
        assert!(dm.provider_in_slot(0).is_none());

        assert!(dm.move_provider_to_slot(2, 3));
        assert_eq!(dm.slot_id_by_uid(2), Some(3));
        assert_eq!(dm.slot_id_by_uid(1), Some(1));

        assert!(!dm.move_provider_to_slot(2, 3));
        assert!(!dm.move_provider_to_slot(2, 8));
    }

    #[test]
    fn test_provider_requests_applied_after_process() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        now += PROCESS_PERIOD_MS;

        dm.provider_in_slot_mut(1)
            .unwrap()
            .pending
            .extend([SchedulerRequest::LockSlot, SchedulerRequest::ActivateSlot]);
        dm.tick(now);
        assert!(dm.is_slot_locked(1));

        run_until_idle(&mut dm, &mut now);
        run_until_idle(&mut dm, &mut now);
        assert_eq!(dm.active_slot(), Some(1));
        assert!(dm.is_slot_locked(1));
    }

    #[test]
    fn test_processes_every_installed_provider() {
        let mut dm = installed(&[1, 2, 3]);
        let mut now = 0;
        run(&mut dm, &mut now, PROCESS_PERIOD_MS / UPDATE_PERIOD_MS * 3);
        for (_, provider) in dm.providers() {
            assert_eq!(provider.count(Hook::Process), 3);
        }
    }

    #[test]
    fn test_fade_effect_applied_when_idle() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        dm.tick(now);
        assert_eq!(dm.fade_effect(), FadeEffect::Linear);

        dm.activate_next_fade_effect();
        assert_eq!(dm.fade_effect(), FadeEffect::MoveX);
        dm.activate_next_fade_effect();
        assert_eq!(dm.fade_effect(), FadeEffect::MoveY);

        run_until_idle(&mut dm, &mut now);
        dm.tick(now);
        assert_eq!(dm.fader.effect(), FadeEffect::MoveY);
    }

    #[test]
    fn test_display_off_blanks_output() {
        let mut dm = installed(&[1]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        dm.display_off();
        dm.tick(now);
        assert!(!dm.is_display_on());
        assert_eq!(dm.frame(), &MatrixFrame::new());

        dm.display_on();
        dm.tick(now);
        assert_ne!(dm.frame(), &MatrixFrame::new());
    }

    #[test]
    fn test_skip_active_content() {
        let mut dm = installed(&[1, 2]);
        let mut now = 0;
        run_until_idle(&mut dm, &mut now);
        dm.provider_in_slot_mut(0).unwrap().skips = 1;

        assert!(dm.skip_active_content());
        assert!(!dm.skip_active_content());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Next,
        Previous,
        Tick(u8),
        Toggle(usize),
        Uninstall(u16),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Next),
            Just(Op::Previous),
            (1u8..40).prop_map(Op::Tick),
            (0usize..4).prop_map(Op::Toggle),
            (1u16..5).prop_map(Op::Uninstall),
        ]
    }

    proptest! {
        #[test]
        fn prop_active_slot_is_always_eligible(ops in proptest::collection::vec(op_strategy(), 1..60)) {
            let mut dm = installed(&[1, 2, 3, 4]);
            let mut now = 0u32;

            for op in ops {
                match op {
                    Op::Next => dm.activate_next_slot(),
                    Op::Previous => dm.activate_previous_slot(),
                    Op::Tick(n) => {
                        for _ in 0..n {
                            dm.tick(now);
                            now = now.wrapping_add(UPDATE_PERIOD_MS);
                        }
                    }
                    Op::Toggle(slot) => {
                        if let Some(provider) = dm.provider_in_slot_mut(slot) {
                            provider.enabled = !provider.enabled;
                        }
                    }
                    Op::Uninstall(uid) => {
                        dm.uninstall(uid);
                    }
                }

                dm.tick(now);
                now = now.wrapping_add(UPDATE_PERIOD_MS);

                if let Some(active) = dm.active_slot() {
                    prop_assert!(dm.slot(active).unwrap().is_eligible());
                }

                let active_count = dm
                    .providers()
                    .filter(|(_, p)| p.count(Hook::Active) > p.count(Hook::Inactive))
                    .count();
                prop_assert!(active_count <= 1);
            }
        }
    }
}
