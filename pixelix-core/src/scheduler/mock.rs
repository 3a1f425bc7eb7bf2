//! Recording provider for scheduler tests

extern crate std;

use std::vec::Vec;

use embedded_graphics::pixelcolor::Rgb888;

use super::requests::{ProviderContext, SchedulerRequest};
use crate::gfx::MatrixFrame;
use crate::traits::{ContentProvider, ProviderError, ProviderUid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Start,
    Stop,
    Process,
    Active,
    Inactive,
    Update,
}

#[derive(Debug)]
pub struct MockProvider {
    pub uid: ProviderUid,
    pub enabled: bool,
    pub fail_start: bool,
    pub color: Rgb888,
    pub duration_ms: u32,
    pub calls: Vec<Hook>,
    /// Requests issued on the next `process()` call
    pub pending: Vec<SchedulerRequest>,
    pub skips: u32,
}

impl MockProvider {
    pub fn new(uid: ProviderUid) -> Self {
        Self {
            uid,
            enabled: true,
            fail_start: false,
            color: Rgb888::new(uid as u8, 0, 0),
            duration_ms: 0,
            calls: Vec::new(),
            pending: Vec::new(),
            skips: 0,
        }
    }

    pub fn count(&self, hook: Hook) -> usize {
        self.calls.iter().filter(|call| **call == hook).count()
    }
}

impl ContentProvider for MockProvider {
    fn uid(&self) -> ProviderUid {
        self.uid
    }

    fn name(&self) -> &'static str {
        "Mock"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn duration(&self) -> u32 {
        self.duration_ms
    }

    fn start(&mut self, _width: u16, _height: u16) -> Result<(), ProviderError> {
        self.calls.push(Hook::Start);
        if self.fail_start {
            Err(ProviderError::OutOfMemory)
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) {
        self.calls.push(Hook::Stop);
    }

    fn process(&mut self, _is_connected: bool, ctx: &mut ProviderContext) {
        self.calls.push(Hook::Process);
        for request in self.pending.drain(..) {
            match request {
                SchedulerRequest::LockSlot => ctx.lock_slot(),
                SchedulerRequest::UnlockSlot => ctx.unlock_slot(),
                SchedulerRequest::ActivateSlot => ctx.activate_slot(),
                SchedulerRequest::SetSlotDuration(ms) => ctx.set_slot_duration(ms),
                SchedulerRequest::SetBrightness(level) => ctx.set_brightness(level),
                SchedulerRequest::DisplayOn => ctx.display_on(),
                SchedulerRequest::DisplayOff => ctx.display_off(),
            };
        }
    }

    fn active(&mut self, frame: &mut MatrixFrame) {
        self.calls.push(Hook::Active);
        frame.fill_screen(self.color);
    }

    fn inactive(&mut self) {
        self.calls.push(Hook::Inactive);
    }

    fn update(&mut self, frame: &mut MatrixFrame) {
        self.calls.push(Hook::Update);
        frame.fill_screen(self.color);
    }

    fn skip_content(&mut self) -> bool {
        if self.skips > 0 {
            self.skips -= 1;
            true
        } else {
            false
        }
    }
}
