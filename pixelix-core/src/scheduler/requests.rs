//! Requests from providers to the scheduler
//!
//! Providers never call back into the display manager while it runs their
//! hooks. Instead `process()` queues requests here and the manager applies
//! them right after the hook returns, still inside the same lock.

use heapless::Vec;

use super::slot::SlotId;

/// Maximum queued requests per `process()` call
pub const MAX_REQUESTS: usize = 8;

/// Scheduler change requested by a provider for its own slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerRequest {
    LockSlot,
    UnlockSlot,
    /// Show the provider's slot
    ActivateSlot,
    SetSlotDuration(u32),
    SetBrightness(u8),
    DisplayOn,
    DisplayOff,
}

/// Context handed to `ContentProvider::process`
#[derive(Debug)]
pub struct ProviderContext {
    now_ms: u32,
    slot: SlotId,
    active_slot: Option<SlotId>,
    requests: Vec<SchedulerRequest, MAX_REQUESTS>,
}

impl ProviderContext {
    pub fn new(now_ms: u32, slot: SlotId, active_slot: Option<SlotId>) -> Self {
        Self {
            now_ms,
            slot,
            active_slot,
            requests: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u32 {
        self.now_ms
    }

    /// Slot of the provider being processed
    pub fn slot_id(&self) -> SlotId {
        self.slot
    }

    pub fn active_slot(&self) -> Option<SlotId> {
        self.active_slot
    }

    /// The provider's slot is the one currently shown
    pub fn is_active(&self) -> bool {
        self.active_slot == Some(self.slot)
    }

    pub fn lock_slot(&mut self) -> bool {
        self.push(SchedulerRequest::LockSlot)
    }

    pub fn unlock_slot(&mut self) -> bool {
        self.push(SchedulerRequest::UnlockSlot)
    }

    pub fn activate_slot(&mut self) -> bool {
        self.push(SchedulerRequest::ActivateSlot)
    }

    pub fn set_slot_duration(&mut self, duration_ms: u32) -> bool {
        self.push(SchedulerRequest::SetSlotDuration(duration_ms))
    }

    pub fn set_brightness(&mut self, level: u8) -> bool {
        self.push(SchedulerRequest::SetBrightness(level))
    }

    pub fn display_on(&mut self) -> bool {
        self.push(SchedulerRequest::DisplayOn)
    }

    pub fn display_off(&mut self) -> bool {
        self.push(SchedulerRequest::DisplayOff)
    }

    pub fn requests(&self) -> &[SchedulerRequest] {
        &self.requests
    }

    fn push(&mut self, request: SchedulerRequest) -> bool {
        if self.requests.push(request).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Request queue of slot {} full, dropping {}", self.slot, request);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_in_order() {
        let mut ctx = ProviderContext::new(0, 2, Some(1));
        assert!(!ctx.is_active());
        ctx.lock_slot();
        ctx.activate_slot();
        assert_eq!(
            ctx.requests(),
            &[SchedulerRequest::LockSlot, SchedulerRequest::ActivateSlot]
        );
    }

    #[test]
    fn test_full_queue_rejects() {
        let mut ctx = ProviderContext::new(0, 0, None);
        for _ in 0..MAX_REQUESTS {
            assert!(ctx.display_on());
        }
        assert!(!ctx.display_off());
        assert_eq!(ctx.requests().len(), MAX_REQUESTS);
    }
}
