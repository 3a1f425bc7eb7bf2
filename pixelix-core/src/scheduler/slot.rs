//! Display slot

use crate::traits::ContentProvider;

/// Slot index `0..N`
pub type SlotId = usize;

/// One scheduling unit
///
/// The duration is stored as configured: 0 means the global default.
#[derive(Debug)]
pub struct Slot<P> {
    pub(crate) provider: Option<P>,
    pub(crate) duration_ms: u32,
    pub(crate) locked: bool,
    pub(crate) enabled: bool,
    /// Provider failed to start, a placeholder is shown instead
    pub(crate) degraded: bool,
    /// Configuration changed and needs to be persisted
    pub(crate) dirty: bool,
}

impl<P> Default for Slot<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P> Slot<P> {
    pub const fn empty() -> Self {
        Self {
            provider: None,
            duration_ms: 0,
            locked: false,
            enabled: true,
            degraded: false,
            dirty: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn provider_mut(&mut self) -> Option<&mut P> {
        self.provider.as_mut()
    }
}

impl<P: ContentProvider> Slot<P> {
    /// Slot may be shown: enabled, occupied and the provider enabled
    pub fn is_eligible(&self) -> bool {
        self.enabled
            && self
                .provider
                .as_ref()
                .map(|provider| provider.is_enabled())
                .unwrap_or(false)
    }
}
