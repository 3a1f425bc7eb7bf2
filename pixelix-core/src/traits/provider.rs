//! Content provider contract
//!
//! A provider renders one kind of content into a slot. The scheduler owns
//! the provider value while it is installed and calls the hooks below,
//! always under its own lock.

use crate::gfx::MatrixFrame;
use crate::scheduler::ProviderContext;

/// Unique provider instance id (0 is never assigned)
pub type ProviderUid = u16;

/// Errors reported by provider hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProviderError {
    /// Not enough memory for the provider's buffers
    OutOfMemory,
    /// Display size not supported by this provider
    UnsupportedSize,
    /// Backing resource (sensor, service) not available
    Unavailable,
}

/// Pluggable content renderer bound to a slot
pub trait ContentProvider {
    /// Instance id assigned by the registry
    fn uid(&self) -> ProviderUid;

    /// Provider type name, used to recreate it from the slot configuration
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Preferred slot duration in ms, 0 = use the global default
    fn duration(&self) -> u32 {
        0
    }

    /// Called once when installed into a slot
    ///
    /// On error the slot stays installed but is rendered as degraded.
    fn start(&mut self, _width: u16, _height: u16) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Called once when uninstalled; must abort in-flight requests and
    /// drain the provider's message proxy
    fn stop(&mut self) {}

    /// Periodic background processing, called for every installed provider
    fn process(&mut self, _is_connected: bool, _ctx: &mut ProviderContext) {}

    /// The provider's slot became the displayed one
    fn active(&mut self, frame: &mut MatrixFrame);

    /// The provider's slot stopped being displayed
    fn inactive(&mut self) {}

    /// Render the next frame of the active provider
    fn update(&mut self, frame: &mut MatrixFrame);

    /// Skip to the provider's next piece of content
    ///
    /// Returns true if the provider consumed the request, in which case the
    /// slot is not changed.
    fn skip_content(&mut self) -> bool {
        false
    }
}
