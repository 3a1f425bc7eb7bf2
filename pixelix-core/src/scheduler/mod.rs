//! Slot scheduler
//!
//! The display manager owns a fixed set of slots, each holding at most one
//! content provider, and decides which one is shown. Rotation is driven by
//! per-slot durations and explicit navigation, with fade transitions in
//! between. The provider registry creates and destroys providers by name.

pub mod brightness;
pub mod manager;
pub mod registry;
pub mod requests;
pub mod shared;
pub mod slot;
pub mod sysmsg;

#[cfg(test)]
pub(crate) mod mock;

pub use brightness::Brightness;
pub use manager::{DisplayManager, InstallError};
pub use registry::{ProviderFactory, ProviderRegistry, SlotConfig, MAX_PROVIDER_NAME_LEN};
pub use requests::{ProviderContext, SchedulerRequest, MAX_REQUESTS};
pub use shared::SharedDisplayManager;
pub use slot::{Slot, SlotId};
pub use sysmsg::{
    post_clear, post_text, SystemMessage, SystemMessageEnvelope, SystemMessageInbox, SystemMessageKind,
    SystemText, MAX_MESSAGE_LEN, MAX_QUEUED_MESSAGES, SYSTEM_MESSAGE_NAME,
};
