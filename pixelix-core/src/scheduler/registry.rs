//! Content provider registry
//!
//! Creates providers by type name through a `ProviderFactory`, assigns
//! unique UIDs, installs them into the display manager and destroys them
//! after uninstalling. The slot table can be exported as `SlotConfig`
//! records and restored after a reboot.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::manager::DisplayManager;
use super::slot::SlotId;
use crate::traits::{ContentProvider, ProviderUid};

/// Maximum provider type name length
pub const MAX_PROVIDER_NAME_LEN: usize = 24;

/// Creates provider instances by type name
pub trait ProviderFactory<P> {
    /// `None` if the name is unknown or the provider can not be created
    fn create(&mut self, name: &str, uid: ProviderUid) -> Option<P>;
}

impl<P, F> ProviderFactory<P> for F
where
    F: FnMut(&str, ProviderUid) -> Option<P>,
{
    fn create(&mut self, name: &str, uid: ProviderUid) -> Option<P> {
        self(name, uid)
    }
}

/// Persisted configuration of one slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotConfig {
    pub slot: u8,
    /// Provider type name, empty for an empty slot
    pub name: String<MAX_PROVIDER_NAME_LEN>,
    /// 0 for an empty slot
    pub uid: ProviderUid,
    /// Configured duration, 0 = global default
    pub duration_ms: u32,
}

/// Provider registry
pub struct ProviderRegistry<F> {
    factory: F,
    next_uid: ProviderUid,
}

impl<F> ProviderRegistry<F> {
    pub const fn new(factory: F) -> Self {
        Self {
            factory,
            next_uid: 1,
        }
    }

    /// Create a provider by name and install it
    ///
    /// Returns the new provider's UID.
    pub fn install<P, const N: usize>(
        &mut self,
        dm: &mut DisplayManager<P, N>,
        name: &str,
        slot: Option<SlotId>,
    ) -> Option<ProviderUid>
    where
        P: ContentProvider,
        F: ProviderFactory<P>,
    {
        let uid = self.generate_uid(dm);
        self.install_with_uid(dm, name, uid, slot)
    }

    /// Create a provider with a known UID (restoring) and install it
    pub fn install_with_uid<P, const N: usize>(
        &mut self,
        dm: &mut DisplayManager<P, N>,
        name: &str,
        uid: ProviderUid,
        slot: Option<SlotId>,
    ) -> Option<ProviderUid>
    where
        P: ContentProvider,
        F: ProviderFactory<P>,
    {
        let Some(provider) = self.factory.create(name, uid) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Unknown provider type {}", name);
            return None;
        };

        match dm.install(provider, slot) {
            Ok(_slot_id) => Some(uid),
            Err((_err, _provider)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Couldn't install {} (UID {}): {}", name, uid, _err);
                None
            }
        }
    }

    /// Uninstall and destroy a provider
    pub fn uninstall<P, const N: usize>(&mut self, dm: &mut DisplayManager<P, N>, uid: ProviderUid) -> bool
    where
        P: ContentProvider,
    {
        dm.uninstall(uid).is_some()
    }

    pub fn provider_in_slot<'a, P, const N: usize>(
        &self,
        dm: &'a DisplayManager<P, N>,
        slot: SlotId,
    ) -> Option<&'a P>
    where
        P: ContentProvider,
    {
        dm.provider_in_slot(slot)
    }

    pub fn slot_id_by_uid<P, const N: usize>(&self, dm: &DisplayManager<P, N>, uid: ProviderUid) -> Option<SlotId>
    where
        P: ContentProvider,
    {
        dm.slot_id_by_uid(uid)
    }

    /// Export the slot table
    pub fn slot_configs<P, const N: usize>(&self, dm: &DisplayManager<P, N>) -> Vec<SlotConfig, N>
    where
        P: ContentProvider,
    {
        let mut configs = Vec::new();
        for slot in 0..N {
            let mut config = SlotConfig {
                slot: slot as u8,
                duration_ms: dm.configured_slot_duration(slot).unwrap_or(0),
                ..Default::default()
            };
            if let Some(provider) = dm.provider_in_slot(slot) {
                let _ = config.name.push_str(provider.name());
                config.uid = provider.uid();
            }
            // One entry per slot, never exceeds N
            let _ = configs.push(config);
        }
        configs
    }

    /// Recreate providers from an exported slot table
    ///
    /// Slots that already hold a provider (system providers installed at
    /// boot) are kept. Returns the number of providers installed.
    pub fn restore<P, const N: usize>(&mut self, dm: &mut DisplayManager<P, N>, configs: &[SlotConfig]) -> usize
    where
        P: ContentProvider,
        F: ProviderFactory<P>,
    {
        let mut installed = 0;

        for config in configs {
            let slot = config.slot as SlotId;
            if slot >= N {
                #[cfg(feature = "defmt")]
                defmt::warn!("Ignoring configuration of invalid slot {}", slot);
                continue;
            }

            if !config.name.is_empty() && dm.provider_in_slot(slot).is_none() {
                let uid = if config.uid == 0 || dm.slot_id_by_uid(config.uid).is_some() {
                    self.generate_uid(dm)
                } else {
                    config.uid
                };
                if self.install_with_uid(dm, &config.name, uid, Some(slot)).is_some() {
                    installed += 1;
                }
            }

            dm.set_slot_duration(slot, config.duration_ms, false);
        }

        // Restored state matches what is stored
        let _ = dm.take_dirty_slots();
        installed
    }

    /// Next unused UID, never 0
    fn generate_uid<P, const N: usize>(&mut self, dm: &DisplayManager<P, N>) -> ProviderUid
    where
        P: ContentProvider,
    {
        loop {
            let uid = self.next_uid;
            self.next_uid = self.next_uid.wrapping_add(1);
            if uid != 0 && dm.slot_id_by_uid(uid).is_none() {
                return uid;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::mock::{Hook, MockProvider};

    type Manager = DisplayManager<MockProvider, 4>;

    fn factory(name: &str, uid: ProviderUid) -> Option<MockProvider> {
        (name == "Mock").then(|| MockProvider::new(uid))
    }

    #[test]
    fn test_install_by_name() {
        let mut dm = Manager::new();
        let mut registry = ProviderRegistry::new(factory);

        let uid = registry.install(&mut dm, "Mock", None).unwrap();
        assert_ne!(uid, 0);
        assert_eq!(registry.slot_id_by_uid(&dm, uid), Some(0));
        assert_eq!(registry.provider_in_slot(&dm, 0).unwrap().uid, uid);

        assert!(registry.install(&mut dm, "Unknown", None).is_none());
    }

    #[test]
    fn test_uids_are_unique() {
        let mut dm = Manager::new();
        let mut registry = ProviderRegistry::new(factory);

        // Occupy UID 2 directly
        dm.install(MockProvider::new(2), Some(3)).unwrap();

        let a = registry.install(&mut dm, "Mock", None).unwrap();
        let b = registry.install(&mut dm, "Mock", None).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 3);
    }

    #[test]
    fn test_failed_install_destroys_provider() {
        let mut dm = Manager::new();
        let mut registry = ProviderRegistry::new(factory);
        registry.install(&mut dm, "Mock", Some(1)).unwrap();

        assert!(registry.install(&mut dm, "Mock", Some(1)).is_none());
        assert_eq!(dm.providers().count(), 1);
    }

    #[test]
    fn test_uninstall() {
        let mut dm = Manager::new();
        let mut registry = ProviderRegistry::new(factory);
        let uid = registry.install(&mut dm, "Mock", None).unwrap();

        assert!(registry.uninstall(&mut dm, uid));
        assert!(!registry.uninstall(&mut dm, uid));
        assert!(dm.provider_in_slot(0).is_none());
    }

    #[test]
    fn test_export_and_restore() {
        let mut dm = Manager::new();
        let mut registry = ProviderRegistry::new(factory);
        let uid = registry.install(&mut dm, "Mock", Some(2)).unwrap();
        dm.set_slot_duration(2, 5000, true);
        dm.set_slot_duration(0, 700, true);

        let configs = registry.slot_configs(&dm);
        assert_eq!(configs.len(), 4);
        assert_eq!(configs[2].name.as_str(), "Mock");
        assert_eq!(configs[2].uid, uid);
        assert_eq!(configs[2].duration_ms, 5000);
        assert_eq!(configs[0].uid, 0);
        assert_eq!(configs[0].duration_ms, 700);

        let mut restored = Manager::new();
        let mut registry = ProviderRegistry::new(factory);
        assert_eq!(registry.restore(&mut restored, &configs), 1);
        assert_eq!(restored.slot_id_by_uid(uid), Some(2));
        assert_eq!(restored.slot_duration(2), 5000);
        assert_eq!(restored.slot_duration(0), 700);
        assert!(restored.take_dirty_slots().is_empty());
        assert_eq!(restored.provider_in_slot(2).unwrap().count(Hook::Start), 1);
    }

    #[test]
    fn test_restore_keeps_system_slot() {
        let mut dm = Manager::new();
        dm.install(MockProvider::new(100), Some(0)).unwrap();
        let mut registry = ProviderRegistry::new(factory);

        let mut name = String::new();
        let _ = name.push_str("Mock");
        let configs = [SlotConfig {
            slot: 0,
            name,
            uid: 5,
            duration_ms: 0,
        }];

        assert_eq!(registry.restore(&mut dm, &configs), 0);
        assert_eq!(dm.provider_in_slot(0).unwrap().uid, 100);
    }
}
