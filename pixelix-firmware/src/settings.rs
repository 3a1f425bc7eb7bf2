//! Settings and slot table persistence
//!
//! Both records are postcard binary data in the sequential-storage map.
//! Missing records are not an error at boot: defaults apply and the
//! settings record is written back so the next boot finds it.

use defmt::*;
use heapless::Vec;

use pixelix_core::config::{Settings, MAX_SLOTS, SETTINGS_VERSION};
use pixelix_core::scheduler::SlotConfig;
use pixelix_core::traits::{SettingsError, SettingsStore};
use pixelix_hal_rp2040::flash::{FlashError, Rp2040FlashStorage, StorageKey};
use pixelix_hal_rp2040::FlashStorageTrait;

/// Largest serialized record
const MAX_RECORD_SIZE: usize = 512;

/// Persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// Settings version mismatch
    VersionMismatch,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ConfigError> for SettingsError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Flash(_) => SettingsError::Storage,
            _ => SettingsError::Corrupted,
        }
    }
}

/// Settings and slot table store
pub struct ConfigPersistence<'d> {
    storage: Rp2040FlashStorage<'d>,
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(storage: Rp2040FlashStorage<'d>) -> Self {
        Self { storage }
    }

    pub async fn load_settings(&mut self) -> Result<Settings, ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = self.storage.read(StorageKey::Settings, &mut buffer).await?;
        debug!("Read {} bytes of settings from flash", len);

        let settings: Settings = postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;
        if settings.version != SETTINGS_VERSION {
            warn!(
                "Settings version mismatch: found {}, expected {}",
                settings.version, SETTINGS_VERSION
            );
            return Err(ConfigError::VersionMismatch);
        }
        Ok(settings)
    }

    pub async fn save_settings(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let data = postcard::to_slice(settings, &mut buffer).map_err(|_| ConfigError::Serialize)?;
        self.storage.write(StorageKey::Settings, data).await?;
        info!("Settings saved ({} bytes)", data.len());
        Ok(())
    }

    pub async fn load_slots(&mut self) -> Result<Vec<SlotConfig, MAX_SLOTS>, ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = self.storage.read(StorageKey::SlotConfig, &mut buffer).await?;
        debug!("Read {} bytes of slot configuration from flash", len);

        postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)
    }

    pub async fn save_slots(&mut self, slots: &[SlotConfig]) -> Result<(), ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let data = postcard::to_slice(&slots, &mut buffer).map_err(|_| ConfigError::Serialize)?;
        self.storage.write(StorageKey::SlotConfig, data).await?;
        info!("Slot configuration saved ({} bytes)", data.len());
        Ok(())
    }

    /// Load the settings, falling back to defaults
    ///
    /// Defaults are written back when nothing was stored. Any other
    /// failure is kept for the lifecycle, which reports it and carries on
    /// with defaults.
    pub async fn load_or_default(&mut self) -> (Settings, Option<SettingsError>) {
        match self.load_settings().await {
            Ok(settings) => {
                info!("Loaded settings from flash");
                (settings, None)
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No settings in flash, storing defaults");
                let settings = Settings::default();
                if let Err(e) = self.save_settings(&settings).await {
                    warn!("Failed to store default settings: {:?}", e);
                }
                (settings, None)
            }
            Err(e) => {
                warn!("Failed to load settings: {:?}", e);
                (Settings::default(), Some(e.into()))
            }
        }
    }
}

/// Settings read once at boot, handed to the lifecycle
pub struct LoadedSettings {
    settings: Settings,
    error: Option<SettingsError>,
}

impl LoadedSettings {
    pub fn new(settings: Settings, error: Option<SettingsError>) -> Self {
        Self { settings, error }
    }
}

impl SettingsStore for LoadedSettings {
    fn load(&mut self) -> Result<Settings, SettingsError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.settings.clone()),
        }
    }
}
