//! Wi-Fi network facade for the lifecycle
//!
//! The lifecycle runs in a synchronous step function, the modem talks over
//! an async UART. `ModemNetwork` bridges the two: calls are queued as
//! `ModemCommand`s for the modem task, and link state is read back from
//! the flags the modem task maintains.

use defmt::*;
use heapless::String;
use portable_atomic::Ordering;

use pixelix_core::config::{MAX_HOSTNAME_LEN, MAX_PASSPHRASE_LEN, MAX_SSID_LEN};
use pixelix_core::traits::{Network, NetworkError};

use crate::channels::{ADDRESS, LINK_UP, MODEM_COMMANDS};

/// Work for the modem task
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemCommand {
    Join {
        ssid: String<MAX_SSID_LEN>,
        passphrase: String<MAX_PASSPHRASE_LEN>,
    },
    Leave,
    SetHostname(String<MAX_HOSTNAME_LEN>),
    StartAccessPoint {
        ssid: String<MAX_SSID_LEN>,
        passphrase: String<MAX_PASSPHRASE_LEN>,
    },
    StopAccessPoint,
}

fn bounded<const N: usize>(value: &str) -> Result<String<N>, NetworkError> {
    if value.is_empty() {
        return Err(NetworkError::InvalidParameter);
    }
    let mut out = String::new();
    out.push_str(value).map_err(|_| NetworkError::InvalidParameter)?;
    Ok(out)
}

/// `Network` implementation backed by the modem task
pub struct ModemNetwork;

impl ModemNetwork {
    fn submit(&self, command: ModemCommand) -> Result<(), NetworkError> {
        MODEM_COMMANDS.try_send(command).map_err(|_| {
            warn!("Modem command queue full");
            NetworkError::NotReady
        })
    }
}

impl Network for ModemNetwork {
    fn connect(&mut self, ssid: &str, passphrase: &str) -> Result<(), NetworkError> {
        let command = ModemCommand::Join {
            ssid: bounded(ssid)?,
            passphrase: bounded(passphrase)?,
        };
        LINK_UP.store(false, Ordering::Release);
        ADDRESS.store(0, Ordering::Release);
        self.submit(command)
    }

    fn is_connected(&self) -> bool {
        LINK_UP.load(Ordering::Acquire)
    }

    fn disconnect(&mut self) {
        LINK_UP.store(false, Ordering::Release);
        ADDRESS.store(0, Ordering::Release);
        let _ = self.submit(ModemCommand::Leave);
    }

    fn set_hostname(&mut self, hostname: &str) -> Result<(), NetworkError> {
        let hostname = bounded(hostname)?;
        self.submit(ModemCommand::SetHostname(hostname))
    }

    fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<(), NetworkError> {
        let command = ModemCommand::StartAccessPoint {
            ssid: bounded(ssid)?,
            passphrase: bounded(passphrase)?,
        };
        self.submit(command)
    }

    fn stop_access_point(&mut self) {
        let _ = self.submit(ModemCommand::StopAccessPoint);
    }

    fn address(&self) -> Option<[u8; 4]> {
        match ADDRESS.load(Ordering::Acquire) {
            0 => None,
            raw => Some(raw.to_be_bytes()),
        }
    }
}
