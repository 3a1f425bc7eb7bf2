//! Wi-Fi modem task
//!
//! Owns the ESP-AT modem. Executes queued `ModemCommand`s and, while idle,
//! polls the station link so `LINK_UP` and `ADDRESS` stay current.

use defmt::*;
use embassy_rp::uart::BufferedUart;
use embassy_time::{with_timeout, Duration, Timer};
use portable_atomic::Ordering;

use pixelix_core::state::Fault;
use pixelix_drivers::esp_at::{EspAtModem, LinkStatus, ModemError};

use crate::channels::{ADDRESS, FAULTS, LINK_UP, MODEM_COMMANDS};
use crate::network::ModemCommand;

/// Link poll interval while no command is pending
const LINK_POLL_MS: u64 = 2_000;

/// Upper bound for one command; joining an AP takes several seconds
const COMMAND_TIMEOUT_MS: u64 = 20_000;

/// Upper bound for status queries
const QUERY_TIMEOUT_MS: u64 = 1_000;

/// Attempts to reach the modem after power-up
const PROBE_ATTEMPTS: u32 = 5;

type Modem = EspAtModem<BufferedUart>;

/// Modem task - serializes all modem traffic
#[embassy_executor::task]
pub async fn modem_task(mut modem: Modem) {
    info!("Modem task started");

    if !bring_up(&mut modem).await {
        error!("Modem did not answer, network unavailable");
        FAULTS.signal(Fault::Service);
    }

    loop {
        match with_timeout(Duration::from_millis(LINK_POLL_MS), MODEM_COMMANDS.receive()).await {
            Ok(command) => execute(&mut modem, command).await,
            Err(_) => poll_link(&mut modem).await,
        }
    }
}

/// Wait for the modem to answer, then switch it to station mode
///
/// Returns false if the modem never answered the probe.
async fn bring_up(modem: &mut Modem) -> bool {
    let mut answered = false;
    for attempt in 1..=PROBE_ATTEMPTS {
        match with_timeout(Duration::from_millis(QUERY_TIMEOUT_MS), modem.probe()).await {
            Ok(Ok(())) => {
                answered = true;
                break;
            }
            _ => {
                debug!("Modem not responding (attempt {})", attempt);
                Timer::after_millis(500).await;
            }
        }
    }

    if !answered {
        return false;
    }

    match with_timeout(Duration::from_millis(QUERY_TIMEOUT_MS), modem.init()).await {
        Ok(Ok(())) => info!("Modem ready"),
        Ok(Err(e)) => warn!("Modem init failed: {:?}", e),
        Err(_) => warn!("Modem init timed out"),
    }
    true
}

async fn execute(modem: &mut Modem, command: ModemCommand) {
    let result = match command {
        ModemCommand::Join { ssid, passphrase } => {
            let result = run(modem.join(&ssid, &passphrase)).await;
            if result.is_ok() {
                info!("Joined {}", ssid.as_str());
                poll_link(modem).await;
            }
            result
        }
        ModemCommand::Leave => run(modem.leave()).await,
        ModemCommand::SetHostname(hostname) => run(modem.set_hostname(&hostname)).await,
        ModemCommand::StartAccessPoint { ssid, passphrase } => {
            run(modem.start_access_point(&ssid, &passphrase)).await
        }
        ModemCommand::StopAccessPoint => run(modem.stop_access_point()).await,
    };

    if let Err(e) = result {
        warn!("Modem command failed: {:?}", e);
    }
}

/// Run one modem operation with the command timeout
async fn run(op: impl core::future::Future<Output = Result<(), ModemError>>) -> Result<(), ModemError> {
    match with_timeout(Duration::from_millis(COMMAND_TIMEOUT_MS), op).await {
        Ok(result) => result,
        Err(_) => Err(ModemError::Io),
    }
}

/// Refresh `LINK_UP` and `ADDRESS` from the modem
async fn poll_link(modem: &mut Modem) {
    let timeout = Duration::from_millis(QUERY_TIMEOUT_MS);

    let link = match with_timeout(timeout, modem.link_status()).await {
        Ok(Ok(link)) => link,
        Ok(Err(e)) => {
            trace!("Link query failed: {:?}", e);
            return;
        }
        Err(_) => return,
    };

    let address = match link {
        LinkStatus::Connected => match with_timeout(timeout, modem.address()).await {
            Ok(Ok(address)) => address,
            _ => None,
        },
        LinkStatus::Disconnected => None,
    };

    // Up means usable: associated and holding a DHCP lease
    let is_up = address.is_some();
    let was_up = LINK_UP.swap(is_up, Ordering::AcqRel);
    if was_up && !is_up {
        warn!("Station link lost");
    }
    ADDRESS.store(address.map(u32::from_be_bytes).unwrap_or(0), Ordering::Release);
}
