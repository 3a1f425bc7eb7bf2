//! ESP-AT Wi-Fi modem
//!
//! An ESP8266/ESP32 running the Espressif AT firmware, attached to a UART.
//!
//! # Protocol
//!
//! Commands are ASCII lines terminated by CR LF. The modem answers with any
//! number of information lines followed by a final `OK`, `ERROR` or `FAIL`.
//! String parameters are quoted; `"`, `,` and `\` inside them are escaped
//! with a backslash.
//!
//! The driver has no timeouts of its own. Callers wrap operations in
//! `embassy_time::with_timeout`.

use core::fmt::Write as _;

use embedded_io_async::{Read, Write};
use heapless::{String, Vec};

/// Longest command line
const MAX_COMMAND_LEN: usize = 192;

/// Longest response line kept, longer lines are truncated
const MAX_LINE_LEN: usize = 128;

/// Modem errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemError {
    /// Serial read or write failed
    Io,
    /// Serial port closed
    Disconnected,
    /// Modem answered `ERROR`
    Rejected,
    /// Join failed; ESP-AT reason code (1 timeout, 2 wrong password,
    /// 3 no AP, 4 connect failed) or 0 if none was given
    JoinFailed(u8),
    /// Command does not fit the command buffer
    CommandTooLong,
    /// Unexpected response format
    Parse,
}

/// Station link as reported by the modem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Disconnected,
    Connected,
}

/// Response line, classified
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Ok,
    Error,
    Fail,
    /// `+CMD:value`
    Info(&'a str, &'a str),
    Other(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    match line {
        "OK" | "SEND OK" => Line::Ok,
        "ERROR" => Line::Error,
        "FAIL" => Line::Fail,
        _ => match line.strip_prefix('+').and_then(|rest| rest.split_once(':')) {
            Some((name, value)) => Line::Info(name, value),
            None => Line::Other(line),
        },
    }
}

/// Append `value` quoted and escaped
fn push_quoted<const N: usize>(cmd: &mut String<N>, value: &str) -> Result<(), ModemError> {
    cmd.push('"').map_err(|_| ModemError::CommandTooLong)?;
    for c in value.chars() {
        if matches!(c, '"' | ',' | '\\') {
            cmd.push('\\').map_err(|_| ModemError::CommandTooLong)?;
        }
        cmd.push(c).map_err(|_| ModemError::CommandTooLong)?;
    }
    cmd.push('"').map_err(|_| ModemError::CommandTooLong)
}

/// Parse a dotted IPv4 address
fn parse_ipv4(text: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in octets.iter_mut() {
        *octet = parts.next()?.parse().ok()?;
    }
    parts.next().is_none().then_some(octets)
}

pub struct EspAtModem<U> {
    uart: U,
    rx: [u8; 64],
    rx_len: usize,
    rx_pos: usize,
    line: Vec<u8, MAX_LINE_LEN>,
}

impl<U: Read + Write> EspAtModem<U> {
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            rx: [0; 64],
            rx_len: 0,
            rx_pos: 0,
            line: Vec::new(),
        }
    }

    /// Check that the modem answers
    pub async fn probe(&mut self) -> Result<(), ModemError> {
        self.run("AT", |_, _| {}).await
    }

    /// Disable command echo and select station mode
    pub async fn init(&mut self) -> Result<(), ModemError> {
        self.run("ATE0", |_, _| {}).await?;
        self.run("AT+CWMODE=1", |_, _| {}).await
    }

    pub async fn join(&mut self, ssid: &str, passphrase: &str) -> Result<(), ModemError> {
        let mut cmd: String<MAX_COMMAND_LEN> = String::new();
        cmd.push_str("AT+CWJAP=").map_err(|_| ModemError::CommandTooLong)?;
        push_quoted(&mut cmd, ssid)?;
        cmd.push(',').map_err(|_| ModemError::CommandTooLong)?;
        push_quoted(&mut cmd, passphrase)?;

        let mut reason = 0;
        let result = self
            .run(&cmd, |name, value| {
                if name == "CWJAP" {
                    reason = value.trim().parse().unwrap_or(0);
                }
            })
            .await;

        match result {
            Err(ModemError::Rejected) => Err(ModemError::JoinFailed(reason)),
            other => other,
        }
    }

    pub async fn leave(&mut self) -> Result<(), ModemError> {
        self.run("AT+CWQAP", |_, _| {}).await
    }

    pub async fn set_hostname(&mut self, hostname: &str) -> Result<(), ModemError> {
        let mut cmd: String<MAX_COMMAND_LEN> = String::new();
        cmd.push_str("AT+CWHOSTNAME=").map_err(|_| ModemError::CommandTooLong)?;
        push_quoted(&mut cmd, hostname)?;
        self.run(&cmd, |_, _| {}).await
    }

    /// Switch to soft-AP mode with WPA2 on channel 5
    pub async fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<(), ModemError> {
        self.run("AT+CWMODE=2", |_, _| {}).await?;

        let mut cmd: String<MAX_COMMAND_LEN> = String::new();
        cmd.push_str("AT+CWSAP=").map_err(|_| ModemError::CommandTooLong)?;
        push_quoted(&mut cmd, ssid)?;
        cmd.push(',').map_err(|_| ModemError::CommandTooLong)?;
        push_quoted(&mut cmd, passphrase)?;
        cmd.push_str(",5,3").map_err(|_| ModemError::CommandTooLong)?;
        self.run(&cmd, |_, _| {}).await
    }

    pub async fn stop_access_point(&mut self) -> Result<(), ModemError> {
        self.run("AT+CWMODE=1", |_, _| {}).await
    }

    /// Query the station link
    pub async fn link_status(&mut self) -> Result<LinkStatus, ModemError> {
        let mut status = LinkStatus::Disconnected;
        self.run("AT+CWJAP?", |name, _| {
            if name == "CWJAP" {
                status = LinkStatus::Connected;
            }
        })
        .await?;
        Ok(status)
    }

    /// Station IPv4 address, `None` while no address is assigned
    pub async fn address(&mut self) -> Result<Option<[u8; 4]>, ModemError> {
        let mut address = None;
        let mut malformed = false;
        self.run("AT+CIPSTA?", |name, value| {
            if name != "CIPSTA" {
                return;
            }
            if let Some(ip) = value.strip_prefix("ip:") {
                match parse_ipv4(ip.trim_matches('"')) {
                    Some([0, 0, 0, 0]) => {}
                    Some(octets) => address = Some(octets),
                    None => malformed = true,
                }
            }
        })
        .await?;

        if malformed {
            return Err(ModemError::Parse);
        }
        Ok(address)
    }

    /// Send a command and collect lines until the final result
    ///
    /// `on_info` is called for every `+NAME:value` line.
    async fn run(&mut self, cmd: &str, mut on_info: impl FnMut(&str, &str)) -> Result<(), ModemError> {
        #[cfg(feature = "defmt")]
        defmt::trace!("AT > {}", cmd);

        self.uart.write_all(cmd.as_bytes()).await.map_err(|_| ModemError::Io)?;
        self.uart.write_all(b"\r\n").await.map_err(|_| ModemError::Io)?;
        self.uart.flush().await.map_err(|_| ModemError::Io)?;

        loop {
            self.read_line().await?;
            let Ok(text) = core::str::from_utf8(&self.line) else {
                continue;
            };

            match classify(text) {
                Line::Ok => return Ok(()),
                Line::Error | Line::Fail => return Err(ModemError::Rejected),
                Line::Info(name, value) => on_info(name, value),
                Line::Other(_other) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("AT < {}", _other);
                }
            }
        }
    }

    /// Read the next non-empty line into `self.line`
    async fn read_line(&mut self) -> Result<(), ModemError> {
        self.line.clear();
        loop {
            if self.rx_pos == self.rx_len {
                let n = self.uart.read(&mut self.rx).await.map_err(|_| ModemError::Io)?;
                if n == 0 {
                    return Err(ModemError::Disconnected);
                }
                self.rx_len = n;
                self.rx_pos = 0;
            }

            let byte = self.rx[self.rx_pos];
            self.rx_pos += 1;

            match byte {
                b'\r' => {}
                b'\n' if self.line.is_empty() => {}
                b'\n' => return Ok(()),
                _ => {
                    // Overlong lines are truncated
                    let _ = self.line.push(byte);
                }
            }
        }
    }
}

/// Format an address for status messages
pub fn format_address(octets: [u8; 4]) -> String<15> {
    let mut text = String::new();
    let [a, b, c, d] = octets;
    let _ = write!(text, "{}.{}.{}.{}", a, b, c, d);
    text
}
