//! Event logging
//!
//! Every observation and lifecycle marker becomes one [`LogLine`]. Lines are
//! appended to the persisted log and observations are also forwarded live to
//! a connected peer, unless a dump currently owns the transmit path.

use alloc::format;
use alloc::string::String;
use core::fmt;

use tracing::{info, warn};

use crate::observation::{hash_identifier, manufacturer_id, Observation};
use crate::storage::LogStorage;
use crate::transmitter::Transmitter;
use crate::transport::TransportSink;

// ----------------------------------------------------------------------------
// Log Line
// ----------------------------------------------------------------------------

/// One immutable formatted log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    text: String,
    live: bool,
}

impl LogLine {
    /// Formatted observation, eligible for live forwarding
    pub fn observation(timestamp: &str, observation: &Observation, hash_len: usize) -> Self {
        let text = match observation {
            Observation::Ble {
                address,
                rssi,
                manufacturer_data,
            } => {
                let mfr = manufacturer_data
                    .as_deref()
                    .and_then(manufacturer_id)
                    .map(|id| format!("0x{id:04X}"))
                    .unwrap_or_else(|| String::from("None"));
                format!(
                    "{timestamp} - BLE Device - RSSI {rssi} dBm - ID: {} - MFR: {mfr}",
                    hash_identifier(address, hash_len)
                )
            }
            Observation::Wifi { ssid, bssid, rssi } => format!(
                "{timestamp} - Wi-Fi: {ssid} (BSSID {}) - RSSI {rssi} dBm",
                hash_identifier(bssid, hash_len)
            ),
        };
        Self { text, live: true }
    }

    /// Boot marker
    pub fn started(timestamp: &str) -> Self {
        Self::marker(format!("=== Log started at {timestamp} ==="))
    }

    /// Written right after the log is cleared
    pub fn cleared(timestamp: &str) -> Self {
        Self::marker(format!("=== Log cleared at {timestamp} ==="))
    }

    /// Written on every connection edge
    pub fn connected(timestamp: &str) -> Self {
        Self::marker(format!("BLE device connected - {timestamp}"))
    }

    fn marker(text: String) -> Self {
        Self { text, live: false }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the line may be forwarded to a connected peer
    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ----------------------------------------------------------------------------
// Logger
// ----------------------------------------------------------------------------

/// Appends log lines and forwards live ones
#[derive(Debug)]
pub struct Logger<St> {
    storage: St,
}

impl<St: LogStorage> Logger<St> {
    pub fn new(storage: St) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &St {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut St {
        &mut self.storage
    }

    /// Persist `line` without forwarding it, returning whether it was stored
    pub fn append(&mut self, line: &LogLine) -> bool {
        info!("{}", line);
        match self.storage.append_line(line.text()) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to persist log line: {:?}", err);
                false
            }
        }
    }

    /// Persist `line` and forward it when allowed
    ///
    /// Returns whether the line was queued for live delivery. A line that
    /// could not be persisted is never forwarded, so the peer only sees
    /// lines a later dump can replay.
    pub fn log<S: TransportSink + ?Sized>(
        &mut self,
        line: &LogLine,
        dump_active: bool,
        transmitter: &mut Transmitter,
        sink: &S,
    ) -> bool {
        if !self.append(line) {
            return false;
        }

        if line.is_live() && !dump_active && sink.is_connected() {
            transmitter.send(sink, line.text())
        } else {
            false
        }
    }
}
