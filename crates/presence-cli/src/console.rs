//! Console stand-ins for the radio hardware
//!
//! [`ConsoleSink`] plays the notification characteristic: every payload is
//! written raw, one per line, so the output is a transcript that `decode`
//! can read back. [`SimulatedScanner`] plays the radio with deterministic
//! observations.

use std::io::Write;

use tracing::debug;

use presence_core::{Observation, ScanError, Scanner, TransportError, TransportSink};

// ----------------------------------------------------------------------------
// Console Input
// ----------------------------------------------------------------------------

/// One line typed on the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// `:connect`, simulate a peer connecting
    Connect,
    /// `:disconnect`, simulate the peer going away
    Disconnect,
    /// `:quit`
    Quit,
    /// Anything else is written to the command characteristic as is
    Command(String),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            ":connect" => ConsoleInput::Connect,
            ":disconnect" => ConsoleInput::Disconnect,
            ":quit" | ":q" => ConsoleInput::Quit,
            _ => ConsoleInput::Command(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

// ----------------------------------------------------------------------------
// Console Sink
// ----------------------------------------------------------------------------

/// Transport sink writing one payload per line
#[derive(Debug)]
pub struct ConsoleSink<W> {
    out: W,
    connected: bool,
    max_payload: usize,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, max_payload: usize) -> Self {
        Self {
            out,
            connected: false,
            max_payload,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TransportSink for ConsoleSink<W> {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn notify(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if payload.len() > self.max_payload {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                max_size: self.max_payload,
            });
        }

        self.out
            .write_all(payload)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush())
            .map_err(|e| TransportError::delivery_failed(e.to_string()))
    }
}

// ----------------------------------------------------------------------------
// Simulated Scanner
// ----------------------------------------------------------------------------

/// Deterministic radio
///
/// Wi-Fi scans report a fixed set of networks whose signal drifts with each
/// scan. A BLE window yields each simulated device once, in order, through
/// [`SimulatedScanner::take_ble_results`].
#[derive(Debug, Clone)]
pub struct SimulatedScanner {
    networks: usize,
    devices: usize,
    enabled: bool,
    round: u32,
    ble_pending: Vec<Observation>,
}

impl SimulatedScanner {
    pub fn new(networks: usize, devices: usize) -> Self {
        Self {
            networks,
            devices,
            enabled: true,
            round: 0,
            ble_pending: Vec::new(),
        }
    }

    /// A radio that never finds anything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0, 0)
        }
    }

    /// Advertisements seen since the last call, at most one per call
    pub fn take_ble_results(&mut self) -> Option<Observation> {
        if self.ble_pending.is_empty() {
            None
        } else {
            Some(self.ble_pending.remove(0))
        }
    }

    fn drift(&self, index: usize) -> i32 {
        ((self.round as usize + index * 7) % 11) as i32
    }
}

impl Scanner for SimulatedScanner {
    fn start_ble_scan(&mut self) -> Result<(), ScanError> {
        if !self.enabled {
            return Err(ScanError::Busy);
        }
        self.round = self.round.wrapping_add(1);
        self.ble_pending = (0..self.devices)
            .map(|index| {
                let manufacturer = (index % 2 == 0).then(|| vec![0x4C, 0x00, index as u8]);
                Observation::ble(
                    format!("c0:ff:ee:00:00:{:02x}", index),
                    -50 - self.drift(index),
                    manufacturer,
                )
            })
            .collect();
        debug!("Simulated BLE window with {} devices", self.devices);
        Ok(())
    }

    fn stop_ble_scan(&mut self) {
        self.ble_pending.clear();
    }

    fn scan_wifi(&mut self) -> Result<Vec<Observation>, ScanError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        self.round = self.round.wrapping_add(1);
        Ok((0..self.networks)
            .map(|index| {
                Observation::wifi(
                    format!("SimNet-{}", index + 1),
                    format!("02:00:00:00:00:{:02x}", index),
                    -40 - self.drift(index),
                )
            })
            .collect())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
