//! Scan and housekeeping timers
//!
//! The scheduler owns no hardware. It decides, from elapsed uptime, when a
//! Wi-Fi scan is due, when a BLE scan window opens or closes, and when the
//! memory report is due; the radio work itself goes through [`Scanner`].

use alloc::vec::Vec;

use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::errors::ScanError;
use crate::observation::Observation;
use crate::types::Timestamp;

/// Radio scanning collaborator
///
/// BLE scans run in the background once started and report results as
/// [`crate::Event::Observation`] events. Wi-Fi scans are synchronous.
pub trait Scanner {
    fn start_ble_scan(&mut self) -> Result<(), ScanError>;

    fn stop_ble_scan(&mut self);

    fn scan_wifi(&mut self) -> Result<Vec<Observation>, ScanError>;
}

/// Change of the BLE scan window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleScanTransition {
    Started,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    last_wifi_scan: Timestamp,
    last_ble_scan: Timestamp,
    ble_scan_started: Option<Timestamp>,
    last_memory_check: Timestamp,
}

impl Scheduler {
    /// All timers start at `now`, so the first scans run one interval after boot
    pub fn new(config: SchedulerConfig, now: Timestamp) -> Self {
        Self {
            config,
            last_wifi_scan: now,
            last_ble_scan: now,
            ble_scan_started: None,
            last_memory_check: now,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn ble_scan_running(&self) -> bool {
        self.ble_scan_started.is_some()
    }

    /// Run the Wi-Fi scan if its interval has elapsed
    ///
    /// The interval restarts only after a successful scan; a failed scan is
    /// retried on the next call.
    pub fn run_wifi_scan<Sc: Scanner + ?Sized>(
        &mut self,
        now: Timestamp,
        scanner: &mut Sc,
    ) -> Vec<Observation> {
        if now.elapsed_since(self.last_wifi_scan) <= self.config.wifi_scan_interval_ms {
            return Vec::new();
        }

        debug!("Starting Wi-Fi scan");
        match scanner.scan_wifi() {
            Ok(networks) => {
                self.last_wifi_scan = now;
                debug!("Wi-Fi scan found {} networks", networks.len());
                networks
            }
            Err(err) => {
                warn!("Wi-Fi scan failed: {:?}", err);
                Vec::new()
            }
        }
    }

    /// Close an expired BLE window or open a new one when due
    ///
    /// At most one transition happens per call.
    pub fn poll_ble_scan<Sc: Scanner + ?Sized>(
        &mut self,
        now: Timestamp,
        scanner: &mut Sc,
    ) -> Option<BleScanTransition> {
        if let Some(started) = self.ble_scan_started {
            let window = self.config.ble_scan_duration_ms + self.config.ble_scan_grace_ms;
            if now.elapsed_since(started) > window {
                scanner.stop_ble_scan();
                self.ble_scan_started = None;
                info!("BLE scan completed");
                return Some(BleScanTransition::Stopped);
            }
            return None;
        }

        if now.elapsed_since(self.last_ble_scan) <= self.config.ble_scan_interval_ms {
            return None;
        }
        self.last_ble_scan = now;

        match scanner.start_ble_scan() {
            Ok(()) => {
                self.ble_scan_started = Some(now);
                info!("Starting BLE scan");
                Some(BleScanTransition::Started)
            }
            Err(err) => {
                warn!("BLE scan could not start: {:?}", err);
                None
            }
        }
    }

    /// Whether the periodic memory report is due; restarts its interval
    pub fn memory_check_due(&mut self, now: Timestamp) -> bool {
        if now.elapsed_since(self.last_memory_check) > self.config.memory_check_interval_ms {
            self.last_memory_check = now;
            true
        } else {
            false
        }
    }
}
