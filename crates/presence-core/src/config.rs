//! Centralized Configuration Management
//!
//! All tunables of the presence logger live here: framing and pacing of the
//! notification protocol, the dump rate, scheduler intervals and log
//! formatting. Values default to what the firmware ships with.

use alloc::string::ToString;

use crate::errors::ConfigError;

/// Largest notification payload any supported peer accepts
pub const MAX_SAFE_CHUNK_SIZE: usize = 512;

// ----------------------------------------------------------------------------
// Protocol Configuration
// ----------------------------------------------------------------------------

/// Framing and pacing of outbound notifications
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Maximum payload bytes per notification
    pub max_chunk_size: usize,
    /// Delay after a single unfragmented frame (ms)
    pub plain_delay_ms: u64,
    /// Delay after a `START:<N>` header (ms)
    pub header_delay_ms: u64,
    /// Delay after each data chunk (ms)
    pub chunk_delay_ms: u64,
    /// Delay after the `END` terminator (ms)
    pub terminator_delay_ms: u64,
    /// Upper bound on frames delivered in one scheduler tick
    pub max_frames_per_poll: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 185, // Safe for most centrals without MTU negotiation
            plain_delay_ms: 50,
            header_delay_ms: 75,
            chunk_delay_ms: 100,
            terminator_delay_ms: 50,
            max_frames_per_poll: 4,
        }
    }
}

impl ProtocolConfig {
    /// No pacing at all; every due frame goes out on the same poll
    pub fn unpaced() -> Self {
        Self {
            plain_delay_ms: 0,
            header_delay_ms: 0,
            chunk_delay_ms: 0,
            terminator_delay_ms: 0,
            max_frames_per_poll: 64,
            ..Self::default()
        }
    }

    /// Set maximum chunk size
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 || self.max_chunk_size > MAX_SAFE_CHUNK_SIZE {
            return Err(ConfigError::InvalidChunkSize {
                size: self.max_chunk_size,
                max: MAX_SAFE_CHUNK_SIZE,
            });
        }
        if self.max_frames_per_poll == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_frames_per_poll",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Dump Configuration
// ----------------------------------------------------------------------------

/// Rate limit of the bulk log dump
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Minimum spacing between two dumped lines (ms)
    pub line_interval_ms: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            line_interval_ms: 100,
        }
    }
}

// ----------------------------------------------------------------------------
// Scheduler Configuration
// ----------------------------------------------------------------------------

/// Periodic work driven by the scheduler tick
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub wifi_scan_interval_ms: u64,
    pub ble_scan_interval_ms: u64,
    pub ble_scan_duration_ms: u64,
    /// Extra time granted to a BLE scan before it is forcibly stopped
    pub ble_scan_grace_ms: u64,
    pub memory_check_interval_ms: u64,
    /// Idle delay closing every tick
    pub tick_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            wifi_scan_interval_ms: 10_000,
            ble_scan_interval_ms: 8_000,
            ble_scan_duration_ms: 5_000,
            ble_scan_grace_ms: 200,
            memory_check_interval_ms: 60_000,
            tick_delay_ms: 50,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_delay_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.ble_scan_duration_ms >= self.ble_scan_interval_ms {
            return Err(ConfigError::InvalidValue {
                field: "ble_scan_duration_ms",
                reason: "must be shorter than ble_scan_interval_ms".to_string(),
            });
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Logger Configuration
// ----------------------------------------------------------------------------

/// Persisted log settings
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Hex characters kept from the identifier digest
    pub identifier_hash_len: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            identifier_hash_len: 16,
        }
    }
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identifier_hash_len == 0 || self.identifier_hash_len > 64 {
            return Err(ConfigError::InvalidValue {
                field: "identifier_hash_len",
                reason: "must be within 1..=64".to_string(),
            });
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Aggregate Configuration
// ----------------------------------------------------------------------------

/// Complete configuration of the presence logger
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub protocol: ProtocolConfig,
    pub dump: DumpConfig,
    pub scheduler: SchedulerConfig,
    pub logger: LoggerConfig,
}

impl PresenceConfig {
    /// Configuration for tests: unpaced transmitter, default intervals
    pub fn testing() -> Self {
        Self {
            protocol: ProtocolConfig::unpaced(),
            ..Self::default()
        }
    }

    pub fn with_protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_dump(mut self, dump: DumpConfig) -> Self {
        self.dump = dump;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol.validate()?;
        self.scheduler.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
