//! Error types for the presence logger
//!
//! Errors are grouped by the collaborator that produced them (transport,
//! storage, scanner), by inbound command validation, and by dump lifecycle
//! conflicts. `PresenceError` unifies them. None of these are fatal: the
//! component that hit one returns to its idle state and waits for the next
//! external trigger.

use alloc::string::String;

use crate::protocol::ControlSentinel;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Errors reported by the transport sink or the transmit path
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum TransportError {
            #[error("Peer not connected")]
            NotConnected,
            #[error("Notification delivery failed: {reason}")]
            DeliveryFailed { reason: String },
            #[error("Payload too large: {size} bytes (max: {max_size})")]
            PayloadTooLarge { size: usize, max_size: usize },
        }
    } else {
        /// Errors reported by the transport sink or the transmit path
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum TransportError {
            NotConnected,
            DeliveryFailed { reason: String },
            PayloadTooLarge { size: usize, max_size: usize },
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Errors reported by the persisted log
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum StorageError {
            #[error("Log file not found: {path}")]
            NotFound { path: String },
            #[error("Failed to open log: {reason}")]
            Open { reason: String },
            #[error("Failed to append to log: {reason}")]
            Append { reason: String },
            #[error("Failed to read log: {reason}")]
            Read { reason: String },
            #[error("Failed to remove log: {reason}")]
            Remove { reason: String },
        }
    } else {
        /// Errors reported by the persisted log
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum StorageError {
            NotFound { path: String },
            Open { reason: String },
            Append { reason: String },
            Read { reason: String },
            Remove { reason: String },
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Validation errors for inbound commands
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum CommandError {
            #[error("Time format should be YYYY-MM-DD HH:MM:SS")]
            InvalidTimeFormat,
            #[error("Invalid time values")]
            InvalidTimeValues,
        }
    } else {
        /// Validation errors for inbound commands
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum CommandError {
            InvalidTimeFormat,
            InvalidTimeValues,
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Dump lifecycle errors
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum DumpError {
            #[error("Dump already in progress")]
            AlreadyActive,
            #[error("Log file not found")]
            LogNotFound,
        }
    } else {
        /// Dump lifecycle errors
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum DumpError {
            AlreadyActive,
            LogNotFound,
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Errors reported by the wireless scanner
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum ScanError {
            #[error("Scan failed: {reason}")]
            Failed { reason: String },
            #[error("Scanner busy")]
            Busy,
        }
    } else {
        /// Errors reported by the wireless scanner
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum ScanError {
            Failed { reason: String },
            Busy,
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Invalid configuration values
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum ConfigError {
            #[error("Invalid chunk size {size} (allowed: 1..={max})")]
            InvalidChunkSize { size: usize, max: usize },
            #[error("Invalid {field}: {reason}")]
            InvalidValue { field: &'static str, reason: String },
        }
    } else {
        /// Invalid configuration values
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum ConfigError {
            InvalidChunkSize { size: usize, max: usize },
            InvalidValue { field: &'static str, reason: String },
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Core error type for the presence logger
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum PresenceError {
            #[error("Transport error: {0}")]
            Transport(#[from] TransportError),

            #[error("Storage error: {0}")]
            Storage(#[from] StorageError),

            #[error("Command error: {0}")]
            Command(#[from] CommandError),

            #[error("Dump error: {0}")]
            Dump(#[from] DumpError),

            #[error("Scan error: {0}")]
            Scan(#[from] ScanError),

            #[error("Configuration error: {0}")]
            Config(#[from] ConfigError),
        }
    } else {
        /// Core error type for the presence logger (no_std version)
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum PresenceError {
            Transport(TransportError),
            Storage(StorageError),
            Command(CommandError),
            Dump(DumpError),
            Scan(ScanError),
            Config(ConfigError),
        }

        impl From<TransportError> for PresenceError {
            fn from(err: TransportError) -> Self {
                PresenceError::Transport(err)
            }
        }

        impl From<StorageError> for PresenceError {
            fn from(err: StorageError) -> Self {
                PresenceError::Storage(err)
            }
        }

        impl From<CommandError> for PresenceError {
            fn from(err: CommandError) -> Self {
                PresenceError::Command(err)
            }
        }

        impl From<DumpError> for PresenceError {
            fn from(err: DumpError) -> Self {
                PresenceError::Dump(err)
            }
        }

        impl From<ScanError> for PresenceError {
            fn from(err: ScanError) -> Self {
                PresenceError::Scan(err)
            }
        }

        impl From<ConfigError> for PresenceError {
            fn from(err: ConfigError) -> Self {
                PresenceError::Config(err)
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Wire Replies
// ----------------------------------------------------------------------------

impl CommandError {
    /// Text sent back to the peer when a command is rejected
    pub fn reply(&self) -> &'static str {
        match self {
            CommandError::InvalidTimeFormat => "ERROR: Time format should be YYYY-MM-DD HH:MM:SS",
            CommandError::InvalidTimeValues => "ERROR: Invalid time values",
        }
    }
}

impl DumpError {
    /// Sentinel sent back to the peer when a dump cannot start
    pub fn reply(&self) -> ControlSentinel {
        match self {
            DumpError::AlreadyActive => ControlSentinel::error("Dump already in progress"),
            DumpError::LogNotFound => ControlSentinel::error("Log file not found"),
        }
    }
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl TransportError {
    /// Create a delivery failure with a reason
    pub fn delivery_failed<T: Into<String>>(reason: T) -> Self {
        TransportError::DeliveryFailed {
            reason: reason.into(),
        }
    }
}

impl ScanError {
    /// Create a scan failure with a reason
    pub fn failed<T: Into<String>>(reason: T) -> Self {
        ScanError::Failed {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, PresenceError>;
