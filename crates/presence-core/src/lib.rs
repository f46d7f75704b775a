//! Presence Logger Core
//!
//! This crate implements the notification side of a wireless presence logger:
//! the chunked framing protocol used for every message sent to the companion
//! application, the paced transmitter that drains frames onto the transport,
//! and the rate-limited dump engine that replays the persisted log without
//! blocking live logging. Everything runs on a single cooperative scheduler
//! tick; collaborators (transport, storage, scanning, heap reporting) are
//! reached through traits so the same logic runs on firmware and on the host.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod app;
pub mod clock;
pub mod command;
pub mod config;
pub mod dump;
pub mod errors;
pub mod framing;
pub mod interpreter;
pub mod logger;
pub mod observation;
pub mod platform;
pub mod protocol;
pub mod scheduler;
pub mod storage;
pub mod transmitter;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use app::{Event, PresenceApp, TickReport};
pub use clock::{days_in_month, is_leap_year, CivilTime, Clock};
pub use command::Command;
pub use config::{DumpConfig, LoggerConfig, PresenceConfig, ProtocolConfig, SchedulerConfig};
pub use dump::{DumpEngine, DumpTick};
pub use errors::{
    CommandError, ConfigError, DumpError, PresenceError, Result, ScanError, StorageError,
    TransportError,
};
pub use framing::{fragment, FrameReassembler, ReceivedMessage};
pub use logger::{LogLine, Logger};
pub use observation::{hash_identifier, manufacturer_id, Observation};
pub use platform::{FixedHeapMonitor, HeapMonitor};
pub use protocol::{ControlSentinel, Frame, FrameKind, TransferState};
pub use scheduler::{BleScanTransition, Scanner, Scheduler};
pub use storage::{LogReader, LogStorage, MemoryLogStorage};
pub use transmitter::{Transmitter, TransmitterStats};
pub use transport::{RecordingSink, TransportSink};
pub use types::{TimeSource, Timestamp};

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        pub use storage::FileLogStorage;
        pub use types::SystemTimeSource;
    }
}
