//! Core time types
//!
//! The target has no real-time clock, so every component works against a
//! monotonic uptime counter in milliseconds. Civil time lives in
//! [`crate::clock`] and is derived from this counter.

use core::fmt;
use core::ops::Sub;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Monotonic milliseconds since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Sub for Timestamp {
    type Output = u64;

    fn sub(self, other: Timestamp) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl Timestamp {
    /// Boot instant
    pub const ZERO: Self = Self(0);

    /// Create a new timestamp
    pub const fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the raw milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Timestamp `millis` later than this one
    pub fn saturating_add(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future
    pub fn elapsed_since(&self, earlier: Self) -> u64 {
        *self - earlier
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ----------------------------------------------------------------------------
// Time Source Trait
// ----------------------------------------------------------------------------

/// Source of monotonic uptime
///
/// Firmware implements this over its tick counter; the host uses
/// [`SystemTimeSource`]; tests drive a manual clock.
pub trait TimeSource {
    /// Get the current timestamp
    fn now(&self) -> Timestamp;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        use std::time::Instant;

        /// Uptime measured from the moment the source was created
        #[derive(Debug, Clone, Copy)]
        pub struct SystemTimeSource {
            started: Instant,
        }

        impl SystemTimeSource {
            pub fn new() -> Self {
                Self {
                    started: Instant::now(),
                }
            }
        }

        impl Default for SystemTimeSource {
            fn default() -> Self {
                Self::new()
            }
        }

        impl TimeSource for SystemTimeSource {
            fn now(&self) -> Timestamp {
                Timestamp(self.started.elapsed().as_millis() as u64)
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
