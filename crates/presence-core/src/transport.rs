//! Transport abstraction for outbound notifications
//!
//! The transmitter is the only component that touches the notification
//! primitive, and it does so exclusively through [`TransportSink`].

use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::TransportError;

// ----------------------------------------------------------------------------
// Transport Trait
// ----------------------------------------------------------------------------

/// Delivery of one bounded payload to the connected peer
pub trait TransportSink {
    /// Whether a peer is currently connected and subscribed
    fn is_connected(&self) -> bool;

    /// Deliver one payload as a single notification
    fn notify(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

impl<T: TransportSink + ?Sized> TransportSink for &mut T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn notify(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).notify(payload)
    }
}

// ----------------------------------------------------------------------------
// Recording Sink
// ----------------------------------------------------------------------------

/// In-memory sink that records every delivered payload
///
/// Used by tests and by host tooling that wants to inspect the exact
/// notification stream.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    connected: bool,
    delivered: Vec<Vec<u8>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    /// Create a sink with a connected peer
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Create a sink with no peer
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Make every delivery after the first `count` fail
    pub fn fail_after(&mut self, count: usize) {
        self.fail_after = Some(count);
    }

    /// Raw payloads in delivery order
    pub fn payloads(&self) -> &[Vec<u8>] {
        &self.delivered
    }

    /// Payloads as lossy UTF-8 text
    pub fn texts(&self) -> Vec<String> {
        self.delivered
            .iter()
            .map(|payload| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }

    /// Remove and return everything delivered so far
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        core::mem::take(&mut self.delivered)
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

impl TransportSink for RecordingSink {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn notify(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(limit) = self.fail_after {
            if self.delivered.len() >= limit {
                return Err(TransportError::delivery_failed("injected failure"));
            }
        }
        self.delivered.push(payload.to_vec());
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
