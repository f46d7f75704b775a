//! Rate-limited bulk log dump
//!
//! The dump engine replays the persisted log through the shared transmitter
//! one line per eligible tick, so a large log is spread across many
//! scheduler iterations instead of one blocking loop.
//!
//! ```text
//! Idle --start()--> Active --tick() at EOF--> Completed --> Idle
//!                     |
//!                     +--abort() / disconnect--> Idle
//! ```
//!
//! `Completed` is transient: the completion sentinel is queued and the
//! engine is back to `Idle` before `tick` returns.

use tracing::{debug, info, warn};

use crate::config::DumpConfig;
use crate::errors::{DumpError, StorageError};
use crate::protocol::ControlSentinel;
use crate::storage::{LogReader, LogStorage};
use crate::transmitter::Transmitter;
use crate::transport::TransportSink;
use crate::types::Timestamp;

/// Outcome of one dump tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTick {
    /// No dump session exists
    Inactive,
    /// Interval not elapsed or transmitter still busy
    Waiting,
    /// One line was handed to the transmitter
    LineSent,
    /// A blank line was consumed without sending
    BlankSkipped,
    /// End of file reached; `DUMP_COMPLETE` queued
    Completed,
    /// Peer disconnected; session closed without completion
    Aborted,
    /// The log could not be read; session closed
    Failed,
}

/// An active dump
#[derive(Debug)]
struct DumpSession<R> {
    reader: R,
    last_send: Option<Timestamp>,
    lines_sent: usize,
}

/// Streams the persisted log through the transmitter
#[derive(Debug)]
pub struct DumpEngine<R> {
    config: DumpConfig,
    session: Option<DumpSession<R>>,
}

impl<R: LogReader> DumpEngine<R> {
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Lines sent by the current session
    pub fn lines_sent(&self) -> Option<usize> {
        self.session.as_ref().map(|session| session.lines_sent)
    }

    /// Open the log and enter `Active`
    ///
    /// A second start while active is rejected and leaves the running
    /// session untouched. If the log cannot be opened the error sentinel is
    /// queued and the engine stays idle.
    pub fn start<St, S>(
        &mut self,
        storage: &mut St,
        transmitter: &mut Transmitter,
        sink: &S,
    ) -> Result<(), DumpError>
    where
        St: LogStorage<Reader = R>,
        S: TransportSink + ?Sized,
    {
        if self.is_active() {
            return Err(DumpError::AlreadyActive);
        }

        match storage.open_reader() {
            Ok(reader) => {
                self.session = Some(DumpSession {
                    reader,
                    last_send: None,
                    lines_sent: 0,
                });
                info!("Starting log dump");
                Ok(())
            }
            Err(err) => {
                warn!("Log file not found for dump: {:?}", err);
                let err = DumpError::LogNotFound;
                transmitter.send_control(sink, err.reply());
                Err(err)
            }
        }
    }

    /// Advance the dump by at most one line
    pub fn tick<S: TransportSink + ?Sized>(
        &mut self,
        now: Timestamp,
        transmitter: &mut Transmitter,
        sink: &S,
    ) -> DumpTick {
        let Some(session) = self.session.as_mut() else {
            return DumpTick::Inactive;
        };

        if !sink.is_connected() {
            self.abort();
            return DumpTick::Aborted;
        }

        if let Some(last) = session.last_send {
            if now.elapsed_since(last) < self.config.line_interval_ms {
                return DumpTick::Waiting;
            }
        }

        // The previous message has to be fully on the wire and its pacing
        // delay elapsed, so the line goes out on this tick's poll
        if !transmitter.is_ready(now) {
            return DumpTick::Waiting;
        }

        match session.reader.next_line() {
            Ok(Some(line)) => {
                session.last_send = Some(now);
                let line = line.trim();
                if line.is_empty() {
                    return DumpTick::BlankSkipped;
                }
                transmitter.send(sink, line);
                session.lines_sent += 1;
                DumpTick::LineSent
            }
            Ok(None) => {
                let lines_sent = session.lines_sent;
                self.session = None;
                transmitter.send_control(sink, ControlSentinel::DumpComplete);
                info!("Log dump completed: {} lines", lines_sent);
                DumpTick::Completed
            }
            Err(err) => {
                self.fail(err);
                transmitter.send_control(sink, ControlSentinel::error("Log read failed"));
                DumpTick::Failed
            }
        }
    }

    /// Close the session without a completion sentinel
    ///
    /// Returns whether a session was active.
    pub fn abort(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                info!("Dump aborted after {} lines", session.lines_sent);
                true
            }
            None => false,
        }
    }

    fn fail(&mut self, err: StorageError) {
        warn!("Log dump failed: {:?}", err);
        self.session = None;
        debug!("Dump session closed after read failure");
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
