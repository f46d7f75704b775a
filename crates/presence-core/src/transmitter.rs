//! Paced notification transmitter
//!
//! Every outbound message (live log lines, command replies, dumped lines,
//! control sentinels) goes through one [`Transmitter`]. Messages wait in an
//! unbounded backlog; only the front message is fragmented and its frames are
//! delivered one by one from [`Transmitter::poll`], each respecting the
//! minimum spacing required after the previous frame. Frames of two messages
//! never interleave.

use alloc::collections::VecDeque;
use alloc::string::String;

use tracing::{debug, warn};

use crate::config::ProtocolConfig;
use crate::framing::fragment;
use crate::protocol::{ControlSentinel, Frame, FrameKind, TransferState};
use crate::transport::TransportSink;
use crate::types::Timestamp;

/// A message waiting for its turn on the transport
#[derive(Debug, Clone)]
enum Outbound {
    /// Fragmented as needed and paced per frame
    Message(String),
    /// Always a single unfragmented frame
    Control(ControlSentinel),
}

/// Counters kept by the transmitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitterStats {
    pub messages_queued: u64,
    pub messages_completed: u64,
    pub frames_sent: u64,
    /// Messages refused because no peer was connected
    pub dropped_disconnected: u64,
    /// Messages cut short by a delivery failure
    pub aborted: u64,
}

/// Serializes all outbound messages onto the transport
#[derive(Debug)]
pub struct Transmitter {
    config: ProtocolConfig,
    backlog: VecDeque<Outbound>,
    in_flight: VecDeque<Frame>,
    next_due: Option<Timestamp>,
    stats: TransmitterStats,
}

impl Transmitter {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            backlog: VecDeque::new(),
            in_flight: VecDeque::new(),
            next_due: None,
            stats: TransmitterStats::default(),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn stats(&self) -> TransmitterStats {
        self.stats
    }

    /// Queue a message for paced, fragmenting delivery
    ///
    /// Returns `false` only when no peer is connected; nothing is buffered
    /// across disconnections. While connected the backlog grows as needed,
    /// so every message reaches the transport in order.
    pub fn send<S: TransportSink + ?Sized>(&mut self, sink: &S, message: &str) -> bool {
        self.enqueue(sink, Outbound::Message(message.into()))
    }

    /// Queue a control sentinel as a single unfragmented frame
    pub fn send_control<S: TransportSink + ?Sized>(
        &mut self,
        sink: &S,
        sentinel: ControlSentinel,
    ) -> bool {
        self.enqueue(sink, Outbound::Control(sentinel))
    }

    fn enqueue<S: TransportSink + ?Sized>(&mut self, sink: &S, outbound: Outbound) -> bool {
        if !sink.is_connected() {
            self.stats.dropped_disconnected += 1;
            debug!("Peer not connected, dropping outbound message");
            return false;
        }

        self.backlog.push_back(outbound);
        self.stats.messages_queued += 1;
        true
    }

    /// Deliver frames that are due, at most `max_frames_per_poll` of them
    ///
    /// Returns the number of frames handed to the transport. A delivery
    /// failure abandons the rest of the current message; the next queued
    /// message starts on a later poll.
    pub fn poll<S: TransportSink + ?Sized>(&mut self, sink: &mut S, now: Timestamp) -> usize {
        if !sink.is_connected() {
            if !self.is_idle() {
                debug!("Peer gone, discarding pending transmissions");
                self.reset();
            }
            return 0;
        }

        let mut delivered = 0;
        while delivered < self.config.max_frames_per_poll {
            if matches!(self.next_due, Some(due) if now < due) {
                break;
            }
            if self.in_flight.is_empty() && !self.load_next() {
                break;
            }
            let Some(frame) = self.in_flight.pop_front() else {
                break;
            };

            if let Err(err) = sink.notify(&frame.payload()) {
                warn!("Notification failed, abandoning message: {:?}", err);
                self.stats.aborted += 1;
                self.in_flight.clear();
                break;
            }

            delivered += 1;
            self.stats.frames_sent += 1;
            self.next_due = Some(now.saturating_add(self.delay_after(frame.kind())));
            debug!(
                "Sent {} frame, {} left in message",
                frame.kind(),
                self.in_flight.len()
            );

            if self.in_flight.is_empty() {
                self.stats.messages_completed += 1;
            }
        }
        delivered
    }

    /// Fragment the next backlog entry into the in-flight slot
    fn load_next(&mut self) -> bool {
        let Some(outbound) = self.backlog.pop_front() else {
            return false;
        };
        match outbound {
            Outbound::Message(message) => {
                let frames = fragment(&message, self.config.max_chunk_size);
                debug!(
                    "Sending message: {} bytes in {} frame(s)",
                    message.len(),
                    frames.len()
                );
                self.in_flight.extend(frames);
            }
            Outbound::Control(sentinel) => {
                let sentinel = self.bounded(sentinel);
                self.in_flight.push_back(Frame::Control(sentinel));
            }
        }
        true
    }

    /// Clamp an error sentinel so it still fits one notification
    fn bounded(&self, sentinel: ControlSentinel) -> ControlSentinel {
        match sentinel {
            ControlSentinel::Error(mut message) => {
                let budget = self.config.max_chunk_size.saturating_sub("ERROR: ".len());
                if message.len() > budget {
                    let mut cut = budget;
                    while !message.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    message.truncate(cut);
                }
                ControlSentinel::Error(message)
            }
            other => other,
        }
    }

    fn delay_after(&self, kind: FrameKind) -> u64 {
        match kind {
            FrameKind::Plain | FrameKind::Control => self.config.plain_delay_ms,
            FrameKind::Header => self.config.header_delay_ms,
            FrameKind::Chunk => self.config.chunk_delay_ms,
            FrameKind::Terminator => self.config.terminator_delay_ms,
        }
    }

    /// Progress of the message currently on the wire
    pub fn state(&self) -> TransferState {
        if self.in_flight.is_empty() {
            TransferState::Idle
        } else {
            TransferState::Sending {
                remaining_chunks: self
                    .in_flight
                    .iter()
                    .filter(|frame| frame.kind() == FrameKind::Chunk)
                    .count(),
            }
        }
    }

    /// No message in flight and nothing waiting
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.backlog.is_empty()
    }

    /// Idle, and the pacing delay after the last frame has elapsed
    pub fn is_ready(&self, now: Timestamp) -> bool {
        self.is_idle() && !matches!(self.next_due, Some(due) if now < due)
    }

    /// Messages waiting behind the one in flight
    pub fn queued(&self) -> usize {
        self.backlog.len()
    }

    /// Drop everything pending; used when the peer disconnects
    pub fn reset(&mut self) {
        self.backlog.clear();
        self.in_flight.clear();
        self.next_due = None;
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingSink;
    use alloc::vec::Vec;

    fn paced() -> Transmitter {
        Transmitter::new(ProtocolConfig::default().with_max_chunk_size(10))
    }

    /// Poll every millisecond until idle, recording when each frame left
    fn drain(tx: &mut Transmitter, sink: &mut RecordingSink, start: u64) -> Vec<u64> {
        let mut times = Vec::new();
        let mut now = start;
        while !tx.is_idle() && now < start + 10_000 {
            let before = sink.len();
            tx.poll(sink, Timestamp::new(now));
            for _ in before..sink.len() {
                times.push(now);
            }
            now += 1;
        }
        times
    }

    #[test]
    fn test_disconnected_send_is_dropped() {
        let mut tx = paced();
        let sink = RecordingSink::disconnected();
        assert!(!tx.send(&sink, "hello"));
        assert!(tx.is_idle());
        assert_eq!(tx.stats().dropped_disconnected, 1);
    }

    #[test]
    fn test_plain_message_single_frame() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        assert!(tx.send(&sink, "short"));
        assert_eq!(tx.poll(&mut sink, Timestamp::new(0)), 1);
        assert_eq!(sink.texts(), alloc::vec!["short"]);
        assert_eq!(tx.state(), TransferState::Idle);
    }

    #[test]
    fn test_fragmented_message_pacing() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        tx.send(&sink, "0123456789abcdefghijXYZ");

        let times = drain(&mut tx, &mut sink, 0);
        assert_eq!(
            sink.texts(),
            alloc::vec!["START:3", "0123456789", "abcdefghij", "XYZ", "END"]
        );
        // header 75ms, then 100ms between chunks
        assert_eq!(times, alloc::vec![0, 75, 175, 275, 375]);
    }

    #[test]
    fn test_messages_never_interleave() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        tx.send(&sink, "first message is long");
        tx.send(&sink, "second");

        drain(&mut tx, &mut sink, 0);
        assert_eq!(
            sink.texts(),
            alloc::vec!["START:3", "first mess", "age is lon", "g", "END", "second"]
        );
    }

    #[test]
    fn test_state_tracks_remaining_chunks() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        tx.send(&sink, "0123456789abcdefghij");

        tx.poll(&mut sink, Timestamp::new(0)); // header
        assert_eq!(tx.state(), TransferState::Sending { remaining_chunks: 2 });
        tx.poll(&mut sink, Timestamp::new(75)); // first chunk
        assert_eq!(tx.state(), TransferState::Sending { remaining_chunks: 1 });
    }

    #[test]
    fn test_delivery_failure_aborts_message() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        sink.fail_after(2);
        tx.send(&sink, "0123456789abcdefghijXYZ");

        drain(&mut tx, &mut sink, 0);
        assert_eq!(sink.texts(), alloc::vec!["START:3", "0123456789"]);
        assert_eq!(tx.state(), TransferState::Idle);
        assert_eq!(tx.stats().aborted, 1);
    }

    #[test]
    fn test_ready_after_pacing_delay() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        assert!(tx.is_ready(Timestamp::ZERO));

        tx.send(&sink, "short");
        assert!(!tx.is_ready(Timestamp::ZERO));
        tx.poll(&mut sink, Timestamp::ZERO);
        assert!(tx.is_idle());
        assert!(!tx.is_ready(Timestamp::new(49)));
        assert!(tx.is_ready(Timestamp::new(50)));
    }

    #[test]
    fn test_burst_is_delivered_in_order() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        let burst: Vec<String> = (0..100).map(|i| alloc::format!("line {i}")).collect();
        for line in &burst {
            assert!(tx.send(&sink, line));
        }
        tx.send_control(&sink, ControlSentinel::DumpStart);
        assert_eq!(tx.queued(), 101);

        drain(&mut tx, &mut sink, 0);
        let texts = sink.texts();
        assert_eq!(texts.len(), 101);
        assert_eq!(&texts[..100], burst.as_slice());
        assert_eq!(texts[100], "DUMP_START");
        assert_eq!(tx.stats().messages_completed, 101);
    }

    #[test]
    fn test_disconnect_discards_pending() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        tx.send(&sink, "0123456789abcdefghij");
        tx.poll(&mut sink, Timestamp::new(0));

        sink.set_connected(false);
        assert_eq!(tx.poll(&mut sink, Timestamp::new(100)), 0);
        assert!(tx.is_idle());
    }

    #[test]
    fn test_control_sentinel_is_never_fragmented() {
        let mut tx = paced();
        let mut sink = RecordingSink::connected();
        tx.send_control(&sink, ControlSentinel::DumpComplete);
        tx.send_control(&sink, ControlSentinel::error("Unknown command: abcdefghijkl"));

        drain(&mut tx, &mut sink, 0);
        // 10 byte budget leaves "ERROR: " plus three bytes of message
        assert_eq!(sink.texts(), alloc::vec!["DUMP_COMPLETE", "ERROR: Unk"]);
    }
}
