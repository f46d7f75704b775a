//! Message fragmentation and reassembly
//!
//! `fragment` is the sending side: a pure function from a message to the
//! frame sequence that carries it. [`FrameReassembler`] is the companion
//! application's side, rebuilding messages from the notification stream.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp;

use tracing::warn;

use crate::protocol::{Frame, HEADER_PREFIX, TERMINATOR};

// ----------------------------------------------------------------------------
// Fragmenter
// ----------------------------------------------------------------------------

/// Number of chunks a message of `len` bytes needs
pub fn chunk_count(len: usize, max_chunk_size: usize) -> usize {
    len.div_ceil(cmp::max(max_chunk_size, 1))
}

/// Split a message into frames of at most `max_chunk_size` payload bytes
///
/// Messages that fit yield a single `Plain` frame, including the empty
/// message. Longer ones yield `Header(N)`, N chunks, then `Terminator`.
/// Chunks are cut on byte boundaries.
pub fn fragment(message: &str, max_chunk_size: usize) -> Vec<Frame> {
    let max_chunk_size = cmp::max(max_chunk_size, 1);
    let data = message.as_bytes();

    if data.len() <= max_chunk_size {
        return alloc::vec![Frame::Plain(data.to_vec())];
    }

    let total_chunks = chunk_count(data.len(), max_chunk_size);
    let mut frames = Vec::with_capacity(total_chunks + 2);
    frames.push(Frame::Header(total_chunks));
    frames.extend(
        data.chunks(max_chunk_size)
            .map(|chunk| Frame::Chunk(chunk.to_vec())),
    );
    frames.push(Frame::Terminator);
    frames
}

// ----------------------------------------------------------------------------
// Reassembler
// ----------------------------------------------------------------------------

/// A message rebuilt from the notification stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedMessage {
    /// A complete message
    Complete(String),
    /// `END` arrived but the chunk count did not match the header
    Mismatched {
        expected: usize,
        received: usize,
        partial: String,
    },
}

/// State of a fragmented message being received
#[derive(Debug)]
struct Pending {
    expected_chunks: usize,
    received_chunks: usize,
    buffer: Vec<u8>,
}

/// Rebuilds messages from notification payloads in arrival order
#[derive(Debug, Default)]
pub struct FrameReassembler {
    pending: Option<Pending>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a fragmented message is open
    pub fn in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one notification payload, yielding a message when one completes
    pub fn push(&mut self, payload: &[u8]) -> Option<ReceivedMessage> {
        if let Some(expected_chunks) = parse_header(payload) {
            if let Some(dropped) = self.pending.take() {
                warn!(
                    "Discarding partial message: {}/{} chunks before new header",
                    dropped.received_chunks, dropped.expected_chunks
                );
            }
            self.pending = Some(Pending {
                expected_chunks,
                received_chunks: 0,
                buffer: Vec::new(),
            });
            return None;
        }

        match self.pending.take() {
            None => Some(ReceivedMessage::Complete(
                String::from_utf8_lossy(payload).into_owned(),
            )),
            Some(pending) if payload == TERMINATOR.as_bytes() => {
                let text = String::from_utf8_lossy(&pending.buffer).into_owned();
                if pending.received_chunks == pending.expected_chunks {
                    Some(ReceivedMessage::Complete(text))
                } else {
                    Some(ReceivedMessage::Mismatched {
                        expected: pending.expected_chunks,
                        received: pending.received_chunks,
                        partial: text,
                    })
                }
            }
            Some(mut pending) => {
                pending.buffer.extend_from_slice(payload);
                pending.received_chunks += 1;
                self.pending = Some(pending);
                None
            }
        }
    }

    /// Drop any partially received message, e.g. after a disconnect
    pub fn reset(&mut self) {
        self.pending = None;
    }
}

fn parse_header(payload: &[u8]) -> Option<usize> {
    let digits = payload.strip_prefix(HEADER_PREFIX.as_bytes())?;
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    core::str::from_utf8(digits).ok()?.parse().ok()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
