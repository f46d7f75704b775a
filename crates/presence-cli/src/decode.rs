//! Companion-side transcript decoding
//!
//! A transcript holds one raw notification payload per line, as written by
//! the console sink. Decoding feeds every payload through the reassembler
//! and classifies the resulting messages.

use std::io::{BufRead, Write};

use serde::Serialize;
use tracing::warn;

use presence_core::{ControlSentinel, FrameReassembler, ReceivedMessage};

use crate::error::Result;

/// Classification of a decoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Log line or command reply
    Text,
    /// Looks like a reserved status token
    Control,
    /// Fragmented message whose chunk count did not match its header
    Incomplete,
}

/// One message rebuilt from the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedMessage {
    pub kind: MessageKind,
    pub text: String,
}

/// Reassemble every message in a transcript
///
/// A fragmented message still open at the end of the transcript is reported
/// and dropped.
pub fn decode_transcript<R: BufRead>(reader: R) -> Result<Vec<DecodedMessage>> {
    let mut reassembler = FrameReassembler::new();
    let mut messages = Vec::new();

    for payload in reader.split(b'\n') {
        let mut payload = payload?;
        if payload.last() == Some(&b'\r') {
            payload.pop();
        }

        let Some(message) = reassembler.push(&payload) else {
            continue;
        };
        messages.push(match message {
            ReceivedMessage::Complete(text) => {
                let kind = if ControlSentinel::recognize(&text).is_some() {
                    MessageKind::Control
                } else {
                    MessageKind::Text
                };
                DecodedMessage { kind, text }
            }
            ReceivedMessage::Mismatched {
                expected,
                received,
                partial,
            } => {
                warn!("Chunk count mismatch: expected {}, received {}", expected, received);
                DecodedMessage {
                    kind: MessageKind::Incomplete,
                    text: partial,
                }
            }
        });
    }

    if reassembler.in_progress() {
        warn!("Transcript ended inside a fragmented message");
    }
    Ok(messages)
}

/// Write decoded messages as plain lines or JSON lines
pub fn write_messages<W: Write>(out: &mut W, messages: &[DecodedMessage], json: bool) -> Result<()> {
    for message in messages {
        if json {
            serde_json::to_writer(&mut *out, message)?;
            writeln!(out)?;
        } else {
            match message.kind {
                MessageKind::Text => writeln!(out, "{}", message.text)?,
                MessageKind::Control => writeln!(out, "[{}]", message.text)?,
                MessageKind::Incomplete => writeln!(out, "[incomplete] {}", message.text)?,
            }
        }
    }
    Ok(())
}
