//! Notification protocol types
//!
//! A logical message reaches the peer either as a single `Plain` frame or as
//! `START:<N>`, N raw chunk payloads, then `END`. The transport has no
//! message boundaries of its own and chunks carry no sequence number, so the
//! receiver depends on in-order, lossless delivery.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Prefix of the header frame announcing a fragmented message
pub const HEADER_PREFIX: &str = "START:";

/// Literal payload closing a fragmented message
pub const TERMINATOR: &str = "END";

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One transmissible unit of the framing protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Whole message that fits in a single notification
    Plain(Vec<u8>),
    /// Announces how many chunk frames follow
    Header(usize),
    /// Ordered slice of a fragmented message
    Chunk(Vec<u8>),
    /// Closes a fragmented message
    Terminator,
    /// Reserved status token, sent exactly like a `Plain` frame
    Control(ControlSentinel),
}

/// Frame discriminant, used for pacing decisions and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Plain,
    Header,
    Chunk,
    Terminator,
    Control,
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Plain(_) => FrameKind::Plain,
            Frame::Header(_) => FrameKind::Header,
            Frame::Chunk(_) => FrameKind::Chunk,
            Frame::Terminator => FrameKind::Terminator,
            Frame::Control(_) => FrameKind::Control,
        }
    }

    /// Bytes handed to the transport for this frame
    pub fn payload(&self) -> Cow<'_, [u8]> {
        match self {
            Frame::Plain(data) | Frame::Chunk(data) => Cow::Borrowed(data.as_slice()),
            Frame::Header(total) => Cow::Owned(alloc::format!("{HEADER_PREFIX}{total}").into_bytes()),
            Frame::Terminator => Cow::Borrowed(TERMINATOR.as_bytes()),
            Frame::Control(sentinel) => Cow::Owned(sentinel.text().into_owned().into_bytes()),
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Plain => write!(f, "plain"),
            FrameKind::Header => write!(f, "header"),
            FrameKind::Chunk => write!(f, "chunk"),
            FrameKind::Terminator => write!(f, "terminator"),
            FrameKind::Control => write!(f, "control"),
        }
    }
}

// ----------------------------------------------------------------------------
// Control Sentinels
// ----------------------------------------------------------------------------

/// Out-of-band status tokens
///
/// These travel as ordinary plain notifications. A receiver cannot tell
/// `ERROR: ...` apart from a short log line that happens to start with the
/// same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSentinel {
    DumpStart,
    DumpComplete,
    LogCleared,
    Error(String),
}

impl ControlSentinel {
    /// Create an error sentinel; the `ERROR: ` prefix is added on the wire
    pub fn error<T: Into<String>>(message: T) -> Self {
        ControlSentinel::Error(message.into())
    }

    /// Wire text of this sentinel
    pub fn text(&self) -> Cow<'static, str> {
        match self {
            ControlSentinel::DumpStart => Cow::Borrowed("DUMP_START"),
            ControlSentinel::DumpComplete => Cow::Borrowed("DUMP_COMPLETE"),
            ControlSentinel::LogCleared => Cow::Borrowed("LOG_CLEARED"),
            ControlSentinel::Error(message) => Cow::Owned(alloc::format!("ERROR: {message}")),
        }
    }

    /// Best-effort classification of a received plain message
    pub fn recognize(text: &str) -> Option<Self> {
        match text {
            "DUMP_START" => Some(ControlSentinel::DumpStart),
            "DUMP_COMPLETE" => Some(ControlSentinel::DumpComplete),
            "LOG_CLEARED" => Some(ControlSentinel::LogCleared),
            _ => text
                .strip_prefix("ERROR: ")
                .map(|message| ControlSentinel::Error(message.into())),
        }
    }
}

impl fmt::Display for ControlSentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ----------------------------------------------------------------------------
// Transfer State
// ----------------------------------------------------------------------------

/// Progress of the message currently owned by the transmitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    /// `remaining_chunks` counts chunk frames not yet delivered
    Sending { remaining_chunks: usize },
}

impl TransferState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TransferState::Idle)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
