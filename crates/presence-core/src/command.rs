//! Inbound command parsing
//!
//! One write on the command channel carries one command. Surrounding
//! whitespace is ignored; keywords are case sensitive.

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use crate::clock::CivilTime;
use crate::errors::CommandError;

const SET_TIME_PREFIX: &str = "SET_TIME:";

/// A parsed control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stream the persisted log
    Dump,
    /// Report free heap and connection state
    Status,
    /// Remove the persisted log
    Clear,
    /// Report the current civil time
    GetTime,
    /// Set the civil time
    SetTime(CivilTime),
    /// Report the current civil time and sync state
    SyncTime,
    /// Anything else, trimmed
    Unknown(String),
}

impl Command {
    /// Parse one inbound command
    ///
    /// Only `SET_TIME:` can fail: its argument must be a valid
    /// `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let command = input.trim();
        match command {
            "DUMP" => Ok(Command::Dump),
            "STATUS" => Ok(Command::Status),
            "CLEAR" => Ok(Command::Clear),
            "TIME" => Ok(Command::GetTime),
            "SYNC_TIME" => Ok(Command::SyncTime),
            _ => match command.strip_prefix(SET_TIME_PREFIX) {
                Some(argument) => CivilTime::parse(argument.trim()).map(Command::SetTime),
                None => Ok(Command::Unknown(command.to_string())),
            },
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Dump => write!(f, "DUMP"),
            Command::Status => write!(f, "STATUS"),
            Command::Clear => write!(f, "CLEAR"),
            Command::GetTime => write!(f, "TIME"),
            Command::SetTime(time) => write!(f, "{SET_TIME_PREFIX}{time}"),
            Command::SyncTime => write!(f, "SYNC_TIME"),
            Command::Unknown(text) => write!(f, "{text}"),
        }
    }
}
