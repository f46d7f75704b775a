//! Presence logger host console
//!
//! Runs the presence logger core on a host: a scheduler loop over
//! stdin/stdout with a file-backed log and a simulated radio, plus the
//! companion-side decoder for notification transcripts.

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod decode;
pub mod error;
pub mod runner;

pub use cli::{Cli, Commands};
pub use config::CliAppConfig;
pub use error::{CliError, Result};

// Re-export commonly used types
pub use presence_core::{PresenceApp, PresenceConfig, ProtocolConfig};
