//! Command interpreter
//!
//! Maps each parsed [`Command`] onto transmitter, dump engine, clock and
//! storage operations. Informational replies take the paced fragmenting
//! path; status tokens and short errors go out as control sentinels.

use alloc::format;

use tracing::{debug, info, warn};

use crate::app::PresenceApp;
use crate::command::Command;
use crate::errors::DumpError;
use crate::logger::LogLine;
use crate::platform::HeapMonitor;
use crate::protocol::ControlSentinel;
use crate::storage::LogStorage;
use crate::transport::TransportSink;
use crate::types::Timestamp;

impl<St: LogStorage, H: HeapMonitor> PresenceApp<St, H> {
    /// Parse and execute one inbound command
    pub fn execute_command<S: TransportSink + ?Sized>(&mut self, input: &str, now: Timestamp, sink: &S) {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(err) => {
                warn!("Rejected command {:?}: {:?}", input.trim(), err);
                self.transmitter.send(sink, err.reply());
                return;
            }
        };
        info!("Received command: {}", command);

        match command {
            Command::Dump => self.start_dump(sink),
            Command::Status => {
                let status = format!(
                    "STATUS: Heap={}, Connected={}",
                    self.heap.free_heap_bytes(),
                    u8::from(self.connected)
                );
                self.transmitter.send(sink, &status);
            }
            Command::Clear => self.clear_log(now, sink),
            Command::GetTime => {
                let reply = format!("Current time: {}", self.clock.timestamp(now));
                self.transmitter.send(sink, &reply);
            }
            Command::SetTime(time) => {
                self.clock.set(time, now);
                info!("Time set to: {}", time);
                let reply = format!("Time set successfully to: {}", self.clock.timestamp(now));
                self.transmitter.send(sink, &reply);
            }
            Command::SyncTime => {
                let reply = format!("Current time: {} (Synced: No)", self.clock.timestamp(now));
                self.transmitter.send(sink, &reply);
            }
            Command::Unknown(text) => {
                self.transmitter
                    .send_control(sink, ControlSentinel::error(format!("Unknown command: {text}")));
            }
        }
    }

    fn start_dump<S: TransportSink + ?Sized>(&mut self, sink: &S) {
        if self.dump.is_active() {
            self.transmitter
                .send_control(sink, DumpError::AlreadyActive.reply());
            return;
        }

        self.transmitter.send_control(sink, ControlSentinel::DumpStart);
        match self
            .dump
            .start(self.logger.storage_mut(), &mut self.transmitter, sink)
        {
            Ok(()) => {}
            // The engine has already queued the error sentinel
            Err(DumpError::LogNotFound) => debug!("Dump requested without a log"),
            Err(err @ DumpError::AlreadyActive) => {
                self.transmitter.send_control(sink, err.reply());
            }
        }
    }

    fn clear_log<S: TransportSink + ?Sized>(&mut self, now: Timestamp, sink: &S) {
        if !self.logger.storage().exists() {
            return;
        }
        if self.dump.abort() {
            info!("Dump aborted by CLEAR");
        }

        match self.logger.storage_mut().remove() {
            Ok(true) => {
                self.transmitter.send_control(sink, ControlSentinel::LogCleared);
                let line = LogLine::cleared(&self.clock.timestamp(now));
                self.logger.append(&line);
            }
            Ok(false) => {}
            Err(err) => warn!("Failed to clear log: {:?}", err),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::app::{Event, PresenceApp};
    use crate::config::{PresenceConfig, ProtocolConfig};
    use crate::platform::FixedHeapMonitor;
    use crate::storage::{LogStorage, MemoryLogStorage};
    use crate::transport::RecordingSink;
    use crate::types::Timestamp;
    use alloc::string::String;
    use alloc::vec::Vec;

    struct Rig {
        app: PresenceApp<MemoryLogStorage, FixedHeapMonitor>,
        sink: RecordingSink,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_config(PresenceConfig::testing())
        }

        fn with_config(config: PresenceConfig) -> Self {
            let app = PresenceApp::new(
                config,
                MemoryLogStorage::new(),
                FixedHeapMonitor(4321),
                Timestamp::ZERO,
            )
            .unwrap();
            let sink = RecordingSink::connected();
            let mut rig = Self { app, sink };
            rig.app.handle_event(Event::Connected, Timestamp::ZERO, &rig.sink);
            rig
        }

        /// Send a command and flush every resulting frame
        fn command(&mut self, text: &str, now: u64) -> Vec<String> {
            let now = Timestamp::new(now);
            self.app
                .handle_event(Event::CommandReceived(text.into()), now, &self.sink);
            while self.app.transmitter.poll(&mut self.sink, now) > 0 {}
            self.sink.take().into_iter().map(|p| String::from_utf8(p).unwrap()).collect()
        }
    }

    #[test]
    fn test_status_reply() {
        let mut rig = Rig::new();
        assert_eq!(rig.command("STATUS", 0), ["STATUS: Heap=4321, Connected=1"]);
    }

    #[test]
    fn test_time_replies() {
        let mut rig = Rig::new();
        assert_eq!(rig.command("TIME", 3_000), ["Current time: 2024-08-30 12:00:03"]);
        assert_eq!(
            rig.command("SYNC_TIME", 3_000),
            ["Current time: 2024-08-30 12:00:03 (Synced: No)"]
        );
    }

    #[test]
    fn test_set_time_then_time() {
        let mut rig = Rig::new();
        assert_eq!(
            rig.command("SET_TIME:2024-08-30 15:30:00", 500),
            ["Time set successfully to: 2024-08-30 15:30:00"]
        );
        assert_eq!(rig.command("TIME", 2_600), ["Current time: 2024-08-30 15:30:02"]);
    }

    #[test]
    fn test_set_time_rejections_leave_clock_alone() {
        let mut rig = Rig::new();
        let before = rig.app.clock().civil();
        assert_eq!(
            rig.command("SET_TIME:2024-13-40 99:99:99", 0),
            ["ERROR: Invalid time values"]
        );
        assert_eq!(
            rig.command("SET_TIME:yesterday", 0),
            ["ERROR: Time format should be YYYY-MM-DD HH:MM:SS"]
        );
        assert_eq!(rig.app.clock().civil(), before);
    }

    #[test]
    fn test_unknown_command() {
        let mut rig = Rig::new();
        assert_eq!(rig.command(" REBOOT ", 0), ["ERROR: Unknown command: REBOOT"]);
    }

    #[test]
    fn test_unknown_command_is_single_frame() {
        let protocol = ProtocolConfig::unpaced().with_max_chunk_size(20);
        let mut rig = Rig::with_config(PresenceConfig::testing().with_protocol(protocol));
        assert_eq!(
            rig.command("A VERY LONG UNKNOWN COMMAND", 0),
            ["ERROR: Unknown comma"]
        );
    }

    #[test]
    fn test_empty_write_is_ignored() {
        let mut rig = Rig::new();
        assert!(rig.command("", 0).is_empty());
    }

    #[test]
    fn test_clear_existing_log() {
        let mut rig = Rig::new();
        assert_eq!(rig.command("CLEAR", 1_000), ["LOG_CLEARED"]);

        let lines: Vec<&str> = rig.app.storage().lines().collect();
        assert_eq!(lines, ["=== Log cleared at 2024-08-30 12:00:01 ==="]);
    }

    #[test]
    fn test_clear_without_log_is_silent() {
        let mut rig = Rig::new();
        rig.app.storage_mut().remove().unwrap();
        assert!(rig.command("CLEAR", 0).is_empty());
        assert!(!rig.app.storage().exists());
    }

    #[test]
    fn test_dump_without_log() {
        let mut rig = Rig::new();
        rig.app.storage_mut().remove().unwrap();
        assert_eq!(
            rig.command("DUMP", 0),
            ["DUMP_START", "ERROR: Log file not found"]
        );
        assert!(!rig.app.is_dumping());
    }

    #[test]
    fn test_dump_twice_is_rejected() {
        let mut rig = Rig::new();
        assert_eq!(rig.command("DUMP", 0), ["DUMP_START"]);
        assert!(rig.app.is_dumping());
        assert_eq!(rig.command("DUMP", 0), ["ERROR: Dump already in progress"]);
        assert!(rig.app.is_dumping());
    }
}
