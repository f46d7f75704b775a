//! Scheduler loop for the host console
//!
//! The loop runs on a current-thread runtime and multiplexes two sources:
//! stdin lines (commands and console directives) and the scheduler tick.
//! Each tick is one non-blocking [`PresenceApp::tick`].

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use presence_core::{
    Event, FileLogStorage, FixedHeapMonitor, PresenceApp, SystemTimeSource, TickReport,
    TimeSource, Timestamp,
};

use crate::config::CliAppConfig;
use crate::console::{ConsoleInput, ConsoleSink, SimulatedScanner};
use crate::error::Result;

/// Options of the `run` subcommand
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub connected: bool,
    pub duration_ms: Option<u64>,
    pub scanning: bool,
}

/// The app wired to console stand-ins for its hardware
pub struct Console<W: Write> {
    app: PresenceApp<FileLogStorage, FixedHeapMonitor>,
    sink: ConsoleSink<W>,
    scanner: SimulatedScanner,
}

impl<W: Write> Console<W> {
    pub fn new(config: &CliAppConfig, out: W, now: Timestamp, scanning: bool) -> Result<Self> {
        let storage = FileLogStorage::new(config.console.log_path.clone());
        let app = PresenceApp::new(
            config.presence.clone(),
            storage,
            FixedHeapMonitor(config.console.heap_bytes),
            now,
        )?;
        let scanner = if scanning {
            SimulatedScanner::new(config.console.simulated_networks, config.console.simulated_devices)
        } else {
            SimulatedScanner::disabled()
        };

        Ok(Self {
            app,
            sink: ConsoleSink::new(out, config.console.max_payload_bytes),
            scanner,
        })
    }

    /// Apply one console line; returns `false` when the console should exit
    pub fn handle_input(&mut self, input: ConsoleInput, now: Timestamp) -> bool {
        match input {
            ConsoleInput::Connect => {
                self.sink.set_connected(true);
                self.app.handle_event(Event::Connected, now, &self.sink);
            }
            ConsoleInput::Disconnect => {
                self.sink.set_connected(false);
                self.app.handle_event(Event::Disconnected, now, &self.sink);
            }
            ConsoleInput::Quit => return false,
            ConsoleInput::Command(command) => {
                if !self.app.is_connected() {
                    debug!("No peer connected, replies will be dropped");
                }
                self.app
                    .handle_event(Event::CommandReceived(command), now, &self.sink);
            }
        }
        true
    }

    /// One scheduler iteration, delivering at most one BLE result first
    pub fn step(&mut self, now: Timestamp) -> TickReport {
        if let Some(observation) = self.scanner.take_ble_results() {
            self.app
                .handle_event(Event::Observation(observation), now, &self.sink);
        }
        self.app.tick(now, &mut self.sink, &mut self.scanner)
    }

    /// No dump running and nothing left to transmit
    pub fn is_settled(&self) -> bool {
        !self.app.is_dumping() && self.app.transmitter().is_idle()
    }

    pub fn app(&self) -> &PresenceApp<FileLogStorage, FixedHeapMonitor> {
        &self.app
    }

    pub fn output(&self) -> &W {
        self.sink.get_ref()
    }
}

/// Run the console until `:quit`, the duration limit, or stdin closing
///
/// When stdin closes without a duration limit, the loop keeps ticking until
/// any dump has completed and the transmit queue is drained.
pub async fn run(config: CliAppConfig, options: RunOptions) -> Result<()> {
    let time = SystemTimeSource::new();
    let mut console = Console::new(&config, std::io::stdout(), time.now(), options.scanning)?;
    if options.connected {
        console.handle_input(ConsoleInput::Connect, time.now());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(
        config.presence.scheduler.tick_delay_ms,
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stdin_open = true;

    info!(
        "Presence logger running, log at {}",
        config.console.log_path.display()
    );

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        if !console.handle_input(ConsoleInput::parse(&line), time.now()) {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                }
            }
            _ = ticker.tick() => {
                let now = time.now();
                console.step(now);
                match options.duration_ms {
                    Some(limit) if now.as_millis() >= limit => break,
                    None if !stdin_open && console.is_settled() => break,
                    _ => {}
                }
            }
        }
    }

    let stats = console.app().transmitter().stats();
    info!(
        "Presence logger stopped: {} messages, {} frames sent",
        stats.messages_completed, stats.frames_sent
    );
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
