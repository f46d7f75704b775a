//! Application state and the scheduler tick
//!
//! [`PresenceApp`] owns every piece of mutable state (connection flag, scan
//! timers, clock, transmit queue, dump session) and is driven from outside by
//! two entry points: [`PresenceApp::handle_event`] for asynchronous events and
//! [`PresenceApp::tick`] for one non-blocking scheduler iteration. Nothing is
//! global and nothing blocks.

use alloc::string::String;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::PresenceConfig;
use crate::dump::{DumpEngine, DumpTick};
use crate::errors::ConfigError;
use crate::logger::{LogLine, Logger};
use crate::observation::Observation;
use crate::platform::HeapMonitor;
use crate::scheduler::{BleScanTransition, Scanner, Scheduler};
use crate::storage::LogStorage;
use crate::transmitter::Transmitter;
use crate::transport::TransportSink;
use crate::types::Timestamp;

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

/// Asynchronous input delivered by the radio stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A peer connected and subscribed
    Connected,
    /// The peer went away
    Disconnected,
    /// One write on the command channel
    CommandReceived(String),
    /// A BLE advertisement seen by a running scan
    Observation(Observation),
}

/// What one scheduler tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub wifi_networks: usize,
    pub ble_scan: Option<BleScanTransition>,
    pub dump: DumpTick,
    pub frames_sent: usize,
    pub memory_checked: bool,
}

// ----------------------------------------------------------------------------
// Application
// ----------------------------------------------------------------------------

/// The presence logger
pub struct PresenceApp<St: LogStorage, H> {
    pub(crate) config: PresenceConfig,
    pub(crate) clock: Clock,
    pub(crate) transmitter: Transmitter,
    pub(crate) dump: DumpEngine<St::Reader>,
    pub(crate) logger: Logger<St>,
    pub(crate) heap: H,
    scheduler: Scheduler,
    pub(crate) connected: bool,
}

impl<St: LogStorage, H: HeapMonitor> PresenceApp<St, H> {
    /// Validate `config`, assemble the app and write the boot marker
    pub fn new(
        config: PresenceConfig,
        storage: St,
        heap: H,
        now: Timestamp,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut app = Self {
            clock: Clock::new(now),
            transmitter: Transmitter::new(config.protocol.clone()),
            dump: DumpEngine::new(config.dump.clone()),
            logger: Logger::new(storage),
            heap,
            scheduler: Scheduler::new(config.scheduler.clone(), now),
            connected: false,
            config,
        };

        let line = LogLine::started(&app.clock.timestamp(now));
        app.logger.append(&line);
        info!("Presence logger started");
        Ok(app)
    }

    /// Dispatch one asynchronous event
    ///
    /// A disconnection aborts any dump and drops the transmit queue before
    /// this returns, so no later step ever sees an orphaned session.
    pub fn handle_event<S: TransportSink + ?Sized>(&mut self, event: Event, now: Timestamp, sink: &S) {
        match event {
            Event::Connected => {
                if !self.connected {
                    self.connected = true;
                    info!("Peer connected");
                    let line = LogLine::connected(&self.clock.timestamp(now));
                    self.logger.append(&line);
                }
            }
            Event::Disconnected => {
                if self.dump.abort() {
                    debug!("Dump aborted by disconnection");
                }
                self.transmitter.reset();
                if self.connected {
                    self.connected = false;
                    info!("Peer disconnected");
                }
            }
            Event::CommandReceived(command) => {
                if command.is_empty() {
                    return;
                }
                self.execute_command(&command, now, sink);
            }
            Event::Observation(observation) => self.record(&observation, now, sink),
        }
    }

    /// One scheduler iteration
    ///
    /// Runs due scans, advances the dump by at most one line, drains due
    /// frames and emits the periodic memory report.
    pub fn tick<S, Sc>(&mut self, now: Timestamp, sink: &mut S, scanner: &mut Sc) -> TickReport
    where
        S: TransportSink + ?Sized,
        Sc: Scanner + ?Sized,
    {
        self.clock.update(now);

        let networks = self.scheduler.run_wifi_scan(now, scanner);
        for network in &networks {
            self.record(network, now, &*sink);
        }

        let ble_scan = self.scheduler.poll_ble_scan(now, scanner);
        let dump = self.dump.tick(now, &mut self.transmitter, &*sink);
        let frames_sent = self.transmitter.poll(sink, now);

        let memory_checked = self.scheduler.memory_check_due(now);
        if memory_checked {
            info!(
                "Heap: {} bytes, Connected: {}",
                self.heap.free_heap_bytes(),
                u8::from(self.connected)
            );
        }

        TickReport {
            wifi_networks: networks.len(),
            ble_scan,
            dump,
            frames_sent,
            memory_checked,
        }
    }

    fn record<S: TransportSink + ?Sized>(&mut self, observation: &Observation, now: Timestamp, sink: &S) {
        let timestamp = self.clock.timestamp(now);
        let line = LogLine::observation(&timestamp, observation, self.config.logger.identifier_hash_len);
        self.logger
            .log(&line, self.dump.is_active(), &mut self.transmitter, sink);
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_dumping(&self) -> bool {
        self.dump.is_active()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.transmitter
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn storage(&self) -> &St {
        self.logger.storage()
    }

    pub fn storage_mut(&mut self) -> &mut St {
        self.logger.storage_mut()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
