//! Connection session
//! This module owns the scan → select → connect → explore → unlock →
//! disconnect → rescan lifecycle. It is the only place that mutates the
//! device registry and the connection state; everything else reaches it
//! through `SessionEvent`s.

use std::io::Write;

use anyhow::Result;
use log::{debug, error, info, warn};
use tokio::time::{MissedTickBehavior, interval, sleep};

use crate::config::session_config::SessionConfig;
use crate::core::bluetooth::console::{self, INVALID_SELECTION_MESSAGE};
use crate::core::bluetooth::control::ControlRegisterWriter;
use crate::core::bluetooth::error::BridgeError;
use crate::core::bluetooth::events::{EventReceiver, SessionEvent, SightingEvent};
use crate::core::bluetooth::explorer::ServiceExplorer;
use crate::core::bluetooth::gatt::{Central, Peripheral};
use crate::core::bluetooth::registry::{DiscoveryRegistry, RankedList};
use crate::core::bluetooth::types::{ConnectionState, DiscoveredDevice};

/// Drives one central through the connection lifecycle.
pub struct ConnectionSession<C: Central, W: Write> {
    /// Wireless stack
    central: C,
    config: SessionConfig,
    /// Devices seen during the current scan cycle
    registry: DiscoveryRegistry<C::Peripheral>,
    /// The list the operator was last shown
    displayed: RankedList,
    state: ConnectionState,
    /// Id of the current scan cycle; events from older cycles are dropped
    scan_id: u64,
    /// Device selected by the operator, owned for the life of the connection
    active: Option<DiscoveredDevice<C::Peripheral>>,
    explorer: ServiceExplorer,
    control_writer: ControlRegisterWriter,
    /// Operator console output
    console: W,
}

impl<C: Central, W: Write> ConnectionSession<C, W> {
    pub fn new(central: C, config: SessionConfig, console: W) -> Self {
        Self {
            central,
            config,
            registry: DiscoveryRegistry::new(),
            displayed: RankedList::new(),
            state: ConnectionState::Idle,
            scan_id: 0,
            active: None,
            explorer: ServiceExplorer::new(),
            control_writer: ControlRegisterWriter::new(),
            console,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn scan_id(&self) -> u64 {
        self.scan_id
    }

    pub fn registry(&self) -> &DiscoveryRegistry<C::Peripheral> {
        &self.registry
    }

    pub fn active_device(&self) -> Option<&DiscoveredDevice<C::Peripheral>> {
        self.active.as_ref()
    }

    pub fn central(&self) -> &C {
        &self.central
    }

    pub fn console(&self) -> &W {
        &self.console
    }

    /// Leaves `Idle` by starting the first scan.
    pub async fn start(&mut self) {
        if self.state != ConnectionState::Idle {
            warn!("Session already started ({})", self.state);
            return;
        }
        self.begin_scan().await;
    }

    /// Runs the session loop until the event queue closes.
    ///
    /// Events are applied one at a time in arrival order. Between events the
    /// loop wakes on a fixed period to check that a connected device is still there.
    pub async fn run(&mut self, mut events: EventReceiver<C::Peripheral>) -> Result<()> {
        let mut poll = interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await?,
                    None => {
                        info!("Event queue closed, stopping session.");
                        return Ok(());
                    }
                },
                _ = poll.tick() => self.check_connection().await,
            }
        }
    }

    /// Applies a single event to the session.
    pub async fn handle_event(&mut self, event: SessionEvent<C::Peripheral>) -> Result<()> {
        match event {
            SessionEvent::Sighting(sighting) => self.on_sighting(sighting),
            SessionEvent::ScanComplete { scan_id } => self.on_scan_complete(scan_id).await?,
            SessionEvent::Connected { address } => info!("Connected to device {}", address),
            SessionEvent::Disconnected { address } => self.on_disconnected(&address).await,
            SessionEvent::OperatorInput(line) => self.on_operator_input(&line).await?,
        }
        Ok(())
    }

    /// Tears the connection down if the device dropped without an event.
    pub async fn check_connection(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }
        let Some(device) = self.active.as_ref() else {
            return;
        };
        if device.handle.is_connected().await {
            return;
        }
        let address = device.address.clone();
        self.teardown(BridgeError::UnexpectedDisconnect(address)).await;
    }

    /// Clears the registry and starts a new scan cycle.
    /// A stack that refuses to scan is retried after the rescan delay.
    async fn begin_scan(&mut self) {
        self.registry.reset();
        self.displayed.clear();
        self.state = ConnectionState::Scanning;

        loop {
            self.scan_id += 1;
            info!(
                "Starting BLE scan for devices with prefix: {}...",
                self.config.name_prefix
            );
            match self
                .central
                .start_scan(self.scan_id, self.config.scan_duration())
                .await
            {
                Ok(()) => return,
                Err(e) => {
                    error!("Failed to start scan: {}", e);
                    sleep(self.config.rescan_delay()).await;
                }
            }
        }
    }

    fn on_sighting(&mut self, sighting: SightingEvent<C::Peripheral>) {
        if self.state != ConnectionState::Scanning || sighting.scan_id != self.scan_id {
            debug!(
                "Dropping sighting of {} from scan {} ({})",
                sighting.address, sighting.scan_id, self.state
            );
            return;
        }
        if !sighting.name.starts_with(&self.config.name_prefix) {
            return;
        }

        info!(
            "Found device: {} - Address: {} - RSSI: {}",
            sighting.name, sighting.address, sighting.rssi
        );
        self.registry
            .record_sighting(&sighting.address, &sighting.name, sighting.rssi, sighting.handle);
    }

    async fn on_scan_complete(&mut self, scan_id: u64) -> Result<()> {
        if self.state != ConnectionState::Scanning || scan_id != self.scan_id {
            debug!("Ignoring completion of scan {} ({})", scan_id, self.state);
            return Ok(());
        }

        info!("Scan complete. Found {} matching devices.", self.registry.len());
        if self.registry.is_empty() {
            let empty = BridgeError::EmptyScanResult(self.config.name_prefix.clone());
            info!("{}. Restarting scan...", empty);
            sleep(self.config.rescan_delay()).await;
            self.begin_scan().await;
            return Ok(());
        }

        self.displayed = self.registry.ranked_snapshot();
        console::write_device_table(&mut self.console, &self.displayed)?;
        self.state = ConnectionState::AwaitingSelection;
        Ok(())
    }

    async fn on_operator_input(&mut self, line: &str) -> Result<()> {
        if self.state != ConnectionState::AwaitingSelection {
            debug!("Ignoring input {:?} while {}", line, self.state);
            return Ok(());
        }

        let index = match console::parse_selection(line, self.displayed.len()) {
            Ok(index) => index,
            Err(e) => {
                debug!("{}", e);
                writeln!(self.console, "{}", INVALID_SELECTION_MESSAGE)?;
                console::write_prompt(&mut self.console, self.displayed.len())?;
                return Ok(());
            }
        };

        let address = self.displayed[index].address.clone();
        let Some(device) = self.registry.take(&address) else {
            // the list and the registry are rebuilt together, so this means the state is stale
            warn!("Device {} is no longer available. Restarting scan...", address);
            self.begin_scan().await;
            return Ok(());
        };

        writeln!(self.console, "Connecting to device #{}", index + 1)?;
        self.connect(device).await
    }

    async fn connect(&mut self, device: DiscoveredDevice<C::Peripheral>) -> Result<()> {
        self.state = ConnectionState::Connecting;
        info!("Connecting to {}", device.address);

        if let Err(e) = self.central.connect(&device.handle).await {
            let failure = match e {
                failure @ BridgeError::ConnectFailure { .. } => failure,
                other => BridgeError::ConnectFailure {
                    address: device.address.clone(),
                    reason: other.to_string(),
                },
            };
            error!("{}. Restarting scan...", failure);
            drop(device);
            self.begin_scan().await;
            return Ok(());
        }

        info!("Connection established. Discovering services...");
        self.state = ConnectionState::Exploring;
        let reports = self.explorer.explore(&device.handle).await;
        console::write_service_reports(&mut self.console, &reports)?;

        self.state = ConnectionState::WritingControl;
        info!("Attempting to write magic word to Control Register...");
        match self.control_writer.write_unlock(&device.handle).await {
            Ok(()) => info!("Control Register write completed successfully"),
            Err(e) => error!("Control Register write failed: {}", e),
        }

        self.active = Some(device);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn on_disconnected(&mut self, address: &str) {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|device| device.address == address);
        if !is_active {
            debug!("Ignoring disconnect of {} ({})", address, self.state);
            return;
        }
        info!("Disconnected from device {}", address);
        self.teardown(BridgeError::UnexpectedDisconnect(address.to_string()))
            .await;
    }

    /// Releases the connection and the selected device, then rescans.
    async fn teardown(&mut self, reason: BridgeError) {
        self.state = ConnectionState::Disconnecting;
        warn!("{}. Restarting scan...", reason);

        if let Some(device) = self.active.take() {
            if let Err(e) = self.central.disconnect(&device.handle).await {
                warn!("Failed to disconnect from {}: {}", device.address, e);
            }
        }

        self.state = ConnectionState::Idle;
        self.begin_scan().await;
    }
}
