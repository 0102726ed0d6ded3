//! Bluetooth scanning
//! Runs timed scan windows and turns advertisements into session events.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use bluest::{Adapter, AdvertisingDevice};
use futures_util::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::events::{EventSender, SessionEvent, SightingEvent};

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("MAC address pattern is valid")
});

/// Runs timed scan windows on a bluest adapter and reports what it hears
/// to the session queue.
pub struct BluetoothScanner {
    adapter: Adapter,
    events: EventSender<bluest::Device>,
    cancel_token: CancellationToken,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl BluetoothScanner {
    pub fn new(adapter: Adapter, events: EventSender<bluest::Device>) -> Self {
        Self {
            adapter,
            events,
            cancel_token: CancellationToken::new(),
            scan_task_handle: None,
        }
    }

    /// Starts a scan window, cancelling the previous one if it is still running.
    pub async fn start_scan(&mut self, scan_id: u64, duration: Duration) -> Result<()> {
        if self.scan_task_handle.is_some() {
            self.stop_scan().await;
        }

        self.cancel_token = CancellationToken::new();
        let cancel_token_for_task = self.cancel_token.clone();
        let adapter_for_task = self.adapter.clone();
        let events_for_task = self.events.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = Self::internal_scan_task(
                adapter_for_task,
                events_for_task.clone(),
                cancel_token_for_task,
                scan_id,
                duration,
            )
            .await
            {
                error!("Scan {} failed: {}", scan_id, e);
            }
            // the session decides what to do with an empty window
            let _ = events_for_task.send(SessionEvent::ScanComplete { scan_id });
        });

        self.scan_task_handle = Some(handle);
        info!("Device scan task {} started.", scan_id);
        Ok(())
    }

    async fn internal_scan_task(
        adapter: Adapter,
        events: EventSender<bluest::Device>,
        cancel_token: CancellationToken,
        scan_id: u64,
        duration: Duration,
    ) -> Result<()> {
        let mut scan_stream = adapter.scan(&[]).await?;
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            debug!("Found device - Device: {:?}, RSSI: {:?}", discovered_device.device, discovered_device.rssi);
                            if let Some(sighting) = Self::to_sighting(scan_id, discovered_device) {
                                if events.send(SessionEvent::Sighting(sighting)).is_err() {
                                    break;
                                }
                            }
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = &mut deadline => {
                    debug!("Scan window {} elapsed.", scan_id);
                    break;
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Cancels the running scan window and waits for its task to finish.
    pub async fn stop_scan(&mut self) {
        self.cancel_token.cancel();

        if let Some(handle) = self.scan_task_handle.take() {
            match handle.await {
                Ok(()) => debug!("Scan task finished."),
                Err(e) if e.is_cancelled() => info!("Scan task was cancelled."),
                Err(e) => error!("Scan task finished with an unexpected join error: {:?}", e),
            }
        }
    }

    /// Only advertisements carrying a name and a signal strength are reported.
    fn to_sighting(scan_id: u64, discovered: AdvertisingDevice) -> Option<SightingEvent<bluest::Device>> {
        let name = discovered
            .adv_data
            .local_name
            .clone()
            .or_else(|| discovered.device.name().ok())?;
        let rssi = discovered.rssi?;
        let address = device_address(&discovered.device);

        Some(SightingEvent {
            scan_id,
            address,
            name,
            rssi,
            handle: discovered.device,
        })
    }
}

/// Address used to key a device: its MAC address when the platform exposes one,
/// otherwise the platform id.
pub fn device_address(device: &bluest::Device) -> String {
    let id = device.id().to_string();
    extract_mac_address(&id).unwrap_or(id)
}

/// Pulls a MAC address out of a platform device id. macOS ids carry none.
pub fn extract_mac_address(device_id_str: &str) -> Option<String> {
    MAC_ADDRESS
        .find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().to_uppercase())
}
