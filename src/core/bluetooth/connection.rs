//! Bluetooth connection handling on top of bluest
//! This module connects the session's stack interface to a real adapter:
//! scanning, connecting, disconnecting, and watching for dropped links.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bluest::{Adapter, ConnectionEvent, Device, Uuid};
use futures_util::StreamExt;
use log::{info, warn};
use tokio::task::JoinHandle;

use crate::core::bluetooth::error::BridgeError;
use crate::core::bluetooth::events::{EventSender, SessionEvent};
use crate::core::bluetooth::gatt::{
    Central, CharacteristicFlags, GattCharacteristic, GattDescriptor, GattService, Peripheral,
};
use crate::core::bluetooth::scanner::{BluetoothScanner, device_address};

/// The production central. Scan results and link events go to the session
/// queue it was created with.
pub struct BluestCentral {
    adapter: Adapter,
    scanner: tokio::sync::Mutex<BluetoothScanner>,
    events: EventSender<Device>,
    /// Task forwarding link events of the connected device
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl BluestCentral {
    pub fn new(adapter: Adapter, events: EventSender<Device>) -> Self {
        let scanner = BluetoothScanner::new(adapter.clone(), events.clone());
        Self {
            adapter,
            scanner: tokio::sync::Mutex::new(scanner),
            events,
            watcher: Mutex::new(None),
        }
    }

    /// Forwards the link events of `device` to the session until it disconnects.
    fn watch_connection(&self, device: &Device) {
        let adapter = self.adapter.clone();
        let device = device.clone();
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            let address = device_address(&device);
            let mut connection_events = match adapter.device_connection_events(&device).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Cannot watch connection of {}: {}", address, e);
                    return;
                }
            };

            while let Some(event) = connection_events.next().await {
                match event {
                    ConnectionEvent::Connected => {
                        let _ = events.send(SessionEvent::Connected {
                            address: address.clone(),
                        });
                    }
                    ConnectionEvent::Disconnected => {
                        let _ = events.send(SessionEvent::Disconnected { address });
                        break;
                    }
                }
            }
        });

        if let Some(previous) = self.replace_watcher(Some(handle)) {
            previous.abort();
        }
    }

    fn replace_watcher(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        match self.watcher.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, handle),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), handle),
        }
    }
}

#[async_trait]
impl Central for BluestCentral {
    type Peripheral = Device;

    async fn start_scan(&self, scan_id: u64, duration: Duration) -> Result<(), BridgeError> {
        self.scanner
            .lock()
            .await
            .start_scan(scan_id, duration)
            .await
            .map_err(|e| BridgeError::Gatt(e.to_string()))
    }

    async fn connect(&self, device: &Device) -> Result<(), BridgeError> {
        let address = device_address(device);
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Device details - ID: {}, Name: {:?}", device.id(), name);

        // connecting while the scan is still running is unreliable on some stacks
        self.scanner.lock().await.stop_scan().await;

        if !device.is_connected().await {
            info!("Initiating connection to {}...", address);
            self.adapter
                .connect_device(device)
                .await
                .map_err(|e| BridgeError::ConnectFailure {
                    address: address.clone(),
                    reason: e.to_string(),
                })?;
        }

        let _ = self.events.send(SessionEvent::Connected { address });
        self.watch_connection(device);
        Ok(())
    }

    async fn disconnect(&self, device: &Device) -> Result<(), BridgeError> {
        if let Some(watcher) = self.replace_watcher(None) {
            watcher.abort();
        }

        if device.is_connected().await {
            info!("Disconnecting from device {}", device.id());
            self.adapter.disconnect_device(device).await?;
            info!("Successfully disconnected");
        } else {
            info!("Device {} not connected", device.id());
        }
        Ok(())
    }
}

#[async_trait]
impl Peripheral for Device {
    type Service = bluest::Service;

    async fn is_connected(&self) -> bool {
        Device::is_connected(self).await
    }

    async fn services(&self) -> Result<Vec<bluest::Service>, BridgeError> {
        Ok(Device::services(self).await?)
    }
}

#[async_trait]
impl GattService for bluest::Service {
    type Characteristic = bluest::Characteristic;

    fn uuid(&self) -> Uuid {
        bluest::Service::uuid(self)
    }

    async fn characteristics(&self) -> Result<Vec<bluest::Characteristic>, BridgeError> {
        Ok(bluest::Service::characteristics(self).await?)
    }
}

#[async_trait]
impl GattCharacteristic for bluest::Characteristic {
    type Descriptor = bluest::Descriptor;

    fn uuid(&self) -> Uuid {
        bluest::Characteristic::uuid(self)
    }

    async fn flags(&self) -> Result<CharacteristicFlags, BridgeError> {
        let properties = self.properties().await?;
        Ok(CharacteristicFlags {
            read: properties.read,
            write: properties.write,
        })
    }

    async fn read(&self) -> Result<Vec<u8>, BridgeError> {
        Ok(bluest::Characteristic::read(self).await?)
    }

    async fn write_with_response(&self, value: &[u8]) -> Result<(), BridgeError> {
        // bluest's plain write requests an acknowledgment
        Ok(bluest::Characteristic::write(self, value).await?)
    }

    async fn descriptors(&self) -> Result<Vec<bluest::Descriptor>, BridgeError> {
        Ok(bluest::Characteristic::descriptors(self).await?)
    }
}

#[async_trait]
impl GattDescriptor for bluest::Descriptor {
    fn uuid(&self) -> Uuid {
        bluest::Descriptor::uuid(self)
    }

    async fn read(&self) -> Result<Vec<u8>, BridgeError> {
        Ok(bluest::Descriptor::read(self).await?)
    }
}
