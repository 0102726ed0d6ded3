//! In-memory wireless stack used by the tests.
//!
//! Peripherals are built from services, characteristics and descriptors with
//! fixed payloads. Writes, scans, connects and disconnects are recorded so
//! tests can assert on what the session asked the stack to do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::bluetooth::error::BridgeError;
use crate::core::bluetooth::gatt::{
    Central, CharacteristicFlags, GattCharacteristic, GattDescriptor, GattService, Peripheral,
};

#[derive(Debug, Clone)]
pub struct SimDescriptor {
    uuid: Uuid,
    value: Vec<u8>,
}

#[async_trait]
impl GattDescriptor for SimDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn read(&self) -> Result<Vec<u8>, BridgeError> {
        Ok(self.value.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SimCharacteristic {
    uuid: Uuid,
    flags: CharacteristicFlags,
    value: Vec<u8>,
    descriptors: Vec<SimDescriptor>,
    fail_reads: bool,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl SimCharacteristic {
    fn new(uuid: Uuid, flags: CharacteristicFlags, value: &[u8]) -> Self {
        Self {
            uuid,
            flags,
            value: value.to_vec(),
            descriptors: Vec::new(),
            fail_reads: false,
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn readable(uuid: Uuid, value: &[u8]) -> Self {
        Self::new(uuid, CharacteristicFlags { read: true, write: false }, value)
    }

    pub fn writable(uuid: Uuid) -> Self {
        Self::new(uuid, CharacteristicFlags { read: false, write: true }, &[])
    }

    pub fn with_descriptor(mut self, uuid: Uuid, value: &[u8]) -> Self {
        self.descriptors.push(SimDescriptor {
            uuid,
            value: value.to_vec(),
        });
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Shared log of every acknowledged write.
    pub fn writes(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        self.writes.clone()
    }
}

#[async_trait]
impl GattCharacteristic for SimCharacteristic {
    type Descriptor = SimDescriptor;

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn flags(&self) -> Result<CharacteristicFlags, BridgeError> {
        Ok(self.flags)
    }

    async fn read(&self) -> Result<Vec<u8>, BridgeError> {
        if self.fail_reads {
            return Err(BridgeError::Gatt("read rejected".to_string()));
        }
        Ok(self.value.clone())
    }

    async fn write_with_response(&self, value: &[u8]) -> Result<(), BridgeError> {
        self.writes.lock().unwrap().push(value.to_vec());
        Ok(())
    }

    async fn descriptors(&self) -> Result<Vec<SimDescriptor>, BridgeError> {
        Ok(self.descriptors.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SimService {
    uuid: Uuid,
    characteristics: Vec<SimCharacteristic>,
}

impl SimService {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            characteristics: Vec::new(),
        }
    }

    pub fn with_characteristic(mut self, characteristic: SimCharacteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }
}

#[async_trait]
impl GattService for SimService {
    type Characteristic = SimCharacteristic;

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn characteristics(&self) -> Result<Vec<SimCharacteristic>, BridgeError> {
        Ok(self.characteristics.clone())
    }
}

/// A simulated remote device. Clones share the connection flag.
#[derive(Debug, Clone)]
pub struct SimPeripheral {
    address: String,
    connected: Arc<AtomicBool>,
    services: Vec<SimService>,
}

impl SimPeripheral {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            connected: Arc::new(AtomicBool::new(false)),
            services: Vec::new(),
        }
    }

    pub fn with_service(mut self, service: SimService) -> Self {
        self.services.push(service);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Number of live clones of this handle.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.connected)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Peripheral for SimPeripheral {
    type Service = SimService;

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn services(&self) -> Result<Vec<SimService>, BridgeError> {
        Ok(self.services.clone())
    }
}

/// A simulated central. Scans only record their id; tests feed the
/// resulting events to the session themselves.
#[derive(Debug, Default)]
pub struct SimCentral {
    fail_connects: AtomicBool,
    scans: Mutex<Vec<u64>>,
    connects: Mutex<Vec<String>>,
    disconnects: Mutex<Vec<String>>,
}

impl SimCentral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_connects(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    pub fn scans(&self) -> Vec<u64> {
        self.scans.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> Vec<String> {
        self.disconnects.lock().unwrap().clone()
    }
}

#[async_trait]
impl Central for SimCentral {
    type Peripheral = SimPeripheral;

    async fn start_scan(&self, scan_id: u64, _duration: Duration) -> Result<(), BridgeError> {
        self.scans.lock().unwrap().push(scan_id);
        Ok(())
    }

    async fn connect(&self, peripheral: &SimPeripheral) -> Result<(), BridgeError> {
        self.connects.lock().unwrap().push(peripheral.address.clone());
        if self.fail_connects.load(Ordering::SeqCst) {
            return Err(BridgeError::ConnectFailure {
                address: peripheral.address.clone(),
                reason: "connection refused".to_string(),
            });
        }
        peripheral.set_connected(true);
        Ok(())
    }

    async fn disconnect(&self, peripheral: &SimPeripheral) -> Result<(), BridgeError> {
        self.disconnects.lock().unwrap().push(peripheral.address.clone());
        peripheral.set_connected(false);
        Ok(())
    }
}
