//! Interface to the wireless stack.
//!
//! The session only talks to the stack through these traits. `connection.rs`
//! implements them on top of bluest; tests use the in-memory stack in `simulated.rs`.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::bluetooth::error::BridgeError;

/// Properties of a characteristic the session cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicFlags {
    pub read: bool,
    /// Write with response
    pub write: bool,
}

/// Central role: scanning, connecting and disconnecting.
///
/// Sightings and scan completion are reported through the event sender the
/// implementation was constructed with.
#[async_trait]
pub trait Central: Send + Sync {
    type Peripheral: Peripheral;

    /// Starts a scan window of `duration`. Every sighting is tagged with `scan_id`,
    /// and a `ScanComplete` carrying the same id is sent when the window closes.
    /// A scan still running is cancelled first.
    async fn start_scan(&self, scan_id: u64, duration: Duration) -> Result<(), BridgeError>;

    async fn connect(&self, peripheral: &Self::Peripheral) -> Result<(), BridgeError>;

    async fn disconnect(&self, peripheral: &Self::Peripheral) -> Result<(), BridgeError>;
}

/// A remote device handle.
#[async_trait]
pub trait Peripheral: Send + Sync + 'static {
    type Service: GattService;

    async fn is_connected(&self) -> bool;

    async fn services(&self) -> Result<Vec<Self::Service>, BridgeError>;
}

#[async_trait]
pub trait GattService: Send + Sync {
    type Characteristic: GattCharacteristic;

    fn uuid(&self) -> Uuid;

    async fn characteristics(&self) -> Result<Vec<Self::Characteristic>, BridgeError>;
}

#[async_trait]
pub trait GattCharacteristic: Send + Sync {
    type Descriptor: GattDescriptor;

    fn uuid(&self) -> Uuid;

    async fn flags(&self) -> Result<CharacteristicFlags, BridgeError>;

    async fn read(&self) -> Result<Vec<u8>, BridgeError>;

    /// Writes `value` and waits for the peripheral's acknowledgment.
    async fn write_with_response(&self, value: &[u8]) -> Result<(), BridgeError>;

    async fn descriptors(&self) -> Result<Vec<Self::Descriptor>, BridgeError>;
}

#[async_trait]
pub trait GattDescriptor: Send + Sync {
    fn uuid(&self) -> Uuid;

    async fn read(&self) -> Result<Vec<u8>, BridgeError>;
}
