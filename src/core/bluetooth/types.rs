//! Defines shared data structures for the Bluetooth module.

use std::fmt;

/// Represents one advertising peripheral whose name matches the target prefix
#[derive(Debug, Clone)]
pub struct DiscoveredDevice<H> {
    /// The address of the device (MAC address on most platforms, the platform id on macOS)
    pub address: String,
    /// The advertised name of the device
    pub display_name: String,
    /// The signal strength (RSSI) of the latest sighting
    pub signal_strength: i16,
    /// The wireless stack's handle for this peripheral
    pub handle: H,
}

impl<H> DiscoveredDevice<H> {
    /// Creates a new DiscoveredDevice instance
    pub fn new(address: String, display_name: String, signal_strength: i16, handle: H) -> Self {
        Self {
            address,
            display_name,
            signal_strength,
            handle,
        }
    }
}

/// A row of the device table shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedDevice {
    pub address: String,
    pub display_name: String,
    pub signal_strength: i16,
}

impl<H> From<&DiscoveredDevice<H>> for RankedDevice {
    fn from(device: &DiscoveredDevice<H>) -> Self {
        Self {
            address: device.address.clone(),
            display_name: device.display_name.clone(),
            signal_strength: device.signal_strength,
        }
    }
}

/// Lifecycle of the connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Scanning,
    AwaitingSelection,
    Connecting,
    Exploring,
    WritingControl,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::AwaitingSelection => "awaiting selection",
            Self::Connecting => "connecting",
            Self::Exploring => "exploring",
            Self::WritingControl => "writing control register",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Decoded value of one readable characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicReport {
    pub label: String,
    pub uuid: String,
    pub value: String,
}

/// Everything read from one recognized service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub label: String,
    pub uuid: String,
    pub characteristics: Vec<CharacteristicReport>,
}
