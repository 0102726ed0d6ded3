//! Bluetooth functionality for the Skp bridge
//! This module handles all bluetooth operations: scanning for Skp peripherals,
//! ranking and selecting them, connecting, decoding their characteristics and
//! unlocking the control register.

mod connection;
mod console;
mod constants;
mod control;
mod decoder;
mod error;
mod events;
mod explorer;
mod gatt;
mod registry;
mod scanner;
mod session;
#[cfg(test)]
mod simulated;
mod types;

// Re-export types that should be publicly accessible
pub use connection::BluestCentral;
pub use console::{INVALID_SELECTION_MESSAGE, parse_selection, spawn_stdin_reader};
pub use constants::*; // Re-export all constants
pub use control::{ControlCommand, ControlRegisterWriter};
pub use decoder::{Format, PresentationFormat, decode, fallback, render};
pub use error::{BridgeError, DecodeError};
pub use events::{EventReceiver, EventSender, SessionEvent, SightingEvent, event_channel};
pub use explorer::ServiceExplorer;
pub use gatt::{Central, CharacteristicFlags, GattCharacteristic, GattDescriptor, GattService, Peripheral};
pub use registry::{DiscoveryRegistry, RankedList};
pub use scanner::BluetoothScanner;
pub use session::ConnectionSession;
pub use types::{CharacteristicReport, ConnectionState, DiscoveredDevice, RankedDevice, ServiceReport};
