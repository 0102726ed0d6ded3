//! Error types for the Bluetooth module.
//!
//! None of these are fatal to the session. Connection-layer errors move the
//! session back to scanning, everything else is reported and skipped.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while scanning, connecting or driving the control register.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Operator input was not a number in `1..=max`.
    #[error("invalid selection {input:?}, expected a number between 1 and {max}")]
    InvalidSelection { input: String, max: usize },

    /// The collaborator refused or timed out the connection.
    #[error("failed to connect to {address}: {reason}")]
    ConnectFailure { address: String, reason: String },

    #[error("device is not connected")]
    NotConnected,

    #[error("service not found: {0}")]
    ServiceNotFound(Uuid),

    #[error("characteristic not found: {0}")]
    CharacteristicNotFound(Uuid),

    #[error("characteristic is not writable: {0}")]
    CharacteristicNotWritable(Uuid),

    /// A scan window closed without any matching advertisement.
    #[error("no devices found with prefix {0:?}")]
    EmptyScanResult(String),

    /// The link dropped while the session was connected.
    #[error("device {0} disconnected unexpectedly")]
    UnexpectedDisconnect(String),

    /// A GATT transaction failed inside the wireless stack.
    #[error("GATT operation failed: {0}")]
    Gatt(String),

    #[error(transparent)]
    Bluetooth(#[from] bluest::Error),
}

/// Reasons a characteristic value could not be decoded with its presentation format.
/// The explorer answers all of them with the fallback rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("presentation format descriptor missing")]
    DescriptorMissing,

    #[error("presentation format descriptor too short ({0} bytes)")]
    DescriptorMalformed(usize),

    #[error("unsupported presentation format 0x{0:02X}")]
    UnsupportedFormat(u8),

    #[error("payload too short: need {needed} bytes, got {actual}")]
    PayloadTooShort { needed: usize, actual: usize },
}
