//! Constants used throughout the application
//! This module contains the fixed wireless profile of the Skp peripherals:
//! service and characteristic UUIDs, descriptor UUIDs, and the unlock magic word.

use uuid::Uuid;

/// Advertised name prefix of the target peripherals
pub const TARGET_NAME_PREFIX: &str = "Skp";

/// Standard Bluetooth Service UUIDs
pub const UUID_DEVICE_INFORMATION_SERVICE: Uuid = Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);
pub const UUID_CYCLING_SPEED_CADENCE_SERVICE: Uuid = Uuid::from_u128(0x00001816_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Vendor Service UUIDs
pub const UUID_TEMPERATURE_SERVICE: Uuid = Uuid::from_u128(0xb1f8799e_4999_4f4a_af05_b5a6fb6ab55d);
pub const UUID_USER_SERVICE: Uuid = Uuid::from_u128(0xb1f879a7_4999_4f4a_af05_b5a6fb6ab55d);
pub const UUID_CONTROL_SERVICE: Uuid = Uuid::from_u128(0xb1f879b4_4999_4f4a_af05_b5a6fb6ab55d);

/// The writable register inside the control service
pub const UUID_CONTROL_REGISTER: Uuid = Uuid::from_u128(0xb1f879b5_4999_4f4a_af05_b5a6fb6ab55d);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_MANUFACTURER_NAME: Uuid = Uuid::from_u128(0x00002a29_0000_1000_8000_00805f9b34fb);
pub const UUID_MODEL_NUMBER: Uuid = Uuid::from_u128(0x00002a24_0000_1000_8000_00805f9b34fb);
pub const UUID_CSC_MEASUREMENT: Uuid = Uuid::from_u128(0x00002a5b_0000_1000_8000_00805f9b34fb);

/// Characteristic Presentation Format descriptor
pub const UUID_PRESENTATION_FORMAT_DESCRIPTOR: Uuid = Uuid::from_u128(0x00002904_0000_1000_8000_00805f9b34fb);

/// Services that get explored after connecting. Anything else is skipped.
pub const RECOGNIZED_SERVICES: [Uuid; 6] = [
    UUID_DEVICE_INFORMATION_SERVICE,
    UUID_TEMPERATURE_SERVICE,
    UUID_CYCLING_SPEED_CADENCE_SERVICE,
    UUID_USER_SERVICE,
    UUID_BATTERY_SERVICE,
    UUID_CONTROL_SERVICE,
];

/// Magic word unlocking the control register, written big-endian
pub const CONTROL_UNLOCK_MAGIC: u32 = 0x3374_12E4;

/// Minimum length of a presentation format descriptor payload
pub const PRESENTATION_FORMAT_LEN: usize = 7;

/// Scan duration in seconds
pub const DEFAULT_SCAN_DURATION_SECS: u64 = 5;

/// Delay before rescanning after an empty scan, in milliseconds
pub const DEFAULT_RESCAN_DELAY_MS: u64 = 2000;

/// Period of the session poll loop, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Human readable names of the known services and characteristics
const KNOWN_UUID_NAMES: [(Uuid, &str); 10] = [
    (UUID_DEVICE_INFORMATION_SERVICE, "Device Information Service"),
    (UUID_TEMPERATURE_SERVICE, "Temperature Service"),
    (UUID_CYCLING_SPEED_CADENCE_SERVICE, "Cycling Speed and Cadence"),
    (UUID_USER_SERVICE, "User Service"),
    (UUID_BATTERY_SERVICE, "Battery Service"),
    (UUID_CONTROL_SERVICE, "Control Service"),
    (UUID_CONTROL_REGISTER, "Control Register"),
    (UUID_MANUFACTURER_NAME, "Manufacturer Name String"),
    (UUID_MODEL_NUMBER, "Model Number String"),
    (UUID_CSC_MEASUREMENT, "CSC Measurement"),
];

/// Returns the human readable name of a known service or characteristic UUID.
pub fn uuid_name(uuid: &Uuid) -> Option<&'static str> {
    KNOWN_UUID_NAMES
        .iter()
        .find(|(known, _)| known == uuid)
        .map(|(_, name)| *name)
}

/// Name of a UUID, or its string form when it is not in the table.
pub fn uuid_label(uuid: &Uuid) -> String {
    uuid_name(uuid)
        .map(str::to_string)
        .unwrap_or_else(|| uuid.to_string())
}
