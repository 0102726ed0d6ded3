//! Skp bridge library
//! Discovers Skp peripherals over BLE, lets the operator pick one, decodes its
//! characteristics and unlocks its control register.

// Module declarations
pub mod config;
pub mod core;
pub mod logging;
