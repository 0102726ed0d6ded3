//! Core functionality for the Skp bridge
//! This module contains the core functionality for talking to Skp peripherals

pub mod bluetooth;

// Re-export commonly used types
pub use bluetooth::{BluestCentral, ConnectionSession, ConnectionState};
