//! Operator console
//! Renders the device table and exploration results, parses device
//! selections, and forwards stdin lines to the session queue.

use std::io::{self, Write};

use log::{debug, error, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::core::bluetooth::error::BridgeError;
use crate::core::bluetooth::events::{EventSender, SessionEvent};
use crate::core::bluetooth::registry::RankedList;
use crate::core::bluetooth::types::ServiceReport;

pub const INVALID_SELECTION_MESSAGE: &str = "Invalid selection. Please try again.";

const SEPARATOR: &str = "----------------------------------------";

/// Writes the numbered device table followed by the selection prompt.
pub fn write_device_table<W: Write>(out: &mut W, devices: &RankedList) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "===== Found Devices =====")?;
    writeln!(out, "Num | Device Name | Address | RSSI")?;
    writeln!(out, "{}", SEPARATOR)?;
    for (index, device) in devices.iter().enumerate() {
        writeln!(
            out,
            "{} | {} | {} | {}",
            index + 1,
            device.display_name,
            device.address,
            device.signal_strength
        )?;
    }
    writeln!(out, "{}", SEPARATOR)?;
    write_prompt(out, devices.len())
}

pub fn write_prompt<W: Write>(out: &mut W, count: usize) -> io::Result<()> {
    writeln!(out, "Enter device number to connect (1-{}):", count)?;
    out.flush()
}

/// Writes one block per explored service, one line per characteristic.
pub fn write_service_reports<W: Write>(out: &mut W, reports: &[ServiceReport]) -> io::Result<()> {
    for service in reports {
        writeln!(out)?;
        writeln!(out, "Service: {}", service.label)?;
        writeln!(out, "UUID: {}", service.uuid)?;
        for characteristic in &service.characteristics {
            writeln!(
                out,
                "  Characteristic: {} ({}): {}",
                characteristic.label, characteristic.uuid, characteristic.value
            )?;
        }
    }
    out.flush()
}

/// Parses a 1-based selection into an index of a list of `count` devices.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, BridgeError> {
    let invalid = || BridgeError::InvalidSelection {
        input: input.to_string(),
        max: count,
    };

    let selection: i64 = input.trim().parse().map_err(|_| invalid())?;
    if selection < 1 || selection > count as i64 {
        return Err(invalid());
    }
    Ok((selection - 1) as usize)
}

/// Spawns a task forwarding every stdin line to the session as operator input.
/// The task ends at end of input or when the session queue is closed.
pub fn spawn_stdin_reader<P: Send + 'static>(events: EventSender<P>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!("Operator input: {:?}", line);
                    if events.send(SessionEvent::OperatorInput(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("Console input closed.");
                    break;
                }
                Err(e) => {
                    error!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
    })
}
