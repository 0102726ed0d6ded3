//! Control register commands
//! This module writes privileged commands to the vendor control service.

use log::info;

use crate::core::bluetooth::constants::{CONTROL_UNLOCK_MAGIC, UUID_CONTROL_REGISTER, UUID_CONTROL_SERVICE};
use crate::core::bluetooth::error::BridgeError;
use crate::core::bluetooth::gatt::{GattCharacteristic, GattService, Peripheral};

/// Commands accepted by the control register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Unlock the protected register (0x33, 0x74, 0x12, 0xE4)
    Unlock,
}

impl ControlCommand {
    /// Convert the command to its byte representation
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Unlock => CONTROL_UNLOCK_MAGIC.to_be_bytes().to_vec(),
        }
    }
}

/// Resolves the control register on a connected peripheral and writes commands to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlRegisterWriter;

impl ControlRegisterWriter {
    pub fn new() -> Self {
        Self
    }

    /// Writes the unlock magic word.
    ///
    /// Preconditions are checked in order and each has its own error: the link
    /// must be up, the control service and the register must exist, and the
    /// register must accept acknowledged writes.
    pub async fn write_unlock<P: Peripheral>(&self, peripheral: &P) -> Result<(), BridgeError> {
        self.send_command(peripheral, ControlCommand::Unlock).await
    }

    async fn send_command<P: Peripheral>(
        &self,
        peripheral: &P,
        command: ControlCommand,
    ) -> Result<(), BridgeError> {
        if !peripheral.is_connected().await {
            return Err(BridgeError::NotConnected);
        }

        info!("Accessing Control Service...");
        let services = peripheral.services().await?;
        let control_service = services
            .iter()
            .find(|s| s.uuid() == UUID_CONTROL_SERVICE)
            .ok_or(BridgeError::ServiceNotFound(UUID_CONTROL_SERVICE))?;

        info!("Accessing Control Register characteristic...");
        let characteristics = control_service.characteristics().await?;
        let register = characteristics
            .iter()
            .find(|c| c.uuid() == UUID_CONTROL_REGISTER)
            .ok_or(BridgeError::CharacteristicNotFound(UUID_CONTROL_REGISTER))?;

        if !register.flags().await?.write {
            return Err(BridgeError::CharacteristicNotWritable(UUID_CONTROL_REGISTER));
        }

        let data = command.to_bytes();
        info!("Sending command to control register: {:?} {:02X?}", command, data);
        register.write_with_response(&data).await?;
        info!("Command {:?} written to Control Register", command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::constants::UUID_BATTERY_SERVICE;
    use crate::core::bluetooth::simulated::{SimCharacteristic, SimPeripheral, SimService};

    fn control_peripheral(register: SimCharacteristic) -> SimPeripheral {
        SimPeripheral::new("01").with_service(SimService::new(UUID_CONTROL_SERVICE).with_characteristic(register))
    }

    #[test]
    fn unlock_bytes_are_big_endian_magic() {
        assert_eq!(ControlCommand::Unlock.to_bytes(), vec![0x33, 0x74, 0x12, 0xE4]);
    }

    #[tokio::test]
    async fn writes_magic_word() {
        let register = SimCharacteristic::writable(UUID_CONTROL_REGISTER);
        let writes = register.writes();
        let peripheral = control_peripheral(register);
        peripheral.set_connected(true);

        ControlRegisterWriter::new().write_unlock(&peripheral).await.unwrap();

        assert_eq!(*writes.lock().unwrap(), vec![vec![0x33, 0x74, 0x12, 0xE4]]);
    }

    #[tokio::test]
    async fn requires_connection() {
        let register = SimCharacteristic::writable(UUID_CONTROL_REGISTER);
        let writes = register.writes();
        let peripheral = control_peripheral(register);

        let result = ControlRegisterWriter::new().write_unlock(&peripheral).await;

        assert!(matches!(result, Err(BridgeError::NotConnected)));
        assert!(writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_service_is_reported() {
        let peripheral = SimPeripheral::new("01").with_service(SimService::new(UUID_BATTERY_SERVICE));
        peripheral.set_connected(true);

        let result = ControlRegisterWriter::new().write_unlock(&peripheral).await;

        assert!(matches!(result, Err(BridgeError::ServiceNotFound(uuid)) if uuid == UUID_CONTROL_SERVICE));
    }

    #[tokio::test]
    async fn missing_register_is_reported() {
        let peripheral = SimPeripheral::new("01").with_service(SimService::new(UUID_CONTROL_SERVICE));
        peripheral.set_connected(true);

        let result = ControlRegisterWriter::new().write_unlock(&peripheral).await;

        assert!(matches!(result, Err(BridgeError::CharacteristicNotFound(_))));
    }

    #[tokio::test]
    async fn read_only_register_is_not_written() {
        let register = SimCharacteristic::readable(UUID_CONTROL_REGISTER, &[0x00]);
        let writes = register.writes();
        let peripheral = control_peripheral(register);
        peripheral.set_connected(true);

        let result = ControlRegisterWriter::new().write_unlock(&peripheral).await;

        assert!(matches!(result, Err(BridgeError::CharacteristicNotWritable(_))));
        assert!(writes.lock().unwrap().is_empty());
    }
}
