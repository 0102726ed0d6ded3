//! Service exploration for a connected peripheral
//! Walks the recognized services, reads every readable characteristic and
//! decodes its value with the presentation format descriptor when present.

use log::{debug, info, warn};

use crate::core::bluetooth::constants::{
    RECOGNIZED_SERVICES, UUID_PRESENTATION_FORMAT_DESCRIPTOR, uuid_label,
};
use crate::core::bluetooth::decoder;
use crate::core::bluetooth::gatt::{GattCharacteristic, GattDescriptor, GattService, Peripheral};
use crate::core::bluetooth::types::{CharacteristicReport, ServiceReport};

/// Reads and decodes the values exposed by the recognized services.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceExplorer;

impl ServiceExplorer {
    pub fn new() -> Self {
        Self
    }

    /// Explores every recognized service of `peripheral`.
    ///
    /// Failures never abort the walk: a service list that cannot be fetched
    /// yields an empty report, a characteristic that cannot be read is skipped.
    pub async fn explore<P: Peripheral>(&self, peripheral: &P) -> Vec<ServiceReport> {
        let services = match peripheral.services().await {
            Ok(services) => services,
            Err(e) => {
                warn!("Failed to get services: {}", e);
                return Vec::new();
            }
        };

        let mut reports = Vec::new();
        for service in &services {
            let uuid = service.uuid();
            if !RECOGNIZED_SERVICES.contains(&uuid) {
                debug!("Skipping unrecognized service {}", uuid);
                continue;
            }
            reports.push(self.explore_service(service).await);
        }
        reports
    }

    async fn explore_service<S: GattService>(&self, service: &S) -> ServiceReport {
        let uuid = service.uuid();
        info!("Exploring service {} ({})", uuid_label(&uuid), uuid);

        let mut report = ServiceReport {
            label: uuid_label(&uuid),
            uuid: uuid.to_string(),
            characteristics: Vec::new(),
        };

        let characteristics = match service.characteristics().await {
            Ok(characteristics) => characteristics,
            Err(e) => {
                warn!("Failed to get characteristics of {}: {}", uuid, e);
                return report;
            }
        };

        for characteristic in &characteristics {
            if let Some(entry) = self.explore_characteristic(characteristic).await {
                report.characteristics.push(entry);
            }
        }
        report
    }

    async fn explore_characteristic<C: GattCharacteristic>(
        &self,
        characteristic: &C,
    ) -> Option<CharacteristicReport> {
        let uuid = characteristic.uuid();
        let readable = match characteristic.flags().await {
            Ok(flags) => flags.read,
            Err(e) => {
                warn!("Failed to get properties of {}: {}", uuid, e);
                return None;
            }
        };
        if !readable {
            debug!("Characteristic {} is not readable", uuid);
            return None;
        }

        let raw = match characteristic.read().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read characteristic {}: {}", uuid, e);
                return None;
            }
        };

        let descriptor = Self::presentation_format(characteristic).await;
        let value = decoder::render(&raw, descriptor.as_deref());
        debug!("Characteristic {} raw {:?} -> {:?}", uuid, raw, value);

        Some(CharacteristicReport {
            label: uuid_label(&uuid),
            uuid: uuid.to_string(),
            value,
        })
    }

    /// Reads the presentation format descriptor payload, if the characteristic has one.
    async fn presentation_format<C: GattCharacteristic>(characteristic: &C) -> Option<Vec<u8>> {
        let descriptors = match characteristic.descriptors().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                debug!("No descriptors for {}: {}", characteristic.uuid(), e);
                return None;
            }
        };

        let descriptor = descriptors
            .iter()
            .find(|d| d.uuid() == UUID_PRESENTATION_FORMAT_DESCRIPTOR)?;

        match descriptor.read().await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Failed to read presentation format of {}: {}", characteristic.uuid(), e);
                None
            }
        }
    }
}
