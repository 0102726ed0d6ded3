//! Registry of advertising peripherals seen during the current scan cycle.

use std::collections::HashMap;

use crate::core::bluetooth::types::{DiscoveredDevice, RankedDevice};

/// Devices ranked by signal strength, strongest first.
pub type RankedList = Vec<RankedDevice>;

struct Entry<H> {
    device: DiscoveredDevice<H>,
    /// Order of first sighting, used to keep the ranking stable.
    order: u64,
}

/// Deduplicates sightings by address and owns the peripheral handles until
/// one of them is taken by a connection attempt.
pub struct DiscoveryRegistry<H> {
    entries: HashMap<String, Entry<H>>,
    next_order: u64,
}

impl<H> Default for DiscoveryRegistry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_order: 0,
        }
    }
}

impl<H> DiscoveryRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry, releasing all handles.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_order = 0;
    }

    /// Inserts a device, or overwrites the name, signal strength and handle
    /// of an address that was already seen. The previous handle is dropped.
    pub fn record_sighting(&mut self, address: &str, name: &str, rssi: i16, handle: H) {
        if let Some(entry) = self.entries.get_mut(address) {
            entry.device.display_name = name.to_string();
            entry.device.signal_strength = rssi;
            entry.device.handle = handle;
            return;
        }

        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(
            address.to_string(),
            Entry {
                device: DiscoveredDevice::new(address.to_string(), name.to_string(), rssi, handle),
                order,
            },
        );
    }

    /// Snapshot sorted by signal strength descending, ties in discovery order.
    pub fn ranked_snapshot(&self) -> RankedList {
        let mut entries: Vec<&Entry<H>> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            b.device
                .signal_strength
                .cmp(&a.device.signal_strength)
                .then(a.order.cmp(&b.order))
        });
        entries
            .into_iter()
            .map(|entry| RankedDevice::from(&entry.device))
            .collect()
    }

    pub fn lookup(&self, address: &str) -> Option<&DiscoveredDevice<H>> {
        self.entries.get(address).map(|entry| &entry.device)
    }

    /// Removes a device and hands its handle to the caller.
    pub fn take(&mut self, address: &str) -> Option<DiscoveredDevice<H>> {
        self.entries.remove(address).map(|entry| entry.device)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
