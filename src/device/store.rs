use indexmap::IndexMap;

use crate::device::types::{DeviceAddress, DiscoveredDevice};

/// Result of merging a scan result into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upsert {
    pub index: usize,
    pub was_insert: bool,
}

/// Devices seen during the current scan session, in order of first sighting.
#[derive(Debug, Default)]
pub struct ScanResultStore {
    devices: IndexMap<DeviceAddress, DiscoveredDevice>,
}

impl ScanResultStore {
    pub fn new() -> Self {
        ScanResultStore::default()
    }

    /// Insert a device, or update the entry that has the same address. An update keeps the
    /// position of the entry so that a live list does not jump around.
    pub fn upsert(&mut self, device: DiscoveredDevice) -> Upsert {
        match self.devices.get_full_mut(&device.address) {
            Some((index, _, existing)) => {
                *existing = device;
                Upsert { index, was_insert: false }
            },
            None => {
                let (index, _) = self.devices.insert_full(device.address.clone(), device);
                Upsert { index, was_insert: true }
            },
        }
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn all(&self) -> impl ExactSizeIterator<Item = &DiscoveredDevice> {
        self.devices.values()
    }

    pub fn get(&self, index: usize) -> Option<&DiscoveredDevice> {
        self.devices.get_index(index).map(|(_, device)| device)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn device(address: &str, name: Option<&str>, rssi: i16) -> DiscoveredDevice {
        DiscoveredDevice {
            address: DeviceAddress::new(address),
            name: name.map(String::from),
            rssi,
            connectable: None,
        }
    }

    #[test]
    fn first_sighting_then_update() {
        let mut store = ScanResultStore::new();

        let result = store.upsert(device("AA:01", Some("Foo"), -60));
        assert_eq!(result, Upsert { index: 0, was_insert: true });
        assert_eq!(store.len(), 1);

        let result = store.upsert(device("AA:01", Some("Foo"), -55));
        assert_eq!(result, Upsert { index: 0, was_insert: false });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).map(|d| d.rssi), Some(-55));
    }

    #[test]
    fn update_keeps_position() {
        let mut store = ScanResultStore::new();
        store.upsert(device("AA:01", None, -80));
        store.upsert(device("AA:02", None, -70));
        store.upsert(device("AA:03", None, -60));

        let result = store.upsert(device("AA:02", Some("Renamed"), -40));
        assert_eq!(result, Upsert { index: 1, was_insert: false });

        let addresses: Vec<&str> = store.all().map(|d| d.address.as_str()).collect();
        assert_eq!(addresses, vec!["AA:01", "AA:02", "AA:03"]);
        assert_eq!(store.get(1).and_then(|d| d.name.as_deref()), Some("Renamed"));
    }

    #[test]
    fn addresses_stay_unique() {
        let mut store = ScanResultStore::new();
        let sightings = ["AA:01", "AA:02", "AA:01", "AA:03", "AA:02", "AA:02", "AA:04", "AA:01"];

        for (i, address) in sightings.iter().enumerate() {
            let before = store.len();
            let result = store.upsert(device(address, None, -(i as i16)));

            if result.was_insert {
                assert_eq!(store.len(), before + 1);
                assert_eq!(result.index, store.len() - 1);
            } else {
                assert_eq!(store.len(), before);
            }
        }

        let unique: HashSet<&DeviceAddress> = store.all().map(|d| &d.address).collect();
        assert_eq!(unique.len(), store.len());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn clear_starts_over() {
        let mut store = ScanResultStore::new();
        store.upsert(device("AA:01", None, -60));
        store.upsert(device("AA:02", None, -60));

        store.clear();
        assert!(store.is_empty());

        assert_eq!(store.upsert(device("AA:02", None, -50)), Upsert { index: 0, was_insert: true });
        assert_eq!(store.upsert(device("AA:01", None, -50)), Upsert { index: 1, was_insert: true });
        assert!(store.get(2).is_none());
    }
}
