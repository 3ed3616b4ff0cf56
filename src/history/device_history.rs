//! Per-device temperature history with bounded capacity
//!
//! Each device keeps a fixed-size FIFO of recent samples. The capacity is
//! derived once at startup from the trend window and check interval; when a
//! buffer is full, appending evicts the oldest sample.

use crate::error::MonitorError;
use crate::events::{DeviceCategory, SensorSnapshot};
use crate::history::trend::Trend;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Smallest capacity that still allows a trend to be computed
pub const MIN_CAPACITY: usize = 2;

/// Samples allocated up front; larger histories grow on demand
const PREALLOCATED_SAMPLES: usize = 64;

/// Fixed-capacity FIFO of temperatures for one device
#[derive(Debug, Clone)]
pub struct DeviceHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl DeviceHistory {
    /// Create an empty history; capacities below 2 are raised to 2
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            samples: VecDeque::with_capacity(capacity.min(PREALLOCATED_SAMPLES)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, temperature: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(temperature);
    }

    /// Samples from oldest to newest
    pub fn samples(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn trend(&self) -> Trend {
        Trend::from_samples(self.samples())
    }
}

/// Histories for every device seen so far
///
/// Shared between the scheduled monitor loop and interactive queries; a
/// single mutex serializes writers. The lock is never held across an await.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    devices: Mutex<HashMap<DeviceCategory, DeviceHistory>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(MIN_CAPACITY),
            devices: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<DeviceCategory, DeviceHistory>>, MonitorError> {
        self.devices
            .lock()
            .map_err(|_| MonitorError::StatePoisoned("device history"))
    }

    /// Append one sample, creating the device's history on first use
    pub fn append(&self, category: DeviceCategory, temperature: f64) -> Result<(), MonitorError> {
        let mut devices = self.lock()?;
        devices
            .entry(category)
            .or_insert_with(|| DeviceHistory::new(self.capacity))
            .push(temperature);
        Ok(())
    }

    /// Append one sample and compute the resulting trend under the same lock
    pub fn append_and_trend(
        &self,
        category: DeviceCategory,
        temperature: f64,
    ) -> Result<Trend, MonitorError> {
        let mut devices = self.lock()?;
        let history = devices
            .entry(category)
            .or_insert_with(|| DeviceHistory::new(self.capacity));
        history.push(temperature);
        Ok(history.trend())
    }

    /// Append every reading of a snapshot; absent devices are left untouched
    pub fn record_snapshot(&self, snapshot: &SensorSnapshot) -> Result<(), MonitorError> {
        let mut devices = self.lock()?;
        for reading in snapshot.readings() {
            devices
                .entry(reading.category)
                .or_insert_with(|| DeviceHistory::new(self.capacity))
                .push(reading.temperature);
        }
        Ok(())
    }

    /// Samples for a device, oldest first; empty if never seen
    pub fn get(&self, category: DeviceCategory) -> Result<Vec<f64>, MonitorError> {
        Ok(self
            .lock()?
            .get(&category)
            .map(DeviceHistory::to_vec)
            .unwrap_or_default())
    }

    /// Trend for a device; `Trend::Flat` if never seen
    pub fn trend(&self, category: DeviceCategory) -> Result<Trend, MonitorError> {
        Ok(self
            .lock()?
            .get(&category)
            .map(DeviceHistory::trend)
            .unwrap_or(Trend::Flat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_floor() {
        assert_eq!(DeviceHistory::new(0).capacity(), 2);
        assert_eq!(DeviceHistory::new(1).capacity(), 2);
        assert_eq!(DeviceHistory::new(7).capacity(), 7);
        assert_eq!(HistoryStore::new(1).capacity(), 2);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = DeviceHistory::new(3);
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            history.push(value);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.to_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_huge_capacity_is_not_preallocated() {
        let store = HistoryStore::new(usize::MAX / 2);
        store.append(DeviceCategory::Cpu, 45.0).unwrap();
        store.append(DeviceCategory::Cpu, 46.0).unwrap();

        assert_eq!(store.get(DeviceCategory::Cpu).unwrap(), vec![45.0, 46.0]);
        assert_eq!(store.trend(DeviceCategory::Cpu).unwrap(), Trend::Rising);
    }

    #[test]
    fn test_eviction_beyond_preallocation() {
        let mut history = DeviceHistory::new(PREALLOCATED_SAMPLES + 10);
        for value in 0..(PREALLOCATED_SAMPLES + 20) {
            history.push(value as f64);
        }
        assert_eq!(history.len(), PREALLOCATED_SAMPLES + 10);
        assert_eq!(history.samples().next(), Some(10.0));
    }

    #[test]
    fn test_round_trip_within_capacity() {
        let mut history = DeviceHistory::new(7);
        for value in [40.0, 40.5, 41.2] {
            history.push(value);
        }
        assert_eq!(history.to_vec(), vec![40.0, 40.5, 41.2]);
    }

    #[test]
    fn test_store_creates_histories_lazily() {
        let store = HistoryStore::new(3);
        assert!(store.get(DeviceCategory::Cpu).unwrap().is_empty());
        assert_eq!(store.trend(DeviceCategory::Cpu).unwrap(), Trend::Flat);

        store.append(DeviceCategory::Cpu, 50.0).unwrap();
        assert_eq!(store.get(DeviceCategory::Cpu).unwrap(), vec![50.0]);
        assert!(store.get(DeviceCategory::Nvme).unwrap().is_empty());
    }

    #[test]
    fn test_record_snapshot_leaves_absent_devices_untouched() {
        let store = HistoryStore::new(5);
        store.append(DeviceCategory::Nvme, 38.0).unwrap();

        let snapshot: SensorSnapshot = [(DeviceCategory::Cpu, 45.0), (DeviceCategory::Wifi, 39.0)]
            .into_iter()
            .collect();
        store.record_snapshot(&snapshot).unwrap();

        assert_eq!(store.get(DeviceCategory::Cpu).unwrap(), vec![45.0]);
        assert_eq!(store.get(DeviceCategory::Wifi).unwrap(), vec![39.0]);
        assert_eq!(store.get(DeviceCategory::Nvme).unwrap(), vec![38.0]);
        assert!(store.get(DeviceCategory::Motherboard).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_trend() {
        let store = HistoryStore::new(7);
        assert_eq!(
            store.append_and_trend(DeviceCategory::Cpu, 40.0).unwrap(),
            Trend::Flat
        );
        assert_eq!(
            store.append_and_trend(DeviceCategory::Cpu, 40.5).unwrap(),
            Trend::Rising
        );
        assert_eq!(
            store.append_and_trend(DeviceCategory::Cpu, 41.2).unwrap(),
            Trend::Rising
        );
        assert_eq!(store.get(DeviceCategory::Cpu).unwrap().len(), 3);
    }

    #[test]
    fn test_concurrent_appends_respect_capacity() {
        use std::sync::Arc;

        let store = Arc::new(HistoryStore::new(4));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        store.append(DeviceCategory::Cpu, (i * 100 + j) as f64).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get(DeviceCategory::Cpu).unwrap().len(), 4);
    }
}
