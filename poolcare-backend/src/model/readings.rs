use poolcare_common::ChemicalReading;
use tracing::{debug, warn};

use super::storage::{KeyValueStore, NamespacedStore};

/// Default namespace for persisted readings
pub const DEFAULT_READINGS_NAMESPACE: &str = "readings";

/// Append-only history of readings, one entry per reading id
pub struct ReadingLog<S: KeyValueStore> {
    store: NamespacedStore<S>,
}

impl<S: KeyValueStore> ReadingLog<S> {
    pub fn new(store: NamespacedStore<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NamespacedStore<S> {
        &self.store
    }

    /// Persist a new reading; an existing id is never overwritten
    pub fn record(&self, reading: &ChemicalReading) -> bool {
        if self.store.has(reading.id()) {
            warn!("Reading {} already recorded, ignoring", reading.id());
            return false;
        }
        let ok = self.store.set(reading.id(), reading);
        if ok {
            debug!("Recorded reading {} at {}", reading.id(), reading.timestamp);
        }
        ok
    }

    pub fn get(&self, id: &str) -> Option<ChemicalReading> {
        self.store.get(id, None)
    }

    pub fn delete(&self, id: &str) -> bool {
        if !self.store.has(id) {
            return false;
        }
        self.store.remove(id)
    }

    /// Every readable reading, oldest first
    pub fn all(&self) -> Vec<ChemicalReading> {
        let mut readings: Vec<ChemicalReading> = self
            .store
            .get_all_keys()
            .iter()
            .filter_map(|key| self.get(key))
            .collect();
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        readings
    }

    /// The `count` most recent readings, newest first
    pub fn recent(&self, count: usize) -> Vec<ChemicalReading> {
        let mut readings = self.all();
        readings.reverse();
        readings.truncate(count);
        readings
    }

    pub fn latest(&self) -> Option<ChemicalReading> {
        self.all().pop()
    }

    pub fn len(&self) -> usize {
        self.store.get_all_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use poolcare_common::Measurements;

    fn log() -> ReadingLog<MemoryStore> {
        ReadingLog::new(NamespacedStore::new(MemoryStore::new(), DEFAULT_READINGS_NAMESPACE))
    }

    fn reading(hours: i64, chlorine: f64) -> ChemicalReading {
        let base = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        ChemicalReading::new(
            base + Duration::hours(hours),
            Measurements {
                chlorine: Some(chlorine),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_record_and_get() {
        let log = log();
        let r = reading(0, 2.0).with_notes("morning");
        assert!(log.record(&r));
        assert_eq!(log.get(r.id()), Some(r));
    }

    #[test]
    fn test_record_is_append_only() {
        let log = log();
        let r = reading(0, 2.0);
        assert!(log.record(&r));

        let mut altered = r.clone();
        altered.measurements.chlorine = Some(9.0);
        assert!(!log.record(&altered));
        assert_eq!(log.get(r.id()).unwrap().measurements.chlorine, Some(2.0));
    }

    #[test]
    fn test_history_ordering() {
        let log = log();
        let later = reading(5, 3.0);
        let earlier = reading(1, 1.0);
        let middle = reading(3, 2.0);
        for r in [&later, &earlier, &middle] {
            log.record(r);
        }

        let all: Vec<f64> = log.all().iter().filter_map(|r| r.measurements.chlorine).collect();
        assert_eq!(all, vec![1.0, 2.0, 3.0]);
        assert_eq!(log.latest().unwrap().id(), later.id());

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id(), later.id());
        assert_eq!(recent[1].id(), middle.id());
    }

    #[test]
    fn test_delete() {
        let log = log();
        let r = reading(0, 2.0);
        log.record(&r);
        assert!(log.delete(r.id()));
        assert!(!log.delete(r.id()));
        assert!(log.is_empty());
    }
}
