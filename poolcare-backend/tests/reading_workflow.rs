use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use poolcare_backend::model::storage::{
    FileStore, ImportMode, KeyValueStore, ManualClock, MemoryStore, NamespacedStore, TtlCache,
    migrate,
};
use poolcare_backend::module::chemistry::{compute_adjustments, compute_trend, derive_status, validate};
use poolcare_backend::module::csv_import::parse_readings_csv;
use poolcare_backend::service::{PoolService, ServiceOptions};
use poolcare_common::{
    AdjustmentAction, Chemical, ChemicalReading, Measurements, PoolStatus, RangeConfig,
    TrendDirection,
};
use tempfile::TempDir;

fn reading_at(hours: i64, measurements: Measurements) -> ChemicalReading {
    let base = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
    ChemicalReading::new(base + Duration::hours(hours), measurements)
}

#[test]
fn test_documented_properties_hold() {
    let ranges = RangeConfig::default();

    // In-band reading
    let report = derive_status(&Measurements::new(2.0, 7.4, 100.0, 80.0), &ranges);
    assert_eq!(report.level, PoolStatus::Excellent);
    assert!(report.issues.is_empty());

    // Exactly one out of band
    let report = derive_status(&Measurements::new(2.0, 7.4, 100.0, 88.0), &ranges);
    assert_eq!(report.level, PoolStatus::Good);

    // pH 15 is a hard error regardless of the rest
    let bad = Measurements::new(2.0, 15.0, 100.0, 80.0);
    assert!(!validate(&bad, &ranges).errors.is_empty());
    assert_eq!(derive_status(&bad, &ranges).level, PoolStatus::Critical);

    // Chlorine 0.5 -> increase by 1.5 ppm
    let low = Measurements {
        chlorine: Some(0.5),
        ..Default::default()
    };
    let adjustment = compute_adjustments(&low, &ranges)
        .remove(&Chemical::Chlorine)
        .unwrap();
    assert_eq!(adjustment.action, AdjustmentAction::Increase);
    assert_eq!(adjustment.amount, 1.5);
    assert_eq!(adjustment.unit, "ppm");

    // 2.0 -> 2.05 is noise
    let chlorine = |value| Measurements {
        chlorine: Some(value),
        ..Default::default()
    };
    let readings = vec![reading_at(0, chlorine(2.0)), reading_at(1, chlorine(2.05))];
    let trend = compute_trend(&readings, Chemical::Chlorine);
    assert_eq!(trend.direction, TrendDirection::Stable);
    assert_eq!(trend.percentage, 0.0);
}

#[test]
fn test_ttl_expiry_removes_physical_entry() {
    let clock = Arc::new(ManualClock::new(1_000));
    let cache = TtlCache::with_clock(NamespacedStore::new(MemoryStore::new(), "cache"), clock.clone());

    assert!(cache.set_with_ttl("k", &"v", 10));
    clock.advance(20);
    assert_eq!(cache.get::<String>("k"), None);
    assert!(!cache.store().has("k"));
}

#[test]
fn test_migrate_three_keys_between_backends() {
    let temp_dir = TempDir::new().unwrap();
    let source = NamespacedStore::new(MemoryStore::new(), "readings");
    for (key, value) in [("a", 1.0), ("b", 7.4), ("c", 100.0)] {
        assert!(source.set(key, &value));
    }

    let file_store = FileStore::open(temp_dir.path().join("target.json")).unwrap();
    let target = NamespacedStore::new(file_store, "readings");

    assert!(migrate(&source, &target, None));
    assert_eq!(target.get_all(), source.get_all());
}

#[test]
fn test_full_workflow_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("poolcare.json");

    let csv = "timestamp,chlorine,ph,alkalinity,temperature,notes
2024-06-15T09:00:00Z,2.0,7.4,100,80,opening
2024-06-16T09:00:00Z,1.0,7.4,100,80,
2024-06-17T09:00:00Z,-1,7.4,100,80,broken strip
2024-06-18T09:00:00Z,oops,7.4,100,80,";

    let first_id = {
        let service = PoolService::new(
            Arc::new(FileStore::open(&path).unwrap()),
            ServiceOptions::default(),
        );
        let summary = parse_readings_csv(csv);
        assert_eq!(summary.skipped_rows, vec![4]);

        // The negative chlorine row parses but fails validation
        assert_eq!(service.import_readings(summary.readings), 2);

        let history = service.history(10);
        assert_eq!(history.len(), 2);
        history[1].id().to_string()
    };

    // Reopen from disk
    let store = Arc::new(FileStore::open(&path).unwrap());
    let service = PoolService::new(store.clone(), ServiceOptions::default());

    let (latest, status) = service.latest_status().unwrap();
    assert_eq!(latest.value(Chemical::Chlorine), Some(1.0));
    assert_eq!(status.level, PoolStatus::Excellent);

    let trend = service.trend(Chemical::Chlorine);
    assert_eq!(trend.direction, TrendDirection::Down);
    assert_eq!(trend.percentage, 50.0);

    // Readings and cached statuses live in separate namespaces of one file
    let keys = store.keys().unwrap();
    assert!(keys.iter().any(|k| k.starts_with("readings:")));
    assert!(keys.iter().any(|k| k.starts_with("cache:status:")));

    // Export into a fresh in-memory service
    let exported = service.export(None);
    let copy = PoolService::new(Arc::new(MemoryStore::new()), ServiceOptions::default());
    assert!(copy.import(&exported, ImportMode::Merge));
    assert_eq!(copy.readings().all(), service.readings().all());

    assert!(service.delete(&first_id));
    assert_eq!(service.history(10).len(), 1);
}

#[test]
fn test_clear_expired_sweeps_once() {
    let clock = Arc::new(ManualClock::new(0));
    let physical = MemoryStore::new();
    let cache = TtlCache::with_clock(NamespacedStore::new(&physical, "cache"), clock.clone());
    let data = NamespacedStore::new(&physical, "readings");
    data.set("untouched", &1);

    for key in ["a", "b", "c"] {
        cache.set_with_ttl(key, &key, 5);
    }
    cache.set_with_ttl("fresh", &"ok", 1_000);
    clock.advance(10);

    assert_eq!(cache.clear_expired(), 3);
    assert_eq!(cache.clear_expired(), 0);
    assert!(cache.has("fresh"));
    assert!(data.has("untouched"));
}
