use poolcare_common::{
    Adjustments, Chemical, ChemicalReading, Measurements, RangeConfig, StatusReport, Trend,
    ValidationResult,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::model::ReadingLog;
use crate::model::storage::{
    Clock, ImportMode, KeyValueStore, NamespacedStore, SystemClock, TtlCache, migrate,
};
use crate::module::chemistry::{compute_adjustments, compute_trend, derive_status, validate};

/// Settings the service needs from the application config
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub ranges: RangeConfig,
    pub readings_namespace: String,
    pub cache_namespace: String,
    pub cache_ttl_ms: i64,
}

impl From<&AppConfig> for ServiceOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            ranges: config.ranges.clone(),
            readings_namespace: config.readings_namespace.clone(),
            cache_namespace: config.cache_namespace.clone(),
            cache_ttl_ms: config.cache_ttl_ms,
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Everything computed for a submitted reading
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub reading: ChemicalReading,
    pub validation: ValidationResult,
    pub status: StatusReport,
    pub adjustments: Adjustments,
    /// False when validation failed or the store rejected the write
    pub persisted: bool,
}

/// Reading workflow over one physical store: validate, classify, dose, persist
pub struct PoolService<S: KeyValueStore + Clone, C: Clock = SystemClock> {
    store: S,
    ranges: RangeConfig,
    readings: ReadingLog<S>,
    cache: TtlCache<S, C>,
    cache_ttl_ms: i64,
}

impl<S: KeyValueStore + Clone> PoolService<S, SystemClock> {
    pub fn new(store: S, options: ServiceOptions) -> Self {
        Self::with_clock(store, options, SystemClock)
    }
}

impl<S: KeyValueStore + Clone, C: Clock> PoolService<S, C> {
    pub fn with_clock(store: S, options: ServiceOptions, clock: C) -> Self {
        let readings = ReadingLog::new(NamespacedStore::new(
            store.clone(),
            options.readings_namespace,
        ));
        let cache = TtlCache::with_clock(
            NamespacedStore::new(store.clone(), options.cache_namespace),
            clock,
        );

        Self {
            store,
            ranges: options.ranges,
            readings,
            cache,
            cache_ttl_ms: options.cache_ttl_ms,
        }
    }

    pub fn readings(&self) -> &ReadingLog<S> {
        &self.readings
    }

    /// Validate a partial reading without persisting anything
    pub fn check(&self, measurements: &Measurements) -> ValidationResult {
        validate(measurements, &self.ranges)
    }

    /// Run the full workflow for a new reading.
    ///
    /// Readings with hard validation errors are reported but not stored.
    pub fn submit(&self, reading: ChemicalReading) -> SubmissionReport {
        let validation = validate(&reading.measurements, &self.ranges);
        let status = derive_status(&reading.measurements, &self.ranges);
        let adjustments = compute_adjustments(&reading.measurements, &self.ranges);

        let persisted = if !validation.is_valid {
            warn!(
                "Reading {} rejected: {}",
                reading.id(),
                validation.errors.join("; ")
            );
            false
        } else if reading.measurements.is_empty() {
            warn!("Reading {} has no measurements, not stored", reading.id());
            false
        } else {
            let stored = self.readings.record(&reading);
            if stored {
                self.cache_status(reading.id(), &status);
                info!("Stored reading {} with status {}", reading.id(), status.level);
            }
            stored
        };

        SubmissionReport {
            reading,
            validation,
            status,
            adjustments,
            persisted,
        }
    }

    /// Status of a stored reading, served from the cache when fresh
    pub fn status_of(&self, reading: &ChemicalReading) -> StatusReport {
        let key = status_cache_key(reading.id());
        if let Some(status) = self.cache.get::<StatusReport>(&key) {
            debug!("Status cache hit for {}", reading.id());
            return status;
        }

        let status = derive_status(&reading.measurements, &self.ranges);
        self.cache_status(reading.id(), &status);
        status
    }

    pub fn latest_status(&self) -> Option<(ChemicalReading, StatusReport)> {
        let latest = self.readings.latest()?;
        let status = self.status_of(&latest);
        Some((latest, status))
    }

    pub fn adjustments_for_latest(&self) -> Option<(ChemicalReading, Adjustments)> {
        let latest = self.readings.latest()?;
        let adjustments = compute_adjustments(&latest.measurements, &self.ranges);
        Some((latest, adjustments))
    }

    pub fn trend(&self, chemical: Chemical) -> Trend {
        compute_trend(&self.readings.all(), chemical)
    }

    /// Most recent `count` readings, newest first
    pub fn history(&self, count: usize) -> Vec<ChemicalReading> {
        self.readings.recent(count)
    }

    pub fn delete(&self, id: &str) -> bool {
        let deleted = self.readings.delete(id);
        if deleted {
            self.cache.remove(&status_cache_key(id));
        }
        deleted
    }

    /// A namespaced view over the same physical store
    pub fn namespace(&self, name: &str) -> NamespacedStore<S> {
        NamespacedStore::new(self.store.clone(), name)
    }

    pub fn export(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(name) => self.namespace(name).export(),
            None => self.readings.store().export(),
        }
    }

    /// Import readings previously produced by `export`
    pub fn import(&self, json: &str, mode: ImportMode) -> bool {
        self.readings.store().import(json, mode)
    }

    /// Store every reading, skipping invalid ones; returns how many were stored
    pub fn import_readings(&self, readings: Vec<ChemicalReading>) -> usize {
        readings
            .into_iter()
            .map(|reading| self.submit(reading))
            .filter(|report| report.persisted)
            .count()
    }

    pub fn migrate(&self, from: &str, to: &str, keys: Option<&[&str]>) -> bool {
        migrate(&self.namespace(from), &self.namespace(to), keys)
    }

    /// Evict expired cache entries
    pub fn sweep_cache(&self) -> usize {
        self.cache.clear_expired()
    }

    fn cache_status(&self, id: &str, status: &StatusReport) {
        if !self
            .cache
            .set_with_ttl(&status_cache_key(id), status, self.cache_ttl_ms)
        {
            debug!("Could not cache status for {}", id);
        }
    }
}

fn status_cache_key(id: &str) -> String {
    format!("status:{}", id)
}
