use async_trait::async_trait;
use conflict_risk::error::AppError;
use conflict_risk::risk::{
    EntityId, RiskDatasetImporter, RiskStore, ScoringEngine, StoreError, TimeSeriesRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Append-only time series held in process memory.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRiskStore {
    records: Arc<Mutex<Vec<TimeSeriesRecord>>>,
}

impl InMemoryRiskStore {
    pub(crate) fn new(records: Vec<TimeSeriesRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// Imports `dataset` when given, otherwise the bundled sample fleet.
    pub(crate) fn load(dataset: Option<&Path>, engine: &ScoringEngine) -> Result<Self, AppError> {
        let records = match dataset {
            Some(path) => RiskDatasetImporter::from_path(path, engine)?,
            None => RiskDatasetImporter::sample(engine)?,
        };
        Ok(Self::new(records))
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<TimeSeriesRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("risk store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl RiskStore for InMemoryRiskStore {
    async fn fetch_latest(
        &self,
        entity: &EntityId,
    ) -> Result<Option<TimeSeriesRecord>, StoreError> {
        let guard = self.lock()?;
        // Ties on period keep the earliest appended record.
        let mut latest: Option<&TimeSeriesRecord> = None;
        for record in guard.iter().filter(|record| &record.entity_id == entity) {
            if latest.map_or(true, |current| record.period > current.period) {
                latest = Some(record);
            }
        }
        Ok(latest.cloned())
    }

    async fn fetch_range(
        &self,
        entity: &EntityId,
        from_year: i32,
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        let guard = self.lock()?;
        let mut records: Vec<_> = guard
            .iter()
            .filter(|record| &record.entity_id == entity && record.period.year >= from_year)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.period);
        Ok(records)
    }

    async fn fetch_all_latest(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }
}
