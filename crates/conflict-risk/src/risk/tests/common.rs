use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::risk::domain::{EntityId, Period, RiskInputVector, TimeSeriesRecord};
use crate::risk::scoring::ScoringEngine;
use crate::risk::service::RiskService;
use crate::risk::store::{RiskStore, StoreError};

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::seeded(2024)
}

pub(super) fn record(entity: &str, year: i32, month: u8, inputs: RiskInputVector) -> TimeSeriesRecord {
    TimeSeriesRecord {
        entity_id: EntityId::new(entity),
        period: Period::new(year, month).expect("valid period"),
        inputs,
        assessment: engine().score(&inputs),
    }
}

/// Record whose composite equals `level` because every component is `level`.
pub(super) fn leveled(entity: &str, year: i32, month: u8, level: f64) -> TimeSeriesRecord {
    record(entity, year, month, RiskInputVector::uniform(level))
}

pub(super) fn fleet_records() -> Vec<TimeSeriesRecord> {
    vec![
        leveled("IND", 2022, 6, 45.0),
        leveled("IND", 2024, 3, 62.0),
        leveled("PAK", 2024, 1, 81.0),
        leveled("PAK", 2023, 12, 20.0),
        leveled("CHN", 2024, 2, 58.0),
        leveled("UKR", 2024, 2, 88.0),
        leveled("NOR", 2024, 2, 12.0),
    ]
}

/// Latest record for `entity`; on tied periods the first one seen wins.
pub(super) fn first_latest<'a>(
    records: impl Iterator<Item = &'a TimeSeriesRecord>,
    entity: &EntityId,
) -> Option<&'a TimeSeriesRecord> {
    records
        .filter(|record| &record.entity_id == entity)
        .fold(None::<&'a TimeSeriesRecord>, |latest, record| match latest {
            Some(current) if record.period <= current.period => Some(current),
            _ => Some(record),
        })
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<Vec<TimeSeriesRecord>>,
    fleet_fetches: AtomicUsize,
    range_fetches: AtomicUsize,
}

impl MemoryStore {
    pub(super) fn with_records(records: Vec<TimeSeriesRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub(super) fn push(&self, record: TimeSeriesRecord) {
        self.records.lock().expect("store mutex poisoned").push(record);
    }

    pub(super) fn fleet_fetches(&self) -> usize {
        self.fleet_fetches.load(Ordering::SeqCst)
    }

    pub(super) fn range_fetches(&self) -> usize {
        self.range_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskStore for MemoryStore {
    async fn fetch_latest(
        &self,
        entity: &EntityId,
    ) -> Result<Option<TimeSeriesRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(first_latest(guard.iter(), entity).cloned())
    }

    async fn fetch_range(
        &self,
        entity: &EntityId,
        from_year: i32,
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        self.range_fetches.fetch_add(1, Ordering::SeqCst);
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut records: Vec<_> = guard
            .iter()
            .filter(|record| &record.entity_id == entity && record.period.year >= from_year)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.period);
        Ok(records)
    }

    async fn fetch_all_latest(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        self.fleet_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().expect("store mutex poisoned").clone())
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl RiskStore for UnavailableStore {
    async fn fetch_latest(
        &self,
        _entity: &EntityId,
    ) -> Result<Option<TimeSeriesRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn fetch_range(
        &self,
        _entity: &EntityId,
        _from_year: i32,
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn fetch_all_latest(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (RiskService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_records(fleet_records()));
    let service = RiskService::new(store.clone(), engine(), CacheConfig::default());
    (service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
