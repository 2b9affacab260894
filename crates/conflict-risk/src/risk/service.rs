use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tokio::task::JoinSet;

use super::cache::{CacheKey, QueryClass, TtlCache};
use super::domain::{
    EntityId, Period, RiskComponent, RiskInputVector, RiskTier, ScenarioOverride,
    TimeSeriesRecord,
};
use super::fleet::{filter_by_threshold, select_latest, tier_stats, LatestSnapshot, TierStatistics};
use super::scoring::{RiskAssessment, ScoringEngine};
use super::simulation::ScenarioOutcome;
use super::store::{RiskStore, StoreError};
use crate::config::{CacheConfig, EngineConfig};

const SNAPSHOT_SHAPE: &str = "fleet:latest";

/// Service composing the external store, the scoring engine, and the read-through cache.
pub struct RiskService<S> {
    store: Arc<S>,
    engine: Arc<ScoringEngine>,
    snapshots: TtlCache<Arc<LatestSnapshot>>,
    histories: TtlCache<Arc<Vec<TimeSeriesRecord>>>,
    alert_threshold: f64,
}

impl<S> RiskService<S>
where
    S: RiskStore + 'static,
{
    pub fn new(store: Arc<S>, engine: ScoringEngine, cache: CacheConfig) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
            snapshots: TtlCache::new(cache.clone()),
            histories: TtlCache::new(cache),
            alert_threshold: EngineConfig::DEFAULT_ALERT_THRESHOLD,
        }
    }

    pub fn from_config(store: Arc<S>, engine: &EngineConfig, cache: CacheConfig) -> Self {
        Self::new(store, ScoringEngine::from_config(engine), cache)
            .with_alert_threshold(engine.alert_threshold)
    }

    pub fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.alert_threshold = threshold;
        self
    }

    pub fn alert_threshold(&self) -> f64 {
        self.alert_threshold
    }

    pub fn score(&self, inputs: &RiskInputVector) -> RiskAssessment {
        self.engine.score(inputs)
    }

    /// Latest record for an entity; `None` when the store has nothing for it.
    pub async fn latest(
        &self,
        entity: &EntityId,
    ) -> Result<Option<TimeSeriesRecord>, RiskServiceError> {
        let record = self
            .store
            .fetch_latest(entity)
            .await
            .map_err(|err| log_store_error("fetch_latest", err))?;
        Ok(record)
    }

    /// Scenario run against the entity's latest inputs.
    pub async fn simulate(
        &self,
        entity: &EntityId,
        overrides: &ScenarioOverride,
    ) -> Result<Option<ScenarioOutcome>, RiskServiceError> {
        let Some(record) = self.latest(entity).await? else {
            return Ok(None);
        };

        let outcome = self.engine.simulate(&record.inputs, overrides);
        tracing::info!(
            entity = %entity,
            baseline = outcome.baseline.composite,
            simulated = outcome.simulated.composite,
            delta = outcome.delta,
            "scenario simulated"
        );
        Ok(Some(outcome))
    }

    pub async fn stability(
        &self,
        entity: &EntityId,
    ) -> Result<Option<StabilityProfile>, RiskServiceError> {
        Ok(self
            .latest(entity)
            .await?
            .map(|record| StabilityProfile::from_record(&record)))
    }

    /// Records from the last `years` calendar years, ascending by period.
    ///
    /// `None` when the store has no record at all for the entity.
    pub async fn history(
        &self,
        entity: &EntityId,
        years: u32,
    ) -> Result<Option<Arc<Vec<TimeSeriesRecord>>>, RiskServiceError> {
        let years = i32::try_from(years).map_err(|_| {
            RiskServiceError::InvalidRequest(format!("history window of {years} years is too large"))
        })?;
        let from_year = Utc::now().year().saturating_sub(years);
        self.history_since(entity, from_year).await
    }

    pub async fn history_since(
        &self,
        entity: &EntityId,
        from_year: i32,
    ) -> Result<Option<Arc<Vec<TimeSeriesRecord>>>, RiskServiceError> {
        let key = CacheKey::new(QueryClass::History, format!("history:{entity}:{from_year}"));
        if let Some(cached) = self.histories.get(&key).await {
            return Ok(Some(cached));
        }

        let records = self
            .store
            .fetch_range(entity, from_year)
            .await
            .map_err(|err| log_store_error("fetch_range", err))?;

        // Unknown entities are never cached.
        if records.is_empty() && self.latest(entity).await?.is_none() {
            return Ok(None);
        }

        Ok(Some(self.histories.insert(key, Arc::new(records)).await))
    }

    /// Latest records for at least two entities, in request order. Unknown ids are omitted.
    pub async fn compare(
        &self,
        entities: &[EntityId],
    ) -> Result<Vec<TimeSeriesRecord>, RiskServiceError> {
        let mut requested: Vec<EntityId> = Vec::new();
        for entity in entities {
            if !requested.contains(entity) {
                requested.push(entity.clone());
            }
        }
        if requested.len() < 2 {
            return Err(RiskServiceError::InvalidRequest(
                "provide at least 2 distinct entity ids".to_string(),
            ));
        }

        let mut fetches = JoinSet::new();
        for (index, entity) in requested.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            fetches.spawn(async move { (index, store.fetch_latest(&entity).await) });
        }

        // Join everything before combining; completion order is arbitrary.
        let mut found: Vec<(usize, TimeSeriesRecord)> = Vec::new();
        while let Some(joined) = fetches.join_next().await {
            let (index, result) = joined?;
            if let Some(record) = result.map_err(|err| log_store_error("fetch_latest", err))? {
                found.push((index, record));
            }
        }

        found.sort_by_key(|(index, _)| *index);
        Ok(found.into_iter().map(|(_, record)| record).collect())
    }

    /// Latest-per-entity view of the whole fleet, cached as a fleet query.
    pub async fn snapshot(&self) -> Result<Arc<LatestSnapshot>, RiskServiceError> {
        let key = CacheKey::new(QueryClass::Fleet, SNAPSHOT_SHAPE);
        if let Some(cached) = self.snapshots.get(&key).await {
            return Ok(cached);
        }

        let records = self
            .store
            .fetch_all_latest()
            .await
            .map_err(|err| log_store_error("fetch_all_latest", err))?;
        let snapshot = Arc::new(select_latest(records));
        tracing::debug!(entities = snapshot.len(), "fleet snapshot refreshed");
        Ok(self.snapshots.insert(key, snapshot).await)
    }

    pub async fn heatmap(&self) -> Result<Vec<TimeSeriesRecord>, RiskServiceError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.ranked().into_iter().cloned().collect())
    }

    /// Entities at or above `threshold` (the configured default when `None`), highest first.
    pub async fn alerts(
        &self,
        threshold: Option<f64>,
    ) -> Result<Vec<TimeSeriesRecord>, RiskServiceError> {
        let threshold = threshold.unwrap_or(self.alert_threshold);
        if !threshold.is_finite() {
            return Err(RiskServiceError::InvalidRequest(
                "threshold must be a finite number".to_string(),
            ));
        }

        let snapshot = self.snapshot().await?;
        Ok(filter_by_threshold(snapshot.records(), threshold)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn tier_stats(&self) -> Result<TierStatistics, RiskServiceError> {
        let snapshot = self.snapshot().await?;
        Ok(tier_stats(snapshot.records()))
    }
}

fn log_store_error(operation: &'static str, err: StoreError) -> RiskServiceError {
    tracing::warn!(operation, error = %err, "risk store call failed");
    RiskServiceError::Store(err)
}

/// Stability is the complement of risk per dimension (`100 - input`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityProfile {
    pub entity_id: EntityId,
    pub period: Period,
    pub composite: f64,
    pub tier: RiskTier,
    pub radar: Vec<StabilityDimension>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityDimension {
    pub component: RiskComponent,
    pub dimension: &'static str,
    pub score: f64,
}

impl StabilityProfile {
    pub fn from_record(record: &TimeSeriesRecord) -> Self {
        let radar = record
            .inputs
            .components()
            .map(|(component, value)| StabilityDimension {
                component,
                dimension: component.dimension(),
                score: ((100.0 - value) * 10.0).round() / 10.0,
            })
            .collect();

        Self {
            entity_id: record.entity_id.clone(),
            period: record.period,
            composite: record.composite(),
            tier: record.tier(),
            radar,
        }
    }
}

/// Error raised by the risk service.
#[derive(Debug, thiserror::Error)]
pub enum RiskServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("store fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RiskServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RiskServiceError::Store(err) => err.is_retryable(),
            RiskServiceError::InvalidRequest(_) | RiskServiceError::Task(_) => false,
        }
    }
}
