use async_trait::async_trait;

use super::domain::{EntityId, TimeSeriesRecord};

/// Read access to the external time-series store.
///
/// Concurrent fetches carry no ordering guarantee; callers join them before combining results.
#[async_trait]
pub trait RiskStore: Send + Sync {
    async fn fetch_latest(&self, entity: &EntityId)
        -> Result<Option<TimeSeriesRecord>, StoreError>;

    /// Records with `year >= from_year`, ascending by period.
    async fn fetch_range(
        &self,
        entity: &EntityId,
        from_year: i32,
    ) -> Result<Vec<TimeSeriesRecord>, StoreError>;

    /// One or more records per entity, in no particular order.
    async fn fetch_all_latest(&self) -> Result<Vec<TimeSeriesRecord>, StoreError>;
}

/// Store failures. Every variant is transient and safe to retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("risk store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        true
    }
}
