//! Conflict-risk scoring, scenario simulation, and fleet aggregation.
//!
//! Scoring, attribution, explanation, and simulation are pure functions over immutable inputs.
//! The only suspension points live behind [`RiskStore`]; everything fleet-wide operates on a
//! snapshot that is fetched once and never mutated.

pub mod cache;
pub mod dataset;
pub mod domain;
pub mod fleet;
pub mod router;
pub mod scoring;
pub mod service;
pub mod simulation;
pub mod store;

#[cfg(test)]
mod tests;

pub use cache::{CacheKey, CacheStats, QueryClass, TtlCache};
pub use dataset::{DatasetImportError, RiskDatasetImporter, SAMPLE_DATASET};
pub use domain::{
    EntityId, Period, RawRiskInputs, RiskComponent, RiskError, RiskInputVector, RiskTier,
    ScenarioOverride, TimeSeriesRecord,
};
pub use fleet::{
    filter_by_threshold, select_latest, tier_stats, LatestSnapshot, TierBucket, TierStatistics,
};
pub use router::risk_router;
pub use scoring::{
    attribute, composite_score, explain, Attribution, ConfidenceSource, FixedConfidence,
    RiskAssessment, ScoringEngine, SeededConfidence, ThreadRngConfidence, MODEL_VERSION, WEIGHTS,
};
pub use service::{RiskService, RiskServiceError, StabilityDimension, StabilityProfile};
pub use simulation::{apply_overrides, ScenarioOutcome};
pub use store::{RiskStore, StoreError};
