mod attribution;
mod confidence;
mod explanation;
mod weights;

pub use attribution::{attribute, Attribution};
pub use confidence::{
    ConfidenceSource, FixedConfidence, SeededConfidence, ThreadRngConfidence, CONFIDENCE_MAX,
    CONFIDENCE_MIN,
};
pub use explanation::{explain, salient_drivers};
pub use weights::{weight, WEIGHTS};

pub(crate) use weights::round2;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{RiskInputVector, RiskTier};
use crate::config::EngineConfig;

pub const MODEL_VERSION: &str = "rule_based_v1.0";

/// Weighted composite, clamped to `[0, 100]` and rounded to two decimals.
pub fn composite_score(inputs: &RiskInputVector) -> f64 {
    let raw: f64 = weights::weighted_contributions(inputs)
        .iter()
        .map(|(_, value)| value)
        .sum();
    round2(raw.clamp(0.0, 100.0))
}

/// Immutable output of a scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub composite: f64,
    pub tier: RiskTier,
    pub attribution: Attribution,
    pub explanation: String,
    pub confidence_interval: f64,
    pub model_version: String,
    pub computed_at: DateTime<Utc>,
}

/// Stateless scorer; the only injected collaborator is the confidence source.
#[derive(Clone)]
pub struct ScoringEngine {
    confidence: Arc<dyn ConfidenceSource>,
}

impl ScoringEngine {
    pub fn new(confidence: Arc<dyn ConfidenceSource>) -> Self {
        Self { confidence }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Arc::new(SeededConfidence::new(seed)))
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        match config.confidence_seed {
            Some(seed) => Self::seeded(seed),
            None => Self::default(),
        }
    }

    pub fn score(&self, inputs: &RiskInputVector) -> RiskAssessment {
        self.assess(inputs, self.confidence.draw(), Utc::now())
    }

    pub(crate) fn draw_confidence(&self) -> f64 {
        self.confidence.draw()
    }

    /// Scores with caller-supplied nondeterministic fields so paired assessments can share them.
    pub(crate) fn assess(
        &self,
        inputs: &RiskInputVector,
        confidence_interval: f64,
        computed_at: DateTime<Utc>,
    ) -> RiskAssessment {
        let inputs = inputs.sanitized();
        let composite = composite_score(&inputs);
        let tier = RiskTier::from_score(composite);

        RiskAssessment {
            composite,
            tier,
            attribution: attribute(&inputs),
            explanation: explain(&inputs, tier),
            confidence_interval,
            model_version: MODEL_VERSION.to_string(),
            computed_at,
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngConfidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_vector_scores_fifty() {
        let engine = ScoringEngine::new(Arc::new(FixedConfidence(5.0)));
        let assessment = engine.score(&RiskInputVector::neutral());
        assert_eq!(assessment.composite, 50.0);
        assert_eq!(assessment.tier, RiskTier::Moderate);
        assert_eq!(assessment.confidence_interval, 5.0);
        assert_eq!(assessment.model_version, MODEL_VERSION);
    }

    #[test]
    fn composite_is_clamped_and_rounded() {
        assert_eq!(composite_score(&RiskInputVector::uniform(100.0)), 100.0);
        assert_eq!(composite_score(&RiskInputVector::uniform(0.0)), 0.0);
        let inputs = RiskInputVector::new(33.33, 33.33, 33.33, 33.33, 33.33, 33.33);
        assert_eq!(composite_score(&inputs), 33.33);
    }

    #[test]
    fn seeded_engines_agree_on_confidence() {
        let inputs = RiskInputVector::new(80.0, 70.0, 60.0, 50.0, 40.0, 30.0);
        let left = ScoringEngine::seeded(9).score(&inputs);
        let right = ScoringEngine::seeded(9).score(&inputs);
        assert_eq!(left.confidence_interval, right.confidence_interval);
        assert_eq!(left.composite, 60.5);
    }

    #[test]
    fn invalid_components_are_scored_as_neutral() {
        let engine = ScoringEngine::seeded(1);
        let inputs = RiskInputVector::new(f64::NAN, 50.0, 250.0, 50.0, -1.0, 50.0);
        let assessment = engine.score(&inputs);
        assert_eq!(assessment.composite, 50.0);
        assert_eq!(assessment.tier, RiskTier::Moderate);
    }
}
