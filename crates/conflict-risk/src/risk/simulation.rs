use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{RiskComponent, RiskInputVector, ScenarioOverride};
use super::scoring::{round2, RiskAssessment, ScoringEngine};

/// Baseline and perturbed assessments for one what-if run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub baseline: RiskAssessment,
    pub simulated: RiskAssessment,
    /// `simulated - baseline`; positive values mean escalation.
    pub delta: f64,
    pub scenario: ScenarioOverride,
}

/// Applies the override rules to a copy of `baseline`, reclamping every touched component.
pub fn apply_overrides(baseline: &RiskInputVector, overrides: &ScenarioOverride) -> RiskInputVector {
    let mut modified = baseline.sanitized();

    // GDP moves in either direction add economic stress.
    if let Some(change) = finite(overrides.gdp_change_pct) {
        adjust(&mut modified, RiskComponent::Economic, change.abs() * 2.0);
    }
    if let Some(change) = finite(overrides.military_budget_change_pct) {
        adjust(&mut modified, RiskComponent::Military, change * 1.5);
    }
    if let Some(change) = finite(overrides.political_stability_change) {
        adjust(&mut modified, RiskComponent::Political, -change);
    }
    if let Some(change) = finite(overrides.alliance_change) {
        adjust(&mut modified, RiskComponent::Alliance, -change);
    }

    modified
}

fn finite(value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v),
        Some(v) => {
            tracing::warn!(value = v, "ignoring non-finite scenario override");
            None
        }
        None => None,
    }
}

fn adjust(inputs: &mut RiskInputVector, component: RiskComponent, by: f64) {
    let next = (inputs.get(component) + by).clamp(0.0, 100.0);
    inputs.set(component, next);
}

impl ScoringEngine {
    /// Scores the baseline and the perturbed vector together. Both assessments share one
    /// confidence draw and timestamp, so an empty override reproduces the baseline exactly.
    pub fn simulate(
        &self,
        baseline: &RiskInputVector,
        overrides: &ScenarioOverride,
    ) -> ScenarioOutcome {
        let confidence = self.draw_confidence();
        let computed_at = Utc::now();

        let baseline_assessment = self.assess(baseline, confidence, computed_at);
        let modified = apply_overrides(baseline, overrides);
        let simulated = self.assess(&modified, confidence, computed_at);
        let delta = round2(simulated.composite - baseline_assessment.composite);

        ScenarioOutcome {
            baseline: baseline_assessment,
            simulated,
            delta,
            scenario: *overrides,
        }
    }
}
