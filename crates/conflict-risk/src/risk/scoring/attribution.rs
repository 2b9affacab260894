use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::{RiskComponent, RiskInputVector};
use super::weights::{round2, weighted_contributions};

/// Percentage share of the composite contributed by each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attribution(BTreeMap<RiskComponent, f64>);

impl Attribution {
    pub fn get(&self, component: RiskComponent) -> f64 {
        self.0.get(&component).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Components ordered by contribution, largest first. Ties keep component order.
    pub fn ranked(&self) -> Vec<(RiskComponent, f64)> {
        let mut ranked: Vec<_> = self.0.iter().map(|(k, v)| (*k, *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskComponent, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

pub fn attribute(inputs: &RiskInputVector) -> Attribution {
    let contributions = weighted_contributions(inputs);
    let total: f64 = contributions.iter().map(|(_, value)| value).sum();
    let denominator = if total == 0.0 { 1.0 } else { total };

    Attribution(
        contributions
            .into_iter()
            .map(|(component, value)| (component, round2(value / denominator * 100.0)))
            .collect(),
    )
}
