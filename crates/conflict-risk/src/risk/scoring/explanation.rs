use super::super::domain::{RiskComponent, RiskInputVector, RiskTier};

const SALIENCE_THRESHOLD: f64 = 55.0;
const MAX_DRIVERS: usize = 3;

/// Components whose raw input exceeds the salience threshold, highest first, at most three.
pub fn salient_drivers(inputs: &RiskInputVector) -> Vec<RiskComponent> {
    let mut ranked: Vec<(RiskComponent, f64)> = inputs.components().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .filter(|(_, value)| *value > SALIENCE_THRESHOLD)
        .take(MAX_DRIVERS)
        .map(|(component, _)| component)
        .collect()
}

pub fn explain(inputs: &RiskInputVector, tier: RiskTier) -> String {
    let drivers = salient_drivers(inputs);
    if drivers.is_empty() {
        return format!("Country is at {tier} risk with generally stable indicators.");
    }

    let labels = drivers
        .iter()
        .map(|component| component.label())
        .collect::<Vec<_>>()
        .join(", ")
        .to_lowercase();
    format!("{tier} risk driven primarily by {labels}.")
}
