use super::super::domain::{RiskComponent, RiskInputVector};

/// Fixed weight table. The weights sum to exactly 1.0.
pub const WEIGHTS: [(RiskComponent, f64); 6] = [
    (RiskComponent::Military, 0.25),
    (RiskComponent::Economic, 0.20),
    (RiskComponent::Political, 0.20),
    (RiskComponent::Alliance, 0.15),
    (RiskComponent::Cyber, 0.10),
    (RiskComponent::Social, 0.10),
];

pub fn weight(component: RiskComponent) -> f64 {
    WEIGHTS
        .iter()
        .find(|(candidate, _)| *candidate == component)
        .map(|(_, weight)| *weight)
        .unwrap_or(0.0)
}

/// `weight_i * input_i` for every component, in table order.
pub(crate) fn weighted_contributions(inputs: &RiskInputVector) -> [(RiskComponent, f64); 6] {
    WEIGHTS.map(|(component, weight)| (component, weight * inputs.get(component)))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = WEIGHTS.iter().map(|(_, weight)| weight).sum();
        assert!((total - 1.0).abs() < 1e-9, "weights summed to {total}");
    }

    #[test]
    fn every_component_has_a_weight() {
        for component in RiskComponent::ALL {
            assert!(weight(component) > 0.0, "{component:?} missing weight");
        }
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(60.499_999_999), 60.5);
        assert_eq!(round2(29.994), 29.99);
        assert_eq!(round2(-0.004), 0.0);
    }
}
