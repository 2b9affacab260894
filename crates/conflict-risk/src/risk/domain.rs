use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scoring::RiskAssessment;

/// Identifier wrapper for a monitored entity (an ISO country code in practice).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Canonical form: invisible characters stripped, whitespace collapsed, upper-cased.
    pub fn normalized(raw: &str) -> Self {
        let cleaned = raw.replace(['\u{feff}', '\u{200b}'], "");
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(collapsed.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The six sub-domains feeding the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskComponent {
    Military,
    Economic,
    Political,
    Alliance,
    Cyber,
    Social,
}

impl RiskComponent {
    pub const ALL: [RiskComponent; 6] = [
        RiskComponent::Military,
        RiskComponent::Economic,
        RiskComponent::Political,
        RiskComponent::Alliance,
        RiskComponent::Cyber,
        RiskComponent::Social,
    ];

    /// Wire key used in attribution maps and CSV headers.
    pub fn key(self) -> &'static str {
        match self {
            RiskComponent::Military => "military",
            RiskComponent::Economic => "economic",
            RiskComponent::Political => "political",
            RiskComponent::Alliance => "alliance",
            RiskComponent::Cyber => "cyber",
            RiskComponent::Social => "social",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskComponent::Military => "Military Escalation",
            RiskComponent::Economic => "Economic Stress",
            RiskComponent::Political => "Political Instability",
            RiskComponent::Alliance => "Border & Alliance Tensions",
            RiskComponent::Cyber => "Cyber Vulnerability",
            RiskComponent::Social => "Social Unrest",
        }
    }

    /// Short dimension name used by the stability radar.
    pub fn dimension(self) -> &'static str {
        match self {
            RiskComponent::Military => "Military",
            RiskComponent::Economic => "Economic",
            RiskComponent::Political => "Political",
            RiskComponent::Alliance => "Alliance",
            RiskComponent::Cyber => "Cyber",
            RiskComponent::Social => "Social",
        }
    }
}

/// Fixed-schema risk inputs. Every component is kept inside `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputVector {
    pub military: f64,
    pub economic: f64,
    pub political: f64,
    pub alliance: f64,
    pub cyber: f64,
    pub social: f64,
}

impl RiskInputVector {
    pub const NEUTRAL: f64 = 50.0;

    pub fn new(
        military: f64,
        economic: f64,
        political: f64,
        alliance: f64,
        cyber: f64,
        social: f64,
    ) -> Self {
        Self {
            military,
            economic,
            political,
            alliance,
            cyber,
            social,
        }
    }

    pub fn neutral() -> Self {
        Self::uniform(Self::NEUTRAL)
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value, value, value)
    }

    pub fn get(&self, component: RiskComponent) -> f64 {
        match component {
            RiskComponent::Military => self.military,
            RiskComponent::Economic => self.economic,
            RiskComponent::Political => self.political,
            RiskComponent::Alliance => self.alliance,
            RiskComponent::Cyber => self.cyber,
            RiskComponent::Social => self.social,
        }
    }

    pub fn set(&mut self, component: RiskComponent, value: f64) {
        let slot = match component {
            RiskComponent::Military => &mut self.military,
            RiskComponent::Economic => &mut self.economic,
            RiskComponent::Political => &mut self.political,
            RiskComponent::Alliance => &mut self.alliance,
            RiskComponent::Cyber => &mut self.cyber,
            RiskComponent::Social => &mut self.social,
        };
        *slot = value;
    }

    pub fn components(&self) -> impl Iterator<Item = (RiskComponent, f64)> + '_ {
        RiskComponent::ALL
            .into_iter()
            .map(move |component| (component, self.get(component)))
    }

    /// Replaces non-finite or out-of-range components with the neutral default.
    pub fn sanitized(&self) -> Self {
        let mut clean = *self;
        for component in RiskComponent::ALL {
            let value = self.get(component);
            if let Err(err) = check_range(component, value) {
                tracing::warn!(%err, "substituting neutral risk input");
                clean.set(component, Self::NEUTRAL);
            }
        }
        clean
    }

    /// Validates loosely-typed boundary input once, falling back to the neutral default.
    pub fn from_raw(raw: &RawRiskInputs) -> Self {
        let mut vector = Self::neutral();
        for component in RiskComponent::ALL {
            match coerce_component(component, raw.get(component)) {
                Ok(Some(value)) => vector.set(component, value),
                Ok(None) => {}
                Err(err) => tracing::warn!(%err, "substituting neutral risk input"),
            }
        }
        vector
    }
}

impl Default for RiskInputVector {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Boundary representation of caller-supplied inputs before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRiskInputs {
    #[serde(default, alias = "militaryRisk")]
    pub military: Option<Value>,
    #[serde(default, alias = "economicRisk")]
    pub economic: Option<Value>,
    #[serde(default, alias = "politicalRisk")]
    pub political: Option<Value>,
    #[serde(default, alias = "allianceRisk")]
    pub alliance: Option<Value>,
    #[serde(default, alias = "cyberRisk")]
    pub cyber: Option<Value>,
    #[serde(default, alias = "socialRisk")]
    pub social: Option<Value>,
}

impl RawRiskInputs {
    fn get(&self, component: RiskComponent) -> Option<&Value> {
        match component {
            RiskComponent::Military => self.military.as_ref(),
            RiskComponent::Economic => self.economic.as_ref(),
            RiskComponent::Political => self.political.as_ref(),
            RiskComponent::Alliance => self.alliance.as_ref(),
            RiskComponent::Cyber => self.cyber.as_ref(),
            RiskComponent::Social => self.social.as_ref(),
        }
    }
}

/// Absent and `null` yield `Ok(None)`; anything unusable is an `InvalidInput`.
pub(crate) fn coerce_component(
    component: RiskComponent,
    value: Option<&Value>,
) -> Result<Option<f64>, RiskError> {
    let number = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let number = number.ok_or_else(|| RiskError::InvalidInput {
        component,
        reason: "value is not numeric".to_string(),
    })?;
    check_range(component, number)?;
    Ok(Some(number))
}

fn check_range(component: RiskComponent, value: f64) -> Result<(), RiskError> {
    if !value.is_finite() {
        return Err(RiskError::InvalidInput {
            component,
            reason: format!("{value} is not finite"),
        });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(RiskError::InvalidInput {
            component,
            reason: format!("{value} is outside 0-100"),
        });
    }
    Ok(())
}

/// Ordered classification bucket derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Moderate,
        RiskTier::High,
        RiskTier::Critical,
    ];

    /// Thresholds: [0,30) Low, [30,60) Moderate, [60,80) High, [80,100] Critical.
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskTier::Low
        } else if score < 60.0 {
            RiskTier::Moderate
        } else if score < 80.0 {
            RiskTier::High
        } else {
            RiskTier::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Moderate => "Moderate",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hypothetical perturbation applied before rescoring. Unset fields are no-ops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverride {
    #[serde(default, alias = "gdpChangePct", skip_serializing_if = "Option::is_none")]
    pub gdp_change_pct: Option<f64>,
    #[serde(
        default,
        alias = "militaryBudgetChangePct",
        skip_serializing_if = "Option::is_none"
    )]
    pub military_budget_change_pct: Option<f64>,
    #[serde(
        default,
        alias = "politicalStabilityChange",
        skip_serializing_if = "Option::is_none"
    )]
    pub political_stability_change: Option<f64>,
    #[serde(default, alias = "allianceChange", skip_serializing_if = "Option::is_none")]
    pub alliance_change: Option<f64>,
}

impl ScenarioOverride {
    pub fn is_empty(&self) -> bool {
        self.gdp_change_pct.is_none()
            && self.military_budget_change_pct.is_none()
            && self.political_stability_change.is_none()
            && self.alliance_change.is_none()
    }
}

/// Reporting period; ordering is year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u8,
}

impl Period {
    pub fn new(year: i32, month: u8) -> Result<Self, RiskError> {
        if !(1..=12).contains(&month) {
            return Err(RiskError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// One scored observation for an entity in a given period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub entity_id: EntityId,
    #[serde(flatten)]
    pub period: Period,
    pub inputs: RiskInputVector,
    pub assessment: RiskAssessment,
}

impl TimeSeriesRecord {
    pub fn composite(&self) -> f64 {
        self.assessment.composite
    }

    pub fn tier(&self) -> RiskTier {
        self.assessment.tier
    }
}

/// Domain-level validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("invalid {} input: {reason}", .component.key())]
    InvalidInput {
        component: RiskComponent,
        reason: String,
    },
    #[error("invalid period {year}-{month}: month must be within 1-12")]
    InvalidPeriod { year: i32, month: u8 },
}
