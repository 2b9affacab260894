use crate::infra::InMemoryRiskStore;
use clap::Args;
use conflict_risk::config::{CacheConfig, EngineConfig};
use conflict_risk::error::AppError;
use conflict_risk::risk::{
    RiskAssessment, RiskInputVector, RiskService, ScenarioOutcome, ScenarioOverride,
    ScoringEngine, StabilityProfile, TierStatistics, TimeSeriesRecord,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Component inputs on the 0-100 scale. Omitted components score as neutral.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ComponentArgs {
    #[arg(long)]
    pub(crate) military: Option<f64>,
    #[arg(long)]
    pub(crate) economic: Option<f64>,
    #[arg(long)]
    pub(crate) political: Option<f64>,
    #[arg(long)]
    pub(crate) alliance: Option<f64>,
    #[arg(long)]
    pub(crate) cyber: Option<f64>,
    #[arg(long)]
    pub(crate) social: Option<f64>,
}

impl ComponentArgs {
    pub(crate) fn to_inputs(&self) -> RiskInputVector {
        let value = |component: Option<f64>| component.unwrap_or(RiskInputVector::NEUTRAL);
        RiskInputVector::new(
            value(self.military),
            value(self.economic),
            value(self.political),
            value(self.alliance),
            value(self.cyber),
            value(self.social),
        )
    }
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ScenarioArgs {
    /// GDP change in percent; growth and contraction both add economic stress
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) gdp_change_pct: Option<f64>,
    /// Military budget change in percent
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) military_budget_change_pct: Option<f64>,
    /// Change in political stability points
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) political_stability_change: Option<f64>,
    /// Change in alliance strength points
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) alliance_change: Option<f64>,
}

impl ScenarioArgs {
    pub(crate) fn to_override(&self) -> ScenarioOverride {
        ScenarioOverride {
            gdp_change_pct: self.gdp_change_pct,
            military_budget_change_pct: self.military_budget_change_pct,
            political_stability_change: self.political_stability_change,
            alliance_change: self.alliance_change,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    #[command(flatten)]
    pub(crate) inputs: ComponentArgs,
    /// Seed the confidence-interval draw for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Print the assessment as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SimulateArgs {
    #[command(flatten)]
    pub(crate) inputs: ComponentArgs,
    #[command(flatten)]
    pub(crate) scenario: ScenarioArgs,
    /// Seed the confidence-interval draw for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct FleetArgs {
    /// CSV dataset to evaluate (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Alert threshold on the composite score
    #[arg(long)]
    pub(crate) threshold: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV dataset to walk through (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Seed the confidence-interval draw for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Number of fleet rows to show in the heatmap
    #[arg(long, default_value_t = 5)]
    pub(crate) top: usize,
}

fn engine_for(seed: Option<u64>) -> ScoringEngine {
    ScoringEngine::from_config(&EngineConfig {
        confidence_seed: seed,
        ..EngineConfig::default()
    })
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let inputs = args.inputs.to_inputs();
    let assessment = engine_for(args.seed).score(&inputs);

    if args.json {
        match serde_json::to_string_pretty(&assessment) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Assessment payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_assessment("Risk assessment", &assessment);
    Ok(())
}

pub(crate) fn run_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let inputs = args.inputs.to_inputs();
    let overrides = args.scenario.to_override();
    if overrides.is_empty() {
        println!("No scenario overrides supplied; simulated score equals the baseline.");
    }

    let outcome = engine_for(args.seed).simulate(&inputs, &overrides);
    render_outcome(&outcome);
    Ok(())
}

pub(crate) async fn run_fleet(args: FleetArgs) -> Result<(), AppError> {
    let service = load_fleet_service(args.dataset, None)?;
    let threshold = args.threshold.unwrap_or(service.alert_threshold());

    let alerts = service.alerts(Some(threshold)).await?;
    render_alerts(&alerts, threshold);

    let stats = service.tier_stats().await?;
    render_tier_stats(&stats);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { dataset, seed, top } = args;

    println!("Conflict risk engine demo");
    let service = load_fleet_service(dataset, seed)?;

    let heatmap = service.heatmap().await?;
    println!("\nFleet heatmap (top {} of {})", top.min(heatmap.len()), heatmap.len());
    for record in heatmap.iter().take(top) {
        println!(
            "  - {} ({}): {:.2} {}",
            record.entity_id,
            record.period,
            record.composite(),
            record.tier()
        );
    }

    let alerts = service.alerts(None).await?;
    render_alerts(&alerts, service.alert_threshold());

    let stats = service.tier_stats().await?;
    render_tier_stats(&stats);

    let Some(leader) = heatmap.first() else {
        println!("\nDataset is empty; nothing further to demonstrate.");
        return Ok(());
    };

    println!();
    render_assessment(
        &format!("Latest assessment for {}", leader.entity_id),
        &leader.assessment,
    );

    if let Some(profile) = service.stability(&leader.entity_id).await? {
        render_stability(&profile);
    }

    let de_escalation = ScenarioOverride {
        military_budget_change_pct: Some(-20.0),
        political_stability_change: Some(10.0),
        ..ScenarioOverride::default()
    };
    if let Some(outcome) = service.simulate(&leader.entity_id, &de_escalation).await? {
        println!("\nDe-escalation scenario for {}", leader.entity_id);
        render_outcome(&outcome);
    }

    let pair: Vec<_> = heatmap
        .iter()
        .take(2)
        .map(|record| record.entity_id.clone())
        .collect();
    if pair.len() == 2 {
        let compared = service.compare(&pair).await?;
        println!("\nComparison");
        for record in &compared {
            println!(
                "  - {}: {:.2} {} | {}",
                record.entity_id,
                record.composite(),
                record.tier(),
                record.assessment.explanation
            );
        }
    }

    Ok(())
}

fn load_fleet_service(
    dataset: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<RiskService<InMemoryRiskStore>, AppError> {
    let engine_config = EngineConfig {
        confidence_seed: seed,
        ..EngineConfig::default()
    };
    let store = InMemoryRiskStore::load(
        dataset.as_deref(),
        &ScoringEngine::from_config(&engine_config),
    )?;
    Ok(RiskService::from_config(
        Arc::new(store),
        &engine_config,
        CacheConfig::default(),
    ))
}

pub(crate) fn render_assessment(title: &str, assessment: &RiskAssessment) {
    println!("{title}");
    println!(
        "- Composite {:.2} | tier {} | confidence +/-{:.2}",
        assessment.composite, assessment.tier, assessment.confidence_interval
    );
    println!("- {}", assessment.explanation);
    println!("Attribution:");
    for (component, share) in assessment.attribution.ranked() {
        println!("  - {}: {:.2}%", component.label(), share);
    }
    println!(
        "- Model {} at {}",
        assessment.model_version,
        assessment.computed_at.to_rfc3339()
    );
}

pub(crate) fn render_outcome(outcome: &ScenarioOutcome) {
    println!(
        "- Baseline {:.2} ({}) -> simulated {:.2} ({})",
        outcome.baseline.composite,
        outcome.baseline.tier,
        outcome.simulated.composite,
        outcome.simulated.tier
    );
    let direction = if outcome.delta > 0.0 {
        "escalation"
    } else if outcome.delta < 0.0 {
        "de-escalation"
    } else {
        "no change"
    };
    println!("- Delta {:+.2} ({direction})", outcome.delta);
    println!("- {}", outcome.simulated.explanation);
}

pub(crate) fn render_alerts(alerts: &[TimeSeriesRecord], threshold: f64) {
    println!("\nAlerts at or above {threshold:.2}");
    if alerts.is_empty() {
        println!("  none");
        return;
    }
    for record in alerts {
        println!(
            "  - {} ({}): {:.2} {}",
            record.entity_id,
            record.period,
            record.composite(),
            record.tier()
        );
    }
}

pub(crate) fn render_tier_stats(stats: &TierStatistics) {
    println!("\nTier statistics ({} entities monitored)", stats.total_monitored);
    for bucket in &stats.by_tier {
        println!(
            "  - {}: {} entities | mean composite {:.2}",
            bucket.tier, bucket.count, bucket.mean_composite
        );
    }
}

fn render_stability(profile: &StabilityProfile) {
    println!("Stability radar ({})", profile.period);
    for dimension in &profile.radar {
        println!("  - {}: {:.1}", dimension.dimension, dimension.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflict_risk::risk::RiskTier;

    #[test]
    fn omitted_components_default_to_neutral() {
        let args = ComponentArgs {
            military: Some(80.0),
            ..ComponentArgs::default()
        };
        let inputs = args.to_inputs();
        assert_eq!(inputs.military, 80.0);
        assert_eq!(inputs.social, RiskInputVector::NEUTRAL);
    }

    #[test]
    fn scenario_flags_map_to_override() {
        let args = ScenarioArgs {
            alliance_change: Some(-5.0),
            ..ScenarioArgs::default()
        };
        let overrides = args.to_override();
        assert_eq!(overrides.alliance_change, Some(-5.0));
        assert!(overrides.gdp_change_pct.is_none());
        assert!(ScenarioArgs::default().to_override().is_empty());
    }

    #[test]
    fn seeded_engine_is_reproducible() {
        let inputs = RiskInputVector::new(80.0, 70.0, 60.0, 50.0, 40.0, 30.0);
        let left = engine_for(Some(4)).score(&inputs);
        let right = engine_for(Some(4)).score(&inputs);
        assert_eq!(left.confidence_interval, right.confidence_interval);
        assert_eq!(left.tier, RiskTier::High);
    }

    #[tokio::test]
    async fn fleet_service_uses_configured_default_threshold() {
        let service = load_fleet_service(None, Some(2)).expect("sample loads");
        assert_eq!(service.alert_threshold(), EngineConfig::DEFAULT_ALERT_THRESHOLD);
        let alerts = service.alerts(None).await.expect("alerts");
        assert_eq!(alerts.len(), 4);
    }

    #[tokio::test]
    async fn demo_runs_against_bundled_sample() {
        run_demo(DemoArgs {
            dataset: None,
            seed: Some(3),
            top: 3,
        })
        .await
        .expect("demo completes");
    }
}
