use std::sync::Arc;

use async_trait::async_trait;
use conflict_risk::config::CacheConfig;
use conflict_risk::risk::{
    select_latest, tier_stats, EntityId, Period, RiskDatasetImporter, RiskInputVector,
    RiskService, RiskStore, RiskTier, ScenarioOverride, ScoringEngine, StoreError,
    TimeSeriesRecord,
};

struct DatasetStore {
    records: Vec<TimeSeriesRecord>,
}

#[async_trait]
impl RiskStore for DatasetStore {
    async fn fetch_latest(
        &self,
        entity: &EntityId,
    ) -> Result<Option<TimeSeriesRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|record| &record.entity_id == entity)
            .fold(None::<&TimeSeriesRecord>, |latest, record| match latest {
                // First record seen wins on tied periods.
                Some(current) if record.period <= current.period => Some(current),
                _ => Some(record),
            })
            .cloned())
    }

    async fn fetch_range(
        &self,
        entity: &EntityId,
        from_year: i32,
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|record| &record.entity_id == entity && record.period.year >= from_year)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.period);
        Ok(records)
    }

    async fn fetch_all_latest(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Ok(self.records.clone())
    }
}

fn sample_records() -> Vec<TimeSeriesRecord> {
    let data = include_bytes!("../data/risk_timeseries_sample.csv");
    RiskDatasetImporter::from_reader(&data[..], &ScoringEngine::seeded(11))
        .expect("sample dataset imports")
}

fn sample_service() -> RiskService<DatasetStore> {
    let store = Arc::new(DatasetStore {
        records: sample_records(),
    });
    RiskService::new(store, ScoringEngine::seeded(11), CacheConfig::default())
}

#[test]
fn sample_dataset_scores_every_row() {
    let records = sample_records();
    assert_eq!(records.len(), 16);
    assert!(records
        .iter()
        .all(|record| (0.0..=100.0).contains(&record.composite())));
    assert!(records.iter().all(|record| {
        let ci = record.assessment.confidence_interval;
        (3.0..=8.0).contains(&ci)
    }));
}

#[test]
fn latest_snapshot_covers_each_entity_once() {
    let snapshot = select_latest(sample_records());
    assert_eq!(snapshot.len(), 10);

    let ukraine = snapshot.get(&EntityId::new("UKR")).expect("UKR present");
    assert_eq!(ukraine.period, Period { year: 2024, month: 6 });
    assert_eq!(ukraine.tier(), RiskTier::Critical);

    let stats = tier_stats(snapshot.records());
    assert_eq!(stats.total_monitored, 10);
    let counts: Vec<(RiskTier, usize)> = stats
        .by_tier
        .iter()
        .map(|bucket| (bucket.tier, bucket.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            (RiskTier::Low, 3),
            (RiskTier::Moderate, 3),
            (RiskTier::High, 3),
            (RiskTier::Critical, 1),
        ]
    );
}

#[tokio::test]
async fn alerts_list_entities_at_or_above_threshold() {
    let service = sample_service();
    let alerts = service.alerts(None).await.expect("alerts");

    let ids: Vec<&str> = alerts.iter().map(|record| record.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["UKR", "RUS", "PAK", "ISR"]);
    assert!(alerts
        .windows(2)
        .all(|pair| pair[0].composite() >= pair[1].composite()));
}

#[tokio::test]
async fn scenario_against_imported_baseline() {
    let service = sample_service();
    let overrides = ScenarioOverride {
        political_stability_change: Some(20.0),
        alliance_change: Some(10.0),
        ..ScenarioOverride::default()
    };

    let outcome = service
        .simulate(&EntityId::new("PAK"), &overrides)
        .await
        .expect("store reachable")
        .expect("PAK present");

    // political 76 -> 56 (-4.0), alliance 58 -> 48 (-1.5)
    assert_eq!(outcome.delta, -5.5);
    assert!(outcome.simulated.composite < outcome.baseline.composite);
    assert_eq!(outcome.scenario, overrides);
}

#[tokio::test]
async fn compare_returns_latest_records_in_request_order() {
    let service = sample_service();
    let records = service
        .compare(&[EntityId::new("NOR"), EntityId::new("UKR"), EntityId::new("XXX")])
        .await
        .expect("comparison");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].entity_id, EntityId::new("NOR"));
    assert_eq!(records[1].period, Period { year: 2024, month: 6 });
}

#[tokio::test]
async fn tied_periods_resolve_to_first_imported_row() {
    let csv = "entity_id,year,month,military\nIND,2024,6,90\nPAK,2024,6,10\n";
    let mut records = RiskDatasetImporter::from_reader(csv.as_bytes(), &ScoringEngine::seeded(11))
        .expect("dataset imports");
    let mut restated = records[0].clone();
    restated.inputs = RiskInputVector::uniform(10.0);
    restated.assessment = ScoringEngine::seeded(11).score(&restated.inputs);
    records.push(restated);

    let service = RiskService::new(
        Arc::new(DatasetStore { records }),
        ScoringEngine::seeded(11),
        CacheConfig::default(),
    );
    let latest = service
        .latest(&EntityId::new("IND"))
        .await
        .expect("store reachable")
        .expect("IND present");
    assert_eq!(latest.inputs.military, 90.0);

    let snapshot = service.snapshot().await.expect("snapshot");
    let ind = snapshot.get(&EntityId::new("IND")).expect("IND present");
    assert_eq!(ind.inputs.military, 90.0);
}

#[test]
fn direct_scoring_matches_imported_assessment() {
    let engine = ScoringEngine::seeded(5);
    let assessment = engine.score(&RiskInputVector::new(62.0, 46.0, 42.0, 48.0, 54.0, 50.0));
    assert_eq!(assessment.composite, 50.7);
    assert_eq!(assessment.tier, RiskTier::Moderate);
}
