use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::domain::{EntityId, RiskTier, TimeSeriesRecord};
use super::scoring::{round2, RiskAssessment};

/// Most recent record per entity, reduced from an unordered time series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestSnapshot {
    records: HashMap<EntityId, TimeSeriesRecord>,
}

impl LatestSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, entity: &EntityId) -> Option<&TimeSeriesRecord> {
        self.records.get(entity)
    }

    pub fn records(&self) -> impl Iterator<Item = &TimeSeriesRecord> {
        self.records.values()
    }

    pub fn assessments(&self) -> HashMap<&EntityId, &RiskAssessment> {
        self.records
            .iter()
            .map(|(entity, record)| (entity, &record.assessment))
            .collect()
    }

    /// Records ordered by composite, highest first.
    pub fn ranked(&self) -> Vec<&TimeSeriesRecord> {
        let mut ranked: Vec<_> = self.records.values().collect();
        sort_descending(&mut ranked);
        ranked
    }
}

/// Single pass with a per-entity running maximum on `(year, month)`.
///
/// When two records for the same entity share a period, the first one encountered is kept.
pub fn select_latest<I>(records: I) -> LatestSnapshot
where
    I: IntoIterator<Item = TimeSeriesRecord>,
{
    let mut latest: HashMap<EntityId, TimeSeriesRecord> = HashMap::new();

    for record in records {
        match latest.entry(record.entity_id.clone()) {
            Entry::Occupied(mut current) => {
                if record.period > current.get().period {
                    current.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    LatestSnapshot { records: latest }
}

/// Records with `composite >= threshold`, highest first. Equal scores order by entity id.
pub fn filter_by_threshold<'a, I>(records: I, threshold: f64) -> Vec<&'a TimeSeriesRecord>
where
    I: IntoIterator<Item = &'a TimeSeriesRecord>,
{
    let mut matching: Vec<_> = records
        .into_iter()
        .filter(|record| record.composite() >= threshold)
        .collect();
    sort_descending(&mut matching);
    matching
}

fn sort_descending(records: &mut [&TimeSeriesRecord]) {
    records.sort_by(|a, b| {
        b.composite()
            .total_cmp(&a.composite())
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBucket {
    pub tier: RiskTier,
    pub count: usize,
    pub mean_composite: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStatistics {
    /// Only tiers that occur, ordered Low to Critical.
    pub by_tier: Vec<TierBucket>,
    pub total_monitored: usize,
}

impl TierStatistics {
    pub fn bucket(&self, tier: RiskTier) -> Option<&TierBucket> {
        self.by_tier.iter().find(|bucket| bucket.tier == tier)
    }
}

pub fn tier_stats<'a, I>(records: I) -> TierStatistics
where
    I: IntoIterator<Item = &'a TimeSeriesRecord>,
{
    let mut sums: BTreeMap<RiskTier, (usize, f64)> = BTreeMap::new();
    let mut entities: HashSet<&EntityId> = HashSet::new();

    for record in records {
        let slot = sums.entry(record.tier()).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += record.composite();
        entities.insert(&record.entity_id);
    }

    let by_tier = sums
        .into_iter()
        .map(|(tier, (count, total))| TierBucket {
            tier,
            count,
            mean_composite: round2(total / count as f64),
        })
        .collect();

    TierStatistics {
        by_tier,
        total_monitored: entities.len(),
    }
}
