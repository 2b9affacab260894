mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::domain::{EntityId, Period, RiskError, TimeSeriesRecord};
use super::scoring::ScoringEngine;

#[derive(Debug)]
pub enum DatasetImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidPeriod { line: u64, source: RiskError },
    DuplicatePeriod { line: u64, entity_id: EntityId, period: Period },
}

impl std::fmt::Display for DatasetImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetImportError::Io(err) => write!(f, "failed to read risk dataset: {}", err),
            DatasetImportError::Csv(err) => write!(f, "invalid risk dataset CSV: {}", err),
            DatasetImportError::InvalidPeriod { line, source } => {
                write!(f, "line {}: {}", line, source)
            }
            DatasetImportError::DuplicatePeriod {
                line,
                entity_id,
                period,
            } => write!(
                f,
                "line {}: {} already has a record for {}",
                line, entity_id, period
            ),
        }
    }
}

impl std::error::Error for DatasetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetImportError::Io(err) => Some(err),
            DatasetImportError::Csv(err) => Some(err),
            DatasetImportError::InvalidPeriod { source, .. } => Some(source),
            DatasetImportError::DuplicatePeriod { .. } => None,
        }
    }
}

impl From<std::io::Error> for DatasetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DatasetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Sixteen monthly observations across ten entities, bundled for demos and smoke tests.
pub const SAMPLE_DATASET: &str = include_str!("../../../data/risk_timeseries_sample.csv");

/// Loads scored time-series records from a CSV export.
///
/// Expected headers: `entity_id,year,month,military,economic,political,alliance,cyber,social`.
/// `month` may be omitted (defaults to 1); blank component cells score as neutral.
pub struct RiskDatasetImporter;

impl RiskDatasetImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        engine: &ScoringEngine,
    ) -> Result<Vec<TimeSeriesRecord>, DatasetImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, engine)
    }

    pub fn sample(engine: &ScoringEngine) -> Result<Vec<TimeSeriesRecord>, DatasetImportError> {
        Self::from_reader(SAMPLE_DATASET.as_bytes(), engine)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        engine: &ScoringEngine,
    ) -> Result<Vec<TimeSeriesRecord>, DatasetImportError> {
        let mut seen: HashSet<(EntityId, Period)> = HashSet::new();
        let mut records = Vec::new();

        for row in parser::parse_rows(reader)? {
            let period = Period::new(row.year, row.month).map_err(|source| {
                DatasetImportError::InvalidPeriod {
                    line: row.line,
                    source,
                }
            })?;
            let entity_id = row.entity_id;

            if !seen.insert((entity_id.clone(), period)) {
                return Err(DatasetImportError::DuplicatePeriod {
                    line: row.line,
                    entity_id,
                    period,
                });
            }

            let assessment = engine.score(&row.inputs);
            records.push(TimeSeriesRecord {
                entity_id,
                period,
                inputs: row.inputs,
                assessment,
            });
        }

        tracing::info!(records = records.len(), "risk dataset imported");
        Ok(records)
    }
}
