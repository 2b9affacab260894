use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::io::Read;

use super::super::domain::{EntityId, RawRiskInputs, RiskInputVector};

#[derive(Debug)]
pub(crate) struct DatasetRow {
    pub(crate) line: u64,
    pub(crate) entity_id: EntityId,
    pub(crate) year: i32,
    pub(crate) month: u8,
    pub(crate) inputs: RiskInputVector,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<DatasetRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        rows.push(DatasetRow {
            // Header is line 1.
            line: index as u64 + 2,
            entity_id: EntityId::normalized(&row.entity_id),
            year: row.year,
            month: row.month.unwrap_or(1),
            inputs: RiskInputVector::from_raw(&row.raw_inputs()),
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    entity_id: String,
    year: i32,
    #[serde(default, deserialize_with = "empty_as_none")]
    month: Option<u8>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    military: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    economic: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    political: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    alliance: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cyber: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    social: Option<String>,
}

impl CsvRow {
    fn raw_inputs(&self) -> RawRiskInputs {
        let cell = |value: &Option<String>| value.clone().map(Value::String);
        RawRiskInputs {
            military: cell(&self.military),
            economic: cell(&self.economic),
            political: cell(&self.political),
            alliance: cell(&self.alliance),
            cyber: cell(&self.cyber),
            social: cell(&self.social),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match empty_string_as_none(deserializer)? {
        Some(raw) => raw
            .trim()
            .parse::<u8>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
