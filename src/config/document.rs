//! Raw YAML document as written by the user
//!
//! Every field is optional here so that a missing key surfaces as a
//! validation error with its field path instead of an opaque parse failure.
//! Numbers are kept signed so negative values reach the range checks.

use serde::de::{self, Deserializer, SeqAccess, Unexpected, Visitor};
use serde::Deserialize;
use std::fmt;

/// Unvalidated training configuration document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigDocument {
    pub general: Option<GeneralSection>,
    pub data: Option<DataSection>,
    pub model: Option<ModelSection>,
}

/// `general` block: run metadata and output flags
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneralSection {
    pub name: Option<String>,
    pub output_dir: Option<String>,
    pub seed: Option<i64>,
    pub save_model: Option<bool>,
    pub save_checkpoints: Option<bool>,
    pub log_tensorboard_events: Option<bool>,
    pub logging_config: Option<String>,
}

/// `data` block: basins, sources and date windows
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataSection {
    pub basins_file: Option<String>,
    pub forcings: Option<Vec<SourceSection>>,
    pub streamflow: Option<SourceSection>,
    pub training: Option<PeriodSection>,
    pub validation: Option<PeriodSection>,
    pub test: Option<PeriodSection>,
}

/// A forcing or streamflow source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceSection {
    pub dir: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub variables: Option<Vec<String>>,
}

/// Closed date interval, dates still as written
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PeriodSection {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `model` block: architecture and training regimen
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSection {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timesteps: Option<Timesteps>,
    pub offset: Option<i64>,
    pub loss: Option<Vec<String>>,
    pub metrics: Option<Vec<String>>,
    pub optimizer: Option<String>,
    pub epochs: Option<i64>,
    pub batch_size: Option<i64>,
    pub multi_output: Option<bool>,
    pub params: Option<ParamsSection>,
}

/// Lookback lengths: a bare integer is shorthand for a single branch
#[derive(Debug, Clone, PartialEq)]
pub enum Timesteps {
    Single(i64),
    PerBranch(Vec<i64>),
}

// Visited by hand rather than `untagged` so that a bad element keeps its
// `model.timesteps[i]` path in the deserializer error.
impl<'de> Deserialize<'de> for Timesteps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestepsVisitor)
    }
}

struct TimestepsVisitor;

impl<'de> Visitor<'de> for TimestepsVisitor {
    type Value = Timesteps;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a sequence of integers")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Timesteps, E> {
        Ok(Timesteps::Single(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Timesteps, E> {
        i64::try_from(value)
            .map(Timesteps::Single)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Timesteps, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<i64>()? {
            values.push(value);
        }
        Ok(Timesteps::PerBranch(values))
    }
}

impl Timesteps {
    pub fn to_vec(&self) -> Vec<i64> {
        match self {
            Timesteps::Single(t) => vec![*t],
            Timesteps::PerBranch(ts) => ts.clone(),
        }
    }
}

/// `model.params` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParamsSection {
    pub cnn: Option<CnnSection>,
    pub lstm: Option<LstmSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CnnSection {
    pub hidden_layers: Option<i64>,
    pub filters: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LstmSection {
    pub hidden_layers: Option<i64>,
    pub units: Option<Vec<i64>>,
    pub dropout: Option<Vec<f64>>,
}
