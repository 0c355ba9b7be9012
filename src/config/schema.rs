//! Validated training configuration
//!
//! These types are only produced by [`validate`](super::validate): once built,
//! every length and range invariant of the schema holds. Serializing them
//! yields a document in the same camelCase layout that was loaded.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete description of one training run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    pub general: GeneralConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
}

/// Run metadata and output flags
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralConfig {
    /// Run name, used as prefix for the run directory
    pub name: String,

    /// Root directory for run outputs
    pub output_dir: PathBuf,

    /// Seed for reproducible runs
    pub seed: u64,

    pub save_model: bool,
    pub save_checkpoints: bool,
    pub log_tensorboard_events: bool,

    /// Logging config for the training pipeline, passed through unopened
    pub logging_config: PathBuf,
}

/// Input and target sources plus the temporal split
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    /// Newline-delimited list of basin identifiers
    pub basins_file: PathBuf,

    /// Forcing sources, in branch order for multi-input models
    pub forcings: Vec<DatasetSource>,

    /// Target source
    pub streamflow: DatasetSource,

    pub training: Period,
    pub validation: Period,
    pub test: Period,
}

/// One dataset directory and the variables to extract from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSource {
    pub dir: PathBuf,

    #[serde(rename = "type")]
    pub kind: DatasetType,

    pub variables: Vec<String>,
}

/// Known dataset layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DatasetType {
    /// CAMELS-US lumped text files
    #[serde(rename = "camels-us")]
    CamelsUs,

    /// Daymet NetCDF files aggregated per basin
    #[serde(rename = "daymet")]
    Daymet,

    /// Daymet 2D raster NetCDF files
    #[serde(rename = "daymet-2d")]
    Daymet2d,
}

impl DatasetType {
    pub const ALL: [DatasetType; 3] = [
        DatasetType::CamelsUs,
        DatasetType::Daymet,
        DatasetType::Daymet2d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetType::CamelsUs => "camels-us",
            DatasetType::Daymet => "daymet",
            DatasetType::Daymet2d => "daymet-2d",
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        DatasetType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| {
                format!(
                    "Unknown dataset type: {}. Valid types: camels-us, daymet, daymet-2d",
                    s
                )
            })
    }
}

/// Closed calendar interval `[start_date, end_date]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of days covered, both ends included
    pub fn len_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// First date that can be predicted when a `lookback`-step input window
    /// followed by `offset` steps of lead time has to fit inside the period.
    ///
    /// Returns `None` if that date lies beyond `end_date`.
    pub fn first_target_date(&self, lookback: u32, offset: u32, step: Duration) -> Option<NaiveDate> {
        let steps = i64::from(lookback) + i64::from(offset) - 1;
        let secs = step.num_seconds().checked_mul(steps)?;
        let target = self.start_date.checked_add_signed(Duration::try_seconds(secs)?)?;
        self.contains(target).then_some(target)
    }
}

/// Architecture and training regimen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// `type` and `params`, which always agree with each other
    #[serde(flatten)]
    pub architecture: Architecture,

    /// Lookback window length per input branch
    pub timesteps: Vec<u32>,

    /// Lead time between the end of the input window and the target, in steps
    pub offset: u32,

    pub loss: Vec<String>,
    pub metrics: Vec<String>,
    pub optimizer: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub multi_output: bool,
}

impl ModelConfig {
    pub fn model_type(&self) -> ModelType {
        self.architecture.model_type()
    }

    pub fn branch_count(&self) -> usize {
        self.timesteps.len()
    }
}

/// Model variant together with the hyperparameters it uses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params")]
pub enum Architecture {
    #[serde(rename = "lstm")]
    Lstm { lstm: LstmParams },

    #[serde(rename = "cnn-lstm")]
    CnnLstm { cnn: CnnParams, lstm: LstmParams },

    #[serde(rename = "convlstm")]
    ConvLstm { cnn: CnnParams },

    #[serde(rename = "multi-cnn-lstm")]
    MultiCnnLstm { cnn: CnnParams, lstm: LstmParams },

    #[serde(rename = "conv3d")]
    Conv3d { cnn: CnnParams },
}

impl Architecture {
    pub fn model_type(&self) -> ModelType {
        match self {
            Architecture::Lstm { .. } => ModelType::Lstm,
            Architecture::CnnLstm { .. } => ModelType::CnnLstm,
            Architecture::ConvLstm { .. } => ModelType::ConvLstm,
            Architecture::MultiCnnLstm { .. } => ModelType::MultiCnnLstm,
            Architecture::Conv3d { .. } => ModelType::Conv3d,
        }
    }

    pub fn cnn(&self) -> Option<&CnnParams> {
        match self {
            Architecture::Lstm { .. } => None,
            Architecture::CnnLstm { cnn, .. }
            | Architecture::ConvLstm { cnn }
            | Architecture::MultiCnnLstm { cnn, .. }
            | Architecture::Conv3d { cnn } => Some(cnn),
        }
    }

    pub fn lstm(&self) -> Option<&LstmParams> {
        match self {
            Architecture::Lstm { lstm }
            | Architecture::CnnLstm { lstm, .. }
            | Architecture::MultiCnnLstm { lstm, .. } => Some(lstm),
            Architecture::ConvLstm { .. } | Architecture::Conv3d { .. } => None,
        }
    }
}

/// Convolutional stack: one filter count per layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CnnParams {
    pub hidden_layers: u32,
    pub filters: Vec<u32>,
}

/// Recurrent stack: units and dropout per layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LstmParams {
    pub hidden_layers: u32,
    pub units: Vec<u32>,
    pub dropout: Vec<f64>,
}

/// Vocabulary of `model.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    Lstm,
    CnnLstm,
    ConvLstm,
    MultiCnnLstm,
    Conv3d,
}

impl ModelType {
    pub const ALL: [ModelType; 5] = [
        ModelType::Lstm,
        ModelType::CnnLstm,
        ModelType::ConvLstm,
        ModelType::MultiCnnLstm,
        ModelType::Conv3d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::Lstm => "lstm",
            ModelType::CnnLstm => "cnn-lstm",
            ModelType::ConvLstm => "convlstm",
            ModelType::MultiCnnLstm => "multi-cnn-lstm",
            ModelType::Conv3d => "conv3d",
        }
    }

    /// Number of input branches, hence the expected length of `timesteps`
    pub fn branch_count(self) -> usize {
        match self {
            ModelType::MultiCnnLstm => 2,
            _ => 1,
        }
    }

    pub fn uses_cnn(self) -> bool {
        !matches!(self, ModelType::Lstm)
    }

    pub fn uses_lstm(self) -> bool {
        matches!(
            self,
            ModelType::Lstm | ModelType::CnnLstm | ModelType::MultiCnnLstm
        )
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ModelType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| {
                format!(
                    "Unknown model type: {}. Valid types: lstm, cnn-lstm, convlstm, multi-cnn-lstm, conv3d",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("lstm".parse::<ModelType>(), Ok(ModelType::Lstm));
        assert_eq!("CNN-LSTM".parse::<ModelType>(), Ok(ModelType::CnnLstm));
        assert_eq!(" convlstm ".parse::<ModelType>(), Ok(ModelType::ConvLstm));
        assert_eq!("multi-cnn-lstm".parse::<ModelType>(), Ok(ModelType::MultiCnnLstm));
        assert_eq!("conv3d".parse::<ModelType>(), Ok(ModelType::Conv3d));
        assert!("transformer".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_branch_counts() {
        assert_eq!(ModelType::MultiCnnLstm.branch_count(), 2);
        for t in [ModelType::Lstm, ModelType::CnnLstm, ModelType::ConvLstm, ModelType::Conv3d] {
            assert_eq!(t.branch_count(), 1);
        }
    }

    #[test]
    fn test_params_usage_per_type() {
        assert!(!ModelType::Lstm.uses_cnn());
        assert!(ModelType::Lstm.uses_lstm());
        assert!(ModelType::ConvLstm.uses_cnn());
        assert!(!ModelType::ConvLstm.uses_lstm());
        assert!(ModelType::MultiCnnLstm.uses_cnn() && ModelType::MultiCnnLstm.uses_lstm());
    }

    #[test]
    fn test_dataset_type_from_str() {
        assert_eq!("camels-us".parse::<DatasetType>(), Ok(DatasetType::CamelsUs));
        assert_eq!("Daymet".parse::<DatasetType>(), Ok(DatasetType::Daymet));
        assert_eq!("daymet-2d".parse::<DatasetType>(), Ok(DatasetType::Daymet2d));
        assert!("nldas".parse::<DatasetType>().is_err());
    }

    #[test]
    fn test_period_len_and_contains() {
        let period = Period {
            start_date: date(1980, 1, 1),
            end_date: date(1980, 12, 31),
        };
        assert_eq!(period.len_days(), 366);
        assert!(period.contains(date(1980, 6, 15)));
        assert!(period.contains(date(1980, 12, 31)));
        assert!(!period.contains(date(1981, 1, 1)));
    }

    #[test]
    fn test_period_overlap() {
        let a = Period {
            start_date: date(1980, 1, 1),
            end_date: date(1990, 12, 31),
        };
        let b = Period {
            start_date: date(1990, 12, 31),
            end_date: date(1995, 12, 31),
        };
        let c = Period {
            start_date: date(1991, 1, 1),
            end_date: date(1995, 12, 31),
        };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_first_target_date() {
        let period = Period {
            start_date: date(1980, 1, 1),
            end_date: date(1980, 12, 31),
        };
        // 10 days of input, predicted on the last input day
        assert_eq!(
            period.first_target_date(10, 0, Duration::days(1)),
            Some(date(1980, 1, 10))
        );
        // one day of lead time
        assert_eq!(
            period.first_target_date(10, 1, Duration::days(1)),
            Some(date(1980, 1, 11))
        );
        // window longer than the period
        assert_eq!(period.first_target_date(400, 0, Duration::days(1)), None);
    }

    #[test]
    fn test_first_target_date_far_beyond_range() {
        let period = Period {
            start_date: date(1980, 1, 1),
            end_date: date(1980, 12, 31),
        };
        assert_eq!(
            period.first_target_date(1_000_000_000, 0, Duration::days(1000)),
            None
        );
        assert_eq!(period.first_target_date(u32::MAX, u32::MAX, Duration::weeks(52)), None);
    }

    #[test]
    fn test_architecture_serializes_type_and_params() {
        let model = ModelConfig {
            architecture: Architecture::ConvLstm {
                cnn: CnnParams {
                    hidden_layers: 2,
                    filters: vec![8, 16],
                },
            },
            timesteps: vec![10],
            offset: 1,
            loss: vec!["mse".to_string()],
            metrics: vec!["mae".to_string()],
            optimizer: "adam".to_string(),
            epochs: 5,
            batch_size: 32,
            multi_output: false,
        };
        let value = serde_yaml::to_value(&model).unwrap();
        assert_eq!(value["type"].as_str(), Some("convlstm"));
        assert_eq!(value["params"]["cnn"]["hiddenLayers"].as_u64(), Some(2));
        assert_eq!(value["batchSize"].as_u64(), Some(32));
        assert!(value["params"].get("lstm").is_none());
    }
}
