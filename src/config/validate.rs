//! Configuration validation
//!
//! Turns a raw [`ConfigDocument`] into a [`TrainingConfig`], or reports the
//! first violated rule together with the field path it was found at.

use super::document::{
    CnnSection, ConfigDocument, DataSection, GeneralSection, LstmSection, ModelSection,
    ParamsSection, PeriodSection, SourceSection, Timesteps,
};
use super::schema::{
    Architecture, CnnParams, DataConfig, DatasetSource, DatasetType, GeneralConfig, LstmParams,
    ModelConfig, ModelType, Period, TrainingConfig,
};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Field path used when an error cannot be attributed to a key
pub const ROOT_FIELD: &str = "<root>";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: required field is missing")]
    MissingField { field: String },

    #[error("{field}: must not be empty")]
    EmptyField { field: String },

    #[error("{field}: {detail}")]
    Schema { field: String, detail: String },

    #[error(
        "{field}: unknown model type '{value}' (expected one of: lstm, cnn-lstm, convlstm, multi-cnn-lstm, conv3d)"
    )]
    UnknownModelType { field: String, value: String },

    #[error("{field}: unknown dataset type '{value}' (expected one of: camels-us, daymet, daymet-2d)")]
    UnknownDatasetType { field: String, value: String },

    #[error("{field}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("{field}: invalid value {value} (expected {constraint})")]
    InvalidRange {
        field: String,
        value: String,
        constraint: String,
    },

    #[error("{field}: '{value}' is not a valid calendar date (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("{field}: {end} precedes the start date {start}")]
    ReversedPeriod {
        field: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("{field}: {date} must be later than {other_field} ({other_date})")]
    OverlappingPeriods {
        field: String,
        date: NaiveDate,
        other_field: String,
        other_date: NaiveDate,
    },

    #[error("{field}: not used by model type '{model_type}'")]
    UnexpectedParams { field: String, model_type: ModelType },
}

impl ValidationError {
    /// Dotted path of the offending field, e.g. `model.params.cnn.filters`
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::EmptyField { field }
            | ValidationError::Schema { field, .. }
            | ValidationError::UnknownModelType { field, .. }
            | ValidationError::UnknownDatasetType { field, .. }
            | ValidationError::LengthMismatch { field, .. }
            | ValidationError::InvalidRange { field, .. }
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::ReversedPeriod { field, .. }
            | ValidationError::OverlappingPeriods { field, .. }
            | ValidationError::UnexpectedParams { field, .. } => field,
        }
    }

    /// Wrap a typed-deserialization failure (wrong YAML type, unknown key).
    ///
    /// serde_yaml prefixes such messages with the dotted path of the value.
    /// Unknown keys are reported at their own path, e.g. `general.saveModels`.
    pub(crate) fn from_yaml(err: &serde_yaml::Error) -> Self {
        let message = err.to_string();
        let (path, detail) = match message.split_once(": ") {
            Some((path, detail)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
                (Some(path).filter(|p| *p != "."), detail.to_string())
            }
            _ => (None, message.clone()),
        };

        let field = match (path, unknown_key(&detail)) {
            (Some(parent), Some(key)) => format!("{parent}.{key}"),
            (None, Some(key)) => key.to_string(),
            (Some(parent), None) => parent.to_string(),
            (None, None) => ROOT_FIELD.to_string(),
        };
        ValidationError::Schema { field, detail }
    }
}

/// Key named by serde's "unknown field `key`, expected ..." message
fn unknown_key(detail: &str) -> Option<&str> {
    let rest = detail.strip_prefix("unknown field `")?;
    rest.split_once('`').map(|(key, _)| key)
}

/// Validate a configuration document
///
/// Checks, in order:
/// - `general`: required keys, non-empty names and paths
/// - `data`: sources, dataset types, calendar dates and window chronology
/// - `model`: type vocabulary, branch count, ranges, params per model type
/// - cross-field: enough forcing sources for every input branch
pub fn validate(doc: &ConfigDocument) -> Result<TrainingConfig, ValidationError> {
    let general = validate_general(required(doc.general.as_ref(), "general")?)?;
    let data = validate_data(required(doc.data.as_ref(), "data")?)?;
    let model = validate_model(required(doc.model.as_ref(), "model")?)?;

    validate_branch_sources(&data, &model)?;

    Ok(TrainingConfig {
        general,
        data,
        model,
    })
}

fn validate_general(section: &GeneralSection) -> Result<GeneralConfig, ValidationError> {
    Ok(GeneralConfig {
        name: required_str(&section.name, "general.name")?,
        output_dir: required_path(&section.output_dir, "general.outputDir")?,
        seed: non_negative_u64(section.seed, "general.seed")?,
        save_model: required_bool(section.save_model, "general.saveModel")?,
        save_checkpoints: required_bool(section.save_checkpoints, "general.saveCheckpoints")?,
        log_tensorboard_events: required_bool(
            section.log_tensorboard_events,
            "general.logTensorboardEvents",
        )?,
        logging_config: required_path(&section.logging_config, "general.loggingConfig")?,
    })
}

fn validate_data(section: &DataSection) -> Result<DataConfig, ValidationError> {
    let basins_file = required_path(&section.basins_file, "data.basinsFile")?;

    let forcing_sections = required(section.forcings.as_ref(), "data.forcings")?;
    if forcing_sections.is_empty() {
        return Err(ValidationError::EmptyField {
            field: "data.forcings".to_string(),
        });
    }
    let forcings = forcing_sections
        .iter()
        .enumerate()
        .map(|(i, source)| validate_source(source, &format!("data.forcings[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let streamflow = validate_source(
        required(section.streamflow.as_ref(), "data.streamflow")?,
        "data.streamflow",
    )?;
    if streamflow.kind != DatasetType::CamelsUs {
        return Err(ValidationError::InvalidRange {
            field: "data.streamflow.type".to_string(),
            value: streamflow.kind.to_string(),
            constraint: "camels-us".to_string(),
        });
    }

    let training = validate_period(section.training.as_ref(), "data.training")?;
    let validation = validate_period(section.validation.as_ref(), "data.validation")?;
    let test = validate_period(section.test.as_ref(), "data.test")?;

    ensure_after(&validation, "data.validation", &training, "data.training")?;
    ensure_after(&test, "data.test", &validation, "data.validation")?;

    Ok(DataConfig {
        basins_file,
        forcings,
        streamflow,
        training,
        validation,
        test,
    })
}

fn validate_source(section: &SourceSection, field: &str) -> Result<DatasetSource, ValidationError> {
    let dir = required_path(&section.dir, &format!("{field}.dir"))?;

    let type_field = format!("{field}.type");
    let kind_str = required_str(&section.kind, &type_field)?;
    let kind = kind_str
        .parse::<DatasetType>()
        .map_err(|_| ValidationError::UnknownDatasetType {
            field: type_field,
            value: kind_str.clone(),
        })?;

    let variables = identifiers(
        section.variables.as_ref(),
        &format!("{field}.variables"),
        false,
    )?;

    Ok(DatasetSource {
        dir,
        kind,
        variables,
    })
}

fn validate_period(section: Option<&PeriodSection>, field: &str) -> Result<Period, ValidationError> {
    let section = required(section, field)?;
    let start_date = parse_date(&section.start_date, &format!("{field}.startDate"))?;
    let end_date = parse_date(&section.end_date, &format!("{field}.endDate"))?;

    if end_date < start_date {
        return Err(ValidationError::ReversedPeriod {
            field: format!("{field}.endDate"),
            start: start_date,
            end: end_date,
        });
    }

    Ok(Period {
        start_date,
        end_date,
    })
}

/// Windows must be strictly ordered: `later` starts after `earlier` ends
fn ensure_after(
    later: &Period,
    later_field: &str,
    earlier: &Period,
    earlier_field: &str,
) -> Result<(), ValidationError> {
    if later.start_date <= earlier.end_date {
        return Err(ValidationError::OverlappingPeriods {
            field: format!("{later_field}.startDate"),
            date: later.start_date,
            other_field: format!("{earlier_field}.endDate"),
            other_date: earlier.end_date,
        });
    }
    Ok(())
}

fn validate_model(section: &ModelSection) -> Result<ModelConfig, ValidationError> {
    let kind_str = required_str(&section.kind, "model.type")?;
    let model_type = kind_str
        .parse::<ModelType>()
        .map_err(|_| ValidationError::UnknownModelType {
            field: "model.type".to_string(),
            value: kind_str.clone(),
        })?;

    let timesteps = validate_timesteps(section.timesteps.as_ref(), model_type)?;
    let offset = non_negative_u32(section.offset, "model.offset")?;
    let loss = identifiers(section.loss.as_ref(), "model.loss", false)?;
    let metrics = identifiers(section.metrics.as_ref(), "model.metrics", true)?;
    let optimizer = required_str(&section.optimizer, "model.optimizer")?;
    let epochs = positive_u32(section.epochs, "model.epochs")?;
    let batch_size = positive_u32(section.batch_size, "model.batchSize")?;
    let multi_output = required_bool(section.multi_output, "model.multiOutput")?;

    let params = required(section.params.as_ref(), "model.params")?;
    let architecture = validate_architecture(model_type, params)?;

    Ok(ModelConfig {
        architecture,
        timesteps,
        offset,
        loss,
        metrics,
        optimizer,
        epochs,
        batch_size,
        multi_output,
    })
}

fn validate_timesteps(
    timesteps: Option<&Timesteps>,
    model_type: ModelType,
) -> Result<Vec<u32>, ValidationError> {
    let values = required(timesteps, "model.timesteps")?.to_vec();

    let expected = model_type.branch_count();
    if values.len() != expected {
        return Err(ValidationError::LengthMismatch {
            field: "model.timesteps".to_string(),
            expected,
            actual: values.len(),
        });
    }

    values
        .iter()
        .enumerate()
        .map(|(i, v)| positive_u32(Some(*v), &format!("model.timesteps[{i}]")))
        .collect()
}

fn validate_architecture(
    model_type: ModelType,
    params: &ParamsSection,
) -> Result<Architecture, ValidationError> {
    if params.cnn.is_some() && !model_type.uses_cnn() {
        return Err(ValidationError::UnexpectedParams {
            field: "model.params.cnn".to_string(),
            model_type,
        });
    }
    if params.lstm.is_some() && !model_type.uses_lstm() {
        return Err(ValidationError::UnexpectedParams {
            field: "model.params.lstm".to_string(),
            model_type,
        });
    }

    let cnn = || validate_cnn(params.cnn.as_ref());
    let lstm = || validate_lstm(params.lstm.as_ref());

    Ok(match model_type {
        ModelType::Lstm => Architecture::Lstm { lstm: lstm()? },
        ModelType::CnnLstm => Architecture::CnnLstm {
            cnn: cnn()?,
            lstm: lstm()?,
        },
        ModelType::ConvLstm => Architecture::ConvLstm { cnn: cnn()? },
        ModelType::MultiCnnLstm => Architecture::MultiCnnLstm {
            cnn: cnn()?,
            lstm: lstm()?,
        },
        ModelType::Conv3d => Architecture::Conv3d { cnn: cnn()? },
    })
}

fn validate_cnn(section: Option<&CnnSection>) -> Result<CnnParams, ValidationError> {
    let section = required(section, "model.params.cnn")?;
    let hidden_layers = positive_u32(section.hidden_layers, "model.params.cnn.hiddenLayers")?;
    let filters = layer_values(
        section.filters.as_ref(),
        hidden_layers,
        "model.params.cnn.filters",
    )?;

    Ok(CnnParams {
        hidden_layers,
        filters,
    })
}

fn validate_lstm(section: Option<&LstmSection>) -> Result<LstmParams, ValidationError> {
    let section = required(section, "model.params.lstm")?;
    let hidden_layers = positive_u32(section.hidden_layers, "model.params.lstm.hiddenLayers")?;
    let units = layer_values(
        section.units.as_ref(),
        hidden_layers,
        "model.params.lstm.units",
    )?;

    let dropout = required(section.dropout.as_ref(), "model.params.lstm.dropout")?;
    check_layer_count(dropout.len(), hidden_layers, "model.params.lstm.dropout")?;
    for (i, rate) in dropout.iter().enumerate() {
        if !(0.0..1.0).contains(rate) {
            return Err(ValidationError::InvalidRange {
                field: format!("model.params.lstm.dropout[{i}]"),
                value: rate.to_string(),
                constraint: "in [0, 1)".to_string(),
            });
        }
    }

    Ok(LstmParams {
        hidden_layers,
        units,
        dropout: dropout.clone(),
    })
}

/// Multi-input models read each branch from its own forcing source
fn validate_branch_sources(data: &DataConfig, model: &ModelConfig) -> Result<(), ValidationError> {
    let branches = model.branch_count();
    if branches > 1 && data.forcings.len() < branches {
        return Err(ValidationError::InvalidRange {
            field: "data.forcings".to_string(),
            value: format!("{} source(s)", data.forcings.len()),
            constraint: format!(
                "at least {branches} sources for model type '{}'",
                model.model_type()
            ),
        });
    }
    Ok(())
}

fn required<'a, T>(value: Option<&'a T>, field: &str) -> Result<&'a T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })
}

fn required_str(value: &Option<String>, field: &str) -> Result<String, ValidationError> {
    let value = required(value.as_ref(), field)?;
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            field: field.to_string(),
        });
    }
    Ok(value.clone())
}

fn required_path(value: &Option<String>, field: &str) -> Result<PathBuf, ValidationError> {
    required_str(value, field).map(PathBuf::from)
}

fn required_bool(value: Option<bool>, field: &str) -> Result<bool, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })
}

fn positive_u32(value: Option<i64>, field: &str) -> Result<u32, ValidationError> {
    let value = required(value.as_ref(), field)?;
    if *value < 1 {
        return Err(ValidationError::InvalidRange {
            field: field.to_string(),
            value: value.to_string(),
            constraint: ">= 1".to_string(),
        });
    }
    to_u32(*value, field)
}

fn non_negative_u32(value: Option<i64>, field: &str) -> Result<u32, ValidationError> {
    let value = required(value.as_ref(), field)?;
    if *value < 0 {
        return Err(ValidationError::InvalidRange {
            field: field.to_string(),
            value: value.to_string(),
            constraint: ">= 0".to_string(),
        });
    }
    to_u32(*value, field)
}

fn non_negative_u64(value: Option<i64>, field: &str) -> Result<u64, ValidationError> {
    let value = required(value.as_ref(), field)?;
    u64::try_from(*value).map_err(|_| ValidationError::InvalidRange {
        field: field.to_string(),
        value: value.to_string(),
        constraint: ">= 0".to_string(),
    })
}

fn to_u32(value: i64, field: &str) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::InvalidRange {
        field: field.to_string(),
        value: value.to_string(),
        constraint: format!("<= {}", u32::MAX),
    })
}

/// One positive value per hidden layer
fn layer_values(
    values: Option<&Vec<i64>>,
    hidden_layers: u32,
    field: &str,
) -> Result<Vec<u32>, ValidationError> {
    let values = required(values, field)?;
    check_layer_count(values.len(), hidden_layers, field)?;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| positive_u32(Some(*v), &format!("{field}[{i}]")))
        .collect()
}

fn check_layer_count(actual: usize, hidden_layers: u32, field: &str) -> Result<(), ValidationError> {
    let expected = hidden_layers as usize;
    if actual != expected {
        return Err(ValidationError::LengthMismatch {
            field: field.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn identifiers(
    values: Option<&Vec<String>>,
    field: &str,
    allow_empty: bool,
) -> Result<Vec<String>, ValidationError> {
    let values = required(values, field)?;
    if values.is_empty() && !allow_empty {
        return Err(ValidationError::EmptyField {
            field: field.to_string(),
        });
    }
    for (i, value) in values.iter().enumerate() {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: format!("{field}[{i}]"),
            });
        }
    }
    Ok(values.clone())
}

fn parse_date(value: &Option<String>, field: &str) -> Result<NaiveDate, ValidationError> {
    let raw = required_str(value, field)?;
    let invalid = || ValidationError::InvalidDate {
        field: field.to_string(),
        value: raw.clone(),
    };
    // chrono also takes unpadded fields and signed years
    if !is_canonical_date(&raw) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| invalid())
}

/// Exactly `YYYY-MM-DD`: digits with dashes at positions 4 and 7
fn is_canonical_date(raw: &str) -> bool {
    raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}
