//! Loading, validating and writing configuration files

use super::document::ConfigDocument;
use super::schema::TrainingConfig;
use super::validate::{validate, ValidationError};
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read a configuration file into an unvalidated document
///
/// - missing file: [`Error::NotFound`]
/// - malformed YAML syntax: [`Error::Parse`]
/// - wrong value types or unknown keys: [`Error::Validation`] with the field path
pub fn load<P: AsRef<Path>>(config_path: P) -> Result<ConfigDocument> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::not_found("config file", path),
        _ => Error::Io(e),
    })?;

    tracing::debug!(path = %path.display(), bytes = yaml_content.len(), "read config file");
    parse_document(&yaml_content)
}

/// Parse YAML text into an unvalidated document
pub fn parse_document(yaml: &str) -> Result<ConfigDocument> {
    // Syntax first, so that broken YAML is never reported as a schema problem
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| Error::Parse(e.to_string()))?;
    if value.is_null() {
        return Err(ValidationError::MissingField {
            field: "general".to_string(),
        }
        .into());
    }

    serde_yaml::from_str(yaml).map_err(|e| ValidationError::from_yaml(&e).into())
}

/// Load and validate a configuration file
///
/// This is the entry point used before any data loading or training.
///
/// # Example
///
/// ```no_run
/// use hydrotrain::config::load_config;
///
/// let config = load_config("configs/lstm-training-config.yml")?;
/// println!("{} epochs", config.model.epochs);
/// # Ok::<(), hydrotrain::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<TrainingConfig> {
    let document = load(config_path.as_ref())?;
    let config = validate(&document)?;

    tracing::info!(
        path = %config_path.as_ref().display(),
        name = %config.general.name,
        model = %config.model.model_type(),
        "config validated"
    );
    Ok(config)
}

/// Render a validated config in the input schema
pub fn to_yaml_string(config: &TrainingConfig) -> Result<String> {
    serde_yaml::to_string(config)
        .map_err(|e| Error::Serialization(format!("Failed to serialize config: {e}")))
}

/// Write a validated config to a YAML file
pub fn save_config<P: AsRef<Path>>(config: &TrainingConfig, path: P) -> Result<()> {
    let content = to_yaml_string(config)?;
    fs::write(path.as_ref(), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
general:
  name: cnn-lstm-run
  outputDir: ./output
  seed: 7
  saveModel: true
  saveCheckpoints: true
  logTensorboardEvents: true
  loggingConfig: ./logging.yml
data:
  basinsFile: ./basins.txt
  forcings:
    - dir: ./daymet
      type: daymet-2d
      variables: [prcp, tmax]
  streamflow:
    dir: ./streamflow
    type: camels-us
    variables: [streamflow]
  training: {startDate: 2000-01-01, endDate: 2005-12-31}
  validation: {startDate: 2006-01-01, endDate: 2007-12-31}
  test: {startDate: 2008-01-01, endDate: 2010-12-31}
model:
  type: cnn-lstm
  timesteps: [10]
  offset: 1
  loss: [mse]
  metrics: [mae]
  optimizer: adam
  epochs: 10
  batchSize: 16
  multiOutput: false
  params:
    cnn: {hiddenLayers: 2, filters: [8, 16]}
    lstm: {hiddenLayers: 1, units: [32], dropout: [0.0]}
"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_temp(CONFIG);
        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.model.model_type(), ModelType::CnnLstm);
        assert_eq!(config.model.batch_size, 16);
        assert_eq!(config.model.architecture.cnn().unwrap().filters, vec![8, 16]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/nonexistent/dir/config.yml").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_load_malformed_yaml() {
        let temp_file = write_temp("this is not valid yaml: [}");
        let err = load(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_load_wrong_type_is_validation_error() {
        let temp_file = write_temp(&CONFIG.replace("epochs: 10", "epochs: ten"));
        let err = load(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.field(), Some("model.epochs"));
    }

    #[test]
    fn test_load_unknown_key_is_validation_error() {
        let temp_file = write_temp(&CONFIG.replace("saveModel: true", "saveModels: true"));
        let err = load(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_empty_document() {
        let err = parse_document("").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_file = write_temp(&CONFIG.replace("filters: [8, 16]", "filters: [8]"));
        let err = load_config(temp_file.path()).unwrap_err();
        assert_eq!(err.field(), Some("model.params.cnn.filters"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_file = write_temp(CONFIG);
        let config = load_config(temp_file.path()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("saved.yml");
        save_config(&config, &out).unwrap();

        let reloaded = load_config(&out).unwrap();
        assert_eq!(config, reloaded);
    }
}
