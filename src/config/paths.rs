//! Existence checks for paths referenced by a config

use super::schema::TrainingConfig;
use crate::error::{Error, Result};
use std::path::Path;

/// Confirm that every input path named by the config exists
///
/// `general.outputDir` is not checked: it is created when a run starts.
pub fn check_paths(config: &TrainingConfig) -> Result<()> {
    require_file(&config.data.basins_file, "data.basinsFile")?;
    require_file(&config.general.logging_config, "general.loggingConfig")?;

    for (i, source) in config.data.forcings.iter().enumerate() {
        require_dir(&source.dir, &format!("data.forcings[{i}].dir"))?;
    }
    require_dir(&config.data.streamflow.dir, "data.streamflow.dir")?;

    Ok(())
}

fn require_file(path: &Path, field: &str) -> Result<()> {
    if !path.is_file() {
        return Err(Error::not_found(field, path));
    }
    Ok(())
}

fn require_dir(path: &Path, field: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::not_found(field, path));
    }
    Ok(())
}
