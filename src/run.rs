//! Run orchestration
//!
//! Turns a validated [`TrainingConfig`] into a prepared run: basins resolved,
//! per-basin input files located, a timestamped run directory created and the
//! resolved config copied into it. The prepared [`RunContext`] is then handed
//! to a [`TrainingDriver`], the seam to the training pipeline.
//!
//! # Example
//!
//! ```no_run
//! use hydrotrain::run::{run_training, ManifestDriver, RunOptions};
//!
//! let run = run_training(
//!     "configs/lstm-training-config.yml",
//!     RunOptions::default(),
//!     &mut ManifestDriver,
//! )?;
//! println!("run directory: {}", run.run_dir.display());
//! # Ok::<(), hydrotrain::Error>(())
//! ```

use crate::basins::read_basins;
use crate::config::{check_paths, load_config, save_config, DatasetSource, TrainingConfig};
use crate::discovery::{DatasetIndex, SourceRole};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp suffix of run directory names
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Copy of the resolved config inside the run directory
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Manifest written by [`ManifestDriver`]
pub const MANIFEST_FILE_NAME: &str = "run-manifest.json";

/// How much of the run to prepare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Locate every basin's forcing and streamflow files
    pub discover_files: bool,

    /// Resolve everything but write nothing and skip the driver
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            discover_files: true,
            dry_run: false,
        }
    }
}

impl RunOptions {
    pub fn without_discovery(mut self) -> Self {
        self.discover_files = false;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// One model input branch and the forcing sources feeding it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBranch {
    pub index: usize,
    pub timesteps: u32,
    pub sources: Vec<DatasetSource>,
}

/// Input files located for one basin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasinFiles {
    pub basin: String,

    /// One file per forcing source, in `data.forcings` order
    pub forcings: Vec<PathBuf>,

    pub streamflow: PathBuf,
}

/// Everything the training pipeline needs for one run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: TrainingConfig,
    pub basins: Vec<String>,
    pub branches: Vec<InputBranch>,

    /// Empty when discovery was skipped
    pub basin_files: Vec<BasinFiles>,

    pub run_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Seam to the training pipeline
///
/// Implementations build tensors, construct and fit the model and write
/// artifacts below [`RunContext::run_dir`] according to the `general` flags.
pub trait TrainingDriver {
    fn train(&mut self, run: &RunContext) -> Result<()>;
}

/// Map `timesteps` entries to the forcing sources they read from
///
/// Single-branch models read all forcing sources; multi-input models read
/// `forcings[i]` on branch `i`.
pub fn input_branches(config: &TrainingConfig) -> Vec<InputBranch> {
    let forcings = &config.data.forcings;
    let timesteps = &config.model.timesteps;

    if timesteps.len() == 1 {
        return vec![InputBranch {
            index: 0,
            timesteps: timesteps[0],
            sources: forcings.clone(),
        }];
    }

    timesteps
        .iter()
        .zip(forcings)
        .enumerate()
        .map(|(index, (steps, source))| InputBranch {
            index,
            timesteps: *steps,
            sources: vec![source.clone()],
        })
        .collect()
}

/// `{output_dir}/{name}_{timestamp}`
pub fn run_dir_path(output_dir: &Path, name: &str, timestamp: DateTime<Utc>) -> PathBuf {
    output_dir.join(format!("{name}_{}", timestamp.format(RUN_TIMESTAMP_FORMAT)))
}

/// Create the output directory if needed, then the run directory below it
///
/// An existing run directory is reused.
pub fn create_run_dir(output_dir: &Path, name: &str, timestamp: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let run_dir = run_dir_path(output_dir, name, timestamp);
    if run_dir.exists() {
        tracing::warn!(dir = %run_dir.display(), "run directory already exists");
    } else {
        fs::create_dir(&run_dir)?;
        tracing::info!(dir = %run_dir.display(), "created run directory");
    }
    Ok(run_dir)
}

/// Resolve basins and input files and set up the run directory
pub fn prepare_run(config: TrainingConfig, options: RunOptions) -> Result<RunContext> {
    check_paths(&config)?;

    let basins = read_basins(&config.data.basins_file)?;
    let branches = input_branches(&config);
    let basin_files = if options.discover_files {
        discover_inputs(&config, &basins)?
    } else {
        Vec::new()
    };

    let started_at = Utc::now();
    let run_dir = if options.dry_run {
        run_dir_path(&config.general.output_dir, &config.general.name, started_at)
    } else {
        let dir = create_run_dir(&config.general.output_dir, &config.general.name, started_at)?;
        save_config(&config, dir.join(CONFIG_FILE_NAME))?;
        dir
    };

    tracing::info!(
        name = %config.general.name,
        basins = basins.len(),
        branches = branches.len(),
        discovered = basin_files.len(),
        dry_run = options.dry_run,
        "prepared run"
    );

    Ok(RunContext {
        config,
        basins,
        branches,
        basin_files,
        run_dir,
        started_at,
    })
}

fn discover_inputs(config: &TrainingConfig, basins: &[String]) -> Result<Vec<BasinFiles>> {
    let forcing_indexes = config
        .data
        .forcings
        .iter()
        .map(DatasetIndex::scan)
        .collect::<Result<Vec<_>>>()?;
    let streamflow_index = DatasetIndex::scan(&config.data.streamflow)?;

    basins
        .iter()
        .map(|basin| {
            let forcings = forcing_indexes
                .iter()
                .map(|index| index.find(SourceRole::Forcings, basin))
                .collect::<Result<Vec<_>>>()?;
            Ok(BasinFiles {
                basin: basin.clone(),
                forcings,
                streamflow: streamflow_index.find(SourceRole::Streamflow, basin)?,
            })
        })
        .collect()
}

/// Prepare a validated config and hand it to `driver`
///
/// The driver is skipped on dry runs.
pub fn run_with_config<D>(config: TrainingConfig, options: RunOptions, driver: &mut D) -> Result<RunContext>
where
    D: TrainingDriver + ?Sized,
{
    let run = prepare_run(config, options)?;
    if !options.dry_run {
        driver.train(&run)?;
    }
    Ok(run)
}

/// Load, validate, prepare and train
pub fn run_training<P, D>(config_path: P, options: RunOptions, driver: &mut D) -> Result<RunContext>
where
    P: AsRef<Path>,
    D: TrainingDriver + ?Sized,
{
    let config = load_config(config_path)?;
    run_with_config(config, options, driver)
}

/// Summary of a prepared run for an external trainer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub name: String,
    pub model_type: String,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub save_model: bool,
    pub save_checkpoints: bool,
    pub log_tensorboard_events: bool,
    pub logging_config: PathBuf,
    pub config_file: PathBuf,
    pub offset: u32,
    pub multi_output: bool,
    pub branches: Vec<InputBranch>,
    pub basins: Vec<String>,
    pub basin_files: Vec<BasinFiles>,
}

impl RunManifest {
    pub fn from_run(run: &RunContext) -> Self {
        let general = &run.config.general;
        let model = &run.config.model;
        Self {
            name: general.name.clone(),
            model_type: model.model_type().as_str().to_string(),
            seed: general.seed,
            started_at: run.started_at,
            save_model: general.save_model,
            save_checkpoints: general.save_checkpoints,
            log_tensorboard_events: general.log_tensorboard_events,
            logging_config: general.logging_config.clone(),
            config_file: run.run_dir.join(CONFIG_FILE_NAME),
            offset: model.offset,
            multi_output: model.multi_output,
            branches: run.branches.clone(),
            basins: run.basins.clone(),
            basin_files: run.basin_files.clone(),
        }
    }
}

/// Driver that writes a [`RunManifest`] into the run directory
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestDriver;

impl TrainingDriver for ManifestDriver {
    fn train(&mut self, run: &RunContext) -> Result<()> {
        let manifest = RunManifest::from_run(run);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| Error::Serialization(format!("Failed to serialize run manifest: {e}")))?;

        let path = run.run_dir.join(MANIFEST_FILE_NAME);
        fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "wrote run manifest");
        Ok(())
    }
}
