//! # Hydrotrain: Rainfall-runoff training run configuration
//!
//! Hydrotrain loads and validates declarative YAML configs for training deep
//! learning rainfall-runoff models (LSTM, CNN-LSTM, ConvLSTM, multi-input
//! CNN-LSTM, Conv3D) on CAMELS-US and Daymet data, and prepares the run they
//! describe.
//!
//! ## Architecture
//!
//! - **config**: Config document, validation rules and CLI overrides
//! - **basins**: Basin list files
//! - **discovery**: Per-basin dataset file lookup
//! - **run**: Run directories and the training driver seam

pub mod basins;
pub mod config;
pub mod discovery;
pub mod run;

pub mod error;

// Re-export commonly used types
pub use config::{load_config, validate, TrainingConfig, ValidationError};
pub use error::{Error, Result};
pub use run::{run_training, ManifestDriver, RunContext, RunOptions, TrainingDriver};
