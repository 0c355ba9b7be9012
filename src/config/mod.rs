//! Declarative YAML training configuration
//!
//! A config describes one training run: run metadata, the basins and data
//! sources to train on, the temporal split and the model to build.
//!
//! # Example
//!
//! ```yaml
//! general:
//!   name: lstm-camels
//!   outputDir: ./output
//!   seed: 42
//!   saveModel: true
//!   saveCheckpoints: false
//!   logTensorboardEvents: true
//!   loggingConfig: ./config/logging.yml
//!
//! data:
//!   basinsFile: ./data/basins.txt
//!   forcings:
//!     - dir: ./data/camels/basin_mean_forcing
//!       type: camels-us
//!       variables: [prcp, srad, tmax, tmin, vp]
//!   streamflow:
//!     dir: ./data/camels/usgs_streamflow
//!     type: camels-us
//!     variables: [streamflow]
//!   training: {startDate: 1980-01-01, endDate: 1994-12-31}
//!   validation: {startDate: 1995-01-01, endDate: 1999-12-31}
//!   test: {startDate: 2000-01-01, endDate: 2009-12-31}
//!
//! model:
//!   type: lstm
//!   timesteps: [365]
//!   offset: 1
//!   loss: [mse]
//!   metrics: [mse, mae]
//!   optimizer: adam
//!   epochs: 30
//!   batchSize: 256
//!   multiOutput: false
//!   params:
//!     lstm:
//!       hiddenLayers: 2
//!       units: [32, 32]
//!       dropout: [0.1, 0.0]
//! ```

mod cli;
mod document;
mod load;
mod paths;
mod schema;
mod validate;



pub use cli::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, TrainArgs, ValidateArgs,
};
pub use document::{
    CnnSection, ConfigDocument, DataSection, GeneralSection, LstmSection, ModelSection,
    ParamsSection, PeriodSection, SourceSection, Timesteps,
};
pub use load::{load, load_config, parse_document, save_config, to_yaml_string};
pub use paths::check_paths;
pub use schema::{
    Architecture, CnnParams, DataConfig, DatasetSource, DatasetType, GeneralConfig, LstmParams,
    ModelConfig, ModelType, Period, TrainingConfig,
};
pub use validate::{validate, ValidationError, ROOT_FIELD};
