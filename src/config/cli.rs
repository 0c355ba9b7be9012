//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! run_training validate config.yml
//! run_training validate config.yml --detailed --check-paths
//! run_training info config.yml --format json
//! run_training train config.yml --epochs 2 --output-dir ./scratch
//! run_training train config.yml --dry-run
//! ```

use super::document::{ConfigDocument, GeneralSection, ModelSection};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prepare and launch rainfall-runoff model training runs from YAML configuration
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "run_training")]
#[command(version)]
#[command(about = "Validate training configs and prepare rainfall-runoff training runs")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Prepare a run directory and hand the config to the training driver
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Display information about a configuration
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override general.outputDir
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override model.epochs
    #[arg(short, long)]
    pub epochs: Option<u32>,

    /// Override model.batchSize
    #[arg(short, long)]
    pub batch_size: Option<u32>,

    /// Override general.seed
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Validate and resolve basins, but create nothing on disk
    #[arg(long)]
    pub dry_run: bool,

    /// Do not look up per-basin data files
    #[arg(long)]
    pub skip_discovery: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,

    /// Also check that referenced files and directories exist
    #[arg(long)]
    pub check_paths: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for info command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {}. Valid formats: text, json, yaml",
                s
            )),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a document before it is validated
///
/// Overridden values go through the same validation as values from the file.
pub fn apply_overrides(doc: &mut ConfigDocument, args: &TrainArgs) {
    if args.output_dir.is_some() || args.seed.is_some() {
        let general = doc.general.get_or_insert_with(GeneralSection::default);
        if let Some(output_dir) = &args.output_dir {
            general.output_dir = Some(output_dir.display().to_string());
        }
        if let Some(seed) = args.seed {
            general.seed = Some(seed);
        }
    }

    if args.epochs.is_some() || args.batch_size.is_some() {
        let model = doc.model.get_or_insert_with(ModelSection::default);
        if let Some(epochs) = args.epochs {
            model.epochs = Some(i64::from(epochs));
        }
        if let Some(batch_size) = args.batch_size {
            model.batch_size = Some(i64::from(batch_size));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_command() {
        let cli = parse_args(["run_training", "train", "config.yml"]).unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.config, PathBuf::from("config.yml"));
                assert!(!args.dry_run);
                assert!(!args.skip_discovery);
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_train_with_overrides() {
        let cli = parse_args([
            "run_training",
            "train",
            "config.yml",
            "--epochs",
            "2",
            "--batch-size",
            "64",
            "--seed",
            "123",
            "--output-dir",
            "./scratch",
        ])
        .unwrap();

        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.epochs, Some(2));
                assert_eq!(args.batch_size, Some(64));
                assert_eq!(args.seed, Some(123));
                assert_eq!(args.output_dir, Some(PathBuf::from("./scratch")));
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_train_dry_run() {
        let cli =
            parse_args(["run_training", "train", "config.yml", "--dry-run", "--skip-discovery"])
                .unwrap();
        match cli.command {
            Command::Train(args) => {
                assert!(args.dry_run);
                assert!(args.skip_discovery);
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_validate_command() {
        let cli = parse_args(["run_training", "validate", "config.yml"]).unwrap();
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.config, PathBuf::from("config.yml"));
                assert!(!args.detailed);
                assert!(!args.check_paths);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_parse_validate_detailed() {
        let cli = parse_args([
            "run_training",
            "validate",
            "config.yml",
            "--detailed",
            "--check-paths",
        ])
        .unwrap();
        match cli.command {
            Command::Validate(args) => {
                assert!(args.detailed);
                assert!(args.check_paths);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_parse_info_command() {
        let cli = parse_args(["run_training", "info", "config.yml"]).unwrap();
        match cli.command {
            Command::Info(args) => {
                assert_eq!(args.config, PathBuf::from("config.yml"));
                assert_eq!(args.format, OutputFormat::Text);
            }
            _ => panic!("Expected Info command"),
        }
    }

    #[test]
    fn test_parse_info_json_format() {
        let cli = parse_args(["run_training", "info", "config.yml", "--format", "json"]).unwrap();
        match cli.command {
            Command::Info(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("Expected Info command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["run_training", "-v", "validate", "config.yml"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);

        let cli = parse_args(["run_training", "validate", "config.yml", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_missing_config_argument() {
        assert!(parse_args(["run_training", "validate"]).is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_args(["run_training", "quantize", "model.h5"]).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("yml".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    fn train_args() -> TrainArgs {
        TrainArgs {
            config: PathBuf::from("config.yml"),
            output_dir: None,
            epochs: None,
            batch_size: None,
            seed: None,
            dry_run: false,
            skip_discovery: false,
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut doc: ConfigDocument = serde_yaml::from_str(
            "general:\n  outputDir: ./output\n  seed: 1\nmodel:\n  epochs: 30\n  batchSize: 128\n",
        )
        .unwrap();

        let args = TrainArgs {
            output_dir: Some(PathBuf::from("./scratch")),
            epochs: Some(2),
            seed: Some(99),
            ..train_args()
        };
        apply_overrides(&mut doc, &args);

        let general = doc.general.as_ref().unwrap();
        assert_eq!(general.output_dir.as_deref(), Some("./scratch"));
        assert_eq!(general.seed, Some(99));
        let model = doc.model.as_ref().unwrap();
        assert_eq!(model.epochs, Some(2));
        assert_eq!(model.batch_size, Some(128));
    }

    #[test]
    fn test_apply_no_overrides_leaves_document_untouched() {
        let mut doc = ConfigDocument::default();
        apply_overrides(&mut doc, &train_args());
        assert_eq!(doc, ConfigDocument::default());
    }
}
