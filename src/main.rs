//! Hydrotrain CLI
//!
//! Console entry point for validating training configs and preparing runs.
//!
//! # Usage
//!
//! ```bash
//! # Validate config
//! run_training validate configs/lstm-training-config.yml --detailed
//!
//! # Show config info
//! run_training info configs/lstm-training-config.yml --format json
//!
//! # Prepare a run with overrides
//! run_training train configs/lstm-training-config.yml --epochs 2 --output-dir ./scratch
//! ```

use clap::Parser;
use hydrotrain::config::{
    apply_overrides, check_paths, load, load_config, to_yaml_string, validate, Cli, Command,
    InfoArgs, OutputFormat, TrainArgs, TrainingConfig, ValidateArgs,
};
use hydrotrain::run::{input_branches, run_with_config, ManifestDriver, RunOptions};
use hydrotrain::Error;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let (config_path, result) = match cli.command {
        Command::Train(args) => (args.config.clone(), run_train(&args)),
        Command::Validate(args) => (args.config.clone(), run_validate(&args)),
        Command::Info(args) => (args.config.clone(), run_info(&args)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", config_path.display());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_directive = if cli.quiet {
        "hydrotrain=warn"
    } else if cli.verbose {
        "hydrotrain=debug"
    } else {
        "hydrotrain=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_train(args: &TrainArgs) -> Result<(), Error> {
    let mut document = load(&args.config)?;
    apply_overrides(&mut document, args);
    let config = validate(&document)?;

    let mut options = RunOptions::default();
    if args.skip_discovery {
        options = options.without_discovery();
    }
    if args.dry_run {
        options = options.dry_run();
    }

    let run = run_with_config(config, options, &mut ManifestDriver)?;

    if args.dry_run {
        println!(
            "Dry run: {} basin(s), run directory would be {}",
            run.basins.len(),
            run.run_dir.display()
        );
    } else {
        println!("Run prepared in {}", run.run_dir.display());
    }
    Ok(())
}

fn run_validate(args: &ValidateArgs) -> Result<(), Error> {
    let config = load_config(&args.config)?;
    if args.check_paths {
        check_paths(&config)?;
    }

    println!("Configuration is valid");
    if args.detailed {
        println!();
        print_summary(&args.config, &config);
    }
    Ok(())
}

fn run_info(args: &InfoArgs) -> Result<(), Error> {
    let config = load_config(&args.config)?;

    match args.format {
        OutputFormat::Text => print_summary(&args.config, &config),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| Error::Serialization(format!("JSON serialization error: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Yaml => print!("{}", to_yaml_string(&config)?),
    }
    Ok(())
}

fn print_summary(path: &Path, config: &TrainingConfig) {
    let general = &config.general;
    let data = &config.data;
    let model = &config.model;

    println!("Configuration Summary: {}", path.display());
    println!("  Run name: {}", general.name);
    println!("  Output dir: {}", general.output_dir.display());
    println!("  Seed: {}", general.seed);
    println!(
        "  Save model / checkpoints / tensorboard: {} / {} / {}",
        general.save_model, general.save_checkpoints, general.log_tensorboard_events
    );

    println!();
    println!("  Basins file: {}", data.basins_file.display());
    for (i, source) in data.forcings.iter().enumerate() {
        println!(
            "  Forcings[{i}]: {} ({}) {:?}",
            source.dir.display(),
            source.kind,
            source.variables
        );
    }
    println!(
        "  Streamflow: {} ({}) {:?}",
        data.streamflow.dir.display(),
        data.streamflow.kind,
        data.streamflow.variables
    );
    for (label, period) in [
        ("Training", &data.training),
        ("Validation", &data.validation),
        ("Test", &data.test),
    ] {
        println!(
            "  {label}: {} .. {} ({} days)",
            period.start_date,
            period.end_date,
            period.len_days()
        );
    }

    println!();
    println!("  Model: {}", model.model_type());
    for branch in input_branches(config) {
        println!(
            "    Branch {}: {} timesteps from {} source(s)",
            branch.index,
            branch.timesteps,
            branch.sources.len()
        );
    }
    if let Some(cnn) = model.architecture.cnn() {
        println!("    CNN: {} layer(s), filters {:?}", cnn.hidden_layers, cnn.filters);
    }
    if let Some(lstm) = model.architecture.lstm() {
        println!(
            "    LSTM: {} layer(s), units {:?}, dropout {:?}",
            lstm.hidden_layers, lstm.units, lstm.dropout
        );
    }
    println!("  Offset: {}", model.offset);
    println!("  Loss: {:?}  Metrics: {:?}", model.loss, model.metrics);
    println!("  Optimizer: {}", model.optimizer);
    println!("  Epochs: {}  Batch size: {}", model.epochs, model.batch_size);
    println!("  Multi-output: {}", model.multi_output);
}
