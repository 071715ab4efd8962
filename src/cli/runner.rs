use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use s2stack::{GdalEngine, PipelineConfig, TracingReporter, process_tree};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging(args: &CliArgs) -> Result<(), AppError> {
    let default_level = if args.log { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| AppError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<PipelineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(res) = args.target_resolution {
        if !res.is_finite() || res <= 0.0 {
            return Err(AppError::InvalidResolution { value: res });
        }
        config.target_resolution = res;
    }
    config.validate()?;
    Ok(config)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&args)?;
    let config = load_config(&args)?;

    info!("Input root: {:?}", args.input_root);
    info!("Output root: {:?}", args.output_root);
    info!("SCL output root: {:?}", args.scl_output_root);
    info!(
        "Target resolution: {} m, denylist: {:?}",
        config.target_resolution, config.denylist
    );

    let engine = GdalEngine::new(args.gdal_bin_dir.clone());
    let report = process_tree(
        &engine,
        &TracingReporter,
        &config,
        &args.input_root,
        &args.output_root,
        &args.scl_output_root,
        !args.fail_fast,
    )
    .map_err(AppError::from)?;

    for (path, reason) in &report.failures {
        warn!("Failed scene {:?}: {}", path, reason);
    }
    info!("Batch processing complete!");
    info!("Processed: {}", report.processed);
    info!("Errors: {}", report.errors);

    Ok(())
}
