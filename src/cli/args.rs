use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "s2stack", version, about = "Sentinel-2 band stacking CLI")]
pub struct CliArgs {
    /// Extraction root containing per-scene tier directories
    #[arg(short, long, default_value = "SN2_Extract")]
    pub input_root: PathBuf,

    /// Root directory for multi-band composites
    #[arg(short, long, default_value = "Raster_Processed")]
    pub output_root: PathBuf,

    /// Root directory for exported scene classification layers
    #[arg(long, default_value = "SCL_Classified")]
    pub scl_output_root: PathBuf,

    /// Common target pixel size in metres (overrides the config file)
    #[arg(short = 'r', long)]
    pub target_resolution: Option<f64>,

    /// JSON pipeline config (denylist, overview levels, creation options, cleanup retry)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing gdal_translate (defaults to $PATH)
    #[arg(long)]
    pub gdal_bin_dir: Option<PathBuf>,

    /// Stop at the first scene that fails instead of continuing with the next
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Also append log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
