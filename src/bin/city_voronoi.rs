//! Batch renderer: one SVG per city of a data directory
//!
//! `city-voronoi --data-dir data --land land-polygons.geojson berlin paris`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use city_voronoi::input::load_land_index;
use city_voronoi::{run_batch, ArtworkConfig, BatchReport, ClipPolicy, DataDir, Result};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Render clipped Voronoi artwork for cities")]
struct Args {
    /// Directory with cities.json, boundaries/, water/ and metadata/
    #[clap(long, default_value = "data", parse(from_os_str))]
    data_dir: PathBuf,

    /// Land-mass polygons in Web Mercator (GeoJSON)
    #[clap(long, parse(from_os_str))]
    land: PathBuf,

    /// JSON configuration file; flags below override it
    #[clap(long, parse(from_os_str))]
    config: Option<PathBuf>,

    #[clap(long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    /// Length of the longer canvas side
    #[clap(long)]
    canvas_size: Option<f64>,

    /// Cities processed concurrently
    #[clap(long)]
    workers: Option<usize>,

    /// Keep only the piece of a split cell that holds its site
    #[clap(long)]
    keep_site_fragment: bool,

    /// City keys to render; all cities of the data directory when omitted
    cities: Vec<String>,
}

fn load_config(args: &Args) -> Result<ArtworkConfig> {
    let mut config = match &args.config {
        Some(path) => ArtworkConfig::from_json_file(path)?,
        None => ArtworkConfig::default(),
    };

    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(size) = args.canvas_size {
        config.canvas_size = size;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.keep_site_fragment {
        config.clip_policy = ClipPolicy::KeepSiteFragment;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<BatchReport> {
    let config = load_config(&args)?;
    let data = DataDir::new(&args.data_dir);
    let land = load_land_index(&args.land)?;
    info!(polygons = land.len(), "land index ready");

    let keys = if args.cities.is_empty() {
        data.cities()?.into_iter().map(|city| city.key).collect()
    } else {
        args.cities
    };

    Ok(run_batch(&land, &keys, &data, &config))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(report) => {
            for outcome in &report.outcomes {
                if let Ok(summary) = &outcome.result {
                    info!(
                        city = %outcome.key,
                        cells = summary.cells,
                        dropped = summary.diagnostics.len(),
                        output = %summary.output.display(),
                        "done"
                    );
                }
            }
            if report.failed() > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            error!(error = %err, "batch aborted");
            ExitCode::FAILURE
        }
    }
}
