use anyhow::Context;
use clap::Parser;
use generator::synthetic::{build_synthetic_inputs, export_synthetic_inputs, SyntheticConfig};
use io::cells::read_cells;
use plot::figure::render_figure;
use std::io::Write;
use std::path::PathBuf;
use workflow::config::AnalysisConfig;
use workflow::runner::{AnalysisInputs, Runner};
use workflow::summary::{write_report_json, write_summary};

mod generator;
mod io;
mod plot;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Point-to-point radio/X-ray (and radio/SZ) surface-brightness correlation"
)]
struct Args {
    /// Cell table (CSV with radio1_sb, xray_sb, y_sb and their errors)
    #[arg(long, required_unless_present = "synthetic")]
    filein: Option<PathBuf>,
    /// Output figure; `.svg` for vector output, anything else for PNG
    #[arg(long)]
    fileout: PathBuf,
    /// Skip the radio vs SZ comparison
    #[arg(long = "no-y", alias = "no_y", default_value_t = false)]
    no_y: bool,
    /// Load analysis settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// CSV noise map used to estimate the radio noise floor
    #[arg(long)]
    noise_map: Option<PathBuf>,
    /// Precomputed noise floor in Jy/arcsec^2, skips the noise map
    #[arg(long)]
    noise_floor: Option<f64>,
    /// Significance level of the correlation confidence intervals
    #[arg(long)]
    alpha: Option<f64>,
    /// Write the full analysis report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Analyse a generated cell table and noise map instead of input files
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// With --synthetic, also write the generated table, map and config here
    #[arg(long, requires = "synthetic")]
    export_synthetic: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config.as_ref() {
        AnalysisConfig::load(path)?
    } else {
        AnalysisConfig::default()
    };
    config.apply_overrides(args.noise_map, args.noise_floor, args.alpha);

    let inputs = if args.synthetic {
        let synthetic = SyntheticConfig {
            seed: args.seed,
            ..Default::default()
        };
        let inputs = build_synthetic_inputs(&synthetic).context("building synthetic inputs")?;
        if let Some(dir) = args.export_synthetic.as_ref() {
            export_synthetic_inputs(&inputs, dir)?;
        }
        inputs
    } else {
        let filein = args
            .filein
            .as_ref()
            .context("--filein is required unless --synthetic is set")?;
        AnalysisInputs {
            cells: read_cells(filein)?,
            noise: config.noise_input()?,
        }
    };

    let runner = Runner::new(config.to_stage_config(!args.no_y));
    let report = runner.execute(inputs)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, &report)?;
    out.flush()?;

    render_figure(&args.fileout, &report)?;
    if let Some(path) = args.report {
        write_report_json(&path, &report)?;
    }

    Ok(())
}
