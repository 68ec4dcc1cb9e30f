use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use polars::prelude::*;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bcanorm::config::{CliOverrides, NormalizeConfig};
use bcanorm::dilution::VolumeUnit;
use bcanorm::layout;

/// bcanorm CLI
#[derive(Parser)]
#[command(name = "bcanorm")]
#[command(version)]
#[command(about = "BCA standard curve and protein normalization worklists", long_about = None)]
struct Cli {
    /// TOML run configuration (defaults apply to missing keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the standard curve and compute normalization volumes from a plate export
    Normalize {
        /// Plate-reader export (CSV, or TSV for .tsv/.txt)
        file: PathBuf,
        /// Number of unknown samples on the plate
        #[arg(long)]
        samples: Option<usize>,
        /// Target concentration (mg/mL)
        #[arg(long)]
        target: Option<f64>,
        /// Final volume per sample, in --unit
        #[arg(long)]
        final_volume: Option<f64>,
        /// Volume unit (mL or uL)
        #[arg(long)]
        unit: Option<VolumeUnit>,
        /// Records above the first plate row
        #[arg(long)]
        skip_rows: Option<usize>,
        /// Spreadsheet column of plate column 1 (e.g. C)
        #[arg(long)]
        first_column: Option<String>,
        /// Warn when R² falls below this value
        #[arg(long)]
        min_r_squared: Option<f64>,
        /// Emit CSV to stdout instead of a table
        #[arg(long)]
        csv: bool,
        /// Write the full run as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show source, destination and assay wells for a sample count
    Layout {
        /// Number of unknown samples
        #[arg(long)]
        samples: Option<usize>,
    },

    /// Print the reference concentrations of the standard series
    Standards,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { file, samples, target, final_volume, unit, skip_rows, first_column, min_r_squared, csv, json } => {
            let overrides = CliOverrides {
                sample_count: samples,
                target_concentration: target,
                final_volume,
                volume_unit: unit,
                skip_rows,
                first_column,
                min_r_squared,
            };
            let config = NormalizeConfig::load(cli.config.as_deref(), Some(&overrides)).context("loading configuration")?;
            cmd_normalize(file, &config, csv, json)?;
        }

        Commands::Layout { samples } => {
            let overrides = CliOverrides { sample_count: samples, ..Default::default() };
            let config = NormalizeConfig::load(cli.config.as_deref(), Some(&overrides)).context("loading configuration")?;
            cmd_layout(&config)?;
        }

        Commands::Standards => {
            let config = NormalizeConfig::load(cli.config.as_deref(), None).context("loading configuration")?;
            for (i, c) in config.standards.concentrations().iter().enumerate() {
                println!("{}\t{}\t{c} mg/mL", i + 1, layout::replicate_wells(i).map(|w| w[0].to_string()).unwrap_or_default());
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so `--csv` output on stdout stays clean. `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn configure_table_output() {
    std::env::set_var("POLARS_FMT_TABLE_FORMATTING", "UTF8_FULL");
    std::env::set_var("POLARS_FMT_MAX_COLS", "100000"); // all report columns
    std::env::set_var("POLARS_FMT_MAX_ROWS", "1000000"); // effectively show all rows
    std::env::set_var("POLARS_FMT_STR_LEN", "100000"); // don't truncate well lists
    std::env::set_var("POLARS_TABLE_WIDTH", "65535"); // safe upper bound for width in polars 0.42
}

fn cmd_normalize(file: PathBuf, config: &NormalizeConfig, csv: bool, json: Option<PathBuf>) -> anyhow::Result<()> {
    let run = bcanorm::normalize_file(&file, config).with_context(|| format!("normalizing {}", file.display()))?;

    if let Some(path) = &json {
        let f = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        bcanorm::report::write_json(&run, std::io::BufWriter::new(f))?;
        tracing::info!(path = %path.display(), "wrote JSON report");
    }

    if csv {
        bcanorm::report::write_csv(&run, std::io::stdout())?;
        return Ok(());
    }

    configure_table_output();
    let m = run.calibration;
    println!("slope: {:.6}", m.slope);
    println!("intercept: {:.6}", m.intercept);
    println!("r_squared: {:.6}{}", m.r_squared, if run.low_fit { " (below threshold)" } else { "" });
    println!("{}", bcanorm::report::standards_frame(&run)?);
    println!(
        "normalized to {} mg/mL in {} {}:",
        run.target.concentration,
        run.target.final_volume,
        run.volume_unit.as_str()
    );
    println!("{}", bcanorm::report::samples_frame(&run)?);
    Ok(())
}

fn cmd_layout(config: &NormalizeConfig) -> anyhow::Result<()> {
    let n = config.sample_count;
    let mut sample = Vec::with_capacity(n);
    let mut source = Vec::with_capacity(n);
    let mut destination = Vec::with_capacity(n);
    let mut assay = Vec::with_capacity(n);
    for i in 0..n {
        sample.push(format!("Sample {}", i + 1));
        source.push(layout::source_well(i, &config.source).map(|w| w.to_string()).unwrap_or_default());
        destination.push(layout::destination_well(i, &config.destination).map(|w| w.to_string()).unwrap_or_default());
        assay.push(
            layout::replicate_wells(bcanorm::calibration::STANDARD_COUNT + i)
                .map(|ws| ws.map(|w| w.to_string()).join("/"))
                .unwrap_or_default(),
        );
    }
    let df = df!(
        "sample"           => sample,
        "source_well"      => source,
        "assay_wells"      => assay,
        "destination_well" => destination,
    )?;

    configure_table_output();
    println!("{}", df);
    println!("destination columns: {}", layout::columns_spanned(n, config.destination.rows));
    Ok(())
}
