//! Command-line interface for the data preparation jobs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use crate::core::writers;
use crate::processors::{kinematics, sorting, splitter};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "wheel-dataprep")]
#[command(about = "Wheel-sensor dataset preparation jobs", version)]
pub struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive velocity, projected current and ratio columns from raw wheel data
    Extract {
        /// Path to YAML config file (geometry and default paths)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Raw measurement table (.xlsx or .csv)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output table (.xlsx or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Select features and build binary labels for the train and test sets
    Split {
        /// Path to YAML config file with data_load and data_split paths
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Sort a processed CSV by one column
    Sort {
        /// Path to YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input CSV
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Column to sort by
        #[arg(long)]
        column: Option<String>,
        /// Sort smallest values first
        #[arg(long)]
        ascending: bool,
        /// Number of sorted rows to print
        #[arg(long)]
        head: Option<usize>,
    },

    /// Write a config file populated with the default values
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        println!("{}", summary_item(key, value));
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// One `key: value` row of the summary box, truncating long values.
fn summary_item(key: &str, value: &str) -> String {
    let display_value = if value.chars().count() > 38 {
        format!("{}...", value.chars().take(35).collect::<String>())
    } else {
        value.to_string()
    };
    format!("║ {:<20}: {:<38} ║", key, display_value)
}

/// Load the config at `path`, or defaults when none was given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::from_yaml(path)?;
            info!("Loaded config from: {}", path.display());
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let result = match cli.command {
        Commands::Extract { config, input, output } => {
            cmd_extract(config.as_deref(), input, output)
        }
        Commands::Split { config } => cmd_split(&config),
        Commands::Sort { config, input, output, column, ascending, head } => {
            cmd_sort(config.as_deref(), input, output, column, ascending, head)
        }
        Commands::InitConfig { path, force } => cmd_init_config(&path, force),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cmd_extract(config_path: Option<&Path>, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let input = input.unwrap_or(config.extract.input);
    let output = output.unwrap_or(config.extract.output);
    let geometry = &config.kinematics;

    println!("Extracting kinematic features...");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());

    let spinner = create_spinner("Applying wheel transforms...");
    let report = kinematics::run_extraction(&input, &output, geometry);
    spinner.finish_and_clear();
    let report = report.context("Kinematic feature extraction failed")?;

    println!("Saved: {}", output.display());
    print_summary(
        "Kinematic Extraction Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output file", output.display().to_string()),
            ("Rows", report.rows.to_string()),
            ("Columns", format!("{} -> {}", report.input_columns, report.output_columns)),
            ("Wheel angle (deg)", geometry.wheel_angle_deg.to_string()),
            ("Orientation (deg)", geometry.orientation_deg.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_split(config_path: &Path) -> Result<()> {
    let start = Instant::now();
    let config = load_config(Some(config_path))?;
    let paths = config.split_paths()?;

    println!("Preparing train/test sets...");
    println!("Train input: {}", paths.train_dataset.display());
    println!("Test input: {}", paths.test_dataset.display());

    let report = splitter::split_dataset(&config).context("Dataset split failed")?;

    println!("Saved processed data to: {}", paths.trainset_path.display());
    println!("Saved processed data to: {}", paths.testset_path.display());

    let skipped = if report.train.skipped.is_empty() && report.test.skipped.is_empty() {
        "none".to_string()
    } else {
        let mut all = report.train.skipped.clone();
        all.extend(report.test.skipped.iter().filter(|s| !report.train.skipped.contains(s)).cloned());
        all.join(", ")
    };

    print_summary(
        "Dataset Split Complete",
        &[
            ("Train rows", format!("{} ({} dropped)", report.train.rows_loaded - report.train.rows_dropped, report.train.rows_dropped)),
            ("Train positives", report.train.positives.to_string()),
            ("Test rows", format!("{} ({} dropped)", report.test.rows_loaded - report.test.rows_dropped, report.test.rows_dropped)),
            ("Test positives", report.test.positives.to_string()),
            ("Features kept", report.train.features_kept.to_string()),
            ("Skipped features", skipped),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_sort(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    column: Option<String>,
    ascending: bool,
    head: Option<usize>,
) -> Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?.sort;

    let input = input.unwrap_or(config.input);
    let output = output.unwrap_or(config.output);
    let column = column.unwrap_or(config.column);
    let order = sorting::SortOrder::from_descending(config.descending && !ascending);
    let head = head.unwrap_or(config.preview_rows);

    let sorted = sorting::sort_csv_file(&input, &output, &column, order)
        .with_context(|| format!("Sorting {} by '{}' failed", input.display(), column))?;

    writers::write_preview(std::io::stdout().lock(), &sorted.head(head))
        .context("Failed to print preview")?;

    print_summary(
        "Sort Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output file", output.display().to_string()),
            ("Column", column),
            ("Order", format!("{:?}", order)),
            ("Rows", sorted.num_rows().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    PipelineConfig::default().to_yaml(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
