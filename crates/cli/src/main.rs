//! CLI entry point for the coinset dataset builder.
//!
//! Subcommands:
//!   - `build`          — Load per-asset CSVs, align them and write the container
//!   - `inspect`        — Decode a container and print a summary
//!   - `default-config` — Print the default JSON configuration

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coinset_codec::{load_from_file, save_to_file};
use coinset_core::{CryptocoinExperiment, DatasetConfig};
use coinset_ingestion::{CsvRowSource, ExperimentAssembler};

#[derive(Parser)]
#[command(
    name = "coinset",
    version,
    about = "Builds gap-filled, fixed-window cryptocoin experiment datasets",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an experiment container from per-asset CSV files
    Build(BuildArgs),
    /// Decode a container and print a summary
    Inspect(InspectArgs),
    /// Print the default configuration as JSON
    DefaultConfig,
}

#[derive(Parser)]
struct BuildArgs {
    /// JSON configuration file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference end date (YYYY-MM-DD); the last snapshot is the day before
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Number of daily snapshots per asset
    #[arg(long)]
    length: Option<usize>,

    /// Comma-separated asset identifiers, in output order
    #[arg(long, value_delimiter = ',')]
    assets: Option<Vec<String>>,

    /// Directory holding the per-asset CSV files
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// File name template, `{asset}` is replaced by the identifier
    #[arg(long)]
    file_template: Option<String>,

    /// Output container path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Load assets in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon's thread count (defaults to num CPUs)
    #[arg(long)]
    threads: Option<usize>,
}

impl BuildArgs {
    /// Resolve the effective configuration: file (or defaults), then flags.
    fn resolve_config(&self) -> anyhow::Result<DatasetConfig> {
        let mut config = match &self.config {
            Some(path) => DatasetConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DatasetConfig::default(),
        };

        if let Some(end_date) = self.end_date {
            config.end_date = end_date;
        }
        if let Some(length) = self.length {
            config.window_length = length;
        }
        if let Some(assets) = &self.assets {
            config.assets = assets.clone();
        }
        if let Some(base_dir) = &self.base_dir {
            config.source.base_dir = base_dir.clone();
        }
        if let Some(template) = &self.file_template {
            config.source.file_template = template.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        config.parallel |= self.parallel;

        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser)]
struct InspectArgs {
    /// Container file to read
    path: PathBuf,

    /// Also print per-coin prices and cumulative volumes for this day index
    #[arg(long)]
    day: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build(args) => cmd_build(&args),
        Commands::Inspect(args) => cmd_inspect(&args),
        Commands::DefaultConfig => {
            println!("{}", DatasetConfig::default().to_json_string()?);
            Ok(())
        }
    }
}

fn cmd_build(args: &BuildArgs) -> anyhow::Result<()> {
    let config = args.resolve_config()?;

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("configuring rayon thread pool")?;
    }

    let experiment = build_experiment(&config)?;
    save_to_file(&experiment, &config.output)
        .with_context(|| format!("writing {}", config.output.display()))?;
    Ok(())
}

/// Run the whole pipeline for a resolved configuration.
fn build_experiment(config: &DatasetConfig) -> anyhow::Result<CryptocoinExperiment> {
    let source = CsvRowSource::new(config.source.clone());
    let build = ExperimentAssembler::from_config(&source, config)
        .assemble(&config.assets)
        .context("assembling experiment")?;

    let window = build.experiment.validate_uniform()?;
    if !build.gaps.is_empty() {
        warn!(
            gaps = build.gaps.len(),
            "Filled post-listing gaps with the previous day's values"
        );
    }
    info!(coins = build.experiment.len(), window, "Experiment assembled");

    Ok(build.experiment)
}

fn cmd_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let experiment = load_from_file(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let window = experiment.validate_uniform()?;

    for line in summary_lines(&experiment, window) {
        println!("{line}");
    }

    if let Some(day) = args.day {
        let (Some(prices), Some(volumes)) = (
            experiment.prices_at(day),
            experiment.cumulative_volumes_at(day),
        ) else {
            bail!("day {day} is outside the {window}-day window");
        };

        println!();
        println!("day {day}:");
        for ((coin, price), cumulative) in experiment.coins.iter().zip(prices).zip(volumes) {
            println!(
                "  {:<8} price={:<16} cumulative_volume={}",
                coin.display_name(),
                price,
                cumulative
            );
        }
    }

    Ok(())
}

/// One header line plus one line per coin.
fn summary_lines(experiment: &CryptocoinExperiment, window: usize) -> Vec<String> {
    let mut lines = vec![format!("{} coins, {} days", experiment.len(), window)];
    for coin in &experiment.coins {
        let listed = coin
            .snapshots
            .iter()
            .position(|s| !s.is_prelisting())
            .map(|idx| idx.to_string())
            .unwrap_or_else(|| "-".to_string());
        let last = coin
            .snapshots
            .last()
            .map(|s| format!("price={} volume={}", s.price, s.volume))
            .unwrap_or_default();
        lines.push(format!("{:<8} first_data_day={:<5} {}", coin.display_name(), listed, last));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinset_core::DateSnapshot;

    const HEADER: &str = "snapped_at,price,market_cap,total_volume\n";

    #[test]
    fn test_cli_parses_build_flags() {
        let cli = Cli::try_parse_from([
            "coinset",
            "build",
            "--end-date",
            "2022-01-01",
            "--length",
            "30",
            "--assets",
            "btc,eth",
            "--parallel",
        ])
        .unwrap();

        let Commands::Build(args) = cli.command else {
            panic!("expected build subcommand");
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(config.window_length, 30);
        assert_eq!(config.assets, vec!["btc".to_string(), "eth".to_string()]);
        assert!(config.parallel);
    }

    #[test]
    fn test_zero_length_rejected() {
        let cli = Cli::try_parse_from(["coinset", "build", "--length", "0"]).unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build subcommand");
        };
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn test_build_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("btc-usd-max.csv"),
            format!(
                "{HEADER}2021-12-05 00:00:00 UTC,100.0,1,5.0\n2021-12-07 00:00:00 UTC,110.0,1,7.0\n"
            ),
        )
        .unwrap();
        std::fs::write(dir.path().join("new-usd-max.csv"), HEADER).unwrap();

        let output = dir.path().join("unified_data");
        let mut config = DatasetConfig::default();
        config.window_length = 3;
        config.assets = vec!["btc".to_string(), "new".to_string()];
        config.source.base_dir = dir.path().to_path_buf();
        config.output = output.clone();

        let experiment = build_experiment(&config).unwrap();
        save_to_file(&experiment, &config.output).unwrap();

        let loaded = load_from_file(&output).unwrap();
        assert_eq!(loaded, experiment);
        assert_eq!(loaded.coins[0].snapshots[1], DateSnapshot::new(100.0, 5.0));
        assert_eq!(loaded.coins[1].snapshots, vec![DateSnapshot::PRELISTING; 3]);

        let lines = summary_lines(&loaded, 3);
        assert_eq!(lines[0], "2 coins, 3 days");
        assert!(lines[1].starts_with("btc"));
        assert!(lines[2].contains("first_data_day=-"));
    }

    #[test]
    fn test_build_missing_asset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DatasetConfig::default();
        config.window_length = 3;
        config.assets = vec!["ghost".to_string()];
        config.source.base_dir = dir.path().to_path_buf();
        config.output = dir.path().join("unified_data");

        assert!(build_experiment(&config).is_err());
        assert!(!config.output.exists());
    }
}
