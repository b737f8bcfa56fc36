use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;

use nearmiss::config::Config;
use nearmiss::engine::{write_labels, BatchParams, BatchRunner};
use nearmiss::propagate::{Satellite, TrajectoryCache};
use nearmiss::{Catalog, ConjunctionEngine, OrbitalElementSet, PairAssessmentRequest, TimeWindow};

#[derive(Parser)]
#[command(name = "nearmiss")]
#[command(about = "Satellite conjunction screening and collision probability")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one pair of objects over a time window
    Assess {
        primary: PathBuf,
        secondary: PathBuf,
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,
        /// Window length, e.g. "24h" or "3days"
        #[arg(long, value_parser = parse_duration)]
        window: Duration,
        /// Primary hard-body radius in metres
        #[arg(long)]
        radius1: Option<f64>,
        /// Secondary hard-body radius in metres
        #[arg(long)]
        radius2: Option<f64>,
    },
    /// Print the state of every object in a TLE file
    Propagate {
        file: PathBuf,
        #[arg(long, value_parser = parse_time)]
        at: DateTime<Utc>,
    },
    /// Screen a whole catalog and write training labels as CSV
    Screen {
        catalog: PathBuf,
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_duration)]
        window: Duration,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Commands::Assess {
            primary,
            secondary,
            start,
            window,
            radius1,
            radius2,
        } => assess(
            &config,
            &primary,
            &secondary,
            TimeWindow::starting_at(start, window),
            radius1,
            radius2,
        ),
        Commands::Propagate { file, at } => propagate(&config, &file, at),
        Commands::Screen {
            catalog,
            start,
            window,
            out,
        } => screen(
            &config,
            &catalog,
            TimeWindow::starting_at(start, window),
            out.as_deref(),
        ),
    }
}

fn assess(
    config: &Config,
    primary: &Path,
    secondary: &Path,
    window: TimeWindow,
    radius1: Option<f64>,
    radius2: Option<f64>,
) -> ExitCode {
    let (a, b) = match (first_entry(primary), first_entry(secondary)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let defaults = &config.screening;
    let request = PairAssessmentRequest::new(
        &a,
        &b,
        window,
        radius1.unwrap_or(defaults.primary_radius_m),
        radius2.unwrap_or(defaults.secondary_radius_m),
    )
    .with_sampling_interval(Duration::seconds(defaults.sampling_interval_s))
    .with_spatial_threshold_km(defaults.spatial_threshold_km)
    .with_apsis_threshold_km(defaults.apsis_threshold_km);

    let engine = ConjunctionEngine::new(config.engine.clone());
    match engine.assess(&request) {
        Ok(result) => print_json(&result),
        Err(e) => {
            eprintln!("Assessment failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn propagate(config: &Config, file: &Path, at: DateTime<Utc>) -> ExitCode {
    let catalog = match load_catalog(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let model = config.engine.propagation_model;
    let states: Vec<_> = catalog
        .entries()
        .iter()
        .map(|elements| {
            let outcome = Satellite::new(elements.clone(), model)
                .map_err(|e| e.to_string())
                .and_then(|sat| sat.propagate(at).map_err(|e| e.to_string()));
            match outcome {
                Ok(state) => json!({
                    "catalog_id": elements.catalog_id(),
                    "name": elements.name(),
                    "state": state,
                }),
                Err(message) => json!({
                    "catalog_id": elements.catalog_id(),
                    "name": elements.name(),
                    "error": message,
                }),
            }
        })
        .collect();
    print_json(&states)
}

fn screen(config: &Config, catalog: &Path, window: TimeWindow, out: Option<&Path>) -> ExitCode {
    let catalog = match load_catalog(catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let defaults = &config.screening;
    let params = BatchParams {
        sampling_interval: Duration::seconds(defaults.sampling_interval_s),
        pair_threshold_km: config.batch.pair_threshold_km,
        spatial_threshold_km: defaults.spatial_threshold_km,
        apsis_threshold_km: defaults.apsis_threshold_km,
        identical_tolerance_km: config.batch.identical_tolerance_km,
        ..BatchParams::new(window, defaults.primary_radius_m, defaults.secondary_radius_m)
    };

    let runner = BatchRunner::new(
        ConjunctionEngine::new(config.engine.clone()),
        Arc::new(TrajectoryCache::new()),
    );
    let report = match runner.run(&catalog, &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Screening failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "{} satellites, {} pairs, {} assessed, {} failed",
        report.satellites,
        report.pairs_discovered,
        report.rows.len(),
        report.failed
    );

    let written = match out {
        Some(path) => File::create(path)
            .map_err(csv::Error::from)
            .and_then(|file| write_labels(&report.rows, file)),
        None => write_labels(&report.rows, io::stdout().lock()),
    };
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error writing labels: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_catalog(path: &Path) -> Result<Catalog, String> {
    let catalog = Catalog::from_path(path)
        .map_err(|e| format!("Error reading {}: {}", path.display(), e))?;
    if catalog.is_empty() {
        return Err(format!("No valid element sets in {}", path.display()));
    }
    Ok(catalog)
}

fn first_entry(path: &Path) -> Result<OrbitalElementSet, String> {
    let catalog = load_catalog(path)?;
    catalog
        .entries()
        .first()
        .cloned()
        .ok_or_else(|| format!("No valid element sets in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}
