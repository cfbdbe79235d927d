//! vdc-check - dataset consistency checker
//!
//! Scans the six collection directories of a video dataset, reports every
//! video whose artifacts are missing, duplicated, empty or inconsistent, and
//! exits with 0 (PASS), 1 (ISSUES_FOUND) or 2 (fatal error).

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vdc_check::report::summary;
use vdc_check::sampler::SamplerOptions;
use vdc_check::{CheckError, CheckOptions};
use vdc_common::config::{self, CompiledDefaults, DatasetRootResolver, TomlConfig};

/// Exit code for configuration errors and internal failures
const EXIT_FATAL: u8 = 2;

/// Command-line arguments for vdc-check
#[derive(Parser, Debug)]
#[command(name = "vdc-check")]
#[command(about = "Cross-collection consistency checker for video datasets")]
#[command(version)]
struct Args {
    /// Dataset root holding video/, keyframes/, clip-features-32/, ...
    dataset_root: Option<PathBuf>,

    /// Directory receiving validation_results.json and missing_files_report.md
    #[arg(long, env = "VDC_REPORTS_DIR")]
    reports_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render a sample of annotated keyframes after validation
    #[arg(long)]
    sample: bool,

    /// Maximum number of annotated keyframes to write
    #[arg(long)]
    sample_images: Option<usize>,

    /// Seed for the keyframe sample
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let defaults = CompiledDefaults::for_current_platform();

    // Config is read before logging is configured, so its warnings go
    // through a bootstrap subscriber
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(
            args.log_level.as_deref().unwrap_or(defaults.log_level.as_str()),
        ))
        .finish();
    let toml_config = tracing::subscriber::with_default(bootstrap, || {
        config::load_toml_config(args.config.as_deref())
    });

    let toml_config = match toml_config {
        Ok(config) => config,
        Err(e) => {
            let err = CheckError::from(e);
            eprintln!("vdc-check: {}", err);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    if let Err(e) = init_tracing(&args, &toml_config) {
        eprintln!("vdc-check: {:#}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    // Build identification immediately after tracing init
    info!(
        "Starting vdc-check v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match run(args, toml_config, defaults).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(args: Args, toml_config: TomlConfig, defaults: CompiledDefaults) -> Result<ExitCode> {
    let dataset_root =
        DatasetRootResolver::new(&toml_config).resolve(args.dataset_root.as_deref());
    let reports_dir = args
        .reports_dir
        .clone()
        .or_else(|| toml_config.reports_dir.clone())
        .unwrap_or(defaults.reports_dir);

    let mut sampler_config = toml_config.sampler.clone();
    sampler_config.enabled |= args.sample;
    if let Some(max_images) = args.sample_images {
        sampler_config.max_images = max_images;
    }
    if args.seed.is_some() {
        sampler_config.seed = args.seed;
    }

    let options = CheckOptions {
        dataset_root,
        reports_dir: Some(reports_dir.clone()),
        thresholds: toml_config.thresholds.clone(),
        sampler: sampler_config
            .enabled
            .then(|| SamplerOptions::from_config(&sampler_config, &reports_dir)),
    };

    let outcome = match vdc_check::run_validation(&options).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal_config() => {
            error!("{}", e);
            eprintln!("Please provide a valid dataset root: vdc-check /path/to/Data2025");
            return Ok(ExitCode::from(EXIT_FATAL));
        }
        Err(e) => return Err(e).context("Validation failed"),
    };

    println!("{}", summary::render(&outcome.report));
    if let Some(paths) = &outcome.report_paths {
        println!("Results saved to: {}", paths.results_json.display());
        println!("Missing files report: {}", paths.missing_files_markdown.display());
    }
    if let Some(quality) = &outcome.quality {
        println!(
            "Quality sample: {} videos, {} overlays",
            quality.videos.len(),
            quality.overlays.len()
        );
    }

    let status = outcome.report.overall_status();
    Ok(ExitCode::from(status.exit_code() as u8))
}

/// `RUST_LOG` when set, else `level`
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_tracing(args: &Args, toml_config: &TomlConfig) -> Result<()> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&toml_config.logging.level);

    match &toml_config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
