//! snapimg: batch image conversion and packaging.
//!
//! Exit codes: 0 success, 1 failure, 2 nothing to save, 3 configuration error,
//! 130 interrupted.

mod config;
mod input;
mod report;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use config::{Config, ConfigSchema};
use report::Report;
use snapimg_batch::{BatchError, CancellationToken, DirectorySink, Package, Packager, Session};
use snapimg_cli::output::{format_count, print_failures, Status};
use snapimg_cli::progress::ProgressObserver;
use snapimg_cli::telemetry::{self, TelemetryConfig};
use snapimg_image::{CombinedPdf, ConversionMode, ModeSettings, ModeTransform};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info};

const EXIT_FAILURE: u8 = 1;
const EXIT_NOTHING_SAVED: u8 = 2;
const EXIT_CONFIG: u8 = 3;
const EXIT_CANCELLED: u8 = 130;

/// Cancel `token` on Ctrl-C; the run stops before its next file.
fn cancel_on_interrupt(token: &CancellationToken) -> anyhow::Result<()> {
    let handle = token.clone();
    ctrlc::set_handler(move || handle.cancel()).context("Failed to install Ctrl-C handler")
}

#[derive(Parser)]
#[command(name = "snapimg")]
#[command(about = "Compress, convert and package images in one batch")]
#[command(version)]
struct Cli {
    /// Configuration file (default: .snapimg.toml, snapimg.toml or .config/snapimg.toml)
    #[arg(short, long, global = true, env = "SNAPIMG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the result is saved to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Replace an existing file with the same name
    #[arg(long, global = true)]
    overwrite: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print a JSON summary instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shrink images, keeping their format
    Compress {
        /// Quality from 10 to 100
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(10..=100))]
        quality: Option<u8>,
        /// Keep full quality
        #[arg(long)]
        lossless: bool,
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Convert images to JPEG
    Jpg {
        /// Quality from 1 to 100
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Convert images to PNG
    Png {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Convert images to lossless WebP
    Webp {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Put each image on an A4 PDF page
    Pdf {
        /// JPEG quality of the embedded images
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
        /// One PDF per image instead of a combined document
        #[arg(long)]
        separate: bool,
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Commands {
    fn mode(&self) -> ConversionMode {
        match self {
            Commands::Compress { .. } => ConversionMode::Compress,
            Commands::Jpg { .. } => ConversionMode::Jpg,
            Commands::Png { .. } => ConversionMode::Png,
            Commands::Webp { .. } => ConversionMode::Webp,
            Commands::Pdf { .. } => ConversionMode::Pdf,
        }
    }

    fn paths(&self) -> &[PathBuf] {
        match self {
            Commands::Compress { paths, .. }
            | Commands::Jpg { paths, .. }
            | Commands::Png { paths }
            | Commands::Webp { paths }
            | Commands::Pdf { paths, .. } => paths,
        }
    }

    fn quality(&self) -> Option<u8> {
        match self {
            Commands::Compress { quality, .. } | Commands::Jpg { quality, .. } | Commands::Pdf { quality, .. } => {
                *quality
            }
            Commands::Png { .. } | Commands::Webp { .. } => None,
        }
    }

    /// Settings from the config file, overridden by flags
    fn settings(&self, schema: &ConfigSchema) -> ModeSettings {
        let mode = self.mode();
        let mut settings = ModeSettings::for_mode(mode);

        if let Some(quality) = schema.quality_for(mode) {
            settings = settings.with_quality(mode, quality);
        }
        if let Some(quality) = self.quality() {
            settings = settings.with_quality(mode, quality);
        }
        if let Commands::Compress { lossless, .. } = self {
            settings = settings.with_lossless(*lossless || schema.compress.lossless);
        }
        settings
    }

    fn packager(&self, schema: &ConfigSchema, settings: ModeSettings) -> Box<dyn Package> {
        let mode = self.mode();
        if let Commands::Pdf { separate, .. } = self {
            if schema.pdf.combine && !separate {
                return Box::new(CombinedPdf::new(mode.combined_name(), settings.quality));
            }
        }
        Box::new(Packager::new(mode.archive_name()).collisions(schema.archive.collision))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            Status::error(&format!("{:#}", e));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let config = match Config::load(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&e.to_string());
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };
    let schema = &config.schema;

    let telemetry_config = TelemetryConfig {
        log_level: schema.general.log_level.clone(),
        json: schema.general.log_json,
        ..TelemetryConfig::default()
    }
    .with_verbosity(cli.verbose);
    telemetry::init(&telemetry_config)?;
    if let Some(path) = &config.path {
        debug!(path = %path.display(), "Loaded configuration");
    }

    let mode = cli.command.mode();
    let settings = cli.command.settings(schema);
    info!(%mode, quality = settings.quality, lossless = settings.lossless, "Starting");

    let paths = input::collect_paths(cli.command.paths())?;
    let files = input::load_files(&paths)?;
    if files.is_empty() {
        Status::warning("No files selected");
        return Ok(ExitCode::from(EXIT_NOTHING_SAVED));
    }

    let mut session = Session::new();
    let total = session.add_files(files)?;
    let input_bytes = session.total_size() as u64;

    let mut observer = if cli.json {
        ProgressObserver::hidden()
    } else {
        ProgressObserver::for_stderr()
    };
    let transform = ModeTransform::with_settings(mode, settings);
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel)?;
    let started = Instant::now();

    let processed = session
        .process(&transform, &mode.accept(), &mut observer, &cancel)
        .map(|results| results.len());
    match processed {
        Ok(count) => debug!(count, "Processing finished"),
        Err(BatchError::NoValidResults { total, failures }) => {
            let report = Report::new(mode, total, &failures).with_settings(settings);
            if cli.json {
                report.print_json()?;
            } else {
                print_failures(&failures);
                report.print_text();
            }
            return Ok(ExitCode::from(EXIT_NOTHING_SAVED));
        }
        Err(BatchError::Cancelled { completed, total }) => {
            observer.bar().finish_and_clear();
            Status::warning(&format!(
                "Cancelled after {} of {}; nothing was saved",
                completed,
                format_count(total, "file", "files")
            ));
            return Ok(ExitCode::from(EXIT_CANCELLED));
        }
        Err(e) => return Err(e.into()),
    }

    let mut report = Report::new(mode, total, session.failures()).with_settings(settings);
    report.input_bytes = input_bytes;
    report.output_bytes = session.results().iter().map(|r| r.size() as u64).sum();
    report.elapsed_ms = started.elapsed().as_millis();
    if !cli.json {
        print_failures(session.failures());
    }

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&schema.general.output_dir));
    let mut sink = DirectorySink::new(output_dir).overwrite(cli.overwrite || schema.general.overwrite);
    let packager = cli.command.packager(schema, settings);
    let receipt = session.download(packager.as_ref(), &mut sink)?;

    report.artifact = Some(receipt);
    if cli.json {
        report.print_json()?;
    } else {
        report.print_text();
    }

    Ok(ExitCode::SUCCESS)
}
