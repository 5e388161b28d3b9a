//! ZwoForge - Structured Workout Toolkit
//!
//! Command-line entry point.
//!
//! ```bash
//! # Summarise a workout
//! zwoforge info sweet_spot.zwo
//!
//! # Export for an ERG-mode trainer at 280 W FTP
//! zwoforge export sweet_spot.zwo --format erg --ftp 280
//!
//! # Make every main-set block 5% harder
//! zwoforge scale sweet_spot.zwo 1.05
//!
//! # Build a workout from a description
//! zwoforge generate "45 min threshold intervals" --remote
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zwoforge::storage::config::{load_config, load_config_from, AppConfig};
use zwoforge::workouts::exporter_erg::{erg_file_name, export_erg};
use zwoforge::workouts::exporter_mrc::{export_mrc, mrc_file_name};
use zwoforge::workouts::exporter_zwo::{export_zwo, zwo_file_name};
use zwoforge::workouts::generator::{generate_with_fallback, GenerationSource, RemoteGenerator};
use zwoforge::workouts::parser_mrc::parse_course_file;
use zwoforge::workouts::parser_zwo::parse_zwo_file;
use zwoforge::workouts::{EditEngine, PowerShape, SegmentEdit, Workout};

#[derive(Parser)]
#[command(
    name = "zwoforge",
    version,
    about = "Parse, edit and convert structured cycling workouts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file override
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Zwo,
    Erg,
    Mrc,
}

#[derive(Subcommand)]
enum Command {
    /// Show a workout summary and its segments
    Info {
        /// Workout file (.zwo, .erg, .mrc or .json)
        file: PathBuf,
    },

    /// Export a workout to ZWO, ERG or MRC
    Export {
        /// Workout file (.zwo, .erg, .mrc or .json)
        file: PathBuf,

        /// Output format
        #[arg(long, short = 'f', value_enum)]
        format: ExportFormat,

        /// FTP in watts for ERG output (defaults to the configured FTP)
        #[arg(long)]
        ftp: Option<u16>,

        /// Leave out the course text block
        #[arg(long)]
        no_cues: bool,

        /// Output path, `-` for stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Scale every segment except warmup and cooldown, write ZWO
    Scale {
        /// Workout file
        file: PathBuf,

        /// Multiplier, greater than 0 and at most 3
        factor: f64,

        /// Output path, `-` for stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Change one segment's duration and power, write ZWO
    Edit {
        /// Workout file
        file: PathBuf,

        /// Segment number as shown by `info` (starting at 1)
        segment: usize,

        /// New duration in seconds (defaults to the current one)
        #[arg(long)]
        duration: Option<u32>,

        /// Flat power in percent of FTP
        #[arg(long)]
        power: Option<u32>,

        /// Ramp start power in percent of FTP
        #[arg(long)]
        power_low: Option<u32>,

        /// Ramp end power in percent of FTP
        #[arg(long)]
        power_high: Option<u32>,

        /// Output path, `-` for stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Convert an ERG or MRC file to ZWO
    Convert {
        /// Trainer file (.erg or .mrc)
        file: PathBuf,

        /// FTP in watts for ERG files without one (defaults to the configured FTP)
        #[arg(long)]
        ftp: Option<u16>,

        /// Output path, `-` for stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Generate a workout from a text description, write ZWO
    Generate {
        /// What the workout should look like
        description: String,

        /// Try the configured generator service first
        #[arg(long)]
        remote: bool,

        /// Output path, `-` for stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting ZwoForge v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Command::Info { file } => {
            let workout = load_workout(&file, config.ftp)?;
            print_summary(&workout, config.ftp);
        }
        Command::Export {
            file,
            format,
            ftp,
            no_cues,
            output,
        } => {
            let workout = load_workout(&file, config.ftp)?;
            let ftp = checked_ftp(ftp, &config)?;
            let cues = config.export.include_text_cues && !no_cues;

            let (content, default_name) = match format {
                ExportFormat::Zwo => (export_zwo(&workout)?, zwo_file_name(&workout)),
                ExportFormat::Erg => (export_erg(&workout, ftp, cues)?, erg_file_name(&workout)),
                ExportFormat::Mrc => (export_mrc(&workout, cues)?, mrc_file_name(&workout)),
            };
            write_output(&content, output, &default_name)?;
        }
        Command::Scale {
            file,
            factor,
            output,
        } => {
            let mut engine = EditEngine::new();
            engine.load(load_workout(&file, config.ftp)?);
            engine.scale(factor)?;
            write_zwo(&engine, config.ftp, output)?;
        }
        Command::Edit {
            file,
            segment,
            duration,
            power,
            power_low,
            power_high,
            output,
        } => {
            let mut engine = EditEngine::new();
            engine.load(load_workout(&file, config.ftp)?);

            let index = segment.checked_sub(1).context("Segments are numbered from 1")?;
            engine.select_segment(index)?;
            let current_duration = engine
                .current()
                .and_then(|w| w.segments.get(index))
                .map(|s| s.duration)
                .unwrap_or_default();

            let edit = SegmentEdit {
                duration: duration.unwrap_or(current_duration),
                power,
                power_low,
                power_high,
            };
            engine.edit_segment(index, edit)?;
            write_zwo(&engine, config.ftp, output)?;
        }
        Command::Convert { file, ftp, output } => {
            let ftp = checked_ftp(ftp, &config)?;
            let workout = parse_course_file(&file, ftp)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            write_output(&export_zwo(&workout)?, output, &zwo_file_name(&workout))?;
        }
        Command::Generate {
            description,
            remote,
            output,
        } => {
            let client = if remote || config.generator.use_remote {
                Some(RemoteGenerator::new(
                    config.generator.endpoint.clone(),
                    Duration::from_secs(config.generator.timeout_secs),
                )?)
            } else {
                None
            };

            let generated = generate_with_fallback(&description, client.as_ref()).await;
            if remote && generated.source == GenerationSource::Local {
                eprintln!("Generator service unavailable, built the workout locally");
            }

            print_summary(&generated.workout, config.ftp);
            let workout = &generated.workout;
            write_output(&export_zwo(workout)?, output, &zwo_file_name(workout))?;
        }
    }

    Ok(())
}

fn checked_ftp(ftp: Option<u16>, config: &AppConfig) -> Result<u16> {
    let ftp = ftp.unwrap_or(config.ftp);
    if !AppConfig::validate_ftp(ftp) {
        bail!("FTP must be between 50 and 600 watts, got {}", ftp);
    }
    Ok(ftp)
}

/// Read a workout, choosing the parser by file extension.
fn load_workout(path: &Path, ftp: u16) -> Result<Workout> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let workout = match extension.as_str() {
        "zwo" | "xml" => parse_zwo_file(path)?,
        "erg" | "mrc" => parse_course_file(path, ftp)?,
        "json" => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to decode {}", path.display()))?
        }
        other => bail!("Unsupported workout file type {:?}", other),
    };

    Ok(workout)
}

fn write_zwo(engine: &EditEngine, ftp: u16, output: Option<PathBuf>) -> Result<()> {
    let workout = engine.current().context("No workout loaded")?;
    print_summary(workout, ftp);
    write_output(&export_zwo(workout)?, output, &zwo_file_name(workout))
}

fn write_output(content: &str, output: Option<PathBuf>, default_name: &str) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    if path.as_os_str() == "-" {
        println!("{}", content);
        return Ok(());
    }

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

fn format_power(power: &PowerShape, ftp: u16) -> String {
    let watts = |fraction: f64| (fraction * f64::from(ftp)).round() as i64;
    let percent = |fraction: f64| (fraction * 100.0).round() as i64;
    match *power {
        PowerShape::Flat { power } if ftp > 0 => {
            format!("{}% ({} W)", percent(power), watts(power))
        }
        PowerShape::Flat { power } => format!("{}%", percent(power)),
        PowerShape::Ramp { low, high } if ftp > 0 => format!(
            "{}% -> {}% ({} -> {} W)",
            percent(low),
            percent(high),
            watts(low),
            watts(high)
        ),
        PowerShape::Ramp { low, high } => format!("{}% -> {}%", percent(low), percent(high)),
    }
}

/// Print metadata and a segment table; `ftp` of 0 hides wattages.
fn print_summary(workout: &Workout, ftp: u16) {
    eprintln!("{}", workout.name);
    eprintln!("  {}", workout.description);
    eprintln!(
        "  by {} | {} | {} | TSS {}",
        workout.author,
        workout.sport,
        format_duration(workout.total_duration),
        workout.tss
    );
    for (i, segment) in workout.segments.iter().enumerate() {
        eprintln!(
            "  {:>3}. {:<15} {:>8} {:>7}  {}",
            i + 1,
            segment.kind.to_string(),
            format_duration(segment.start_time),
            format_duration(segment.duration),
            format_power(&segment.power, ftp)
        );
    }
}
