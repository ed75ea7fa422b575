//! step2glb CLI - convert STEP solid models to GLB meshes
//!
//! Runs FreeCAD (STEP → OBJ) and obj2gltf (OBJ → GLB) back to back.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use clap::{ArgAction, Parser, ValueEnum};

use step2glb_core::config::{ConfigManager, Settings};
use step2glb_core::logging::{init_tracing, JobLogger, JobLoggerBuilder, LogLevel};
use step2glb_core::orchestrator::{job_name_for, validate_source};
use step2glb_core::paths::FileKind;
use step2glb_core::{convert_obj_to_glb, convert_step_to_glb, convert_step_to_obj, ConversionRequest};

/// Config file picked up when `--config` is not given.
const DEFAULT_CONFIG: &str = ".config/step2glb.toml";

#[derive(Parser)]
#[command(name = "step2glb", version)]
#[command(about = "Convert STEP solid models to GLB meshes", long_about = None)]
struct Cli {
    /// Input file (.step/.stp, or .obj with --stage transcode)
    #[arg(required_unless_present = "init_config")]
    input: Option<PathBuf>,

    /// Output file; the expected extension is appended when missing
    #[arg(required_unless_present = "init_config")]
    output: Option<PathBuf>,

    /// Keep the intermediate OBJ next to the GLB
    #[arg(long)]
    keep_obj: bool,

    /// Which part of the conversion to run
    #[arg(long, value_enum, default_value_t = Stage::Full)]
    stage: Stage,

    /// Configuration file (default: .config/step2glb.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// FreeCAD executable, overriding the configured one
    #[arg(long)]
    freecad: Option<PathBuf>,

    /// Directory for per-run log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Show tool output (-v) or everything (-vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Write the default configuration file and exit
    #[arg(long, conflicts_with_all = ["input", "output"])]
    init_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    /// STEP → OBJ → GLB
    Full,
    /// STEP → OBJ only
    Export,
    /// OBJ → GLB only
    Transcode,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::Warn);

    if cli.init_config {
        return match init_config(cli.config.as_deref()) {
            Ok(path) => {
                println!("Wrote configuration to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        eprintln!("Error: both <INPUT> and <OUTPUT> are required");
        return ExitCode::FAILURE;
    };

    match run(&cli, input, output) {
        Ok(produced) => {
            println!(
                "Conversion completed: {} -> {}",
                input.display(),
                produced.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!(
                "Conversion failed: {} -> {}",
                input.display(),
                output.display()
            );
            ExitCode::FAILURE
        }
    }
}

/// Run the selected stage and return the file it produced.
fn run(cli: &Cli, input: &Path, output: &Path) -> Result<PathBuf> {
    // Reject a bad input before any directory or log file is created
    let kind = match cli.stage {
        Stage::Full | Stage::Export => FileKind::Step,
        Stage::Transcode => FileKind::Obj,
    };
    validate_source(input, kind).map_err(|e| anyhow!(e))?;

    let settings = load_settings(cli)?;
    let logger = Arc::new(build_logger(cli, input, &settings)?);

    if cli.keep_obj && cli.stage != Stage::Full {
        tracing::warn!("--keep-obj only applies to --stage full");
    }

    let produced = match cli.stage {
        Stage::Full => {
            let request = ConversionRequest::new(input, output).keep_intermediate(cli.keep_obj);
            let report = convert_step_to_glb(&request, &settings, Arc::clone(&logger))?;
            if let Some(obj) = &report.intermediate {
                tracing::info!("Intermediate OBJ: {}", obj.display());
            }
            report.output
        }
        Stage::Export => convert_step_to_obj(input, output, &settings, Arc::clone(&logger))?,
        Stage::Transcode => convert_obj_to_glb(input, output, &settings, Arc::clone(&logger))?,
    };

    if let Some(path) = logger.log_path() {
        tracing::info!("Log written to {}", path.display());
    }
    logger.close();

    Ok(produced)
}

/// Resolve settings from `--config`, the default file, or built-in defaults,
/// then apply command-line overrides.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut manager = match &cli.config {
        Some(path) => {
            let mut manager = ConfigManager::new(path);
            manager
                .load()
                .with_context(|| format!("loading config {}", path.display()))?;
            manager
        }
        None => {
            let mut manager = ConfigManager::new(DEFAULT_CONFIG);
            if manager.path().exists() {
                manager
                    .load()
                    .with_context(|| format!("loading config {}", DEFAULT_CONFIG))?;
            }
            manager
        }
    };

    if let Some(freecad) = &cli.freecad {
        manager.settings_mut().tools.freecad_path = freecad.display().to_string();
    }
    if let Some(log_dir) = &cli.log_dir {
        manager.settings_mut().paths.logs_folder = log_dir.display().to_string();
    }

    manager
        .settings()
        .validate()
        .map_err(|e| anyhow!("invalid settings: {}", e))?;
    manager
        .ensure_dirs_exist()
        .context("creating configured directories")?;

    Ok(manager.into_settings())
}

fn build_logger(cli: &Cli, input: &Path, settings: &Settings) -> Result<JobLogger> {
    let mut builder = JobLoggerBuilder::new(job_name_for(input))
        .config(settings.logging.log_config())
        .callback(Box::new(|line: &str| eprintln!("{}", line)));

    builder = match cli.verbose {
        0 => builder,
        1 => builder.level(LogLevel::Debug).compact(false),
        _ => builder.level(LogLevel::Trace).compact(false),
    };

    if let Some(dir) = settings.logs_folder() {
        builder = builder.log_dir(dir);
    }

    builder.build().context("creating job logger")
}

fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG));
    let mut manager = ConfigManager::new(path);
    manager
        .load_or_create()
        .with_context(|| format!("writing config {}", path.display()))?;
    Ok(path.to_path_buf())
}
