//! Entry points that validate a request, build a pipeline and run it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::Pipeline;
use super::steps::{ExportStep, TranscodeStep};
use super::types::{Context, JobState};
use crate::config::Settings;
use crate::logging::JobLogger;
use crate::paths::{self, FileKind};

/// A full STEP → GLB conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// STEP file to convert.
    pub input: PathBuf,
    /// Desired GLB file (`.glb` is appended when missing).
    pub output: PathBuf,
    /// Keep the OBJ next to the GLB instead of discarding it.
    pub keep_intermediate: bool,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            keep_intermediate: false,
        }
    }

    /// Set whether the intermediate OBJ is retained.
    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Absolute STEP input.
    pub input: PathBuf,
    /// Absolute GLB output.
    pub output: PathBuf,
    /// Retained OBJ, when requested.
    pub intermediate: Option<PathBuf>,
    /// Steps that ran, in order.
    pub steps_completed: Vec<String>,
    /// Per-step record of what ran.
    pub state: JobState,
}

/// The OBJ handed from the export step to the transcode step.
#[derive(Debug)]
pub enum IntermediateArtifact {
    /// Caller-visible sibling of the GLB; never deleted.
    Retained(PathBuf),
    /// Lives in a private temp directory removed with this value.
    Temporary { dir: TempDir, path: PathBuf },
}

impl IntermediateArtifact {
    /// `<output stem>.obj` next to the GLB.
    pub fn retained(glb_output: &Path) -> Self {
        Self::Retained(glb_output.with_extension(FileKind::Obj.canonical_extension()))
    }

    /// `<stem>.obj` inside a fresh temp directory under `temp_root`.
    pub fn temporary(temp_root: &Path, stem: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("step2glb-")
            .tempdir_in(temp_root)?;
        let path = dir
            .path()
            .join(format!("{}.{}", stem, FileKind::Obj.canonical_extension()));
        Ok(Self::Temporary { dir, path })
    }

    /// Where the OBJ lives.
    pub fn path(&self) -> &Path {
        match self {
            Self::Retained(path) => path,
            Self::Temporary { path, .. } => path,
        }
    }

    /// Whether the OBJ outlives the run.
    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Retained(_))
    }

    /// Remove a temporary OBJ; a retained one is left alone.
    pub fn cleanup(self, logger: &JobLogger) {
        match self {
            Self::Retained(path) => {
                if path.exists() {
                    logger.info(&format!("Intermediate OBJ kept at {}", path.display()));
                }
            }
            Self::Temporary { dir, .. } => {
                let dir_path = dir.path().to_path_buf();
                match dir.close() {
                    Ok(()) => logger.debug(&format!(
                        "Removed temporary directory {}",
                        dir_path.display()
                    )),
                    Err(e) => logger.warn(&format!(
                        "Failed to remove temporary directory {}: {}",
                        dir_path.display(),
                        e
                    )),
                }
            }
        }
    }
}

/// Job name used for logs: the input's file stem.
pub fn job_name_for(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "conversion".to_string())
}

/// Convert a STEP file to OBJ (Export step only).
///
/// Returns the absolute OBJ path.
pub fn convert_step_to_obj(
    input: &Path,
    output: &Path,
    settings: &Settings,
    logger: Arc<JobLogger>,
) -> PipelineResult<PathBuf> {
    let job_name = job_name_for(input);
    let input = prepare_source(&job_name, input, FileKind::Step, &logger)?;
    let output = prepare_target(&job_name, output, FileKind::Obj)?;

    let ctx = Context::new(&job_name, settings.clone(), logger);
    let mut state = JobState::new(&job_name);
    Pipeline::new()
        .with_step(ExportStep::new(&input, &output))
        .run(&ctx, &mut state)?;

    ctx.logger
        .success(&format!("Converted {} to {}", input.display(), output.display()));
    Ok(output)
}

/// Convert an OBJ file to GLB (Transcode step only).
///
/// Returns the absolute GLB path.
pub fn convert_obj_to_glb(
    input: &Path,
    output: &Path,
    settings: &Settings,
    logger: Arc<JobLogger>,
) -> PipelineResult<PathBuf> {
    let job_name = job_name_for(input);
    let input = prepare_source(&job_name, input, FileKind::Obj, &logger)?;
    let output = prepare_target(&job_name, output, FileKind::Glb)?;

    let ctx = Context::new(&job_name, settings.clone(), logger);
    let mut state = JobState::new(&job_name);
    Pipeline::new()
        .with_step(TranscodeStep::new(&input, &output))
        .run(&ctx, &mut state)?;

    ctx.logger
        .success(&format!("Converted {} to {}", input.display(), output.display()));
    Ok(output)
}

/// Convert a STEP file to GLB through an intermediate OBJ.
///
/// Nothing is launched unless the input exists and is a STEP file.
/// A temporary OBJ is removed on every exit path; a retained one never is.
pub fn convert_step_to_glb(
    request: &ConversionRequest,
    settings: &Settings,
    logger: Arc<JobLogger>,
) -> PipelineResult<ConversionReport> {
    let job_name = job_name_for(&request.input);
    let input = prepare_source(&job_name, &request.input, FileKind::Step, &logger)?;
    let output = prepare_target(&job_name, &request.output, FileKind::Glb)?;

    let intermediate = if request.keep_intermediate {
        IntermediateArtifact::retained(&output)
    } else {
        IntermediateArtifact::temporary(&settings.temp_root(), &job_name_for(&output)).map_err(
            |e| {
                logger.error(&format!("Failed to create temporary directory: {}", e));
                PipelineError::setup_failed(
                    &job_name,
                    format!("creating temporary directory: {}", e),
                )
            },
        )?
    };
    logger.debug(&format!(
        "Intermediate OBJ ({}): {}",
        if intermediate.is_retained() {
            "retained"
        } else {
            "temporary"
        },
        intermediate.path().display()
    ));

    let ctx = Context::new(&job_name, settings.clone(), logger);
    let mut state = JobState::new(&job_name);
    let pipeline = Pipeline::new()
        .with_step(ExportStep::new(&input, intermediate.path()))
        .with_step(TranscodeStep::new(intermediate.path(), &output));

    let result = pipeline.run(&ctx, &mut state);

    let retained = intermediate
        .is_retained()
        .then(|| intermediate.path().to_path_buf());
    intermediate.cleanup(&ctx.logger);

    let run = result?;
    ctx.logger
        .success(&format!("Converted {} to {}", input.display(), output.display()));

    Ok(ConversionReport {
        input,
        output,
        intermediate: retained,
        steps_completed: run.steps_completed,
        state,
    })
}

/// Check that `input` exists and is a `kind` file.
///
/// Touches nothing on disk; the error is the user-facing message.
pub fn validate_source(input: &Path, kind: FileKind) -> Result<(), String> {
    if !input.exists() {
        return Err(format!("Input file {} does not exist", input.display()));
    }
    if !kind.matches(input) {
        return Err(format!(
            "Input file {} is not a {} file",
            input.display(),
            kind.label()
        ));
    }
    Ok(())
}

/// Validate an input before any tool runs and make it absolute.
fn prepare_source(
    job_name: &str,
    input: &Path,
    kind: FileKind,
    logger: &JobLogger,
) -> PipelineResult<PathBuf> {
    if let Err(message) = validate_source(input, kind) {
        logger.error(&message);
        return Err(PipelineError::validation_failed(job_name, message));
    }

    paths::absolute(input).map_err(|e| {
        PipelineError::setup_failed(job_name, format!("resolving {}: {}", input.display(), e))
    })
}

/// Make an output absolute and give it the expected extension.
fn prepare_target(job_name: &str, output: &Path, kind: FileKind) -> PipelineResult<PathBuf> {
    let absolute = paths::absolute(output).map_err(|e| {
        PipelineError::setup_failed(job_name, format!("resolving {}: {}", output.display(), e))
    })?;
    Ok(kind.coerce(&absolute))
}
