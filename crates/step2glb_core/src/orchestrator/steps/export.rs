//! Export step - tessellates a STEP model into an OBJ mesh with FreeCAD.

use std::path::{Path, PathBuf};

use super::{check_input, check_produced, commit_output, ensure_parent_dir, stage_output};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, ToolRunOutput};
use crate::paths::{resolve_executable, FileKind};
use crate::tools::freecad;

/// Export step driving FreeCAD in console mode.
pub struct ExportStep {
    input: PathBuf,
    output: PathBuf,
}

impl ExportStep {
    /// Create the step. The output gets an `.obj` extension if it lacks one.
    pub fn new(input: impl Into<PathBuf>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            output: FileKind::Obj.coerce(output.as_ref()),
        }
    }

    /// STEP file read by this step.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// OBJ file written by this step.
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl PipelineStep for ExportStep {
    fn name(&self) -> &str {
        "Export"
    }

    fn description(&self) -> &str {
        "Convert STEP to OBJ with FreeCAD"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        check_input(&self.input, FileKind::Step)?;

        let freecad = ctx.freecad_path();
        if resolve_executable(&freecad).is_none() {
            return Err(StepError::tool_not_found(
                freecad::TOOL_NAME,
                freecad.display().to_string(),
            ));
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        // validate_input already proved the executable resolves
        let freecad_path = ctx.freecad_path();
        let freecad_bin = resolve_executable(&freecad_path).unwrap_or(freecad_path);

        ctx.logger.info(&format!("Input: {}", self.input.display()));
        ctx.logger.info(&format!("Output: {}", self.output.display()));

        ensure_parent_dir(&self.output)?;
        let staged = stage_output(&self.output, FileKind::Obj)?;

        let tool_output = freecad::export_step_to_obj(
            &freecad_bin,
            &self.input,
            &staged,
            &ctx.temp_root(),
            &ctx.settings.tessellation,
            &ctx.logger,
        )?;
        commit_output(freecad::TOOL_NAME, staged, &self.output)?;

        state.export = Some(ToolRunOutput {
            output_path: self.output.clone(),
            exit_code: tool_output.exit_code,
            command: tool_output.command,
        });

        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_export() {
            return Err(StepError::invalid_output("Export results not recorded"));
        }
        check_produced(freecad::TOOL_NAME, &self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::JobLoggerBuilder;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn context(settings: Settings) -> Context {
        let logger = JobLoggerBuilder::new("export-test").build().unwrap();
        Context::new("export-test", settings, Arc::new(logger))
    }

    #[test]
    fn export_step_has_correct_name() {
        let step = ExportStep::new("part.step", "part.obj");
        assert_eq!(step.name(), "Export");
    }

    #[test]
    fn output_extension_is_coerced() {
        assert_eq!(ExportStep::new("a.step", "mesh").output(), Path::new("mesh.obj"));
        assert_eq!(ExportStep::new("a.step", "mesh.OBJ").output(), Path::new("mesh.OBJ"));
    }

    #[test]
    fn rejects_non_step_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("part.obj");
        fs::write(&input, "v 0 0 0").unwrap();

        let step = ExportStep::new(&input, dir.path().join("out.obj"));
        let err = step.validate_input(&context(Settings::default())).unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));
    }

    #[test]
    fn missing_freecad_is_an_environment_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("part.step");
        fs::write(&input, "ISO-10303-21;").unwrap();

        let mut settings = Settings::default();
        settings.tools.freecad_path = dir.path().join("no-freecad").display().to_string();

        let step = ExportStep::new(&input, dir.path().join("out.obj"));
        let err = step.validate_input(&context(settings)).unwrap_err();
        assert!(matches!(err, StepError::ToolNotFound { .. }));
    }

    #[test]
    fn unrecorded_export_fails_output_validation() {
        let step = ExportStep::new("part.step", "part.obj");
        let err = step
            .validate_output(&context(Settings::default()), &JobState::new("x"))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidOutput(_)));
    }
}
