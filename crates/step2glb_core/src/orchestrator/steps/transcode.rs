//! Transcode step - turns an OBJ mesh into a GLB with obj2gltf.

use std::path::{Path, PathBuf};

use super::{check_input, check_produced, commit_output, ensure_parent_dir, stage_output};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, ToolRunOutput};
use crate::paths::FileKind;
use crate::tools::obj2gltf;

/// Transcode step driving obj2gltf through the configured launcher.
pub struct TranscodeStep {
    input: PathBuf,
    output: PathBuf,
}

impl TranscodeStep {
    /// Create the step. The output gets a `.glb` extension if it lacks one.
    pub fn new(input: impl Into<PathBuf>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            output: FileKind::Glb.coerce(output.as_ref()),
        }
    }

    /// OBJ file read by this step.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// GLB file written by this step.
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl PipelineStep for TranscodeStep {
    fn name(&self) -> &str {
        "Transcode"
    }

    fn description(&self) -> &str {
        "Convert OBJ to GLB with obj2gltf"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        check_input(&self.input, FileKind::Obj)
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        ctx.logger.info(&format!("Input: {}", self.input.display()));
        ctx.logger.info(&format!("Output: {}", self.output.display()));

        ensure_parent_dir(&self.output)?;
        let staged = stage_output(&self.output, FileKind::Glb)?;

        let tool_output = obj2gltf::transcode_obj_to_glb(
            &ctx.settings.tools,
            &self.input,
            &staged,
            &ctx.logger,
        )?;
        commit_output(obj2gltf::TOOL_NAME, staged, &self.output)?;

        state.transcode = Some(ToolRunOutput {
            output_path: self.output.clone(),
            exit_code: tool_output.exit_code,
            command: tool_output.command,
        });

        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_transcode() {
            return Err(StepError::invalid_output("Transcode results not recorded"));
        }
        check_produced(obj2gltf::TOOL_NAME, &self.output)
    }
}
