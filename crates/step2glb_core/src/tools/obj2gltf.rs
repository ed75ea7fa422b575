//! obj2gltf wrapper for OBJ → GLB transcoding.

use std::path::Path;

use super::runner::{ToolCommand, ToolOutput};
use crate::config::ToolSettings;
use crate::logging::JobLogger;
use crate::orchestrator::StepResult;

/// Tool label used in logs and errors.
pub const TOOL_NAME: &str = "obj2gltf";

/// Build `<launcher> <package> -i <input> -o <output> [extra args]`.
pub fn build_command(tools: &ToolSettings, input: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(TOOL_NAME, &tools.transcoder_launcher)
        .arg(&tools.transcoder_package)
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .args(&tools.transcoder_args)
}

/// Transcode `input` (OBJ) to `output` (GLB).
///
/// Launch failures come back as `StepError::LaunchFailed`.
pub fn transcode_obj_to_glb(
    tools: &ToolSettings,
    input: &Path,
    output: &Path,
    logger: &JobLogger,
) -> StepResult<ToolOutput> {
    build_command(tools, input, output).run(logger)
}
