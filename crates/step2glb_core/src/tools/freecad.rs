//! FreeCAD console-mode wrapper for STEP → OBJ export.
//!
//! The macro text is fixed. Paths and tessellation parameters reach it
//! through environment variables, so nothing user-controlled is ever
//! spliced into Python source.

use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, TempPath};

use super::runner::{ToolCommand, ToolOutput};
use crate::config::TessellationSettings;
use crate::logging::JobLogger;
use crate::orchestrator::{StepError, StepResult};

/// Tool label used in logs and errors.
pub const TOOL_NAME: &str = "FreeCAD";

pub const ENV_MACRO: &str = "STEP2GLB_MACRO";
pub const ENV_INPUT: &str = "STEP2GLB_INPUT";
pub const ENV_OUTPUT: &str = "STEP2GLB_OUTPUT";
pub const ENV_LINEAR_DEFLECTION: &str = "STEP2GLB_LINEAR_DEFLECTION";
pub const ENV_ANGULAR_DEFLECTION: &str = "STEP2GLB_ANGULAR_DEFLECTION";
pub const ENV_RELATIVE: &str = "STEP2GLB_RELATIVE";
pub const ENV_SEGMENTS: &str = "STEP2GLB_SEGMENTS";
pub const ENV_SHAPES: &str = "STEP2GLB_SHAPES";

/// Lines printed by the macro with this prefix are surfaced as warnings.
const WARNING_MARKER: &str = "STEP2GLB-WARNING: ";

/// `-c` payload: run the macro file named by `STEP2GLB_MACRO`.
const EXEC_MACRO: &str =
    "exec(open(__import__('os').environ['STEP2GLB_MACRO'], encoding='utf-8').read())";

/// Macro executed inside FreeCAD.
pub const MACRO_SOURCE: &str = r#"# -*- coding: utf-8 -*-
import os
import sys

import FreeCAD
import Mesh
import MeshPart
import Part

env = os.environ
input_path = env["STEP2GLB_INPUT"]
output_path = env["STEP2GLB_OUTPUT"]
linear_deflection = float(env["STEP2GLB_LINEAR_DEFLECTION"])
angular_deflection = float(env["STEP2GLB_ANGULAR_DEFLECTION"])
relative = env["STEP2GLB_RELATIVE"] == "1"
segments = env["STEP2GLB_SEGMENTS"] == "1"
export_all = env["STEP2GLB_SHAPES"] == "all"

print("Converting %s to %s" % (input_path, output_path))

try:
    doc = FreeCAD.newDocument("Conversion")
    Part.insert(input_path, doc.Name)

    shapes = [
        obj.Shape
        for obj in doc.Objects
        if hasattr(obj, "Shape") and not obj.Shape.isNull()
    ]
    if not shapes:
        print("No shapes found in the STEP file")
        sys.exit(1)

    if len(shapes) > 1 and not export_all:
        print("STEP2GLB-WARNING: %d shapes found, exporting only the first" % len(shapes))
    selected = shapes if export_all else shapes[:1]

    combined = Mesh.Mesh()
    for shape in selected:
        combined.addMesh(
            MeshPart.meshFromShape(
                Shape=shape,
                LinearDeflection=linear_deflection,
                AngularDeflection=angular_deflection,
                Relative=relative,
                Segments=segments,
            )
        )

    combined.write(output_path)
    print("Exported %d shape(s) to %s" % (len(selected), output_path))
    FreeCAD.closeDocument(doc.Name)
    sys.exit(0)
except Exception as e:
    print("Error: %s" % e)
    sys.exit(1)
"#;

/// Write the macro to a scoped temporary file under `temp_root`.
///
/// The file is deleted when the returned path is dropped.
pub fn write_macro(temp_root: &Path) -> io::Result<TempPath> {
    let mut file = Builder::new()
        .prefix("step2glb-")
        .suffix(".FCMacro")
        .tempfile_in(temp_root)?;
    file.write_all(MACRO_SOURCE.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Build the FreeCAD invocation for one export.
pub fn build_command(
    freecad: &Path,
    macro_path: &Path,
    input: &Path,
    output: &Path,
    tessellation: &TessellationSettings,
) -> ToolCommand {
    ToolCommand::new(TOOL_NAME, freecad)
        .args(["-c", EXEC_MACRO])
        .env(ENV_MACRO, macro_path)
        .env(ENV_INPUT, input)
        .env(ENV_OUTPUT, output)
        .env(ENV_LINEAR_DEFLECTION, tessellation.linear_deflection.to_string())
        .env(ENV_ANGULAR_DEFLECTION, tessellation.angular_deflection.to_string())
        .env(ENV_RELATIVE, flag(tessellation.relative))
        .env(ENV_SEGMENTS, flag(tessellation.segments))
        .env(ENV_SHAPES, tessellation.shapes.as_str())
}

/// Export `input` (STEP) to `output` (OBJ) with FreeCAD.
///
/// The macro file only lives for the duration of this call.
pub fn export_step_to_obj(
    freecad: &Path,
    input: &Path,
    output: &Path,
    temp_root: &Path,
    tessellation: &TessellationSettings,
    logger: &JobLogger,
) -> StepResult<ToolOutput> {
    let macro_path = write_macro(temp_root)
        .map_err(|e| StepError::io_error("writing FreeCAD macro", e))?;
    logger.debug(&format!("Macro written to {}", macro_path.display()));

    let command = build_command(freecad, &macro_path, input, output, tessellation);
    let result = command.run(logger);

    if let Err(e) = macro_path.close() {
        logger.warn(&format!("Failed to remove FreeCAD macro: {}", e));
    }

    let output = result?;
    for warning in macro_warnings(&output.stdout) {
        logger.warn(warning);
    }
    Ok(output)
}

/// Warning lines the macro printed.
fn macro_warnings(stdout: &str) -> impl Iterator<Item = &str> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(WARNING_MARKER))
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeSelection;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::tempdir;

    fn env_value<'a>(cmd: &'a ToolCommand, key: &str) -> Option<&'a OsString> {
        cmd.envs().iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[test]
    fn command_passes_paths_through_environment() {
        let input = Path::new("/models/it's \"quoted\".step");
        let output = Path::new("/models/out.obj");
        let cmd = build_command(
            Path::new("/usr/bin/freecadcmd"),
            Path::new("/tmp/step2glb-x.FCMacro"),
            input,
            output,
            &TessellationSettings::default(),
        );

        assert_eq!(cmd.tool(), TOOL_NAME);
        assert_eq!(cmd.program(), Path::new("/usr/bin/freecadcmd"));
        assert_eq!(env_value(&cmd, ENV_INPUT), Some(&OsString::from(input)));
        assert_eq!(env_value(&cmd, ENV_OUTPUT), Some(&OsString::from(output)));
        assert_eq!(env_value(&cmd, ENV_LINEAR_DEFLECTION), Some(&OsString::from("0.1")));
        assert_eq!(env_value(&cmd, ENV_RELATIVE), Some(&OsString::from("0")));
        assert_eq!(env_value(&cmd, ENV_SEGMENTS), Some(&OsString::from("1")));
        assert_eq!(env_value(&cmd, ENV_SHAPES), Some(&OsString::from("first")));

        // The command line itself never contains the model paths
        let line = cmd.display();
        assert!(!line.contains("quoted"));
        assert!(!line.contains("out.obj"));
    }

    #[test]
    fn shape_selection_reaches_the_macro() {
        let tessellation = TessellationSettings {
            shapes: ShapeSelection::All,
            ..TessellationSettings::default()
        };
        let cmd = build_command(
            Path::new("freecadcmd"),
            Path::new("m.FCMacro"),
            Path::new("a.step"),
            Path::new("a.obj"),
            &tessellation,
        );
        assert_eq!(env_value(&cmd, ENV_SHAPES), Some(&OsString::from("all")));
    }

    #[test]
    fn macro_reads_every_variable_it_is_given() {
        for key in [
            ENV_INPUT,
            ENV_OUTPUT,
            ENV_LINEAR_DEFLECTION,
            ENV_ANGULAR_DEFLECTION,
            ENV_RELATIVE,
            ENV_SEGMENTS,
            ENV_SHAPES,
        ] {
            assert!(MACRO_SOURCE.contains(&format!("env[\"{}\"]", key)), "{key}");
        }
        assert!(EXEC_MACRO.contains(ENV_MACRO));
        assert!(MACRO_SOURCE.contains(WARNING_MARKER.trim_end()));
    }

    #[test]
    fn macro_file_is_scoped() {
        let dir = tempdir().unwrap();
        let path = write_macro(dir.path()).unwrap();
        let on_disk = path.to_path_buf();

        assert!(on_disk.to_string_lossy().ends_with(".FCMacro"));
        assert_eq!(fs::read_to_string(&on_disk).unwrap(), MACRO_SOURCE);

        drop(path);
        assert!(!on_disk.exists());
    }

    #[test]
    fn warnings_are_extracted_from_stdout() {
        let stdout = "Converting a to b\nSTEP2GLB-WARNING: 3 shapes found, exporting only the first\nExported 1 shape(s)\n";
        let warnings: Vec<&str> = macro_warnings(stdout).collect();
        assert_eq!(warnings, vec!["3 shapes found, exporting only the first"]);
    }
}
