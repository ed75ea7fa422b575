//! Pipeline step implementations.
//!
//! Each step drives one external tool.

mod export;
mod transcode;

pub use export::ExportStep;
pub use transcode::TranscodeStep;

use std::fs;
use std::path::Path;

use tempfile::TempPath;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::paths::FileKind;

/// Input must exist and carry an extension of `kind`.
fn check_input(path: &Path, kind: FileKind) -> StepResult<()> {
    if !path.exists() {
        return Err(StepError::file_not_found(path.display().to_string()));
    }
    if !kind.matches(path) {
        return Err(StepError::invalid_input(format!(
            "{} is not a {} file",
            path.display(),
            kind.label()
        )));
    }
    Ok(())
}

/// Empty placeholder beside `output` for the tool to write into.
///
/// The file keeps the output's extension so tools that pick a format
/// from it still do. It is deleted when dropped unless committed.
fn stage_output(output: &Path, kind: FileKind) -> StepResult<TempPath> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".step2glb-")
        .suffix(&format!(".{}", kind.canonical_extension()))
        .tempfile_in(dir)
        .map(|file| file.into_temp_path())
        .map_err(|e| StepError::io_error(format!("staging output in {}", dir.display()), e))
}

/// Check the staged file and move it over `output`.
///
/// A previous file at `output` is only replaced once the new one is good.
fn commit_output(tool: &str, staged: TempPath, output: &Path) -> StepResult<()> {
    if check_produced(tool, &staged).is_err() {
        return Err(StepError::missing_output(tool, output.display().to_string()));
    }
    staged.persist(output).map_err(|e| {
        StepError::io_error(format!("moving output into {}", output.display()), e.error)
    })
}

/// The tool must have left a non-empty file behind.
fn check_produced(tool: &str, path: &Path) -> StepResult<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(StepError::missing_output(tool, path.display().to_string())),
    }
}

/// Create the output's parent directory if needed.
fn ensure_parent_dir(path: &Path) -> StepResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| StepError::io_error("creating output directory", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn check_input_reports_missing_before_kind() {
        let err = check_input(Path::new("/nonexistent/part.obj"), FileKind::Step).unwrap_err();
        assert!(matches!(err, StepError::FileNotFound { .. }));
    }

    #[test]
    fn check_input_rejects_wrong_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("part.iges");
        fs::write(&path, "data").unwrap();

        let err = check_input(&path, FileKind::Step).unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));
    }

    #[test]
    fn check_produced_rejects_missing_and_empty_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.glb");
        assert!(check_produced("obj2gltf", &path).is_err());

        fs::write(&path, "").unwrap();
        assert!(check_produced("obj2gltf", &path).is_err());

        fs::write(&path, "glTF").unwrap();
        assert!(check_produced("obj2gltf", &path).is_ok());
    }

    #[test]
    fn staged_output_keeps_extension_and_vanishes_on_drop() {
        let dir = tempdir().unwrap();
        let staged = stage_output(&dir.path().join("model.glb"), FileKind::Glb).unwrap();
        let on_disk = staged.to_path_buf();

        assert_eq!(on_disk.parent(), Some(dir.path()));
        assert!(on_disk.to_string_lossy().ends_with(".glb"));

        drop(staged);
        assert!(!on_disk.exists());
    }

    #[test]
    fn commit_replaces_previous_output_only_when_produced() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("model.glb");
        fs::write(&output, "previous").unwrap();

        let empty = stage_output(&output, FileKind::Glb).unwrap();
        let err = commit_output("obj2gltf", empty, &output).unwrap_err();
        assert!(matches!(err, StepError::MissingOutput { .. }));
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");

        let staged = stage_output(&output, FileKind::Glb).unwrap();
        fs::write(&staged, "glTF").unwrap();
        commit_output("obj2gltf", staged, &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "glTF");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
