//! File kinds handled by the pipeline and path normalization helpers.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// File formats that flow through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// STEP solid model (`.step`, `.stp`).
    Step,
    /// Wavefront OBJ mesh (`.obj`).
    Obj,
    /// Binary glTF (`.glb`).
    Glb,
}

impl FileKind {
    /// Accepted extensions, canonical one first.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Step => &["step", "stp"],
            FileKind::Obj => &["obj"],
            FileKind::Glb => &["glb"],
        }
    }

    /// Canonical extension used when coercing an output path.
    pub fn canonical_extension(&self) -> &'static str {
        self.extensions()[0]
    }

    /// Short human-readable label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Step => "STEP",
            FileKind::Obj => "OBJ",
            FileKind::Glb => "GLB",
        }
    }

    /// Check whether the path carries one of this kind's extensions.
    ///
    /// The comparison is case-insensitive.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions()
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            })
            .unwrap_or(false)
    }

    /// Append the canonical extension unless the path already matches.
    ///
    /// The extension is appended, never substituted: `model.txt` becomes
    /// `model.txt.glb`.
    pub fn coerce(&self, path: &Path) -> PathBuf {
        if self.matches(path) {
            return path.to_path_buf();
        }

        let mut raw: OsString = path.as_os_str().to_owned();
        raw.push(".");
        raw.push(self.canonical_extension());
        PathBuf::from(raw)
    }
}

/// Make a path absolute against the current directory.
///
/// The file does not need to exist.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    std::path::absolute(path)
}

/// Resolve an executable the way a shell would.
///
/// A path with more than one component must point at an existing file.
/// A bare program name is looked up on `PATH`.
pub fn resolve_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }

    let name = program.as_os_str();
    if name.is_empty() {
        return None;
    }

    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let full = dir.join(name);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            let mut exe = full.into_os_string();
            exe.push(".exe");
            let exe = PathBuf::from(exe);
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}
