//! Wrappers around the external conversion tools.
//!
//! - [`freecad`] - STEP → OBJ through a FreeCAD console-mode macro
//! - [`obj2gltf`] - OBJ → GLB through a package runner
//! - [`runner`] - blocking process execution shared by both

pub mod freecad;
pub mod obj2gltf;
mod runner;

pub use runner::{ToolCommand, ToolOutput};
