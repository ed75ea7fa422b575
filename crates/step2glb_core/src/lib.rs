//! step2glb Core - STEP to GLB conversion through external tools
//!
//! This crate contains the conversion pipeline with zero CLI dependencies.
//! Geometry work is delegated entirely to FreeCAD (STEP → OBJ) and
//! obj2gltf (OBJ → GLB); this crate validates paths, drives both tools
//! and owns the lifetime of every temporary file involved.

pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod tools;

pub use orchestrator::{
    convert_obj_to_glb, convert_step_to_glb, convert_step_to_obj, ConversionReport,
    ConversionRequest,
};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
