//! Configuration management for step2glb.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use step2glb_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new(".config/step2glb.toml");
//! config.load_or_create().unwrap();
//!
//! println!("FreeCAD: {}", config.settings().tools.freecad_path);
//!
//! config.settings_mut().tessellation.linear_deflection = 0.05;
//! config.save().unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, Settings, ShapeSelection, TessellationSettings,
    ToolSettings,
};
