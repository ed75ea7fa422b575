//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every key has a default, so a partial (or empty) file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// External tool locations and arguments.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Tessellation parameters handed to FreeCAD.
    #[serde(default)]
    pub tessellation: TessellationSettings,

    /// Temp and log directories.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check values that deserialize fine but make no sense.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.tessellation;
        for (key, value) in [
            ("linear_deflection", t.linear_deflection),
            ("angular_deflection", t.angular_deflection),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!(
                    "tessellation.{} must be a positive number, got {}",
                    key, value
                ));
            }
        }

        if self.tools.freecad_path.trim().is_empty() {
            return Err("tools.freecad_path must not be empty".to_string());
        }
        if self.tools.transcoder_launcher.trim().is_empty() {
            return Err("tools.transcoder_launcher must not be empty".to_string());
        }
        if self.logging.error_tail == 0 {
            return Err("logging.error_tail must be at least 1".to_string());
        }

        Ok(())
    }

    /// Root for scoped temporary files (system temp dir when unset).
    pub fn temp_root(&self) -> PathBuf {
        if self.paths.temp_root.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.paths.temp_root)
        }
    }

    /// Directory for per-run log files, if file logging is enabled.
    pub fn logs_folder(&self) -> Option<PathBuf> {
        (!self.paths.logs_folder.is_empty()).then(|| PathBuf::from(&self.paths.logs_folder))
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// FreeCAD executable run in console mode.
    #[serde(default = "default_freecad_path")]
    pub freecad_path: String,

    /// Package runner used to launch the transcoder.
    #[serde(default = "default_transcoder_launcher")]
    pub transcoder_launcher: String,

    /// Transcoder package run by the launcher.
    #[serde(default = "default_transcoder_package")]
    pub transcoder_package: String,

    /// Extra arguments appended after `-i <obj> -o <glb>`.
    #[serde(default)]
    pub transcoder_args: Vec<String>,
}

fn default_freecad_path() -> String {
    if cfg!(target_os = "macos") {
        "/Applications/FreeCAD.app/Contents/MacOS/FreeCAD".to_string()
    } else if cfg!(windows) {
        r"C:\Program Files\FreeCAD 1.0\bin\FreeCADCmd.exe".to_string()
    } else {
        "freecadcmd".to_string()
    }
}

fn default_transcoder_launcher() -> String {
    if cfg!(windows) {
        "npx.cmd".to_string()
    } else {
        "npx".to_string()
    }
}

fn default_transcoder_package() -> String {
    "obj2gltf".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            freecad_path: default_freecad_path(),
            transcoder_launcher: default_transcoder_launcher(),
            transcoder_package: default_transcoder_package(),
            transcoder_args: Vec::new(),
        }
    }
}

/// Which shapes of the STEP document end up in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeSelection {
    /// Only the first shape found (extra shapes are reported and dropped).
    #[default]
    First,
    /// Every shape, merged into one mesh.
    All,
}

impl ShapeSelection {
    /// Value passed to the FreeCAD macro.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeSelection::First => "first",
            ShapeSelection::All => "all",
        }
    }
}

/// Tessellation parameters for `MeshPart.meshFromShape`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessellationSettings {
    /// Maximum distance between mesh and surface.
    #[serde(default = "default_deflection")]
    pub linear_deflection: f64,

    /// Maximum angle between adjacent facets (radians).
    #[serde(default = "default_deflection")]
    pub angular_deflection: f64,

    /// Interpret the linear deflection relative to edge length.
    #[serde(default)]
    pub relative: bool,

    /// Generate one mesh segment per face.
    #[serde(default = "default_true")]
    pub segments: bool,

    /// Shape selection policy.
    #[serde(default)]
    pub shapes: ShapeSelection,
}

fn default_deflection() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            linear_deflection: default_deflection(),
            angular_deflection: default_deflection(),
            relative: false,
            segments: true,
            shapes: ShapeSelection::First,
        }
    }
}

/// Temp and log directories. Empty strings mean "not set".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root for scoped temporary files.
    #[serde(default)]
    pub temp_root: String,

    /// Folder for per-run log files.
    #[serde(default)]
    pub logs_folder: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for job log lines.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep external tool output out of the log unless a tool fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines shown when a tool fails.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with the wall-clock time.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

impl LoggingSettings {
    /// Build the job logger configuration from these settings.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
        }
    }
}

/// Configuration sections for selective updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Tools,
    Tessellation,
    Paths,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Tools,
        ConfigSection::Tessellation,
        ConfigSection::Paths,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "tools",
            ConfigSection::Tessellation => "tessellation",
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "External tools (FreeCAD and the OBJ to GLB transcoder)",
            ConfigSection::Tessellation => "Tessellation parameters used by FreeCAD",
            ConfigSection::Paths => "Temp and log directories (empty = system temp / no log file)",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tessellation() {
        let t = TessellationSettings::default();
        assert_eq!(t.linear_deflection, 0.1);
        assert_eq!(t.angular_deflection, 0.1);
        assert!(!t.relative);
        assert!(t.segments);
        assert_eq!(t.shapes, ShapeSelection::First);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.tools.transcoder_package, "obj2gltf");
        assert!(settings.validate().is_ok());
        assert!(settings.logs_folder().is_none());
    }

    #[test]
    fn shape_selection_parses_lowercase() {
        let settings: Settings = toml::from_str("[tessellation]\nshapes = \"all\"\n").unwrap();
        assert_eq!(settings.tessellation.shapes, ShapeSelection::All);
    }

    #[test]
    fn validate_rejects_non_positive_deflection() {
        let mut settings = Settings::default();
        settings.tessellation.angular_deflection = 0.0;
        let err = settings.validate().unwrap_err();
        assert!(err.contains("angular_deflection"));
    }

    #[test]
    fn temp_root_falls_back_to_system_temp() {
        let mut settings = Settings::default();
        assert_eq!(settings.temp_root(), std::env::temp_dir());

        settings.paths.temp_root = "/scratch".to_string();
        assert_eq!(settings.temp_root(), PathBuf::from("/scratch"));
    }
}
