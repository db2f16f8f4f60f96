use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Arrow-key nudge distance in document units.
    pub nudge_step: f32,
    /// Nudge distance with shift held.
    pub nudge_step_fast: f32,
    /// File name (without extension) suggested for exports.
    pub export_file_stem: String,
    /// Supersampling factor of raster and PDF export.
    pub export_scale: f32,
    /// Export background, `#rrggbb`.
    pub background: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nudge_step: 1.0,
            nudge_step_fast: 10.0,
            export_file_stem: "diagram".to_string(),
            export_scale: 2.0,
            background: "#ffffff".to_string(),
        }
    }
}

impl Settings {
    /// Loads the first readable settings file on the search path, or defaults.
    pub fn load_or_default() -> Self {
        for path in search_paths() {
            if let Some(settings) = load_settings(&path) {
                tracing::info!(path = %path.display(), "loaded settings");
                return settings;
            }
        }
        Self::default()
    }
}

/// `$HOME/.config/diagrammer.toml`, then `./settings.toml`.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("diagrammer.toml"));
    }
    paths.push(PathBuf::from("settings.toml"));
    paths
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

/// Reads `path` as TOML or JSON (by extension, then the other format).
/// Unreadable or unparseable files yield `None`.
pub fn load_settings(path: &Path) -> Option<Settings> {
    let s = std::fs::read_to_string(path).ok()?;
    if is_toml(path) {
        toml::from_str::<Settings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<Settings>(&s).ok())
    } else {
        serde_json::from_str::<Settings>(&s)
            .ok()
            .or_else(|| toml::from_str::<Settings>(&s).ok())
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let text = if is_toml(path) {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagrammer.toml");
        let settings = Settings {
            nudge_step: 4.0,
            export_file_stem: "architecture".into(),
            ..Settings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), Some(settings));
    }

    #[test]
    fn partial_files_fill_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "export_scale = 3.0\n").unwrap();
        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.export_scale, 3.0);
        assert_eq!(loaded.nudge_step_fast, 10.0);
    }

    #[test]
    fn json_in_a_toml_file_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, r##"{"background": "#000000"}"##).unwrap();
        assert_eq!(load_settings(&path).unwrap().background, "#000000");
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(&dir.path().join("absent.toml")).is_none());
    }
}
