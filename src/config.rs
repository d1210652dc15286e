// ── Settings persistence ──────────────────────────────────────────────────────
//
// Reads and writes `<config dir>/tether/settings.json`.
// No `unsafe`; pure safe Rust + serde_json.

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::PointI;
use crate::video::VideoMode;

// ── On-disk types ─────────────────────────────────────────────────────────────

/// Root of the JSON settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    /// Desired video mode applied at startup.
    #[serde(default)]
    pub video: VideoMode,
    #[serde(default)]
    pub video_driver: usize,
    #[serde(default)]
    pub audio_driver: usize,
    #[serde(default = "default_title")]
    pub title: String,
    /// Window position from the previous run.  `None` centers the window.
    #[serde(default)]
    pub position: Option<PointI>,
    #[serde(default)] // old files without this field parse as false
    pub debug_logging: bool,
}

fn default_title() -> String {
    "Tether".to_owned()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            video: VideoMode::default(),
            video_driver: 0,
            audio_driver: 0,
            title: default_title(),
            position: None,
            debug_logging: cfg!(debug_assertions),
        }
    }
}

// ── Format version ────────────────────────────────────────────────────────────

const SETTINGS_VERSION: u32 = 1;

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the path to the settings file.
///
/// Returns `None` if the platform has no per-user configuration directory.
pub fn settings_path() -> Option<PathBuf> {
    let mut p = dirs::config_dir()?;
    p.push("tether");
    p.push("settings.json");
    Some(p)
}

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write settings to `path`, creating parent directories as needed.
pub fn save_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, settings)?;
    Ok(())
}

/// Write settings to the default location.
pub fn save(settings: &Settings) -> Result<()> {
    let path = settings_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no configuration directory")
    })?;
    save_to(&path, settings)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read and parse a settings file.
///
/// Returns `None` on any error: file missing, JSON parse failure, or an
/// unrecognised version number.  Callers continue with defaults.
pub fn load_from(path: &Path) -> Option<Settings> {
    let data = fs::read(path).ok()?;
    let settings: Settings = serde_json::from_slice(&data).ok()?;
    if settings.version != SETTINGS_VERSION {
        return None;
    }
    Some(settings)
}

pub fn load() -> Option<Settings> {
    load_from(&settings_path()?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            video: VideoMode {
                width: 1280,
                height: 720,
                fullscreen: true,
                ..VideoMode::default()
            },
            title: "Demo".to_owned(),
            position: Some(PointI::new(40, 60)),
            ..Settings::default()
        };
        save_to(&path, &settings).expect("save");

        let loaded = load_from(&path).expect("load");
        assert_eq!(loaded, settings);
    }

    /// Files written before `debug_logging` and `position` existed.
    #[test]
    fn optional_fields_default_when_absent() {
        let json = r#"{"version":1,"video":{"width":800,"height":600}}"#;
        let s: Settings = serde_json::from_str(json).expect("deserialize old format");
        assert!(!s.debug_logging);
        assert_eq!(s.position, None);
        assert_eq!(s.title, "Tether");
        assert_eq!(s.video.width, 800);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let settings = Settings {
            version: 99,
            ..Settings::default()
        };
        save_to(&path, &settings).expect("save");
        assert!(load_from(&path).is_none());
    }

    #[test]
    fn garbage_file_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{not json").expect("write");
        assert!(load_from(&path).is_none());
    }

    #[test]
    fn missing_file_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_from(&dir.path().join("absent.json")).is_none());
    }
}
