//! Persisted preferences and host-supplied entitlement limits.
//!
//! Preferences live in a JSON file at an OS-appropriate location. Entitlements
//! come from the host's subscription state and are never computed here.

use crate::{ListingMode, Result, SectionFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Limits derived from the user's subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlements {
    /// Maximum number of items selectable in one flow; `None` is unlimited.
    pub selection_cap: Option<usize>,
    /// Maximum number of stored folders; `None` is unlimited.
    pub category_cap: Option<usize>,
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory holding nest databases.
    pub data_directory: String,
    /// Last section filter chosen on a folder screen.
    pub section_filter: SectionFilter,
    /// Whether sitters see entries above their ceiling as locked rows.
    pub listing_mode: ListingMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory().to_string_lossy().to_string(),
            section_filter: SectionFilter::all(),
            listing_mode: ListingMode::Hide,
        }
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/nestnote/settings.json`
/// - Windows: `%APPDATA%/NestNote/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("NestNote").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("nestnote").join("settings.json")
    }
}

/// Returns the default data directory: the platform data dir plus `NestNote`.
pub fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("NestNote")
}

/// Loads settings from the default location.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_file_path())
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt settings at {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Saves settings to the default location.
pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_file_path(), settings)
}

/// Saves settings to `path`, creating parent directories as needed.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(&dir.path().join("absent.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.section_filter.places = false;
        settings.listing_mode = ListingMode::ShowLocked;

        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"listingMode":"showLocked"}"#).unwrap();
        let settings = load_settings_from(&path);
        assert_eq!(settings.listing_mode, ListingMode::ShowLocked);
        assert_eq!(settings.section_filter, SectionFilter::all());
    }

    #[test]
    fn test_settings_path_is_named_settings_json() {
        assert!(settings_file_path().ends_with("settings.json"));
    }
}
