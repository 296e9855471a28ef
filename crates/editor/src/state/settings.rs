//! Editor settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::undoable::HistoryLimits;

/// Autosave behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutosaveSettings {
    /// Write the scratch model after every successful edit
    pub enabled: bool,
}

/// All editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Undo/redo depth
    #[serde(default)]
    pub history: HistoryLimits,
    /// Scale factor given to new documents
    #[serde(default = "default_scale_factor")]
    pub default_scale_factor: f32,
    #[serde(default)]
    pub autosave: AutosaveSettings,
    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_scale_factor() -> f32 {
    1.0
}

fn default_log_filter() -> String {
    "msk_editor=info,msk_model=info".to_string()
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history: HistoryLimits::default(),
            default_scale_factor: default_scale_factor(),
            autosave: AutosaveSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl EditorSettings {
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "msk", "msk-editor")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from the user's config directory
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_or_create(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`. On first run the defaults are written
    /// there so they can be edited.
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            return Self::load_from(path);
        }
        let settings = Self::default();
        if let Err(e) = settings.save_to(path) {
            warn!("cannot write default settings to {}: {e}", path.display());
        }
        settings
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring unreadable settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
