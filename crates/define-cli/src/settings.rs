//! Editor settings read from a TOML file.
//!
//! The default file lives in the platform config folder:
//! - macOS: ~/Library/Application Support/com.define-editor.Define-Editor/
//! - Windows: %APPDATA%/define-editor/Define Editor/config/
//! - Linux: ~/.config/defineeditor/
//!
//! ```toml
//! [history]
//! limit = 100
//!
//! [integrity]
//! verify_on_dispatch = false
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use define_core::StoreConfig;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "define-editor";
const APP_NAME: &str = "Define Editor";
const CONFIG_FILENAME: &str = "settings.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub history: HistorySettings,
    pub integrity: IntegritySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Undo depth; 0 keeps every step.
    pub limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { limit: 100 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegritySettings {
    /// Reject any dispatch whose result fails the integrity check.
    pub verify_on_dispatch: bool,
}

impl EditorSettings {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            history_limit: (self.history.limit > 0).then_some(self.history.limit),
            verify_integrity: self.integrity.verify_on_dispatch,
        }
    }
}

/// Path of the default settings file, if the platform has a config folder.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load settings from `explicit`, or from the default location.
///
/// An explicit path must exist. A missing default file yields defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<EditorSettings> {
    if let Some(path) = explicit {
        return read_settings(path);
    }
    let Some(path) = settings_path() else {
        tracing::warn!("could not determine settings path, using defaults");
        return Ok(EditorSettings::default());
    };
    match fs::metadata(&path) {
        Ok(_) => read_settings(&path),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Ok(EditorSettings::default())
        }
        Err(error) => {
            Err(error).with_context(|| format!("inspect settings file {}", path.display()))
        }
    }
}

fn read_settings(path: &Path) -> Result<EditorSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    let settings: EditorSettings = toml::from_str(&content)
        .with_context(|| format!("parse settings file {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded settings");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings: EditorSettings = toml::from_str("[integrity]\nverify_on_dispatch = true\n")
            .expect("parse");
        assert_eq!(settings.history.limit, 100);
        assert!(settings.integrity.verify_on_dispatch);
    }

    #[test]
    fn zero_limit_means_unbounded_history() {
        let mut settings = EditorSettings::default();
        settings.history.limit = 0;
        assert_eq!(settings.store_config().history_limit, None);
        assert_eq!(
            EditorSettings::default().store_config(),
            StoreConfig::default()
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_settings(Some(&dir.path().join("missing.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = EditorSettings {
            history: HistorySettings { limit: 7 },
            integrity: IntegritySettings {
                verify_on_dispatch: true,
            },
        };
        let text = toml::to_string_pretty(&settings).expect("serialize");
        assert_eq!(toml::from_str::<EditorSettings>(&text).expect("parse"), settings);
    }
}
