use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use reload_core::Settings;
use reload_logging::{reload_info, reload_warn};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "settings.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}

/// Persisted settings in a RON file.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `./.reload/settings.ron` under the current directory.
    pub fn default_location() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".reload")
            .join(SETTINGS_FILENAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to defaults when the file is missing or unusable.
    pub fn load(&self) -> Settings {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Settings::default();
            }
            Err(err) => {
                reload_warn!("Failed to read settings from {:?}: {}", self.path, err);
                return Settings::default();
            }
        };

        match ron::from_str(&content) {
            Ok(settings) => {
                reload_info!("Loaded settings from {:?}", self.path);
                settings
            }
            Err(err) => {
                reload_warn!("Failed to parse settings from {:?}: {}", self.path, err);
                Settings::default()
            }
        }
    }

    /// Writes settings atomically: temp file in the same directory, then rename.
    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::new())?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("nope.ron"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn saved_settings_round_trip_through_nested_dir() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("a").join(SETTINGS_FILENAME));
        let settings = Settings {
            auto_refresh_timeout: "2 minutes".to_string(),
            blacklist: "vendor/\ncdn.test".to_string(),
            quiet: true,
            debug: false,
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);

        let replaced = Settings {
            quiet: false,
            ..settings
        };
        store.save(&replaced).unwrap();
        assert_eq!(store.load(), replaced);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILENAME);
        fs::write(&path, "(quiet: maybe").unwrap();
        assert_eq!(SettingsStore::new(path).load(), Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILENAME);
        fs::write(&path, "(quiet: true)").unwrap();
        let settings = SettingsStore::new(path).load();
        assert!(settings.quiet);
        assert_eq!(settings.auto_refresh_timeout, "5s");
    }
}
