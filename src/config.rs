use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

/// Environment variable pointing at the audio root.
pub const AUDIO_PATH_ENV: &str = "MEDLEYDB_PATH";

/// Dataset roots and table locations, loaded from a TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding `<track_id>_METADATA.yaml` files.
    pub metadata_dir: PathBuf,
    /// Directory holding `<track_id>_ANNOTATIONS/` directories.
    pub annotation_dir: PathBuf,
    /// Audio root. `None` disables audio path resolution entirely.
    pub audio_dir: Option<PathBuf>,
    /// Mixing coefficient table. Defaults to `<metadata_dir>/mixing_coefficients.yaml`.
    pub mixing_coefficients_path: Option<PathBuf>,
    /// Instrument taxonomy override (built-in if unset).
    pub taxonomy_path: Option<PathBuf>,
    /// Instrument f0 type table override (built-in if unset).
    pub f0_types_path: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            metadata_dir: PathBuf::from("Metadata"),
            annotation_dir: PathBuf::from("Annotations"),
            audio_dir: None,
            mixing_coefficients_path: None,
            taxonomy_path: None,
            f0_types_path: None,
        }
    }
}

impl DatasetConfig {
    /// Load config from `~/.config/medleydb/config.toml`, then fill `audio_dir`
    /// from `MEDLEYDB_PATH` if the file left it unset.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        if config.audio_dir.is_none() {
            config.audio_dir = std::env::var_os(AUDIO_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        config
    }

    /// Load a specific config file, logging and falling back to defaults on failure.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<DatasetConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Config rooted at one directory laid out as `Metadata/`, `Annotations/`
    /// and `Audio/`.
    pub fn from_root(root: &Path, with_audio: bool) -> Self {
        Self {
            metadata_dir: root.join("Metadata"),
            annotation_dir: root.join("Annotations"),
            audio_dir: with_audio.then(|| root.join("Audio")),
            ..Self::default()
        }
    }

    pub fn resolve_mixing_coefficients_path(&self) -> PathBuf {
        self.mixing_coefficients_path
            .clone()
            .unwrap_or_else(|| self.metadata_dir.join("mixing_coefficients.yaml"))
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DatasetConfig::default();
        assert_eq!(config.metadata_dir, PathBuf::from("Metadata"));
        assert!(config.audio_dir.is_none());
        assert_eq!(
            config.resolve_mixing_coefficients_path(),
            PathBuf::from("Metadata/mixing_coefficients.yaml")
        );
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "metadata_dir = \"/data/meta\"\naudio_dir = \"/data/audio\"\n",
        )
        .unwrap();
        let config = DatasetConfig::load_from(&path);
        assert_eq!(config.metadata_dir, PathBuf::from("/data/meta"));
        assert_eq!(config.annotation_dir, PathBuf::from("Annotations"));
        assert_eq!(config.audio_dir, Some(PathBuf::from("/data/audio")));
    }

    #[test]
    fn test_load_from_bad_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "metadata_dir = [").unwrap();
        let config = DatasetConfig::load_from(&path);
        assert_eq!(config.metadata_dir, PathBuf::from("Metadata"));
    }

    #[test]
    fn test_from_root() {
        let config = DatasetConfig::from_root(Path::new("/db"), false);
        assert_eq!(config.annotation_dir, PathBuf::from("/db/Annotations"));
        assert!(config.audio_dir.is_none());
        let config = DatasetConfig::from_root(Path::new("/db"), true);
        assert_eq!(config.audio_dir, Some(PathBuf::from("/db/Audio")));
    }
}
