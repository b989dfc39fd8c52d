//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Dynamic lighting settings.
    pub lighting: LightingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// How often dynamic light sources may recompute their affected chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum QualityMode {
    /// Dynamic lighting never propagates.
    Off,
    /// At most one propagation every 500 ms.
    Slow,
    /// At most one propagation every 200 ms.
    Fast,
    /// No throttling.
    #[default]
    Unrestricted,
}

impl QualityMode {
    /// Minimum delay between two accepted updates, or `None` when unthrottled.
    ///
    /// `Off` has no interval either; callers check [`is_enabled`](Self::is_enabled) first.
    pub fn min_interval(self) -> Option<Duration> {
        match self {
            QualityMode::Slow => Some(Duration::from_millis(500)),
            QualityMode::Fast => Some(Duration::from_millis(200)),
            QualityMode::Off | QualityMode::Unrestricted => None,
        }
    }

    /// Returns `false` only for [`QualityMode::Off`].
    pub fn is_enabled(self) -> bool {
        self != QualityMode::Off
    }
}

/// Dynamic lighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Whether entities may emit dynamic light.
    pub entity_lighting: bool,
    /// Whether block entities may emit dynamic light.
    pub block_entity_lighting: bool,
    /// Update cadence.
    pub quality: QualityMode,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            entity_lighting: true,
            block_entity_lighting: true,
            quality: QualityMode::Unrestricted,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for lumen (`<config_dir>/lumen`), falling back
/// to the working directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("lumen"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::read(&config_path, e))?;
            let config: Config =
                ron::from_str(&contents).map_err(|e| ConfigError::parse(&config_path, e))?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::write(config_dir, e))?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(|e| ConfigError::write(&config_path, e))?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::read(&config_path, e))?;
        let new_config: Config =
            ron::from_str(&contents).map_err(|e| ConfigError::parse(&config_path, e))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("entity_lighting: true"));
        assert!(ron_str.contains("quality: Unrestricted"));
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(lighting: (quality: Slow))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.lighting.quality, QualityMode::Slow);
        assert!(config.lighting.entity_lighting);
        assert!(config.lighting.block_entity_lighting);
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_quality_intervals() {
        assert_eq!(QualityMode::Off.min_interval(), None);
        assert!(!QualityMode::Off.is_enabled());
        assert_eq!(
            QualityMode::Slow.min_interval(),
            Some(Duration::from_millis(500))
        );
        assert_eq!(
            QualityMode::Fast.min_interval(),
            Some(Duration::from_millis(200))
        );
        assert_eq!(QualityMode::Unrestricted.min_interval(), None);
        assert!(QualityMode::Unrestricted.is_enabled());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.lighting.quality = QualityMode::Fast;
        config.lighting.block_entity_lighting = false;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.lighting.quality = QualityMode::Off;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().lighting.quality, QualityMode::Off);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_parse_error_names_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.ron");
        std::fs::write(&config_path, "(lighting: (quality: Sometimes))").unwrap();

        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert_eq!(err.path(), Some(config_path.as_path()));
        assert!(err.to_string().contains(&config_path.display().to_string()));
    }

    #[test]
    fn test_reload_of_missing_file_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::default().reload(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
        assert_eq!(err.path(), Some(dir.path().join("config.ron").as_path()));
    }

    #[test]
    fn test_default_config_dir_ends_with_lumen_or_cwd() {
        let dir = default_config_dir();
        assert!(dir.ends_with("lumen") || dir == Path::new("."));
    }
}
