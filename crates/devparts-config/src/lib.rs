//! Configuration management for devparts
//!
//! Holds the per-deployment constants of every device setting (file paths,
//! config keys, helper argument lists, allowed charger limits) together with
//! process-wide settings such as the preference store location.
//! Configuration lives in a TOML file; environment variables prefixed with
//! `DEVPARTS_` override it when loaded through [`DevpartsConfig::load_layered`].

mod settings_config;
mod system_config;

pub use settings_config::{CameraBackend, CameraConfig, ChargerConfig, TouchscreenConfig};
pub use system_config::SystemConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/devparts";
pub const USER_CONFIG_DIR: &str = "/data/misc/devparts";

/// Environment prefix for layered overrides, e.g. `DEVPARTS_CHARGER__POLL_INTERVAL_MS`
pub const ENV_PREFIX: &str = "DEVPARTS";

/// Main devparts configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevpartsConfig {
    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub touchscreen: TouchscreenConfig,

    #[serde(default)]
    pub charger: ChargerConfig,
}

impl DevpartsConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => {
                tracing::warn!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// First existing config file, user location before system location
    pub fn default_path() -> Option<PathBuf> {
        [
            Path::new(USER_CONFIG_DIR).join("devparts.toml"),
            Path::new(CONFIG_DIR).join("devparts.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Load `path` (or the default location, if any) and apply `DEVPARTS_`
    /// environment overrides on top
    pub fn load_layered(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_environment(path, Self::environment())
    }

    /// `DEVPARTS_SECTION__FIELD` variables, e.g. `DEVPARTS_CHARGER__POLL_INTERVAL_MS`
    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_environment(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        if let Some(file) = file {
            tracing::debug!("Loading configuration from {}", file.display());
            builder = builder
                .add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        let settings = builder.add_source(environment).build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values no device setting could work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if camera.preview_key.is_empty() || camera.rotation_key.is_empty() {
            return Err(ConfigError::Invalid("camera keys must not be empty".into()));
        }
        if camera.preview_key == camera.rotation_key {
            return Err(ConfigError::Invalid(format!(
                "camera preview and rotation share the key '{}'",
                camera.preview_key
            )));
        }

        let charger = &self.charger;
        if charger.limits.is_empty() {
            return Err(ConfigError::Invalid("charger limits must not be empty".into()));
        }
        if charger.limits.iter().any(|l| l == "none" || l.is_empty()) {
            return Err(ConfigError::Invalid(
                "charger limits may not be empty or 'none'".into(),
            ));
        }
        if charger.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "charger poll interval must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = DevpartsConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.camera.enabled);
        assert_eq!(config.charger.poll_interval_ms, 1000);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_content = r#"
[system]
log_level = "debug"

[camera]
backend = "helper"
helper = "/vendor/bin/camcfg"

[charger]
limits = ["500ma", "900ma"]
poll_interval_ms = 250
"#;
        write!(temp_file, "{}", config_content).unwrap();

        let config = DevpartsConfig::load(temp_file.path()).unwrap();
        assert_eq!(config.system.log_level, "debug");
        assert_eq!(config.camera.backend, CameraBackend::Helper);
        assert_eq!(config.camera.helper, PathBuf::from("/vendor/bin/camcfg"));
        assert_eq!(config.charger.limits, vec!["500ma", "900ma"]);
        assert_eq!(config.charger.poll_interval_ms, 250);
        // untouched sections keep their defaults
        assert_eq!(config.touchscreen.get_args, vec!["G".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DevpartsConfig::load(Path::new("/nonexistent/devparts.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("devparts.toml");

        let mut config = DevpartsConfig::default();
        config.charger.poll_interval_ms = 500;
        config.save(&path).unwrap();

        let loaded = DevpartsConfig::load(&path).unwrap();
        assert_eq!(loaded.charger.poll_interval_ms, 500);
        assert_eq!(loaded.camera.config_file, config.camera.config_file);
    }

    #[test]
    fn test_layered_load_reads_file() {
        let mut temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(temp_file, "[touchscreen]\nenabled = false\n").unwrap();

        let config = DevpartsConfig::load_layered(Some(temp_file.path())).unwrap();
        assert!(!config.touchscreen.enabled);
        assert!(config.charger.enabled);
    }

    #[test]
    fn test_layered_load_environment_overrides_file() {
        let mut temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            temp_file,
            "[charger]\npoll_interval_ms = 500\n\n[touchscreen]\nenabled = true\n"
        )
        .unwrap();

        let vars: config::Map<String, String> = [
            ("DEVPARTS_CHARGER__POLL_INTERVAL_MS", "250"),
            ("DEVPARTS_TOUCHSCREEN__ENABLED", "false"),
            ("DEVPARTS_SYSTEM__LOG_LEVEL", "trace"),
            ("OTHER_CHARGER__POLL_INTERVAL_MS", "9"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = DevpartsConfig::load_with_environment(
            Some(temp_file.path()),
            DevpartsConfig::environment().source(Some(vars)),
        )
        .unwrap();
        assert_eq!(config.charger.poll_interval_ms, 250);
        assert!(!config.touchscreen.enabled);
        assert_eq!(config.system.log_level, "trace");
        assert_eq!(config.camera.preview_key, "preview_mode");
    }

    #[test]
    fn test_layered_load_rejects_invalid_override() {
        let vars: config::Map<String, String> =
            [("DEVPARTS_CHARGER__POLL_INTERVAL_MS".to_string(), "0".to_string())]
                .into_iter()
                .collect();

        let err = DevpartsConfig::load_with_environment(
            None,
            DevpartsConfig::environment().source(Some(vars)),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_layered_load_missing_file() {
        let err = DevpartsConfig::load_layered(Some(Path::new("/nonexistent/devparts.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_validate_rejects_shared_camera_key() {
        let mut config = DevpartsConfig::default();
        config.camera.rotation_key = config.camera.preview_key.clone();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_charger() {
        let mut config = DevpartsConfig::default();
        config.charger.limits.clear();
        assert!(config.validate().is_err());

        let mut config = DevpartsConfig::default();
        config.charger.limits.push("none".into());
        assert!(config.validate().is_err());

        let mut config = DevpartsConfig::default();
        config.charger.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotFound(PathBuf::from("/etc/devparts/devparts.toml"));
        assert!(format!("{}", err).contains("not found"));

        let err = ConfigError::Invalid("test error".to_string());
        assert!(format!("{}", err).contains("Invalid"));
    }

    #[test]
    fn test_constants() {
        assert_eq!(CONFIG_DIR, "/etc/devparts");
        assert_eq!(ENV_PREFIX, "DEVPARTS");
    }
}
