//! Per-setting deployment constants
//!
//! Paths, keys and helper argument lists for the camera, touchscreen and
//! charger settings. Defaults match the HP TouchPad (tenderloin) layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the camera preview and rotation modes live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CameraBackend {
    /// `key=value` lines in a root-owned config file
    #[default]
    ConfigFile,
    /// `<helper> get|set <preview|rotation>` binary
    Helper,
}

/// Camera preview/rotation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CameraBackend,

    /// Config file shared by both camera keys
    #[serde(default = "default_camera_file")]
    pub config_file: PathBuf,

    #[serde(default = "default_preview_key")]
    pub preview_key: String,

    #[serde(default = "default_rotation_key")]
    pub rotation_key: String,

    /// Helper binary for the `helper` backend
    #[serde(default = "default_camera_helper")]
    pub helper: PathBuf,

    /// Helper subcommand names
    #[serde(default = "default_preview_subcommand")]
    pub preview_subcommand: String,

    #[serde(default = "default_rotation_subcommand")]
    pub rotation_subcommand: String,
}

fn default_true() -> bool {
    true
}

fn default_camera_file() -> PathBuf {
    PathBuf::from("/data/misc/camera/config.txt")
}

fn default_preview_key() -> String {
    "preview_mode".to_string()
}

fn default_rotation_key() -> String {
    "rotation_mode".to_string()
}

fn default_camera_helper() -> PathBuf {
    PathBuf::from("/system/bin/camera_config")
}

fn default_preview_subcommand() -> String {
    "preview".to_string()
}

fn default_rotation_subcommand() -> String {
    "rotation".to_string()
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CameraBackend::default(),
            config_file: default_camera_file(),
            preview_key: default_preview_key(),
            rotation_key: default_rotation_key(),
            helper: default_camera_helper(),
            preview_subcommand: default_preview_subcommand(),
            rotation_subcommand: default_rotation_subcommand(),
        }
    }
}

/// Touchscreen finger/stylus mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchscreenConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Driver helper binary; the setting is hidden when it is missing
    #[serde(default = "default_touchscreen_helper")]
    pub helper: PathBuf,

    /// Arguments that make the helper print the current mode
    #[serde(default = "default_touchscreen_get_args")]
    pub get_args: Vec<String>,

    /// Arguments placed before the new mode letter
    #[serde(default)]
    pub set_args: Vec<String>,

    /// Run the helper through `su`; stock builds let any user drive it
    #[serde(default)]
    pub privileged: bool,
}

fn default_touchscreen_helper() -> PathBuf {
    PathBuf::from("/system/bin/ts_srv_set")
}

fn default_touchscreen_get_args() -> Vec<String> {
    vec!["G".to_string()]
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            helper: default_touchscreen_helper(),
            get_args: default_touchscreen_get_args(),
            set_args: Vec::new(),
            privileged: false,
        }
    }
}

/// Charger current limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sysfs node; the setting is hidden when it is missing
    #[serde(default = "default_charger_sysfs")]
    pub sysfs_path: PathBuf,

    /// Literal prefix the driver puts in front of every value
    #[serde(default = "default_charger_prefix")]
    pub prefix: String,

    /// Limits the user may pick, as the driver spells them
    #[serde(default = "default_charger_limits")]
    pub limits: Vec<String>,

    /// Delay between the end of one poll and the start of the next
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_charger_sysfs() -> PathBuf {
    PathBuf::from("/sys/power/charger/currentlimit")
}

fn default_charger_prefix() -> String {
    "current".to_string()
}

fn default_charger_limits() -> Vec<String> {
    ["500ma", "1000ma", "1500ma", "2000ma"]
        .into_iter()
        .map(Into::into)
        .collect()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sysfs_path: default_charger_sysfs(),
            prefix: default_charger_prefix(),
            limits: default_charger_limits(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_defaults() {
        let camera = CameraConfig::default();
        assert_eq!(camera.backend, CameraBackend::ConfigFile);
        assert_eq!(camera.preview_key, "preview_mode");
        assert_eq!(camera.rotation_key, "rotation_mode");
    }

    #[test]
    fn test_camera_backend_names() {
        let camera: CameraConfig = toml::from_str("backend = \"helper\"").unwrap();
        assert_eq!(camera.backend, CameraBackend::Helper);

        let camera: CameraConfig = toml::from_str("backend = \"config-file\"").unwrap();
        assert_eq!(camera.backend, CameraBackend::ConfigFile);
    }

    #[test]
    fn test_touchscreen_defaults() {
        let ts = TouchscreenConfig::default();
        assert_eq!(ts.get_args, vec!["G".to_string()]);
        assert!(ts.set_args.is_empty());
        assert!(!ts.privileged);

        let ts: TouchscreenConfig = toml::from_str("privileged = true").unwrap();
        assert!(ts.privileged);
        assert_eq!(ts.get_args, vec!["G".to_string()]);
    }

    #[test]
    fn test_charger_defaults() {
        let charger = ChargerConfig::default();
        assert_eq!(charger.prefix, "current");
        assert_eq!(charger.poll_interval_ms, 1000);
        assert!(charger.limits.contains(&"500ma".to_string()));
    }
}
