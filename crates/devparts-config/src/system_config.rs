//! Process-wide configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Privilege, storage and logging settings shared by every device setting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Binary used to elevate commands when not already running as root
    #[serde(default = "default_su_binary")]
    pub su_binary: PathBuf,

    /// Preference store file (flat JSON object)
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_su_binary() -> PathBuf {
    PathBuf::from("su")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/data/misc/devparts/preferences.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            su_binary: default_su_binary(),
            store_path: default_store_path(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_defaults() {
        let system = SystemConfig::default();
        assert_eq!(system.su_binary, PathBuf::from("su"));
        assert_eq!(system.log_level, "info");
        assert!(system.store_path.ends_with("preferences.json"));
    }

    #[test]
    fn test_partial_system_section() {
        let system: SystemConfig = toml::from_str("log_level = \"debug\"").unwrap();
        assert_eq!(system.log_level, "debug");
        assert_eq!(system.su_binary, PathBuf::from("su"));
    }
}
