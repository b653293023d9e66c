//! The set of settings this device supports
//!
//! Support is decided once, when the registry is built: a setting whose
//! helper binary or sysfs node is missing is left out entirely.

use crate::channel::{ConfigFileChannel, SettingChannel, ShellHelperChannel, SysfsChannel};
use crate::codec::{ChargerCodec, SettingCodec, SettingValue};
use crate::executor::{CommandExecutor, PrivilegedExecutor};
use crate::setting::{DeviceSetting, SettingKey, SyncOutcome};
use crate::store::PreferenceStore;
use devparts_config::{CameraBackend, DevpartsConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Locate a helper binary: paths are checked as-is, bare names are looked up on PATH
pub fn resolve_binary(path: &Path) -> Option<PathBuf> {
    if path.components().count() > 1 {
        return path.exists().then(|| path.to_path_buf());
    }
    which::which(path).ok()
}

#[derive(Debug, Default)]
pub struct SettingRegistry {
    settings: BTreeMap<SettingKey, DeviceSetting>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for the running device from `config`.
    ///
    /// Root-only channels run through `executor`; helpers configured as
    /// unprivileged run directly with the caller's own privileges.
    pub fn probe(config: &DevpartsConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self::probe_with(config, executor, Arc::new(PrivilegedExecutor::direct()))
    }

    /// Like [`SettingRegistry::probe`] with an explicit executor for unprivileged helpers
    pub fn probe_with(
        config: &DevpartsConfig,
        executor: Arc<dyn CommandExecutor>,
        unprivileged: Arc<dyn CommandExecutor>,
    ) -> Self {
        let mut registry = Self::new();

        let camera = &config.camera;
        if camera.enabled {
            match camera.backend {
                CameraBackend::ConfigFile => {
                    let keys = vec![camera.preview_key.clone(), camera.rotation_key.clone()];
                    let preview = ConfigFileChannel::new(
                        executor.clone(),
                        &camera.config_file,
                        &camera.preview_key,
                        keys.clone(),
                    );
                    let rotation = ConfigFileChannel::new(
                        executor.clone(),
                        &camera.config_file,
                        &camera.rotation_key,
                        keys,
                    );
                    registry.register(DeviceSetting::new(
                        SettingKey::PreviewMode,
                        SettingChannel::ConfigFile(preview),
                        SettingCodec::Preview,
                    ));
                    registry.register(DeviceSetting::new(
                        SettingKey::RotationMode,
                        SettingChannel::ConfigFile(rotation),
                        SettingCodec::Rotation,
                    ));
                }
                CameraBackend::Helper => match resolve_binary(&camera.helper) {
                    Some(helper) => {
                        let preview = ShellHelperChannel::subcommand(
                            executor.clone(),
                            &helper,
                            &camera.preview_subcommand,
                        );
                        let rotation = ShellHelperChannel::subcommand(
                            executor.clone(),
                            &helper,
                            &camera.rotation_subcommand,
                        );
                        registry.register(DeviceSetting::new(
                            SettingKey::PreviewMode,
                            SettingChannel::ShellHelper(preview),
                            SettingCodec::Preview,
                        ));
                        registry.register(DeviceSetting::new(
                            SettingKey::RotationMode,
                            SettingChannel::ShellHelper(rotation),
                            SettingCodec::Rotation,
                        ));
                    }
                    None => tracing::info!(
                        "Camera helper {} not found, camera settings disabled",
                        camera.helper.display()
                    ),
                },
            }
        }

        let ts = &config.touchscreen;
        if ts.enabled {
            match resolve_binary(&ts.helper) {
                Some(helper) => {
                    let ts_executor = if ts.privileged {
                        executor.clone()
                    } else {
                        unprivileged
                    };
                    let channel = ShellHelperChannel::with_args(
                        ts_executor,
                        helper,
                        ts.get_args.clone(),
                        ts.set_args.clone(),
                    );
                    registry.register(DeviceSetting::new(
                        SettingKey::TouchscreenMode,
                        SettingChannel::ShellHelper(channel),
                        SettingCodec::Touchscreen,
                    ));
                }
                None => tracing::info!(
                    "Touchscreen helper {} not found, touchscreen settings disabled",
                    ts.helper.display()
                ),
            }
        }

        let charger = &config.charger;
        if charger.enabled {
            if charger.sysfs_path.exists() {
                let channel = SysfsChannel::new(executor, &charger.sysfs_path);
                let codec = ChargerCodec::new(&charger.prefix, charger.limits.clone());
                registry.register(DeviceSetting::new(
                    SettingKey::ChargerLimit,
                    SettingChannel::Sysfs(channel),
                    SettingCodec::Charger(codec),
                ));
            } else {
                tracing::info!(
                    "{} not found, charger control disabled",
                    charger.sysfs_path.display()
                );
            }
        }

        tracing::info!("{} device settings supported", registry.len());
        registry
    }

    /// Add or replace a setting
    pub fn register(&mut self, setting: DeviceSetting) {
        tracing::debug!("Registered {} via {:?}", setting.key(), setting.channel());
        self.settings.insert(setting.key(), setting);
    }

    pub fn contains(&self, key: SettingKey) -> bool {
        self.settings.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = SettingKey> + '_ {
        self.settings.keys().copied()
    }

    pub fn get(&self, key: SettingKey) -> Option<&DeviceSetting> {
        self.settings.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceSetting> {
        self.settings.values()
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Sync every registered setting; one setting's failure does not affect the others
    pub fn sync_all(&mut self, store: &mut PreferenceStore) -> Vec<(SettingKey, SyncOutcome)> {
        self.settings
            .iter_mut()
            .map(|(key, setting)| (*key, setting.sync(store)))
            .collect()
    }

    /// Sync one setting, `None` if it is not registered
    pub fn sync(&mut self, key: SettingKey, store: &mut PreferenceStore) -> Option<SyncOutcome> {
        self.settings.get_mut(&key).map(|s| s.sync(store))
    }

    /// Apply `value` to the setting under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered. Check [`SettingRegistry::contains`]
    /// first when the key comes from outside.
    pub fn apply(&mut self, key: SettingKey, value: SettingValue, store: &mut PreferenceStore) -> bool {
        match self.settings.get_mut(&key) {
            Some(setting) => setting.apply(value, store),
            None => panic!("setting {key} is not registered on this device"),
        }
    }

    /// Parse a preference-form string and apply it; unparseable text is rejected.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered.
    pub fn apply_str(&mut self, key: SettingKey, text: &str, store: &mut PreferenceStore) -> bool {
        let parsed = match self.settings.get(&key) {
            Some(setting) => setting.codec().parse(text),
            None => panic!("setting {key} is not registered on this device"),
        };

        match parsed {
            Ok(value) => self.apply(key, value, store),
            Err(e) => {
                tracing::warn!("{}: {}", key, e);
                false
            }
        }
    }
}
