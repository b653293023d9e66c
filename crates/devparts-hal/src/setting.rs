//! A single hardware setting bound to its channel and codec
//!
//! `DeviceSetting` keeps the last value seen on, or successfully written to,
//! the hardware. Failed reads, undecodable values and rejected writes leave
//! that value alone.
//!
//! Callers must not touch one setting from two threads at once and must keep
//! `sync`/`apply` off threads that have to stay responsive: both block on
//! file and process I/O.

use crate::SyncError;
use crate::channel::SettingChannel;
use crate::codec::{SettingCodec, SettingValue};
use crate::labels::{Label, LabelProvider};
use crate::store::PreferenceStore;
use std::fmt;

/// Preference keys of the supported settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    PreviewMode,
    RotationMode,
    TouchscreenMode,
    ChargerLimit,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::PreviewMode,
        SettingKey::RotationMode,
        SettingKey::TouchscreenMode,
        SettingKey::ChargerLimit,
    ];

    /// Key used in the preference store
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::PreviewMode => "preview_mode_preference",
            SettingKey::RotationMode => "rotation_mode_preference",
            SettingKey::TouchscreenMode => "touchscreen_mode_preference",
            SettingKey::ChargerLimit => "charger_control_limit_pref",
        }
    }

    /// Accepts the store key or a short alias (`preview`, `rotation`, `touchscreen`, `charger`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "preview_mode_preference" | "preview" => Some(SettingKey::PreviewMode),
            "rotation_mode_preference" | "rotation" => Some(SettingKey::RotationMode),
            "touchscreen_mode_preference" | "touchscreen" => Some(SettingKey::TouchscreenMode),
            "charger_control_limit_pref" | "charger" => Some(SettingKey::ChargerLimit),
            _ => None,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingState {
    /// Never read successfully; the caller decides what to show
    Unsynced,
    Synced,
}

/// Result of a sync or refresh
#[derive(Debug)]
pub enum SyncOutcome {
    /// Hardware value read and cached
    Updated(SettingValue),
    /// Cache kept at its previous value
    Unchanged(SyncError),
}

impl SyncOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, SyncOutcome::Updated(_))
    }

    pub fn value(&self) -> Option<&SettingValue> {
        match self {
            SyncOutcome::Updated(value) => Some(value),
            SyncOutcome::Unchanged(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Updated(_) => None,
            SyncOutcome::Unchanged(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceSetting {
    key: SettingKey,
    channel: SettingChannel,
    codec: SettingCodec,
    cached: Option<SettingValue>,
}

impl DeviceSetting {
    pub fn new(key: SettingKey, channel: SettingChannel, codec: SettingCodec) -> Self {
        Self {
            key,
            channel,
            codec,
            cached: None,
        }
    }

    pub fn key(&self) -> SettingKey {
        self.key
    }

    pub fn channel(&self) -> &SettingChannel {
        &self.channel
    }

    pub fn codec(&self) -> &SettingCodec {
        &self.codec
    }

    /// Last known-good value
    pub fn cached(&self) -> Option<&SettingValue> {
        self.cached.as_ref()
    }

    pub fn state(&self) -> SettingState {
        if self.cached.is_some() {
            SettingState::Synced
        } else {
            SettingState::Unsynced
        }
    }

    /// Read the hardware and update the cache, without touching any store
    pub fn refresh(&mut self) -> SyncOutcome {
        let target = self.channel.target();

        let Some(raw) = self.channel.read() else {
            return SyncOutcome::Unchanged(SyncError::ReadFailure { target });
        };

        match self.codec.decode(&raw) {
            Ok(value) => {
                tracing::debug!("{}: {} -> {}", self.key, raw, value);
                self.cached = Some(value.clone());
                SyncOutcome::Updated(value)
            }
            Err(e) => {
                tracing::error!("{}: {} (from {})", self.key, e, target);
                SyncOutcome::Unchanged(SyncError::Decode { target, source: e })
            }
        }
    }

    /// Refresh from hardware and mirror the result into `store`
    pub fn sync(&mut self, store: &mut PreferenceStore) -> SyncOutcome {
        let outcome = self.refresh();
        if let SyncOutcome::Updated(value) = &outcome {
            self.mirror(store, value);
        }
        outcome
    }

    /// Write `value` to the hardware; the cache and store follow only on success
    pub fn apply(&mut self, value: SettingValue, store: &mut PreferenceStore) -> bool {
        let raw = match self.codec.encode(&value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("{}: {}", self.key, e);
                return false;
            }
        };

        if !self.channel.write(&raw) {
            let err = SyncError::WriteFailure {
                target: self.channel.target(),
                raw,
            };
            tracing::warn!("{}: {}", self.key, err);
            return false;
        }

        tracing::info!("{} set to {}", self.key, value);
        self.mirror(store, &value);
        self.cached = Some(value);
        true
    }

    /// Title/summary for the cached value
    pub fn label(&self, labels: &dyn LabelProvider) -> Label {
        match &self.cached {
            Some(value) => labels.label(value),
            None => labels.unavailable(),
        }
    }

    fn mirror(&self, store: &mut PreferenceStore, value: &SettingValue) {
        if let Err(e) = store.put(self.key.as_str(), &value.preference_value()) {
            tracing::warn!("Unable to store {}: {}", self.key, e);
        }
    }
}
