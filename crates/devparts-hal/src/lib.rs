//! Device setting synchronization
//!
//! Keeps device-specific hardware toggles in step with a local preference
//! store. Each setting reads and writes its raw value through one of three
//! channels and translates it with a codec:
//!
//! - camera preview/rotation: a root-owned `key=value` file or a vendor helper
//! - touchscreen finger/stylus mode: the touchscreen driver's helper binary
//! - charger current limit: a sysfs node with a `current` prefix
//!
//! Hardware is the source of truth. Settings are re-read on every attach,
//! and a failed read or write never replaces the last known-good value.
//!
//! # Example
//!
//! ```no_run
//! use devparts_config::DevpartsConfig;
//! use devparts_hal::{PreferenceStore, PrivilegedExecutor, SettingKey, SettingRegistry};
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = DevpartsConfig::load_default()?;
//!     let executor = Arc::new(PrivilegedExecutor::new(&config.system.su_binary));
//!     let mut store = PreferenceStore::open(&config.system.store_path)?;
//!
//!     let mut registry = SettingRegistry::probe(&config, executor);
//!     registry.sync_all(&mut store);
//!
//!     if registry.contains(SettingKey::TouchscreenMode) {
//!         registry.apply_str(SettingKey::TouchscreenMode, "stylus", &mut store);
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod codec;
pub mod executor;
pub mod labels;
pub mod mock;
pub mod poller;
pub mod registry;
pub mod setting;
pub mod store;

pub use channel::{ConfigFileChannel, SettingChannel, ShellHelperChannel, SysfsChannel};
pub use codec::{
    ChargerCodec, ChargerLimit, DecodeError, PreviewMode, RotationMode, SettingCodec, SettingValue,
    TouchscreenMode,
};
pub use executor::{CommandExecutor, CommandOutput, ExecutionError, PrivilegedExecutor};
pub use labels::{DefaultLabels, Label, LabelProvider};
pub use poller::{PollReport, SettingPoller};
pub use registry::SettingRegistry;
pub use setting::{DeviceSetting, SettingKey, SettingState, SyncOutcome};
pub use store::{PreferenceStore, StoreError};

use thiserror::Error;

/// Why a sync or apply left a setting unchanged
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unable to read {target}")]
    ReadFailure { target: String },

    #[error("Unusable value from {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: DecodeError,
    },

    #[error("Unable to write {raw} to {target}")]
    WriteFailure { target: String, raw: String },
}
