//! Raw text <-> canonical value translation
//!
//! Each setting kind has three textual forms:
//!
//! - the *raw* form a channel reads and writes (`1`, `Mode: Finger tip`, `current500ma`)
//! - the canonical enum held in memory
//! - the *preference* form kept in the preference store and offered by the UI
//!   (`normal`, `finger`, `500ma`)
//!
//! Codecs are pure; they never touch hardware.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unrecognized {kind} value: {raw:?}")]
    Unrecognized { kind: &'static str, raw: String },

    #[error("Expected a {expected} value, got {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Camera preview mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    /// Front camera, mirrored
    Mirrored,
    /// Front camera, not mirrored
    Normal,
    /// Rear camera
    Rear,
}

impl PreviewMode {
    pub const ALL: [PreviewMode; 3] = [PreviewMode::Mirrored, PreviewMode::Normal, PreviewMode::Rear];

    /// Index understood by the camera HAL
    pub fn raw_index(&self) -> &'static str {
        match self {
            PreviewMode::Mirrored => "0",
            PreviewMode::Normal => "1",
            PreviewMode::Rear => "2",
        }
    }

    pub fn from_raw_index(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(PreviewMode::Mirrored),
            "1" => Some(PreviewMode::Normal),
            "2" => Some(PreviewMode::Rear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewMode::Mirrored => "mirrored",
            PreviewMode::Normal => "normal",
            PreviewMode::Rear => "rear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mirrored" => Some(PreviewMode::Mirrored),
            "normal" => Some(PreviewMode::Normal),
            "rear" => Some(PreviewMode::Rear),
            _ => None,
        }
    }
}

/// Camera sensor rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationMode {
    pub const ALL: [RotationMode; 4] = [
        RotationMode::Deg0,
        RotationMode::Deg90,
        RotationMode::Deg180,
        RotationMode::Deg270,
    ];

    pub fn degrees(&self) -> u32 {
        match self {
            RotationMode::Deg0 => 0,
            RotationMode::Deg90 => 90,
            RotationMode::Deg180 => 180,
            RotationMode::Deg270 => 270,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Deg0 => "0",
            RotationMode::Deg90 => "90",
            RotationMode::Deg180 => "180",
            RotationMode::Deg270 => "270",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "0" => Some(RotationMode::Deg0),
            "90" => Some(RotationMode::Deg90),
            "180" => Some(RotationMode::Deg180),
            "270" => Some(RotationMode::Deg270),
            _ => None,
        }
    }
}

/// Touchscreen input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchscreenMode {
    Finger,
    Stylus,
}

impl TouchscreenMode {
    /// Mode letter taken by the driver helper
    pub fn helper_arg(&self) -> &'static str {
        match self {
            TouchscreenMode::Finger => "F",
            TouchscreenMode::Stylus => "S",
        }
    }

    /// Match the helper's free-text status line. Finger wins if both appear.
    pub fn from_status(text: &str) -> Option<Self> {
        if text.contains("Finger") {
            Some(TouchscreenMode::Finger)
        } else if text.contains("Stylus") {
            Some(TouchscreenMode::Stylus)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TouchscreenMode::Finger => "finger",
            TouchscreenMode::Stylus => "stylus",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "finger" | "f" => Some(TouchscreenMode::Finger),
            "stylus" | "s" => Some(TouchscreenMode::Stylus),
            _ => None,
        }
    }
}

/// Charger current limit as reported by the charger driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargerLimit {
    /// Driver reports `none`: nothing is plugged in
    NoCharger,
    /// Magnitude and unit exactly as the driver spells them, e.g. `500ma`
    Limit(String),
}

impl ChargerLimit {
    pub const NONE: &'static str = "none";

    pub fn as_str(&self) -> &str {
        match self {
            ChargerLimit::NoCharger => Self::NONE,
            ChargerLimit::Limit(limit) => limit,
        }
    }
}

/// A decoded setting value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Preview(PreviewMode),
    Rotation(RotationMode),
    Touchscreen(TouchscreenMode),
    Charger(ChargerLimit),
}

impl SettingValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Preview(_) => "preview mode",
            SettingValue::Rotation(_) => "rotation mode",
            SettingValue::Touchscreen(_) => "touchscreen mode",
            SettingValue::Charger(_) => "charger limit",
        }
    }

    /// String stored in the preference store
    pub fn preference_value(&self) -> String {
        match self {
            SettingValue::Preview(mode) => mode.as_str().to_string(),
            SettingValue::Rotation(mode) => mode.as_str().to_string(),
            SettingValue::Touchscreen(mode) => mode.as_str().to_string(),
            SettingValue::Charger(limit) => limit.as_str().to_string(),
        }
    }

    /// Entry to select in a list of choices; the no-charger state has none
    pub fn selection(&self) -> Option<String> {
        match self {
            SettingValue::Charger(ChargerLimit::NoCharger) => None,
            value => Some(value.preference_value()),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preference_value())
    }
}

/// Prefix-stripping codec for the charger sysfs node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargerCodec {
    prefix: String,
    limits: Vec<String>,
}

impl ChargerCodec {
    pub fn new(prefix: impl Into<String>, limits: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            limits,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Limits the user may choose from
    pub fn limits(&self) -> &[String] {
        &self.limits
    }

    fn decode(&self, raw: &str) -> Option<ChargerLimit> {
        let value = raw.trim().strip_prefix(self.prefix.as_str())?;
        if value == ChargerLimit::NONE {
            Some(ChargerLimit::NoCharger)
        } else {
            self.parse(value)
        }
    }

    /// Only limits from the allowed set can be written; `none` is read-only
    fn encode(&self, limit: &ChargerLimit) -> Option<String> {
        match limit {
            ChargerLimit::NoCharger => None,
            ChargerLimit::Limit(value) => self
                .limits
                .contains(value)
                .then(|| format!("{}{}", self.prefix, value)),
        }
    }

    fn parse(&self, value: &str) -> Option<ChargerLimit> {
        let value = value.trim();
        self.limits
            .iter()
            .any(|l| l == value)
            .then(|| ChargerLimit::Limit(value.to_string()))
    }
}

/// Codec for one setting kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingCodec {
    Preview,
    Rotation,
    Touchscreen,
    Charger(ChargerCodec),
}

impl SettingCodec {
    pub fn kind(&self) -> &'static str {
        match self {
            SettingCodec::Preview => "preview mode",
            SettingCodec::Rotation => "rotation mode",
            SettingCodec::Touchscreen => "touchscreen mode",
            SettingCodec::Charger(_) => "charger limit",
        }
    }

    /// Raw channel text -> canonical value
    pub fn decode(&self, raw: &str) -> Result<SettingValue, DecodeError> {
        let value = match self {
            SettingCodec::Preview => PreviewMode::from_raw_index(raw).map(SettingValue::Preview),
            SettingCodec::Rotation => RotationMode::parse(raw).map(SettingValue::Rotation),
            SettingCodec::Touchscreen => {
                TouchscreenMode::from_status(raw).map(SettingValue::Touchscreen)
            }
            SettingCodec::Charger(codec) => codec.decode(raw).map(SettingValue::Charger),
        };

        value.ok_or_else(|| DecodeError::Unrecognized {
            kind: self.kind(),
            raw: raw.to_string(),
        })
    }

    /// Canonical value -> raw channel text
    pub fn encode(&self, value: &SettingValue) -> Result<String, DecodeError> {
        match (self, value) {
            (SettingCodec::Preview, SettingValue::Preview(mode)) => Ok(mode.raw_index().into()),
            (SettingCodec::Rotation, SettingValue::Rotation(mode)) => Ok(mode.as_str().into()),
            (SettingCodec::Touchscreen, SettingValue::Touchscreen(mode)) => {
                Ok(mode.helper_arg().into())
            }
            (SettingCodec::Charger(codec), SettingValue::Charger(limit)) => {
                codec.encode(limit).ok_or_else(|| DecodeError::Unrecognized {
                    kind: self.kind(),
                    raw: limit.as_str().to_string(),
                })
            }
            (codec, value) => Err(DecodeError::KindMismatch {
                expected: codec.kind(),
                found: value.kind(),
            }),
        }
    }

    /// Preference form (as stored or typed by the user) -> canonical value
    pub fn parse(&self, text: &str) -> Result<SettingValue, DecodeError> {
        let value = match self {
            SettingCodec::Preview => PreviewMode::parse(text).map(SettingValue::Preview),
            SettingCodec::Rotation => RotationMode::parse(text).map(SettingValue::Rotation),
            SettingCodec::Touchscreen => TouchscreenMode::parse(text).map(SettingValue::Touchscreen),
            SettingCodec::Charger(codec) => codec.parse(text).map(SettingValue::Charger),
        };

        value.ok_or_else(|| DecodeError::Unrecognized {
            kind: self.kind(),
            raw: text.to_string(),
        })
    }

    /// Every preference form the UI may offer
    pub fn choices(&self) -> Vec<String> {
        match self {
            SettingCodec::Preview => PreviewMode::ALL.iter().map(|m| m.as_str().into()).collect(),
            SettingCodec::Rotation => RotationMode::ALL.iter().map(|m| m.as_str().into()).collect(),
            SettingCodec::Touchscreen => vec!["finger".into(), "stylus".into()],
            SettingCodec::Charger(codec) => codec.limits().to_vec(),
        }
    }
}
