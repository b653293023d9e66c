//! Display titles and summaries for setting values
//!
//! The strings are data owned by whoever renders the settings; the default
//! provider carries the English resources.

use crate::codec::{ChargerLimit, PreviewMode, RotationMode, SettingValue, TouchscreenMode};

/// Title/summary pair shown for a setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub title: String,
    pub summary: String,
}

impl Label {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// Resource lookup for setting labels
pub trait LabelProvider: Send + Sync {
    fn label(&self, value: &SettingValue) -> Label;

    /// Shown while a setting has never been read successfully
    fn unavailable(&self) -> Label;

    /// Shown by the charger display when a poll fails
    fn poll_error(&self) -> Label;
}

/// Built-in English labels
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLabels;

impl LabelProvider for DefaultLabels {
    fn label(&self, value: &SettingValue) -> Label {
        match value {
            SettingValue::Preview(PreviewMode::Mirrored) => Label::new(
                "Front camera (mirrored)",
                "Preview is mirrored, like looking into a mirror",
            ),
            SettingValue::Preview(PreviewMode::Normal) => Label::new(
                "Front camera (normal)",
                "Preview shows the image as others see it",
            ),
            SettingValue::Preview(PreviewMode::Rear) => {
                Label::new("Rear camera", "Use the rear camera for preview")
            }
            SettingValue::Rotation(mode) => {
                let degrees = mode.degrees();
                let title = format!("{}°", degrees);
                let summary = if *mode == RotationMode::Deg0 {
                    "Camera image is not rotated".to_string()
                } else {
                    format!("Camera image is rotated by {} degrees", degrees)
                };
                Label::new(title, summary)
            }
            SettingValue::Touchscreen(TouchscreenMode::Finger) => {
                Label::new("Finger mode", "Touchscreen is tuned for fingers")
            }
            SettingValue::Touchscreen(TouchscreenMode::Stylus) => {
                Label::new("Stylus mode", "Touchscreen is tuned for a capacitive stylus")
            }
            SettingValue::Charger(ChargerLimit::NoCharger) => {
                Label::new("No charger detected", "Plug in a charger to see its current limit")
            }
            SettingValue::Charger(ChargerLimit::Limit(limit)) => Label::new(
                format!("Current charger limit: {}", limit),
                "Maximum current drawn from the charger",
            ),
        }
    }

    fn unavailable(&self) -> Label {
        Label::new("Unavailable", "Unable to read the current setting")
    }

    fn poll_error(&self) -> Label {
        Label::new(
            "Error while checking charger status!",
            "The charger driver could not be read",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_charger_label() {
        let label = DefaultLabels.label(&SettingValue::Charger(ChargerLimit::NoCharger));
        assert_eq!(label.title, "No charger detected");
    }

    #[test]
    fn test_limit_label_is_opaque() {
        let label = DefaultLabels.label(&SettingValue::Charger(ChargerLimit::Limit(
            "1500ma".into(),
        )));
        assert_eq!(label.title, "Current charger limit: 1500ma");
    }

    #[test]
    fn test_error_labels_are_distinct() {
        assert_ne!(DefaultLabels.poll_error(), DefaultLabels.unavailable());
        assert!(DefaultLabels.poll_error().title.contains("Error"));
    }

    #[test]
    fn test_rotation_label() {
        let label = DefaultLabels.label(&SettingValue::Rotation(RotationMode::Deg90));
        assert_eq!(label.title, "90°");
    }
}
