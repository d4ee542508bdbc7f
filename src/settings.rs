//! User-facing application settings.
//!
//! Stored wholesale as camelCase JSON. Reads and patches are merged
//! shallowly key by key on top of the defaults, so a stale or partially
//! corrupted blob never discards the keys that are still valid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::settings_defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    HighContrast,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::HighContrast => "high-contrast",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            "high-contrast" => Some(Theme::HighContrast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: Theme,
    pub language: String,
    pub auto_save: bool,
    pub auto_save_interval: u32,
    pub notifications: bool,
    pub sound_effects: bool,
    pub font_size: FontSize,
    pub reduce_motion: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: settings_defaults::LANGUAGE.to_string(),
            auto_save: settings_defaults::AUTO_SAVE,
            auto_save_interval: settings_defaults::AUTO_SAVE_INTERVAL_MS,
            notifications: settings_defaults::NOTIFICATIONS,
            sound_effects: settings_defaults::SOUND_EFFECTS,
            font_size: FontSize::default(),
            reduce_motion: settings_defaults::REDUCE_MOTION,
        }
    }
}

impl AppSettings {
    /// Build settings from a stored JSON blob, keeping defaults for any key
    /// that is missing or holds a value of the wrong shape.
    pub fn from_stored(stored: &Value) -> Self {
        Self::default().merged(stored)
    }

    /// Shallow merge of `patch` on top of `self`. Keys that do not belong to
    /// the settings object, or whose value does not deserialize, are skipped.
    pub fn merged(&self, patch: &Value) -> Self {
        let Some(patch) = patch.as_object() else {
            return self.clone();
        };
        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return self.clone(),
        };

        for (key, value) in patch {
            if !current.contains_key(key) {
                continue;
            }
            let mut candidate: Map<String, Value> = current.clone();
            candidate.insert(key.clone(), value.clone());
            if serde_json::from_value::<AppSettings>(Value::Object(candidate)).is_ok() {
                current.insert(key.clone(), value.clone());
            } else {
                log::warn!("ignoring invalid setting {}={}", key, value);
            }
        }

        serde_json::from_value(Value::Object(current)).unwrap_or_else(|_| self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let s = AppSettings::default();
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.language, "en");
        assert!(s.auto_save);
        assert_eq!(s.auto_save_interval, 30000);
        assert_eq!(s.font_size, FontSize::Medium);
        assert!(!s.reduce_motion);
    }

    #[test]
    fn stored_blob_uses_camel_case() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert_eq!(json["autoSaveInterval"], 30000);
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["fontSize"], "medium");
    }

    #[test]
    fn partial_blob_falls_back_to_defaults() {
        let s = AppSettings::from_stored(&json!({ "theme": "light", "soundEffects": false }));
        assert_eq!(s.theme, Theme::Light);
        assert!(!s.sound_effects);
        assert_eq!(s.language, "en");
    }

    #[test]
    fn invalid_keys_are_skipped_not_fatal() {
        let s = AppSettings::from_stored(&json!({
            "theme": "neon",
            "language": "fr",
            "autoSaveInterval": "soon",
            "unknown": 1
        }));
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.language, "fr");
        assert_eq!(s.auto_save_interval, 30000);
    }

    #[test]
    fn theme_parse_round_trips_names() {
        for theme in [Theme::Dark, Theme::Light, Theme::HighContrast] {
            assert_eq!(Theme::parse(theme.as_str()), Some(theme));
        }
        assert_eq!(Theme::parse("sepia"), None);
    }
}
