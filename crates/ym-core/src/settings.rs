//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`
//!
//! The pronunciation store is deliberately absent: callers open and inject
//! their own handle.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::non_hanzi::Mode;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub convert: ConvertSettings,
    pub non_hanzi: NonHanziSettings,
    #[serde(default)]
    pub pinyin_punctuation: HashMap<String, String>,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertSettings {
    pub without_accent: bool,
    pub accent_markers: String,
    #[serde(default)]
    pub pinyin_fallback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NonHanziSettings {
    pub mode: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default)]
    pub latin: ClassSettings,
    #[serde(default)]
    pub kana: ClassSettings,
    #[serde(default)]
    pub punctuation: ClassSettings,
    #[serde(default)]
    pub other: ClassSettings,
}

/// Per-class override; unset fields fall back to the global `[non_hanzi]` values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassSettings {
    pub mode: Option<String>,
    pub replace: Option<String>,
}

impl NonHanziSettings {
    /// Effective `(mode, replace)` for one class table.
    pub fn resolve<'a>(&'a self, class: &'a ClassSettings) -> (&'a str, &'a str) {
        (
            class.mode.as_deref().unwrap_or(&self.mode),
            class.replace.as_deref().unwrap_or(&self.replace),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub wal_compact_threshold: usize,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_mode {
        ($field:literal, $class:expr) => {
            let (mode, replace) = s.non_hanzi.resolve($class);
            if let Err(e) = Mode::from_name(mode, replace) {
                return Err(SettingsError::InvalidValue {
                    field: $field.to_string(),
                    reason: e.to_string(),
                });
            }
        };
    }

    if let Err(e) = Mode::from_name(&s.non_hanzi.mode, &s.non_hanzi.replace) {
        return Err(SettingsError::InvalidValue {
            field: "non_hanzi.mode".to_string(),
            reason: e.to_string(),
        });
    }
    check_mode!("non_hanzi.latin.mode", &s.non_hanzi.latin);
    check_mode!("non_hanzi.kana.mode", &s.non_hanzi.kana);
    check_mode!("non_hanzi.punctuation.mode", &s.non_hanzi.punctuation);
    check_mode!("non_hanzi.other.mode", &s.non_hanzi.other);

    if s.store.wal_compact_threshold == 0 {
        return Err(SettingsError::InvalidValue {
            field: "store.wal_compact_threshold".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    for (key, value) in &s.pinyin_punctuation {
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(SettingsError::InvalidValue {
                field: format!("pinyin_punctuation.{key:?}"),
                reason: format!("placeholder must be a non-empty token (maps to {value:?})"),
            });
        }
    }

    Ok(())
}
