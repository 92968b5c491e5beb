use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// User preferences persisted alongside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_true")]
    pub auto_rotate_tips: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            dark_mode: false,
            auto_rotate_tips: true,
            notifications: true,
        }
    }
}

/// Partial settings from an imported document; present keys win.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub sound_enabled: Option<bool>,
    pub dark_mode: Option<bool>,
    pub auto_rotate_tips: Option<bool>,
    pub notifications: Option<bool>,
}

impl Settings {
    pub fn merged(mut self, patch: SettingsPatch) -> Self {
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.dark_mode {
            self.dark_mode = v;
        }
        if let Some(v) = patch.auto_rotate_tips {
            self.auto_rotate_tips = v;
        }
        if let Some(v) = patch.notifications {
            self.notifications = v;
        }
        self
    }

    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::Sound => self.sound_enabled,
            SettingKey::DarkMode => self.dark_mode,
            SettingKey::AutoRotateTips => self.auto_rotate_tips,
            SettingKey::Notifications => self.notifications,
        }
    }

    pub(crate) fn slot(&mut self, key: SettingKey) -> &mut bool {
        match key {
            SettingKey::Sound => &mut self.sound_enabled,
            SettingKey::DarkMode => &mut self.dark_mode,
            SettingKey::AutoRotateTips => &mut self.auto_rotate_tips,
            SettingKey::Notifications => &mut self.notifications,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Sound,
    DarkMode,
    AutoRotateTips,
    Notifications,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::Sound,
        SettingKey::DarkMode,
        SettingKey::AutoRotateTips,
        SettingKey::Notifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Sound => "sound",
            SettingKey::DarkMode => "dark-mode",
            SettingKey::AutoRotateTips => "auto-rotate-tips",
            SettingKey::Notifications => "notifications",
        }
    }

    /// Message shown after the setting flips to `enabled`.
    pub fn toggled_message(&self, enabled: bool) -> String {
        match self {
            SettingKey::Sound => {
                format!("Sound effects {}", if enabled { "enabled" } else { "disabled" })
            }
            SettingKey::DarkMode => {
                format!("{} mode enabled", if enabled { "Dark" } else { "Light" })
            }
            SettingKey::AutoRotateTips => {
                format!("Auto-rotate {}", if enabled { "enabled" } else { "disabled" })
            }
            SettingKey::Notifications => {
                format!("Notifications {}", if enabled { "enabled" } else { "disabled" })
            }
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "sound" | "sound-enabled" => Ok(SettingKey::Sound),
            "dark-mode" | "dark" => Ok(SettingKey::DarkMode),
            "auto-rotate-tips" | "tips" => Ok(SettingKey::AutoRotateTips),
            "notifications" => Ok(SettingKey::Notifications),
            other => Err(ValidationError::InvalidValue {
                field: "setting".into(),
                message: format!("unknown setting '{other}'"),
            }),
        }
    }
}
