use std::{
    ops::Not,
    path::{Path, PathBuf},
};

use eframe::egui;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    audio::{AlarmSound, SoundSettings},
    selector::WindowHours,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't read or write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't find a home directory for the config")]
    NoProjectDirs,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

const fn full_volume() -> f32 {
    100.0
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// window the selector starts at
    #[serde(default)]
    pub default_hours: WindowHours,
    #[serde(default)]
    pub theme: Theme,
    /// custom alarm sound, the built in beep is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<PathBuf>,
    /// 0 to 100
    #[serde(default = "full_volume")]
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_hours: WindowHours::default(),
            theme: Theme::Dark,
            sound: None,
            volume: full_volume(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&config)?)
    }

    /// falls back to the defaults if there is no config file yet
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "random_alarm")
            .ok_or(ConfigError::NoProjectDirs)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    #[must_use]
    pub fn alarm_sound(&self) -> AlarmSound {
        AlarmSound::from(self.sound.clone())
    }
}

impl From<&Config> for SoundSettings {
    fn from(config: &Config) -> Self {
        Self {
            sound: config.alarm_sound(),
            volume: config.volume,
        }
    }
}
