use crate::audio::mixer::DEFAULT_HEADROOM;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Construction-time settings for a [`DrumMachine`](crate::DrumMachine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Gain applied after the master curve, before the output soft clip.
    pub master_headroom: f32,
    /// How long a lane's activity flag stays lit after a hit.
    pub led_flash_seconds: f32,
    pub initial_preset: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            master_headroom: DEFAULT_HEADROOM,
            led_flash_seconds: 0.045,
            initial_preset: 0,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// LED hold time in samples, at least one.
    pub fn led_flash_samples(&self) -> u32 {
        ((self.sample_rate.max(1000.0) * self.led_flash_seconds.max(0.0)).round() as u32).max(1)
    }
}
