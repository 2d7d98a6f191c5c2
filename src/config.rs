//! Configuration for the biofeedback pipeline.

use crate::dsp::filter::FilterSpec;
use crate::error::BiofeedError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration: analysis settings per modality plus buffering policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Heart-rate-variability analysis settings
    pub hrv: HrvSettings,

    /// Muscle-activation analysis settings
    pub emg: EmgSettings,

    /// Live sample buffering
    pub buffer: BufferSettings,

    /// How often an external loop is expected to request a fresh score
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hrv: HrvSettings::default(),
            emg: EmgSettings::default(),
            buffer: BufferSettings::default(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, or defaults if it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("biofeed")
            .join("config.json")
    }

    /// Check that both filter bands are realisable at the given sampling rate.
    pub fn validate(&self, sampling_rate: u32) -> Result<(), BiofeedError> {
        self.hrv.band.spec(sampling_rate)?;
        self.emg.band.spec(sampling_rate)?;
        Ok(())
    }
}

/// A bandpass definition that becomes a [`FilterSpec`] once the sampling rate is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    pub low_hz: f64,
    pub high_hz: f64,
    pub order: usize,
}

impl BandSettings {
    pub fn spec(&self, sampling_rate: u32) -> Result<FilterSpec, BiofeedError> {
        FilterSpec::new(self.low_hz, self.high_hz, self.order, sampling_rate)
    }
}

/// HRV analysis policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvSettings {
    pub band: BandSettings,
    /// Peak prominence threshold as a multiple of the raw segment's std
    pub prominence_factor: f64,
    /// Minimum spacing between beats in seconds (0.3 s caps HR at 200 bpm)
    pub min_peak_distance_secs: f64,
    /// Baseline duration in seconds
    pub baseline_secs: f64,
    /// Online scoring window in seconds
    pub window_secs: f64,
}

impl Default for HrvSettings {
    fn default() -> Self {
        Self {
            band: BandSettings {
                low_hz: 0.5,
                high_hz: 8.0,
                order: 3,
            },
            prominence_factor: 0.3,
            min_peak_distance_secs: 0.3,
            baseline_secs: 60.0,
            window_secs: 8.0,
        }
    }
}

/// EMG analysis policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmgSettings {
    pub band: BandSettings,
    /// Samples trimmed from each edge of a filtered window, in seconds
    pub edge_trim_secs: f64,
    /// Chunk length used when summarising a baseline, in seconds
    pub chunk_secs: f64,
    /// Baseline duration in seconds
    pub baseline_secs: f64,
    /// Online scoring window in seconds
    pub window_secs: f64,
}

impl Default for EmgSettings {
    fn default() -> Self {
        Self {
            band: BandSettings {
                low_hz: 55.0,
                high_hz: 95.0,
                order: 3,
            },
            edge_trim_secs: 0.1,
            chunk_secs: 0.3,
            baseline_secs: 20.0,
            window_secs: 0.3,
        }
    }
}

/// Retention policy for live sample buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSettings {
    /// Seconds of history kept per channel
    pub retain_secs: f64,
    /// Capacity of the frame channel feeding the buffer
    pub channel_capacity: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            retain_secs: 60.0,
            channel_capacity: 10_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serde support for Duration, stored as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
