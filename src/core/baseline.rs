//! Baseline capture.
//!
//! A baseline is the parameter record of a resting reference window, frozen
//! at capture time and handed back to the caller. The core keeps no copy:
//! the caller passes it into every scoring call.

use crate::config::Config;
use crate::core::emg::{baseline_activation, EmgActivation};
use crate::core::hrv::{compute_hrv_with, HrvParams};
use crate::dsp::secs_to_samples;
use crate::error::{BiofeedError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physiological signal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Photoplethysmography, analysed for heart-rate variability
    Hrv,
    /// Surface electromyography, analysed for activation energy
    Emg,
}

impl Modality {
    /// Pick the samples a baseline of `samples` length is computed from.
    ///
    /// HRV uses the earliest samples of the segment while EMG uses the most
    /// recent ones. A request longer than `raw` yields all of it.
    pub fn baseline_slice(self, raw: &[f64], samples: usize) -> &[f64] {
        let samples = samples.min(raw.len());
        match self {
            Modality::Hrv => &raw[..samples],
            Modality::Emg => &raw[raw.len() - samples..],
        }
    }

    /// Default baseline duration from configuration, in seconds.
    pub fn baseline_secs(self, config: &Config) -> f64 {
        match self {
            Modality::Hrv => config.hrv.baseline_secs,
            Modality::Emg => config.emg.baseline_secs,
        }
    }

    /// Default online window from configuration, in seconds.
    pub fn window_secs(self, config: &Config) -> f64 {
        match self {
            Modality::Hrv => config.hrv.window_secs,
            Modality::Emg => config.emg.window_secs,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Hrv => write!(f, "hrv"),
            Modality::Emg => write!(f, "emg"),
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hrv" | "ppg" => Ok(Modality::Hrv),
            "emg" => Ok(Modality::Emg),
            other => Err(format!("unknown modality '{other}' (expected hrv or emg)")),
        }
    }
}

/// Frozen summary statistics of a baseline window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum BaselineParams {
    Hrv(HrvParams),
    Emg(EmgActivation),
}

impl BaselineParams {
    pub fn modality(&self) -> Modality {
        match self {
            BaselineParams::Hrv(_) => Modality::Hrv,
            BaselineParams::Emg(_) => Modality::Emg,
        }
    }
}

/// A captured baseline for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Channel label, if the caller supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Sampling rate of the baseline segment
    pub sampling_rate: u32,
    /// Duration the baseline was computed over, in seconds
    pub duration_secs: f64,
    /// When the baseline was captured
    pub captured_at: DateTime<Utc>,
    /// Frozen statistics
    pub params: BaselineParams,
}

impl Baseline {
    pub fn modality(&self) -> Modality {
        self.params.modality()
    }

    pub fn hrv(&self) -> Option<&HrvParams> {
        match &self.params {
            BaselineParams::Hrv(params) => Some(params),
            BaselineParams::Emg(_) => None,
        }
    }

    pub fn emg(&self) -> Option<&EmgActivation> {
        match &self.params {
            BaselineParams::Emg(activation) => Some(activation),
            BaselineParams::Hrv(_) => None,
        }
    }
}

/// Capture a baseline of `duration_secs` from `raw`.
pub fn capture_baseline(
    modality: Modality,
    raw: &[f64],
    fs: u32,
    duration_secs: f64,
    config: &Config,
) -> Result<Baseline> {
    capture_baseline_for(None, modality, raw, fs, duration_secs, config)
}

/// Capture a baseline and label it with a channel name.
pub fn capture_baseline_for(
    channel: Option<&str>,
    modality: Modality,
    raw: &[f64],
    fs: u32,
    duration_secs: f64,
    config: &Config,
) -> Result<Baseline> {
    let required = secs_to_samples(duration_secs, fs);
    if required == 0 || raw.len() < required {
        return Err(BiofeedError::InsufficientSignal {
            required: required.max(1),
            available: raw.len(),
        });
    }

    let segment = modality.baseline_slice(raw, required);
    let params = match modality {
        Modality::Hrv => BaselineParams::Hrv(compute_hrv_with(segment, fs, &config.hrv)?),
        Modality::Emg => BaselineParams::Emg(baseline_activation(segment, fs, &config.emg)?),
    };

    tracing::info!(
        channel = channel.unwrap_or("-"),
        %modality,
        fs,
        duration_secs,
        "baseline captured"
    );

    Ok(Baseline {
        channel: channel.map(str::to_string),
        sampling_rate: fs,
        duration_secs,
        captured_at: Utc::now(),
        params,
    })
}
