//! Online scoring of the latest window against a captured baseline.

use crate::config::{Config, EmgSettings};
use crate::core::baseline::{Baseline, Modality};
use crate::core::emg::window_energy;
use crate::core::hrv::compute_hrv_with;
use crate::dsp::secs_to_samples;
use crate::error::{BiofeedError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relative change of each metric against the baseline.
///
/// HRV entries and `cumulative_energy` are ratios (1.0 means unchanged).
/// `activation_z` is a deviation in baseline standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeVector {
    pub modality: Modality,
    pub values: BTreeMap<String, f64>,
}

impl ChangeVector {
    fn new(modality: Modality) -> Self {
        Self {
            modality,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Ratio expressed as a percentage change, e.g. 1.25 becomes 25.0.
    pub fn percent_change(&self, name: &str) -> Option<f64> {
        self.get(name).map(|ratio| 100.0 * (ratio - 1.0))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Insert `numerator / denominator`, or skip the metric when the
    /// baseline denominator is zero.
    fn insert_ratio(&mut self, name: &str, numerator: f64, denominator: f64) {
        if denominator.abs() <= f64::EPSILON {
            tracing::warn!(
                metric = name,
                modality = %self.modality,
                "baseline value is zero, metric omitted"
            );
            return;
        }
        self.values.insert(name.to_string(), numerator / denominator);
    }
}

/// Clamp a deviation into the `[-1, 1]` range used to drive feedback displays.
pub fn feedback_level(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-1.0, 1.0)
}

/// Score the most recent `window_secs` of `raw` against `baseline`.
pub fn score(
    modality: Modality,
    raw: &[f64],
    fs: u32,
    baseline: Option<&Baseline>,
    window_secs: f64,
    config: &Config,
) -> Result<ChangeVector> {
    let baseline = baseline.ok_or_else(|| BiofeedError::BaselineMissing(modality.to_string()))?;
    if baseline.modality() != modality {
        return Err(BiofeedError::ModalityMismatch {
            expected: modality,
            found: baseline.modality(),
        });
    }
    if baseline.sampling_rate != fs {
        return Err(BiofeedError::SamplingRateMismatch {
            baseline: baseline.sampling_rate,
            window: fs,
        });
    }

    let required = secs_to_samples(window_secs, fs);
    if required == 0 || raw.len() < required {
        tracing::warn!(
            %modality,
            required,
            available = raw.len(),
            "not enough signal for scoring window"
        );
        return Err(BiofeedError::WindowTooShort {
            required: required.max(1),
            available: raw.len(),
        });
    }
    let window = &raw[raw.len() - required..];

    let mut change = ChangeVector::new(modality);

    if let Some(base) = baseline.hrv() {
        let online = compute_hrv_with(window, fs, &config.hrv)?;
        change.insert_ratio("hr", online.hr as f64, base.hr as f64);
        change.insert_ratio("sdnn", online.sdnn, base.sdnn);
        change.insert_ratio("rmssd", online.rmssd, base.rmssd);
        change.insert_ratio(
            "rmssd_corrected",
            online.rmssd_corrected,
            base.rmssd_corrected,
        );
    } else if let Some(base) = baseline.emg() {
        // Scored window length overrides the configured default
        let settings = EmgSettings {
            window_secs,
            ..config.emg.clone()
        };
        let online = window_energy(window, fs, &settings)?;
        change.insert_ratio("cumulative_energy", online, base.mean_activation);
        change.insert_ratio(
            "activation_z",
            online - base.mean_activation,
            base.std_activation,
        );
    }

    tracing::debug!(%modality, metrics = change.len(), "scored window");
    Ok(change)
}
