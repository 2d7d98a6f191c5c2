//! Zero-phase Butterworth bandpass filtering.
//!
//! Filters are designed as cascaded second-order sections and applied
//! forward and backward, so the output carries no group delay.

use crate::error::{BiofeedError, Result};
use num_complex::Complex64;
use sci_rs::signal::filter::design::{
    butter_dyn, DigitalFilter, FilterBandType, FilterOutputType, Sos,
};
use sci_rs::signal::filter::{sosfilt_dyn, sosfiltfilt_dyn};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default Butterworth order for both presets.
pub const DEFAULT_ORDER: usize = 3;

/// Passband used to isolate the blood-volume pulse, in Hz.
pub const HRV_BAND: (f64, f64) = (0.5, 8.0);

/// Passband used to isolate surface muscle activity, in Hz.
pub const EMG_BAND: (f64, f64) = (55.0, 95.0);

/// Immutable description of a bandpass filter.
///
/// Construction validates `0 < low < high < sampling_rate / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    low_hz: f64,
    high_hz: f64,
    order: usize,
    sampling_rate: u32,
}

impl FilterSpec {
    pub fn new(low_hz: f64, high_hz: f64, order: usize, sampling_rate: u32) -> Result<Self> {
        if sampling_rate == 0 {
            return Err(BiofeedError::InvalidFilterSpec(
                "sampling rate must be positive".to_string(),
            ));
        }
        if order == 0 {
            return Err(BiofeedError::InvalidFilterSpec(
                "filter order must be at least 1".to_string(),
            ));
        }
        if !low_hz.is_finite() || !high_hz.is_finite() {
            return Err(BiofeedError::InvalidFilterSpec(format!(
                "cutoffs must be finite, got [{low_hz}, {high_hz}] Hz"
            )));
        }
        if low_hz >= high_hz {
            return Err(BiofeedError::InvalidFilterSpec(format!(
                "low cutoff {low_hz} Hz must be below high cutoff {high_hz} Hz"
            )));
        }

        let nyquist = sampling_rate as f64 / 2.0;
        if low_hz <= 0.0 || high_hz >= nyquist {
            return Err(BiofeedError::InvalidFilterSpec(format!(
                "cutoffs [{low_hz}, {high_hz}] Hz must lie inside (0, {nyquist}) Hz"
            )));
        }

        Ok(Self {
            low_hz,
            high_hz,
            order,
            sampling_rate,
        })
    }

    /// The 0.5-8 Hz pulse band at order 3.
    pub fn hrv(sampling_rate: u32) -> Result<Self> {
        Self::new(HRV_BAND.0, HRV_BAND.1, DEFAULT_ORDER, sampling_rate)
    }

    /// The 55-95 Hz muscle band at order 3. Needs a sampling rate above 190 Hz.
    pub fn emg(sampling_rate: u32) -> Result<Self> {
        Self::new(EMG_BAND.0, EMG_BAND.1, DEFAULT_ORDER, sampling_rate)
    }

    pub fn low_hz(&self) -> f64 {
        self.low_hz
    }

    pub fn high_hz(&self) -> f64 {
        self.high_hz
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    pub fn nyquist(&self) -> f64 {
        self.sampling_rate as f64 / 2.0
    }
}

/// A designed bandpass filter, reusable across windows.
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    spec: FilterSpec,
    sections: Vec<Sos<f64>>,
}

impl BandpassFilter {
    /// Design the filter described by `spec`.
    pub fn new(spec: FilterSpec) -> Result<Self> {
        let design = butter_dyn(
            spec.order,
            vec![spec.low_hz, spec.high_hz],
            Some(FilterBandType::Bandpass),
            Some(false),
            Some(FilterOutputType::Sos),
            Some(spec.sampling_rate as f64),
        );
        let sections = match design {
            DigitalFilter::Sos(filter) => filter.sos,
            _ => {
                return Err(BiofeedError::InvalidFilterSpec(
                    "butterworth design did not yield second-order sections".to_string(),
                ))
            }
        };
        Ok(Self { spec, sections })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Second-order sections, `order` of them for a bandpass.
    pub fn sections(&self) -> &[Sos<f64>] {
        &self.sections
    }

    /// Magnitude of the single-pass frequency response at `hz`.
    pub fn gain_at(&self, hz: f64) -> f64 {
        let omega = 2.0 * PI * hz / self.spec.sampling_rate as f64;
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        self.sections
            .iter()
            .map(|s| {
                let num = z2 * s.b[2] + z1 * s.b[1] + s.b[0];
                let den = z2 * s.a[2] + z1 * s.a[1] + s.a[0];
                (num / den).norm()
            })
            .product()
    }

    /// Samples of odd reflection added at each edge before filtering.
    pub fn padlen(&self) -> usize {
        3 * (2 * self.sections.len() + 1)
    }

    /// Apply the filter forward and backward. Output length equals input length.
    ///
    /// Inputs no longer than [`padlen`](Self::padlen) cannot be edge-padded;
    /// they are run forward and backward from a resting state instead.
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        if samples.is_empty() {
            return Vec::new();
        }
        if samples.len() > self.padlen() {
            return sosfiltfilt_dyn(samples.iter(), &self.sections);
        }

        tracing::debug!(
            len = samples.len(),
            padlen = self.padlen(),
            "input too short for edge padding"
        );
        let forward = sosfilt_dyn(samples.iter(), &mut self.sections.clone());
        let mut backward = sosfilt_dyn(forward.iter().rev(), &mut self.sections.clone());
        backward.reverse();
        backward
    }
}

/// Bandpass `samples` with a zero-phase Butterworth filter.
pub fn filter(samples: &[f64], fs: u32, low: f64, high: f64, order: usize) -> Result<Vec<f64>> {
    let spec = FilterSpec::new(low, high, order, fs)?;
    Ok(BandpassFilter::new(spec)?.apply(samples))
}

/// Bandpass with the HRV preset.
pub fn bandpass_hrv(samples: &[f64], fs: u32) -> Result<Vec<f64>> {
    Ok(BandpassFilter::new(FilterSpec::hrv(fs)?)?.apply(samples))
}

/// Bandpass with the EMG preset.
pub fn bandpass_emg(samples: &[f64], fs: u32) -> Result<Vec<f64>> {
    Ok(BandpassFilter::new(FilterSpec::emg(fs)?)?.apply(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f64, fs: u32, secs: f64) -> Vec<f64> {
        let n = (secs * fs as f64) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / fs as f64).sin())
            .collect()
    }

    fn max_abs(values: &[f64]) -> f64 {
        values.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }

    #[test]
    fn test_rejects_invalid_specs() {
        assert!(FilterSpec::new(8.0, 0.5, 3, 100).is_err());
        assert!(FilterSpec::new(5.0, 5.0, 3, 100).is_err());
        assert!(FilterSpec::new(0.0, 8.0, 3, 100).is_err());
        assert!(FilterSpec::new(0.5, 50.0, 3, 100).is_err());
        assert!(FilterSpec::new(0.5, 8.0, 0, 100).is_err());
        assert!(FilterSpec::new(0.5, 8.0, 3, 0).is_err());
        assert!(FilterSpec::new(f64::NAN, 8.0, 3, 100).is_err());
        assert!(matches!(
            FilterSpec::emg(100),
            Err(BiofeedError::InvalidFilterSpec(_))
        ));
        assert!(FilterSpec::emg(250).is_ok());
    }

    #[test]
    fn test_band_edges_are_half_power() {
        let filter = BandpassFilter::new(FilterSpec::hrv(100).unwrap()).unwrap();
        let half_power = std::f64::consts::FRAC_1_SQRT_2;
        assert!((filter.gain_at(0.5) - half_power).abs() < 1e-5);
        assert!((filter.gain_at(8.0) - half_power).abs() < 1e-5);

        // Geometric centre of the prewarped band has unit gain
        let fs = 100.0;
        let center = fs / PI
            * ((PI * 0.5 / fs).tan() * (PI * 8.0 / fs).tan())
                .sqrt()
                .atan();
        assert!((filter.gain_at(center) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sections_block_dc_and_nyquist() {
        let filter = BandpassFilter::new(FilterSpec::emg(500).unwrap()).unwrap();
        assert_eq!(filter.sections().len(), 3);
        assert_eq!(filter.padlen(), 21);
        assert!(filter.gain_at(0.0) < 1e-9);
        assert!(filter.gain_at(250.0) < 1e-9);
        assert!((filter.gain_at(75.0) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_output_length_matches_input() {
        for len in [0, 1, 2, 5, 21, 22, 500] {
            let input: Vec<f64> = (0..len).map(|i| (i as f64 * 0.37).sin()).collect();
            let output = filter(&input, 100, 0.5, 8.0, 3).unwrap();
            assert_eq!(output.len(), len);
        }
    }

    #[test]
    fn test_passband_sine_is_preserved() {
        let input = sine(2.0, 100, 20.0);
        let output = bandpass_hrv(&input, 100).unwrap();
        let middle = &output[500..1500];
        let amplitude = max_abs(middle);
        assert!((amplitude - 1.0).abs() < 0.05, "amplitude {amplitude}");

        // Zero phase: the filtered peak lines up with the input peak
        let peak_in = (500..1500)
            .max_by(|&i, &j| input[i].total_cmp(&input[j]))
            .unwrap();
        assert!(output[peak_in] > 0.95);
    }

    #[test]
    fn test_stopband_sine_is_attenuated() {
        let input = sine(30.0, 100, 10.0);
        let output = bandpass_hrv(&input, 100).unwrap();
        assert!(max_abs(&output[200..800]) < 0.05);

        let input = sine(10.0, 500, 4.0);
        let output = bandpass_emg(&input, 500).unwrap();
        assert!(max_abs(&output[500..1500]) < 0.05);
    }

    #[test]
    fn test_constant_offset_is_removed() {
        let input = vec![5.0; 400];
        let output = bandpass_hrv(&input, 100).unwrap();
        assert!(max_abs(&output) < 1e-6);
    }

    #[test]
    fn test_short_input_stays_finite() {
        let filter = BandpassFilter::new(FilterSpec::hrv(100).unwrap()).unwrap();
        for len in [1, 2, 21] {
            let input = vec![1.0; len];
            let output = filter.apply(&input);
            assert_eq!(output.len(), len);
            assert!(output.iter().all(|v| v.is_finite()));
        }
    }
}
