//! Heart-rate-variability metrics from a raw PPG segment.
//!
//! The segment is bandpassed to the pulse band, beats are located as
//! prominent peaks of the filtered waveform, and interval statistics are
//! computed from the beat times.

use crate::config::HrvSettings;
use crate::dsp::{find_peaks, secs_to_samples, BandpassFilter};
use crate::error::{BiofeedError, Result, MIN_PEAKS};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

/// HRV parameters of one segment. Intervals are in seconds, `hr` in bpm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvParams {
    /// Mean inter-beat interval
    pub mean_rr: f64,
    /// Population standard deviation of inter-beat intervals
    pub sdnn: f64,
    /// Root mean square of successive interval differences
    pub rmssd: f64,
    /// RMSSD divided by the cube of the mean interval
    pub rmssd_corrected: f64,
    /// Heart rate from the median interval
    pub hr: u32,
    /// Number of detected beats
    pub num_peaks: usize,
    /// Sample indices of detected beats in the segment
    pub peak_indices: Vec<usize>,
    /// Mean of the raw (unfiltered) segment
    pub signal_mean: f64,
    /// Population standard deviation of the raw segment
    pub signal_std: f64,
}

/// Compute HRV parameters with the default pulse band and peak policy.
pub fn compute_hrv(raw: &[f64], fs: u32) -> Result<HrvParams> {
    compute_hrv_with(raw, fs, &HrvSettings::default())
}

/// Compute HRV parameters with explicit settings.
pub fn compute_hrv_with(raw: &[f64], fs: u32, settings: &HrvSettings) -> Result<HrvParams> {
    let filter = BandpassFilter::new(settings.band.spec(fs)?)?;

    if raw.is_empty() {
        return Err(BiofeedError::InsufficientPeaks { found: 0 });
    }

    let filtered = filter.apply(raw);

    let signal_mean = raw.iter().mean();
    let signal_std = raw.iter().population_std_dev();

    let prominence = settings.prominence_factor * signal_std;
    let min_distance = secs_to_samples(settings.min_peak_distance_secs, fs);
    let peaks = find_peaks(&filtered, min_distance, prominence);

    if peaks.len() < MIN_PEAKS {
        tracing::debug!(found = peaks.len(), "too few beats for HRV");
        return Err(BiofeedError::InsufficientPeaks { found: peaks.len() });
    }

    let intervals: Vec<f64> = peaks
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 / fs as f64)
        .collect();
    let summary = IntervalSummary::from_intervals(&intervals);

    tracing::debug!(
        hr = summary.hr,
        sdnn = summary.sdnn,
        rmssd = summary.rmssd,
        num_peaks = peaks.len(),
        "computed HRV parameters"
    );

    Ok(HrvParams {
        mean_rr: summary.mean_rr,
        sdnn: summary.sdnn,
        rmssd: summary.rmssd,
        rmssd_corrected: summary.rmssd_corrected,
        hr: summary.hr,
        num_peaks: peaks.len(),
        peak_indices: peaks,
        signal_mean,
        signal_std,
    })
}

/// Interval statistics; callers guarantee at least two intervals.
struct IntervalSummary {
    mean_rr: f64,
    sdnn: f64,
    rmssd: f64,
    rmssd_corrected: f64,
    hr: u32,
}

impl IntervalSummary {
    fn from_intervals(intervals: &[f64]) -> Self {
        let mean_rr = intervals.iter().mean();
        let sdnn = intervals.iter().population_std_dev();

        let rmssd = intervals
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).powi(2))
            .mean()
            .sqrt();

        // Cube of the mean interval, kept as the established normalisation
        let rmssd_corrected = rmssd / mean_rr.powi(3);

        let median_rr = Data::new(intervals.to_vec()).median();
        let hr = (60.0 / median_rr).round() as u32;

        Self {
            mean_rr,
            sdnn,
            rmssd,
            rmssd_corrected,
            hr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{pulse_train, sine};

    #[test]
    fn test_interval_summary_formulas() {
        let summary = IntervalSummary::from_intervals(&[0.8, 1.0, 0.9]);
        assert!((summary.mean_rr - 0.9).abs() < 1e-12);
        assert!((summary.sdnn - (0.02_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((summary.rmssd - 0.025_f64.sqrt()).abs() < 1e-12);
        assert!((summary.rmssd_corrected - 0.025_f64.sqrt() / 0.729).abs() < 1e-9);
        assert_eq!(summary.hr, 67);
    }

    #[test]
    fn test_sinusoid_heart_rate() {
        // 1.25 Hz -> 75 bpm, period of 80 samples at 100 Hz
        let signal = sine(1.25, 100, 30.0, 1.0);
        let params = compute_hrv(&signal, 100).unwrap();

        assert!((params.hr as i64 - 75).abs() <= 1, "hr {}", params.hr);

        let inner = &params.peak_indices[2..params.peak_indices.len() - 2];
        for pair in inner.windows(2) {
            let spacing = pair[1] - pair[0];
            assert!((79..=81).contains(&spacing), "spacing {spacing}");
        }
        assert_eq!(params.num_peaks, params.peak_indices.len());
    }

    #[test]
    fn test_two_peaks_are_insufficient() {
        let signal = sine(1.0, 100, 2.0, 1.0);
        match compute_hrv(&signal, 100) {
            Err(BiofeedError::InsufficientPeaks { found }) => assert!(found < MIN_PEAKS),
            other => panic!("expected InsufficientPeaks, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_signal_is_insufficient() {
        let signal = vec![0.0; 6000];
        assert_eq!(
            compute_hrv(&signal, 100),
            Err(BiofeedError::InsufficientPeaks { found: 0 })
        );
        assert_eq!(
            compute_hrv(&[], 100),
            Err(BiofeedError::InsufficientPeaks { found: 0 })
        );
    }

    #[test]
    fn test_pulse_train_variability() {
        let signal = pulse_train(100, 60.0, |k| 0.8 + 0.05 * (k as f64 * 0.7).sin());
        let params = compute_hrv(&signal, 100).unwrap();

        assert!((params.hr as i64 - 75).abs() <= 3, "hr {}", params.hr);
        assert!((params.mean_rr - 0.8).abs() < 0.02);
        assert!(params.sdnn > 0.01);
        assert!(params.rmssd > 0.01);
        assert!(params.rmssd_corrected > params.rmssd);
        assert!(params.signal_std > 0.0);
    }

    #[test]
    fn test_invalid_sampling_rate() {
        assert!(matches!(
            compute_hrv(&[0.0; 10], 10),
            Err(BiofeedError::InvalidFilterSpec(_))
        ));
    }
}
