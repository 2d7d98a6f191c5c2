//! Muscle-activation metrics from a raw EMG segment.
//!
//! A window is bandpassed to the muscle band, its edges are trimmed to drop
//! filter transients, the mean is removed, and the rectified samples are
//! summed into one cumulative-energy scalar. A baseline is summarised by
//! splitting it into short chunks and taking the mean and spread of the
//! per-chunk energies.

use crate::config::EmgSettings;
use crate::dsp::{secs_to_samples, BandpassFilter};
use crate::error::{BiofeedError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::ops::Range;

/// How a segment should be summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmgMode {
    /// One cumulative-energy scalar for the whole segment
    SingleWindow,
    /// Mean and spread of chunked cumulative energies
    Baseline,
}

/// Chunked activation statistics of a baseline segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmgActivation {
    /// Mean cumulative energy per chunk
    pub mean_activation: f64,
    /// Population standard deviation of per-chunk energies
    pub std_activation: f64,
    /// Number of chunks the segment was split into
    pub num_chunks: usize,
}

/// EMG parameters; the available fields depend on the mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EmgParams {
    SingleWindow { cumulative_energy: f64 },
    Baseline(EmgActivation),
}

/// Compute EMG parameters in the requested mode.
pub fn compute_emg(raw: &[f64], fs: u32, mode: EmgMode, settings: &EmgSettings) -> Result<EmgParams> {
    match mode {
        EmgMode::SingleWindow => Ok(EmgParams::SingleWindow {
            cumulative_energy: window_energy(raw, fs, settings)?,
        }),
        EmgMode::Baseline => Ok(EmgParams::Baseline(baseline_activation(raw, fs, settings)?)),
    }
}

/// Cumulative rectified energy of one window of at least `settings.window_secs`.
pub fn window_energy(raw: &[f64], fs: u32, settings: &EmgSettings) -> Result<f64> {
    let filter = BandpassFilter::new(settings.band.spec(fs)?)?;
    trimmed_energy(&filter, raw, settings.window_secs, settings.edge_trim_secs)
}

/// Mean and spread of per-chunk energies over the whole segment.
pub fn baseline_activation(raw: &[f64], fs: u32, settings: &EmgSettings) -> Result<EmgActivation> {
    let filter = BandpassFilter::new(settings.band.spec(fs)?)?;

    let per_chunk = secs_to_samples(settings.chunk_secs, fs);
    if per_chunk == 0 || raw.len() < per_chunk {
        return Err(BiofeedError::WindowTooShort {
            required: per_chunk.max(1),
            available: raw.len(),
        });
    }

    let energies = chunk_bounds(raw.len(), per_chunk)
        .into_iter()
        .map(|range| {
            trimmed_energy(
                &filter,
                &raw[range],
                settings.chunk_secs,
                settings.edge_trim_secs,
            )
        })
        .collect::<Result<Vec<f64>>>()?;

    let activation = EmgActivation {
        mean_activation: energies.iter().mean(),
        std_activation: energies.iter().population_std_dev(),
        num_chunks: energies.len(),
    };

    tracing::debug!(
        mean = activation.mean_activation,
        std = activation.std_activation,
        chunks = activation.num_chunks,
        "computed EMG baseline activation"
    );

    Ok(activation)
}

/// Split `len` samples into `len / per_chunk` contiguous, near-equal chunks.
///
/// The first `len % count` chunks carry one extra sample, so every sample is
/// covered exactly once and every chunk holds at least `per_chunk` samples.
pub fn chunk_bounds(len: usize, per_chunk: usize) -> Vec<Range<usize>> {
    if per_chunk == 0 {
        return Vec::new();
    }
    let count = len / per_chunk;
    if count == 0 {
        return Vec::new();
    }

    let base = len / count;
    let extra = len % count;

    let mut start = 0;
    (0..count)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Filter, trim the edges, remove DC and sum the rectified samples.
pub(crate) fn trimmed_energy(
    filter: &BandpassFilter,
    raw: &[f64],
    window_secs: f64,
    edge_trim_secs: f64,
) -> Result<f64> {
    let fs = filter.spec().sampling_rate();

    let required = secs_to_samples(window_secs, fs).max(1);
    if raw.len() < required {
        return Err(BiofeedError::WindowTooShort {
            required,
            available: raw.len(),
        });
    }

    let border = secs_to_samples(edge_trim_secs, fs);
    if raw.len() <= 2 * border {
        return Err(BiofeedError::WindowTooShort {
            required: 2 * border + 1,
            available: raw.len(),
        });
    }

    let filtered = filter.apply(raw);
    let cropped = &filtered[border..filtered.len() - border];
    let mean = cropped.iter().mean();

    Ok(cropped.iter().map(|v| (v - mean).abs()).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::muscle_burst;

    #[test]
    fn test_chunk_bounds_divisible() {
        let chunks = chunk_bounds(1500, 150);
        assert_eq!(chunks.len(), 10);
        assert!(chunks.iter().all(|c| c.len() == 150));
        assert_eq!(chunks.first().unwrap().start, 0);
        assert_eq!(chunks.last().unwrap().end, 1500);
    }

    #[test]
    fn test_chunk_bounds_remainder_stays_in_range() {
        let chunks = chunk_bounds(1543, 150);
        assert_eq!(chunks.len(), 10);
        assert_eq!(chunks.iter().filter(|c| c.len() == 155).count(), 3);
        assert_eq!(chunks.iter().filter(|c| c.len() == 154).count(), 7);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(chunks.last().unwrap().end, 1543);
        assert!(chunks.iter().all(|c| c.len() >= 150));
    }

    #[test]
    fn test_chunk_bounds_too_short() {
        assert!(chunk_bounds(149, 150).is_empty());
        assert!(chunk_bounds(100, 0).is_empty());
    }

    #[test]
    fn test_flat_window_has_zero_energy() {
        let settings = EmgSettings::default();
        assert_eq!(window_energy(&[0.0; 150], 500, &settings).unwrap(), 0.0);
    }

    #[test]
    fn test_energy_scales_with_amplitude() {
        let settings = EmgSettings::default();
        let quiet = muscle_burst(500, 0.3, 1.0);
        let loud = muscle_burst(500, 0.3, 2.0);

        let e_quiet = window_energy(&quiet, 500, &settings).unwrap();
        let e_loud = window_energy(&loud, 500, &settings).unwrap();
        assert!(e_quiet > 0.0);
        assert!((e_loud / e_quiet - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_window_is_rejected() {
        let settings = EmgSettings::default();
        let err = window_energy(&[0.0; 149], 500, &settings).unwrap_err();
        assert_eq!(
            err,
            BiofeedError::WindowTooShort {
                required: 150,
                available: 149
            }
        );
    }

    #[test]
    fn test_baseline_mode_of_flat_signal() {
        let settings = EmgSettings::default();
        let params = compute_emg(&vec![0.0; 10_000], 500, EmgMode::Baseline, &settings).unwrap();
        match params {
            EmgParams::Baseline(activation) => {
                assert_eq!(activation.mean_activation, 0.0);
                assert_eq!(activation.std_activation, 0.0);
                assert_eq!(activation.num_chunks, 66);
            }
            other => panic!("expected baseline params, got {other:?}"),
        }
    }

    #[test]
    fn test_baseline_mode_of_steady_activity() {
        let settings = EmgSettings::default();
        let signal = muscle_burst(500, 3.0, 1.0);
        let activation = baseline_activation(&signal, 500, &settings).unwrap();

        assert_eq!(activation.num_chunks, 10);
        assert!(activation.mean_activation > 0.0);
        assert!(activation.std_activation < activation.mean_activation);
    }

    #[test]
    fn test_emg_band_needs_fast_sampling() {
        let settings = EmgSettings::default();
        assert!(matches!(
            compute_emg(&[0.0; 6000], 100, EmgMode::Baseline, &settings),
            Err(BiofeedError::InvalidFilterSpec(_))
        ));
    }
}
