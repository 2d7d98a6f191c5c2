//! Signal conditioning primitives.
//!
//! This module contains:
//! - Zero-phase Butterworth bandpass filtering
//! - Peak detection with distance and prominence constraints

pub mod filter;
pub mod peaks;

// Re-export commonly used items
pub use filter::{
    bandpass_emg, bandpass_hrv, filter, BandpassFilter, FilterSpec, DEFAULT_ORDER, EMG_BAND,
    HRV_BAND,
};
pub use peaks::{find_peaks, peak_prominences};

/// Convert a duration to a whole number of samples, rounding down.
///
/// A small epsilon absorbs binary rounding so that e.g. 0.3 s at 250 Hz
/// yields 75 samples rather than 74.
pub fn secs_to_samples(secs: f64, sampling_rate: u32) -> usize {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * sampling_rate as f64 + 1e-9).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_samples() {
        assert_eq!(secs_to_samples(0.3, 250), 75);
        assert_eq!(secs_to_samples(0.3, 256), 76);
        assert_eq!(secs_to_samples(60.0, 100), 6000);
        assert_eq!(secs_to_samples(0.1, 500), 50);
        assert_eq!(secs_to_samples(-1.0, 100), 0);
    }
}
