//! Sample acquisition for the metric pipeline.
//!
//! This module provides the [`SampleSource`] contract the pipeline reads
//! windows from, plus two implementations:
//! - [`SampleBuffer`]: a live, channel-fed rolling history
//! - [`Recording`]: a multi-channel recording loaded from JSON

pub mod buffer;
pub mod recording;

// Re-export commonly used types
pub use buffer::{Frame, SampleBuffer};
pub use recording::{Recording, RecordingError};

use crate::core::Modality;

/// Channel labels that carry a PPG signal, in order of preference.
pub const PPG_CHANNELS: &[&str] = &["EEG PPG", "PPG"];

/// Channel labels that carry EMG, in order of preference.
pub const EMG_CHANNELS: &[&str] = &["LFL", "RFL", "LEX", "REX"];

/// Anything that can hand out the latest samples of a named channel.
pub trait SampleSource {
    /// Samples per second, shared by all channels.
    fn sampling_rate(&self) -> u32;

    /// Channel labels in index order.
    fn channel_names(&self) -> &[String];

    /// The most recent `secs` seconds of `channel`, oldest first.
    ///
    /// Returns fewer samples when less history is available and an empty
    /// vector for an unknown channel.
    fn latest(&self, channel: usize, secs: f64) -> Vec<f64>;
}

/// Candidate channel labels for a modality.
pub fn candidates_for(modality: Modality) -> &'static [&'static str] {
    match modality {
        Modality::Hrv => PPG_CHANNELS,
        Modality::Emg => EMG_CHANNELS,
    }
}

/// Index of the first candidate present in `names`.
pub fn select_channel(names: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| names.iter().position(|n| n == c))
}

/// Indices of every candidate present in `names`, in candidate order.
pub fn select_channels(names: &[String], candidates: &[&str]) -> Vec<usize> {
    candidates
        .iter()
        .filter_map(|c| names.iter().position(|n| n == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_channel_prefers_first_candidate() {
        let labels = names(&["TP9", "PPG", "EEG PPG"]);
        assert_eq!(select_channel(&labels, PPG_CHANNELS), Some(2));

        let labels = names(&["TP9", "PPG"]);
        assert_eq!(select_channel(&labels, PPG_CHANNELS), Some(1));

        let labels = names(&["TP9", "AF7"]);
        assert_eq!(select_channel(&labels, PPG_CHANNELS), None);
    }

    #[test]
    fn test_select_channels_finds_all_present() {
        let labels = names(&["REX", "PPG", "LFL", "LEX"]);
        assert_eq!(select_channels(&labels, EMG_CHANNELS), vec![2, 3, 0]);
        assert!(select_channels(&names(&["PPG"]), EMG_CHANNELS).is_empty());
    }

    #[test]
    fn test_candidates_for_modality() {
        assert_eq!(candidates_for(Modality::Hrv), PPG_CHANNELS);
        assert_eq!(candidates_for(Modality::Emg), EMG_CHANNELS);
    }
}
