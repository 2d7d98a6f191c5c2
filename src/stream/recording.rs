//! Multi-channel recordings stored as JSON.
//!
//! ```json
//! { "sampling_rate": 256, "channels": ["PPG", "LFL"], "data": [[...], [...]] }
//! ```
//!
//! `data` holds one row of samples per channel, in channel order.

use crate::dsp::secs_to_samples;
use crate::stream::{Frame, SampleSource};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading or validating a recording.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid recording: {0}")]
    Invalid(String),
}

/// A recorded multi-channel segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub sampling_rate: u32,
    pub channels: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

impl Recording {
    /// Build a recording, checking that every channel has a row of equal length.
    pub fn new(
        sampling_rate: u32,
        channels: Vec<String>,
        data: Vec<Vec<f64>>,
    ) -> Result<Self, RecordingError> {
        let recording = Self {
            sampling_rate,
            channels,
            data,
        };
        recording.validate()?;
        Ok(recording)
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let content = std::fs::read_to_string(path)?;
        let recording: Recording = serde_json::from_str(&content)?;
        recording.validate()?;
        tracing::debug!(
            path = %path.display(),
            channels = recording.channels.len(),
            secs = recording.duration_secs(),
            "loaded recording"
        );
        Ok(recording)
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordingError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), RecordingError> {
        if self.sampling_rate == 0 {
            return Err(RecordingError::Invalid("sampling rate must be positive".into()));
        }
        if self.data.len() != self.channels.len() {
            return Err(RecordingError::Invalid(format!(
                "{} channel labels but {} data rows",
                self.channels.len(),
                self.data.len()
            )));
        }
        if let Some(first) = self.data.first() {
            if self.data.iter().any(|row| row.len() != first.len()) {
                return Err(RecordingError::Invalid(
                    "channel rows differ in length".into(),
                ));
            }
        }
        Ok(())
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sampling_rate as f64
    }

    /// Full sample row of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Replay the recording as frames, oldest first.
    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        (0..self.len()).map(move |i| Frame::new(self.data.iter().map(|row| row[i]).collect()))
    }
}

impl SampleSource for Recording {
    fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    fn channel_names(&self) -> &[String] {
        &self.channels
    }

    fn latest(&self, channel: usize, secs: f64) -> Vec<f64> {
        let Some(row) = self.data.get(channel) else {
            return Vec::new();
        };
        let wanted = secs_to_samples(secs, self.sampling_rate).min(row.len());
        row[row.len() - wanted..].to_vec()
    }
}
