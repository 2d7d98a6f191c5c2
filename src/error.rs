//! Error types for the biofeedback pipeline.
//!
//! Every failure is returned as a typed value; nothing in the pipeline
//! panics on short, flat or noisy input.

use crate::core::Modality;
use thiserror::Error;

/// Minimum number of detected beats needed to form an HRV record.
pub const MIN_PEAKS: usize = 3;

/// Errors produced by filtering, metric extraction, baseline capture and scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BiofeedError {
    /// Cutoffs, order or sampling rate do not describe a realisable bandpass.
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    /// The segment is shorter than the analysis window or chunk.
    #[error("window too short: need {required} samples, have {available}")]
    WindowTooShort { required: usize, available: usize },

    /// The segment is shorter than the requested baseline duration.
    #[error("insufficient signal: need {required} samples, have {available}")]
    InsufficientSignal { required: usize, available: usize },

    /// Fewer than [`MIN_PEAKS`] beats were detected in the window.
    #[error("insufficient peaks: found {found}, need at least {MIN_PEAKS}")]
    InsufficientPeaks { found: usize },

    /// Scoring was attempted before a baseline was captured.
    #[error("no baseline captured for {0}")]
    BaselineMissing(String),

    /// The supplied baseline belongs to another modality.
    #[error("baseline modality mismatch: expected {expected}, found {found}")]
    ModalityMismatch { expected: Modality, found: Modality },

    /// The baseline was captured at a different sampling rate than the window.
    #[error("sampling rate mismatch: baseline at {baseline} Hz, window at {window} Hz")]
    SamplingRateMismatch { baseline: u32, window: u32 },

    /// The source has no channel at this index.
    #[error("unknown channel index {0}")]
    UnknownChannel(usize),
}

impl BiofeedError {
    /// Whether the caller can expect success by retrying with more or cleaner data.
    ///
    /// Configuration and usage errors are not recoverable this way.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BiofeedError::WindowTooShort { .. }
                | BiofeedError::InsufficientSignal { .. }
                | BiofeedError::InsufficientPeaks { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BiofeedError>;
