//! Core metric pipeline.
//!
//! This module contains:
//! - HRV metrics from PPG segments
//! - EMG activation metrics
//! - Baseline capture per modality
//! - Online scoring against a captured baseline

pub mod baseline;
pub mod emg;
pub mod hrv;
pub mod scoring;

// Re-export commonly used types
pub use baseline::{capture_baseline, capture_baseline_for, Baseline, BaselineParams, Modality};
pub use emg::{
    baseline_activation, chunk_bounds, compute_emg, window_energy, EmgActivation, EmgMode,
    EmgParams,
};
pub use hrv::{compute_hrv, compute_hrv_with, HrvParams};
pub use scoring::{feedback_level, score, ChangeVector};
