//! biofeed - signal-to-metric pipeline for PPG/EMG biofeedback training.
//!
//! Raw physiological samples go in; per-window metrics and their relative
//! change against a resting baseline come out.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              biofeed                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐             │
//! │  │   Stream    │──▶│  Bandpass   │──▶│ HRV / EMG   │             │
//! │  │ (buffer,    │   │  (filtfilt) │   │  engines    │             │
//! │  │  recording) │   └─────────────┘   └─────────────┘             │
//! │  └─────────────┘                            │                    │
//! │                                     ┌───────┴───────┐            │
//! │                                     ▼               ▼            │
//! │                              ┌─────────────┐ ┌─────────────┐     │
//! │                              │  Baseline   │▶│   Scorer    │     │
//! │                              │  capture    │ │ (ratios)    │     │
//! │                              └─────────────┘ └─────────────┘     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use biofeed::{capture_baseline, score, Config, Modality};
//!
//! let config = Config::default();
//! let resting: Vec<f64> = vec![0.0; 6000];
//! let latest: Vec<f64> = vec![0.0; 800];
//!
//! let baseline = capture_baseline(Modality::Hrv, &resting, 100, 60.0, &config)?;
//! let change = score(Modality::Hrv, &latest, 100, Some(&baseline), 8.0, &config)?;
//! println!("{:?}", change.percent_change("rmssd"));
//! # Ok::<(), biofeed::BiofeedError>(())
//! ```

pub mod config;
pub mod core;
pub mod dsp;
pub mod error;
pub mod session;
pub mod stream;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{
    capture_baseline, capture_baseline_for, compute_emg, compute_hrv, feedback_level, score,
    Baseline, ChangeVector, EmgMode, EmgParams, HrvParams, Modality,
};
pub use dsp::{filter, find_peaks, BandpassFilter, FilterSpec};
pub use error::{BiofeedError, Result};
pub use session::{FeedbackSession, SessionStats, SharedSessionStats};
pub use stream::{Recording, SampleBuffer, SampleSource};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
