//! Feedback sessions.
//!
//! A session pairs a configuration with the baselines captured for each
//! channel and keeps running counts of what it has done.

pub mod feedback;
pub mod stats;

// Re-export commonly used types
pub use feedback::FeedbackSession;
pub use stats::{create_shared_stats, SessionStats, SessionStatsSnapshot, SharedSessionStats};
