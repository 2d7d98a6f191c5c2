//! Session activity counters.
//!
//! Counters are atomic so a shared handle can be read from a display
//! thread while the session keeps scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity statistics for one feedback session.
#[derive(Debug)]
pub struct SessionStats {
    /// Number of baselines captured
    baselines_captured: AtomicU64,
    /// Number of windows scored successfully
    windows_scored: AtomicU64,
    /// Number of windows rejected for lack of data
    windows_rejected: AtomicU64,
    /// Number of calls that failed for any other reason
    errors: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            baselines_captured: AtomicU64::new(0),
            windows_scored: AtomicU64::new(0),
            windows_rejected: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_baseline(&self) {
        self.baselines_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scored(&self) {
        self.windows_scored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.windows_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            baselines_captured: self.baselines_captured.load(Ordering::Relaxed),
            windows_scored: self.windows_scored.load(Ordering::Relaxed),
            windows_rejected: self.windows_rejected.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Baselines captured: {}\n\
             - Windows scored: {}\n\
             - Windows rejected (insufficient data): {}\n\
             - Errors: {}\n\
             - Session duration: {} seconds",
            stats.baselines_captured,
            stats.windows_scored,
            stats.windows_rejected,
            stats.errors,
            stats.session_duration_secs
        )
    }

    /// Write the current statistics as JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.snapshot()).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.baselines_captured.store(0, Ordering::Relaxed);
        self.windows_scored.store(0, Ordering::Relaxed);
        self.windows_rejected.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatsSnapshot {
    pub baselines_captured: u64,
    pub windows_scored: u64,
    pub windows_rejected: u64,
    pub errors: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared session statistics.
pub type SharedSessionStats = Arc<SessionStats>;

pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = SessionStats::new();
        stats.record_baseline();
        stats.record_scored();
        stats.record_scored();
        stats.record_rejected();

        let snap = stats.snapshot();
        assert_eq!(snap.baselines_captured, 1);
        assert_eq!(snap.windows_scored, 2);
        assert_eq!(snap.windows_rejected, 1);
        assert_eq!(snap.errors, 0);
    }

    #[test]
    fn test_reset() {
        let stats = SessionStats::new();
        stats.record_scored();
        stats.record_error();
        stats.reset();

        let snap = stats.snapshot();
        assert_eq!(snap.windows_scored, 0);
        assert_eq!(snap.errors, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let stats = create_shared_stats();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        stats.record_scored();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.snapshot().windows_scored, 100);
    }

    #[test]
    fn test_summary_format() {
        let stats = SessionStats::new();
        let summary = stats.summary();
        assert!(summary.contains("Baselines captured: 0"));
        assert!(summary.contains("Windows scored"));
    }

    #[test]
    fn test_save_writes_json() {
        let path = std::env::temp_dir()
            .join("biofeed-stats-test")
            .join("stats.json");
        let stats = SessionStats::new();
        stats.record_baseline();
        stats.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let snap: SessionStatsSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(snap.baselines_captured, 1);

        let _ = std::fs::remove_file(&path);
    }
}
