//! A biofeedback session over one sample source.

use crate::config::Config;
use crate::core::{capture_baseline_for, score, Baseline, ChangeVector, Modality};
use crate::error::{BiofeedError, Result};
use crate::session::stats::{create_shared_stats, SharedSessionStats};
use crate::stream::SampleSource;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use uuid::Uuid;

/// Baselines keyed by modality and channel label, owned by the session.
///
/// Nothing here is global: two sessions never see each other's baselines.
pub struct FeedbackSession {
    id: Uuid,
    config: Config,
    baselines: HashMap<(Modality, String), Baseline>,
    stats: SharedSessionStats,
}

impl FeedbackSession {
    pub fn new(config: Config) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "feedback session created");
        Self {
            id,
            config,
            baselines: HashMap::new(),
            stats: create_shared_stats(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to this session's counters.
    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    /// Capture a baseline for `channel` from the source's history.
    ///
    /// `duration_secs` defaults to the configured baseline duration for the
    /// modality. A previous baseline for the same channel is replaced.
    pub fn capture<S: SampleSource>(
        &mut self,
        source: &S,
        modality: Modality,
        channel: usize,
        duration_secs: Option<f64>,
    ) -> Result<&Baseline> {
        let label = self.track(channel_label(source, channel))?;
        let duration = duration_secs.unwrap_or_else(|| modality.baseline_secs(&self.config));
        let raw = source.latest(channel, duration);

        let baseline = self.track(capture_baseline_for(
            Some(label.as_str()),
            modality,
            &raw,
            source.sampling_rate(),
            duration,
            &self.config,
        ))?;
        self.stats.record_baseline();

        let slot = match self.baselines.entry((modality, label)) {
            Entry::Occupied(mut entry) => {
                entry.insert(baseline);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(baseline),
        };
        Ok(slot)
    }

    /// Score the latest window of `channel` against its baseline.
    ///
    /// `window_secs` defaults to the configured online window for the modality.
    pub fn score<S: SampleSource>(
        &self,
        source: &S,
        modality: Modality,
        channel: usize,
        window_secs: Option<f64>,
    ) -> Result<ChangeVector> {
        let label = self.track(channel_label(source, channel))?;
        let window = window_secs.unwrap_or_else(|| modality.window_secs(&self.config));
        let raw = source.latest(channel, window);

        let baseline = self.baselines.get(&(modality, label.clone()));
        let result = score(
            modality,
            &raw,
            source.sampling_rate(),
            baseline,
            window,
            &self.config,
        );
        let change = self.track(result.map_err(|e| match e {
            BiofeedError::BaselineMissing(_) => BiofeedError::BaselineMissing(label),
            other => other,
        }))?;
        self.stats.record_scored();
        Ok(change)
    }

    /// Adopt a previously captured baseline.
    ///
    /// Returns false, leaving the session unchanged, if the baseline carries
    /// no channel label.
    pub fn insert_baseline(&mut self, baseline: Baseline) -> bool {
        let Some(label) = baseline.channel.clone() else {
            return false;
        };
        self.baselines.insert((baseline.modality(), label), baseline);
        true
    }

    pub fn baseline(&self, modality: Modality, channel: &str) -> Option<&Baseline> {
        self.baselines.get(&(modality, channel.to_string()))
    }

    pub fn baselines(&self) -> impl Iterator<Item = &Baseline> {
        self.baselines.values()
    }

    pub fn clear_baselines(&mut self) {
        self.baselines.clear();
    }

    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_recoverable() {
                self.stats.record_rejected();
            } else {
                self.stats.record_error();
            }
        }
        result
    }
}

fn channel_label<S: SampleSource>(source: &S, channel: usize) -> Result<String> {
    source
        .channel_names()
        .get(channel)
        .cloned()
        .ok_or(BiofeedError::UnknownChannel(channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{muscle_burst, pulse_train};
    use crate::stream::Recording;

    fn recording() -> Recording {
        Recording::new(
            500,
            vec!["PPG".into(), "LFL".into()],
            vec![
                pulse_train(500, 20.0, |_| 0.8),
                muscle_burst(500, 20.0, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_capture_then_score() {
        let rec = recording();
        let mut session = FeedbackSession::new(Config::default());

        let baseline = session.capture(&rec, Modality::Emg, 1, Some(3.0)).unwrap();
        assert_eq!(baseline.channel.as_deref(), Some("LFL"));
        assert_eq!(baseline.emg().unwrap().num_chunks, 10);

        let change = session.score(&rec, Modality::Emg, 1, None).unwrap();
        let ratio = change.get("cumulative_energy").unwrap();
        assert!(ratio > 0.5 && ratio < 1.5, "ratio {ratio}");

        let stats = session.stats().snapshot();
        assert_eq!(stats.baselines_captured, 1);
        assert_eq!(stats.windows_scored, 1);
    }

    #[test]
    fn test_score_without_baseline_names_channel() {
        let rec = recording();
        let session = FeedbackSession::new(Config::default());
        assert_eq!(
            session.score(&rec, Modality::Hrv, 0, None).unwrap_err(),
            BiofeedError::BaselineMissing("PPG".into())
        );
        assert_eq!(session.stats().snapshot().errors, 1);
    }

    #[test]
    fn test_unknown_channel_index() {
        let rec = recording();
        let mut session = FeedbackSession::new(Config::default());
        assert_eq!(
            session.capture(&rec, Modality::Emg, 5, Some(1.0)).unwrap_err(),
            BiofeedError::UnknownChannel(5)
        );
        assert_eq!(
            session.score(&rec, Modality::Emg, 5, None).unwrap_err(),
            BiofeedError::UnknownChannel(5)
        );

        let stats = session.stats().snapshot();
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.windows_rejected, 0);
    }

    #[test]
    fn test_short_history_counts_as_rejected() {
        let rec = recording();
        let mut session = FeedbackSession::new(Config::default());
        let err = session.capture(&rec, Modality::Hrv, 0, None).unwrap_err();
        assert!(matches!(err, BiofeedError::InsufficientSignal { .. }));
        assert_eq!(session.stats().snapshot().windows_rejected, 1);
    }

    #[test]
    fn test_baselines_are_per_channel() {
        let rec = recording();
        let mut session = FeedbackSession::new(Config::default());
        session.capture(&rec, Modality::Hrv, 0, Some(15.0)).unwrap();

        assert!(session.baseline(Modality::Hrv, "PPG").is_some());
        assert!(session.baseline(Modality::Hrv, "LFL").is_none());
        assert!(session.baseline(Modality::Emg, "PPG").is_none());

        let other = FeedbackSession::new(Config::default());
        assert_ne!(other.id(), session.id());
        assert_eq!(other.baselines().count(), 0);

        session.clear_baselines();
        assert_eq!(session.baselines().count(), 0);
    }

    #[test]
    fn test_insert_requires_label() {
        let rec = recording();
        let mut session = FeedbackSession::new(Config::default());
        let mut baseline = session
            .capture(&rec, Modality::Emg, 1, Some(1.0))
            .unwrap()
            .clone();

        let mut fresh = FeedbackSession::new(Config::default());
        assert!(fresh.insert_baseline(baseline.clone()));
        assert!(fresh.baseline(Modality::Emg, "LFL").is_some());

        baseline.channel = None;
        assert!(!fresh.insert_baseline(baseline));
        assert_eq!(fresh.baselines().count(), 1);
    }
}
