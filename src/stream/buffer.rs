//! Live rolling sample buffer.
//!
//! Acquisition threads push [`Frame`]s into a bounded channel; the consumer
//! drains the channel into per-channel histories before each analysis call.

use crate::config::BufferSettings;
use crate::dsp::secs_to_samples;
use crate::stream::SampleSource;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::VecDeque;

/// One sample per channel, taken at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub samples: Vec<f64>,
}

impl Frame {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}

/// Rolling per-channel history fed through a channel.
pub struct SampleBuffer {
    sampling_rate: u32,
    channels: Vec<String>,
    history: Vec<VecDeque<f64>>,
    /// Maximum samples retained per channel
    capacity: usize,
    sender: Sender<Frame>,
    receiver: Receiver<Frame>,
    /// Frames rejected for a wrong channel count
    malformed: u64,
}

impl SampleBuffer {
    /// Create a buffer for `channels` sampled at `sampling_rate`.
    pub fn new(sampling_rate: u32, channels: Vec<String>, settings: &BufferSettings) -> Self {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(settings.channel_capacity.max(1));
        let capacity = secs_to_samples(settings.retain_secs, sampling_rate).max(1);
        Self {
            sampling_rate,
            history: vec![VecDeque::with_capacity(capacity); channels.len()],
            channels,
            capacity,
            sender,
            receiver,
            malformed: 0,
        }
    }

    /// Get a sender for producers. Cloning is cheap.
    pub fn sender(&self) -> Sender<Frame> {
        self.sender.clone()
    }

    /// Push a frame without blocking. Returns false if the channel is full.
    pub fn try_push(&self, frame: Frame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("sample channel full, frame dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Move every pending frame into history. Returns the number accepted.
    pub fn drain(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(frame) = self.receiver.try_recv() {
            if frame.samples.len() != self.channels.len() {
                self.malformed += 1;
                tracing::warn!(
                    expected = self.channels.len(),
                    found = frame.samples.len(),
                    "frame with wrong channel count ignored"
                );
                continue;
            }
            for (history, sample) in self.history.iter_mut().zip(frame.samples) {
                if history.len() == self.capacity {
                    history.pop_front();
                }
                history.push_back(sample);
            }
            accepted += 1;
        }
        accepted
    }

    /// Samples currently held per channel.
    pub fn len(&self) -> usize {
        self.history.first().map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seconds of history currently held.
    pub fn buffered_secs(&self) -> f64 {
        self.len() as f64 / self.sampling_rate.max(1) as f64
    }

    pub fn malformed_frames(&self) -> u64 {
        self.malformed
    }

    /// Drop all history and any pending frames.
    pub fn clear(&mut self) {
        while self.receiver.try_recv().is_ok() {}
        for history in &mut self.history {
            history.clear();
        }
    }
}

impl SampleSource for SampleBuffer {
    fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    fn channel_names(&self) -> &[String] {
        &self.channels
    }

    fn latest(&self, channel: usize, secs: f64) -> Vec<f64> {
        let Some(history) = self.history.get(channel) else {
            return Vec::new();
        };
        let wanted = secs_to_samples(secs, self.sampling_rate).min(history.len());
        history.iter().skip(history.len() - wanted).copied().collect()
    }
}
