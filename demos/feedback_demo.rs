//! Demonstration of a live biofeedback loop.
//!
//! This example shows how to:
//! 1. Feed a rolling sample buffer from a producer thread
//! 2. Capture resting baselines for a PPG and an EMG channel
//! 3. Score fresh windows against those baselines
//!
//! The signals are synthetic: a pulse wave that speeds up after rest and a
//! muscle channel that tenses up.
//!
//! Run with: cargo run --example feedback_demo

use std::f64::consts::PI;
use std::thread;

use biofeed::{
    config::Config,
    core::{feedback_level, Modality},
    session::FeedbackSession,
    stream::{Frame, SampleBuffer},
};

const FS: u32 = 500;

/// Heart period and muscle tension at time `t`.
fn physiology(t: f64) -> (f64, f64) {
    if t < 60.0 {
        (1.0, 0.2)
    } else {
        (0.75, 1.0)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("biofeed=debug")
        .init();

    println!("biofeed - Feedback Demo");
    println!("=======================");
    println!();

    let mut config = Config::default();
    config.buffer.retain_secs = 90.0;
    config.buffer.channel_capacity = FS as usize * 90;

    let mut buffer = SampleBuffer::new(FS, vec!["PPG".into(), "LFL".into()], &config.buffer);
    let mut session = FeedbackSession::new(config.clone());
    println!("Session {}", session.id());

    // Producer: 60 s of rest followed by 20 s of effort
    let tx = buffer.sender();
    let producer = thread::spawn(move || {
        let mut phase = 0.0_f64;
        for i in 0..(FS as usize * 80) {
            let t = i as f64 / FS as f64;
            let (period, tension) = physiology(t);
            phase += 1.0 / (period * FS as f64);
            let ppg = (-(phase.fract() - 0.3).powi(2) / 0.005).exp();
            let emg = tension * ((2.0 * PI * 70.0 * t).sin() + 0.4 * (2.0 * PI * 88.0 * t).sin());
            if tx.send(Frame::new(vec![ppg, emg])).is_err() {
                break;
            }
        }
    });

    // Wait for the resting segment
    while buffer.buffered_secs() < 60.0 {
        buffer.drain();
        thread::yield_now();
    }

    for (modality, channel) in [(Modality::Hrv, 0), (Modality::Emg, 1)] {
        match session.capture(&buffer, modality, channel, None) {
            Ok(baseline) => println!("Captured {modality} baseline: {:?}", baseline.params),
            Err(e) => println!("Baseline capture failed for {modality}: {e}"),
        }
    }
    println!();

    if producer.join().is_err() {
        eprintln!("Producer thread panicked");
        return;
    }
    buffer.drain();

    match session.score(&buffer, Modality::Hrv, 0, None) {
        Ok(change) => {
            for (name, _) in change.iter() {
                println!(
                    "PPG {name:<16} {:+.1}%",
                    change.percent_change(name).unwrap_or_default()
                );
            }
        }
        Err(e) => println!("HRV scoring failed: {e}"),
    }

    match session.score(&buffer, Modality::Emg, 1, None) {
        Ok(change) => {
            if let Some(z) = change.get("activation_z") {
                println!("EMG activation_z {z:.2} (feedback level {:+.2})", feedback_level(z));
            }
            if let Some(pct) = change.percent_change("cumulative_energy") {
                println!("EMG energy       {pct:+.1}%");
            }
        }
        Err(e) => println!("EMG scoring failed: {e}"),
    }

    println!();
    println!("{}", session.stats().summary());
}
