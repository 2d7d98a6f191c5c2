//! biofeed CLI
//!
//! Offline analysis, baseline capture and scoring of PPG/EMG recordings.

use biofeed::{
    config::Config,
    core::{compute_hrv_with, window_energy, Baseline, Modality},
    feedback_level,
    session::FeedbackSession,
    stream::{candidates_for, select_channel, select_channels, Recording, SampleSource},
    VERSION,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "biofeed")]
#[command(version = VERSION)]
#[command(about = "PPG/EMG biofeedback metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the metrics of the latest window of a recording
    Analyze {
        /// Recording file (JSON)
        #[arg(long, short)]
        input: PathBuf,

        /// Signal modality (hrv or emg)
        #[arg(long, short)]
        modality: Modality,

        /// Channel label (defaults to every matching channel)
        #[arg(long)]
        channel: Option<String>,

        /// Window length in seconds (defaults to the configured window)
        #[arg(long)]
        window: Option<f64>,
    },

    /// Capture resting baselines from a recording
    Baseline {
        /// Recording file (JSON)
        #[arg(long, short)]
        input: PathBuf,

        /// Signal modality (hrv or emg)
        #[arg(long, short)]
        modality: Modality,

        /// Channel label (defaults to every matching channel)
        #[arg(long)]
        channel: Option<String>,

        /// Baseline duration in seconds (defaults to the configured duration)
        #[arg(long)]
        duration: Option<f64>,

        /// Write baselines to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Score the latest window of a recording against saved baselines
    Score {
        /// Recording file (JSON)
        #[arg(long, short)]
        input: PathBuf,

        /// Baseline file written by `biofeed baseline`
        #[arg(long, short)]
        baseline: PathBuf,

        /// Window length in seconds (defaults to the configured window)
        #[arg(long)]
        window: Option<f64>,
    },

    /// Show configuration
    Config {
        /// Check the filter bands against this sampling rate
        #[arg(long)]
        sampling_rate: Option<u32>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            modality,
            channel,
            window,
        } => {
            cmd_analyze(&input, modality, channel.as_deref(), window);
        }
        Commands::Baseline {
            input,
            modality,
            channel,
            duration,
            output,
        } => {
            cmd_baseline(&input, modality, channel.as_deref(), duration, output);
        }
        Commands::Score {
            input,
            baseline,
            window,
        } => {
            cmd_score(&input, &baseline, window);
        }
        Commands::Config { sampling_rate } => {
            cmd_config(sampling_rate);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("biofeed=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config, using defaults: {e}");
        Config::default()
    })
}

fn load_recording(path: &Path) -> Recording {
    Recording::load(path).unwrap_or_else(|e| {
        eprintln!("Error reading recording {path:?}: {e}");
        std::process::exit(1);
    })
}

/// Resolve the channels to work on, exiting if none match.
fn resolve_channels(rec: &Recording, modality: Modality, channel: Option<&str>) -> Vec<usize> {
    let names = rec.channel_names();
    let indices = match channel {
        Some(label) => select_channel(names, &[label]).into_iter().collect(),
        None => match modality {
            // One pulse channel is enough
            Modality::Hrv => select_channel(names, candidates_for(modality))
                .into_iter()
                .collect(),
            Modality::Emg => select_channels(names, candidates_for(modality)),
        },
    };

    if indices.is_empty() {
        eprintln!(
            "Error: No {modality} channel found. Available channels: {}",
            names.join(", ")
        );
        std::process::exit(1);
    }
    indices
}

fn cmd_analyze(input: &Path, modality: Modality, channel: Option<&str>, window: Option<f64>) {
    let config = load_config();
    let rec = load_recording(input);
    let window = window.unwrap_or_else(|| modality.window_secs(&config));
    let fs = rec.sampling_rate();

    let mut failed = false;
    for idx in resolve_channels(&rec, modality, channel) {
        let label = &rec.channel_names()[idx];
        let raw = rec.latest(idx, window);

        let result = match modality {
            Modality::Hrv => compute_hrv_with(&raw, fs, &config.hrv)
                .map(|params| serde_json::to_value(params).unwrap_or_default()),
            Modality::Emg => {
                let mut settings = config.emg.clone();
                settings.window_secs = window;
                window_energy(&raw, fs, &settings)
                    .map(|energy| serde_json::json!({ "cumulative_energy": energy }))
            }
        };

        match result {
            Ok(value) => {
                let record = serde_json::json!({
                    "channel": label,
                    "modality": modality,
                    "window_secs": window,
                    "metrics": value,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&record).unwrap_or_else(|_| "Error".to_string())
                );
            }
            Err(e) => {
                eprintln!("Error analyzing {label}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn cmd_baseline(
    input: &Path,
    modality: Modality,
    channel: Option<&str>,
    duration: Option<f64>,
    output: Option<PathBuf>,
) {
    let rec = load_recording(input);
    let mut session = FeedbackSession::new(load_config());

    let mut baselines: Vec<Baseline> = Vec::new();
    for idx in resolve_channels(&rec, modality, channel) {
        match session.capture(&rec, modality, idx, duration) {
            Ok(baseline) => baselines.push(baseline.clone()),
            Err(e) => eprintln!("Error capturing baseline for {}: {e}", rec.channel_names()[idx]),
        }
    }

    if baselines.is_empty() {
        eprintln!("Error: No baseline could be captured.");
        std::process::exit(1);
    }

    let json = match serde_json::to_string_pretty(&baselines) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing baselines: {e}");
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Warning: Could not create directories: {e}");
                }
            }
            match std::fs::write(&path, json) {
                Ok(()) => println!("Saved {} baseline(s) to {path:?}", baselines.len()),
                Err(e) => {
                    eprintln!("Error writing baselines: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => println!("{json}"),
    }
}

fn cmd_score(input: &Path, baseline_path: &Path, window: Option<f64>) {
    let rec = load_recording(input);
    let mut session = FeedbackSession::new(load_config());

    let baselines: Vec<Baseline> = match std::fs::read_to_string(baseline_path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(baselines) => baselines,
        Err(e) => {
            eprintln!("Error reading baselines {baseline_path:?}: {e}");
            std::process::exit(1);
        }
    };

    let mut targets = Vec::new();
    for baseline in baselines {
        let Some(label) = baseline.channel.clone() else {
            eprintln!("Warning: Skipping baseline without a channel label");
            continue;
        };
        let Some(idx) = select_channel(rec.channel_names(), &[label.as_str()]) else {
            eprintln!("Warning: Channel {label} not present in recording");
            continue;
        };
        targets.push((baseline.modality(), idx, label));
        session.insert_baseline(baseline);
    }

    for (modality, idx, label) in &targets {
        match session.score(&rec, *modality, *idx, window) {
            Ok(change) => {
                println!("{label} ({modality}):");
                for (name, value) in change.iter() {
                    if name == "activation_z" {
                        println!(
                            "  {name:<16} {value:>8.2}  (level {:+.2})",
                            feedback_level(value)
                        );
                    } else {
                        let percent = change.percent_change(name).unwrap_or_default();
                        println!("  {name:<16} {percent:>+8.1}%");
                    }
                }
            }
            Err(e) => eprintln!("Error scoring {label}: {e}"),
        }
    }

    println!();
    println!("{}", session.stats().summary());

    let stats = session.stats().snapshot();
    if stats.windows_scored == 0 {
        std::process::exit(1);
    }
}

fn cmd_config(sampling_rate: Option<u32>) {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );

    if let Some(fs) = sampling_rate {
        println!();
        match config.validate(fs) {
            Ok(()) => println!("Both filter bands are valid at {fs} Hz."),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}
