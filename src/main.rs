//! wavplay - Main entry point
//!
//! Command-line WAV player: parses the container, prints a stream summary,
//! and plays the audio, downmixing canonical 5.1 PCM to stereo on the fly.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for wavplay
#[derive(Parser, Debug)]
#[command(name = "wavplay")]
#[command(about = "Play a RIFF/WAVE file, downmixing 5.1 PCM to stereo")]
#[command(version)]
struct Args {
    /// WAV file to play
    file: PathBuf,

    /// Output device name (default device when omitted)
    #[arg(short, long, env = "WAVPLAY_DEVICE")]
    device: Option<String>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wavplay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Cancellation flag, set on Ctrl+C and checked between blocks
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    wavplay::player::play_file(&args.file, args.device.as_deref(), &cancel)
        .with_context(|| format!("failed to play {}", args.file.display()))?;

    Ok(())
}
