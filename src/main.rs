//! img2wav: paints an image into the spectrogram of a mono WAV file.
//!
//! ```bash
//! img2wav 44100 5 picture.jpg out.wav
//! img2wav 48000 2.5 picture.png out.wav --bit-depth 16 --clamp
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use img2wav_lib::prelude::*;
use img2wav_lib::{ImagePixels, RenderSettings, SpectrogramSynth, image_to_wav};

/// Convert an image to the frequency spectrum of an audio file.
#[derive(Parser, Debug)]
#[command(name = "img2wav", version, about)]
struct Cli {
    /// Output sample rate in Hz.
    sample_rate: f64,

    /// Length of the signal in seconds.
    duration: f32,

    /// PNG or JPEG image to paint.
    input: PathBuf,

    /// Destination WAV file.
    output: PathBuf,

    /// Bits per sample: 8, 16, 24 or 32 (float).
    #[arg(long, default_value_t = 32)]
    bit_depth: u16,

    /// Saturate out-of-range 8- and 24-bit samples instead of wrapping them.
    #[arg(long)]
    clamp: bool,

    /// Panic on I/O and allocation failures instead of reporting them.
    #[arg(long)]
    strict: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> R<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set.
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let sample_rate = parse_sample_rate(cli.sample_rate)?;
    if !cli.duration.is_finite() || cli.duration <= 0.0 {
        return Err(anyhow!("Invalid transmission time: {}", cli.duration));
    }

    let mut options = CodecOptions::default();
    if cli.clamp {
        options = options.with_overflow(OverflowPolicy::Clamp);
    }
    if cli.strict {
        options = options.with_failure_policy(FailurePolicy::Abort);
    }
    let settings = RenderSettings::new(sample_rate, cli.duration)
        .with_bit_depth(cli.bit_depth)
        .with_options(options);

    let start_time = std::time::Instant::now();
    let frames = image_to_wav(
        &ImagePixels::new(&cli.input),
        &SpectrogramSynth::default(),
        &settings,
        &cli.output,
    )?;

    tracing::info!(
        frames,
        elapsed_s = start_time.elapsed().as_secs_f32(),
        "wrote {}",
        cli.output.display()
    );
    Ok(())
}

fn parse_sample_rate(raw: f64) -> R<u32> {
    let rounded = raw.round();
    if !raw.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
        return Err(anyhow!("Invalid sample rate: {raw}"));
    }
    Ok(rounded as u32)
}
