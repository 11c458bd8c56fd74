//! Turns an intensity grid into a mono signal whose spectrogram draws the
//! image.

use std::f64::consts::TAU;

use crate::pixels::PixelGrid;
use crate::prelude::*;

// Highest frequency painted, reached by the top row of the image
const DEFAULT_MAX_FREQUENCY: f32 = 48000.0;
// Pixels darker than this contribute nothing
const DEFAULT_INTENSITY_FLOOR: u8 = 10;
const DEFAULT_MIN_AMPLITUDE: f32 = 0.001;
const DEFAULT_MAX_AMPLITUDE: f32 = 1.0;
const MAX_INTENSITY: f32 = 255.0;

/// Produces `sample_rate * duration_seconds` samples from a pixel grid. The
/// result is not normalized.
pub trait WaveformSynthesizer {
    fn synthesize(
        &self,
        pixels: &PixelGrid,
        sample_rate: u32,
        duration_seconds: f32,
    ) -> R<Vec<f32>>;
}

/// Additive-sine painter.
///
/// Each image column owns `sample_rate * duration / width` consecutive
/// samples. Inside that span, every pixel bright enough adds a sine whose
/// amplitude follows the intensity and whose frequency follows the row, with
/// the image flipped so the top row is the highest pitch. Phase restarts at
/// zero for each column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramSynth {
    pub max_frequency: f32,
    pub intensity_floor: u8,
    pub min_amplitude: f32,
    pub max_amplitude: f32,
}

impl Default for SpectrogramSynth {
    fn default() -> Self {
        Self {
            max_frequency: DEFAULT_MAX_FREQUENCY,
            intensity_floor: DEFAULT_INTENSITY_FLOOR,
            min_amplitude: DEFAULT_MIN_AMPLITUDE,
            max_amplitude: DEFAULT_MAX_AMPLITUDE,
        }
    }
}

impl SpectrogramSynth {
    fn amplitude(&self, intensity: u8) -> f32 {
        map_range(
            f32::from(intensity),
            0.0,
            MAX_INTENSITY,
            self.min_amplitude,
            self.max_amplitude,
        )
    }
}

impl WaveformSynthesizer for SpectrogramSynth {
    fn synthesize(
        &self,
        pixels: &PixelGrid,
        sample_rate: u32,
        duration_seconds: f32,
    ) -> R<Vec<f32>> {
        if sample_rate == 0 {
            return Err(anyhow!("Invalid sample rate: {sample_rate}"));
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(anyhow!("Invalid duration: {duration_seconds}"));
        }

        let total = (f64::from(sample_rate) * f64::from(duration_seconds)) as usize;
        let column_len = total / pixels.width();
        if column_len == 0 {
            return Err(anyhow!(
                "{} columns do not fit in {total} samples; raise the duration or sample rate",
                pixels.width()
            ));
        }

        let height = pixels.height();
        let fs = f64::from(sample_rate);
        let row_step = f64::from(self.max_frequency) / height as f64;
        tracing::debug!(total, column_len, row_step, "synthesizing");

        let mut signal = vec![0.0f32; total];
        let spans = signal.chunks_exact_mut(column_len).take(pixels.width());
        for (x, span) in spans.enumerate() {
            for (y, intensity) in pixels.column(x).enumerate() {
                if intensity < self.intensity_floor {
                    continue;
                }
                let amplitude = self.amplitude(intensity);
                let frequency = (height - y) as f64 * row_step;
                let omega = TAU * frequency / fs;
                for (t, sample) in span.iter_mut().enumerate() {
                    *sample += amplitude * (omega * t as f64).sin() as f32;
                }
            }
        }
        Ok(signal)
    }
}

/// Linearly remaps `value` from one range onto another.
pub fn map_range(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    to_min + (to_max - to_min) * (value - from_min) / (from_max - from_min)
}

/// Largest absolute value in `samples`, or 0 when empty.
pub fn find_max(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |max, s| max.max(s.abs()))
}

/// Scales `samples` so the peak magnitude is 1. Silence is left alone.
pub fn normalize(samples: &mut [f32]) {
    let max = find_max(samples);
    if max == 0.0 {
        return;
    }
    let norm = 1.0 / max;
    for sample in samples.iter_mut() {
        *sample *= norm;
    }
}
