//! Deterministic voice embedding extraction.
//!
//! The embedding is a fixed-size spectral fingerprint: log band energies
//! from Hann-windowed FFT frames, plus summary statistics (centroid,
//! rolloff, zero crossings, pitch) that the cloning synthesizer maps onto
//! formant and glottal parameters. Same sample in, same vector out.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use songforge_core::version::EXTRACTOR_VERSION;

use crate::error::VoiceError;
use crate::sample::VoiceSample;

/// Embedding vector length.
pub const EMBEDDING_DIM: usize = 32;

/// FFT frame length.
const FRAME_SIZE: usize = 2048;
/// Hop between frames.
const HOP_SIZE: usize = 1024;
/// Log-spaced energy bands. The remaining slots hold summary statistics.
const BAND_COUNT: usize = 26;

/// Sample rates the extractor accepts. No implicit resampling.
const SUPPORTED_RATES: [u32; 4] = [16_000, 22_050, 44_100, 48_000];

/// A versioned voice fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEmbedding {
    /// Extractor version that produced this vector. Synthesizers reject
    /// embeddings from a different version.
    pub version: String,
    /// The feature vector, `EMBEDDING_DIM` long.
    pub values: Vec<f64>,
}

/// Spectral embedding extractor.
#[derive(Debug, Default)]
pub struct EmbeddingExtractor;

impl EmbeddingExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the embedding for a sample.
    pub fn extract(&self, sample: &VoiceSample) -> Result<VoiceEmbedding, VoiceError> {
        if !SUPPORTED_RATES.contains(&sample.sample_rate) {
            return Err(VoiceError::extraction(format!(
                "unsupported sample rate {} Hz",
                sample.sample_rate
            )));
        }
        if sample.samples.len() < FRAME_SIZE {
            return Err(VoiceError::extraction("sample shorter than one frame"));
        }

        let window = hann_window(FRAME_SIZE);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);

        let bin_hz = sample.sample_rate as f64 / FRAME_SIZE as f64;
        let half = FRAME_SIZE / 2;

        let mut band_energy = vec![0.0; BAND_COUNT];
        let mut centroids = Vec::new();
        let mut rolloffs = Vec::new();
        let mut frames = 0usize;

        let mut buffer = vec![Complex::new(0.0, 0.0); FRAME_SIZE];
        let mut start = 0;
        while start + FRAME_SIZE <= sample.samples.len() {
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(sample.samples[start + i] * window[i], 0.0);
            }
            fft.process(&mut buffer);

            let magnitudes: Vec<f64> = buffer[..half].iter().map(|c| c.norm()).collect();
            let total: f64 = magnitudes.iter().sum();
            if total > 1e-9 {
                centroids.push(spectral_centroid(&magnitudes, bin_hz, total));
                rolloffs.push(spectral_rolloff(&magnitudes, bin_hz, total));
            }
            for (band, slot) in band_energy.iter_mut().enumerate() {
                let (lo, hi) = band_bins(band, half);
                *slot += magnitudes[lo..hi].iter().map(|m| m * m).sum::<f64>();
            }
            frames += 1;
            start += HOP_SIZE;
        }

        if centroids.is_empty() {
            return Err(VoiceError::extraction("sample has no spectral content"));
        }

        let mut values = Vec::with_capacity(EMBEDDING_DIM);
        for energy in &band_energy {
            values.push((energy / frames as f64 + 1e-12).log10());
        }
        let (centroid_mean, centroid_std) = mean_std(&centroids);
        let (rolloff_mean, _) = mean_std(&rolloffs);
        values.push(centroid_mean / 1000.0);
        values.push(centroid_std / 1000.0);
        values.push(rolloff_mean / 1000.0);
        values.push(zero_crossing_rate(&sample.samples));
        values.push(estimate_pitch(sample) / 100.0);
        values.push(sample.rms());
        debug_assert_eq!(values.len(), EMBEDDING_DIM);

        Ok(VoiceEmbedding {
            version: EXTRACTOR_VERSION.to_string(),
            values,
        })
    }
}

fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| {
            let x = std::f64::consts::PI * i as f64 / size as f64;
            x.sin() * x.sin()
        })
        .collect()
}

/// Bin range of a log-spaced band over the positive spectrum.
fn band_bins(band: usize, half: usize) -> (usize, usize) {
    let ratio = (half as f64).ln() / BAND_COUNT as f64;
    let lo = ((ratio * band as f64).exp() as usize).min(half - 1);
    let hi = ((ratio * (band + 1) as f64).exp() as usize).clamp(lo + 1, half);
    (lo, hi)
}

/// Mean and population standard deviation of a non-empty slice.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

fn spectral_centroid(magnitudes: &[f64], bin_hz: f64, total: f64) -> f64 {
    magnitudes
        .iter()
        .enumerate()
        .map(|(i, m)| i as f64 * bin_hz * m)
        .sum::<f64>()
        / total
}

/// Frequency below which 85% of the magnitude lives.
fn spectral_rolloff(magnitudes: &[f64], bin_hz: f64, total: f64) -> f64 {
    let threshold = 0.85 * total;
    let mut acc = 0.0;
    for (i, m) in magnitudes.iter().enumerate() {
        acc += m;
        if acc >= threshold {
            return i as f64 * bin_hz;
        }
    }
    (magnitudes.len() - 1) as f64 * bin_hz
}

fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (samples.len() - 1) as f64
}

/// Crude fundamental estimate by autocorrelation over the first second.
fn estimate_pitch(sample: &VoiceSample) -> f64 {
    let sr = sample.sample_rate as f64;
    let span = sample.samples.len().min(sample.sample_rate as usize);
    let signal = &sample.samples[..span];

    let min_lag = (sr / 500.0) as usize;
    let max_lag = ((sr / 60.0) as usize).min(span / 2);
    if min_lag >= max_lag {
        return 0.0;
    }

    let mut best_lag = min_lag;
    let mut best_corr = f64::MIN;
    for lag in min_lag..max_lag {
        let corr: f64 = signal
            .iter()
            .zip(&signal[lag..])
            .map(|(a, b)| a * b)
            .sum();
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }
    sr / best_lag as f64
}
