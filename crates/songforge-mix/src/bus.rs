//! Stereo bus: summation, panning, compression, normalization.

use songforge_core::{Stem, StemKind};

/// Stereo working buffers.
#[derive(Debug, Clone)]
pub struct StereoBus {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

/// Mix placement of one stem kind.
#[derive(Debug, Clone, Copy)]
pub struct StemPlacement {
    /// Linear gain into the bus.
    pub gain: f64,
    /// Pan position, -1.0 (left) to 1.0 (right).
    pub pan: f64,
}

/// Default placements: rhythm section down the middle, melodic parts
/// spread slightly.
pub fn placement_for(kind: StemKind) -> StemPlacement {
    match kind {
        StemKind::Vocal => StemPlacement {
            gain: 1.0,
            pan: 0.0,
        },
        StemKind::Drums => StemPlacement {
            gain: 0.9,
            pan: 0.0,
        },
        StemKind::Bass => StemPlacement {
            gain: 0.9,
            pan: 0.0,
        },
        StemKind::Melody => StemPlacement {
            gain: 0.7,
            pan: -0.25,
        },
        StemKind::Harmony => StemPlacement {
            gain: 0.5,
            pan: 0.25,
        },
    }
}

/// Equal-power pan gains for a position in -1..1.
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f64::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// Sums stems onto a stereo bus with per-kind gain and equal-power pan.
/// Shorter stems are treated as silence past their end.
pub fn sum_stems(stems: &[Stem]) -> StereoBus {
    let len = stems.iter().map(|s| s.samples.len()).max().unwrap_or(0);
    let mut left = vec![0.0; len];
    let mut right = vec![0.0; len];

    for stem in stems {
        let placement = placement_for(stem.kind);
        let (l_gain, r_gain) = pan_gains(placement.pan);
        for (i, &sample) in stem.samples.iter().enumerate() {
            let scaled = sample * placement.gain;
            left[i] += scaled * l_gain;
            right[i] += scaled * r_gain;
        }
    }

    StereoBus { left, right }
}

/// Soft-knee bus compressor settings.
#[derive(Debug, Clone, Copy)]
pub struct CompressorSettings {
    /// Level where gain reduction begins.
    pub threshold: f64,
    /// Compression ratio above the threshold.
    pub ratio: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl CompressorSettings {
    /// Gentle glue compression for full-quality tiers.
    pub fn gentle() -> Self {
        Self {
            threshold: 0.7,
            ratio: 2.5,
            attack: 0.005,
            release: 0.12,
        }
    }

    /// Heavy compression for the preview tier.
    pub fn heavy() -> Self {
        Self {
            threshold: 0.45,
            ratio: 5.0,
            attack: 0.002,
            release: 0.08,
        }
    }
}

/// Applies a linked-stereo soft-knee compressor in place.
pub fn compress(bus: &mut StereoBus, settings: CompressorSettings, sample_rate: f64) {
    let attack_coeff = coeff(settings.attack, sample_rate);
    let release_coeff = coeff(settings.release, sample_rate);
    let knee = settings.threshold * 0.25;

    let mut envelope = 0.0f64;
    for i in 0..bus.left.len() {
        let peak = bus.left[i].abs().max(bus.right[i].abs());
        let target = peak;
        envelope = if target > envelope {
            attack_coeff * envelope + (1.0 - attack_coeff) * target
        } else {
            release_coeff * envelope + (1.0 - release_coeff) * target
        };

        let gain = gain_for(envelope, settings.threshold, settings.ratio, knee);
        bus.left[i] *= gain;
        bus.right[i] *= gain;
    }
}

fn coeff(time: f64, sample_rate: f64) -> f64 {
    (-1.0 / (time * sample_rate)).exp()
}

/// Soft-knee gain computer: unity below the knee, full ratio above it,
/// quadratic interpolation inside the knee.
fn gain_for(level: f64, threshold: f64, ratio: f64, knee: f64) -> f64 {
    if level <= 1e-12 {
        return 1.0;
    }
    let over = level - threshold;
    let compressed_level = if over <= -knee {
        return 1.0;
    } else if over >= knee {
        threshold + over / ratio
    } else {
        // Inside the knee.
        let x = over + knee;
        level + (1.0 / ratio - 1.0) * x * x / (4.0 * knee)
    };
    compressed_level / level
}

/// Peak-normalizes both channels together to a dBFS target.
pub fn normalize(bus: &mut StereoBus, target_dbfs: f64) {
    let target_peak = 10.0_f64.powf(target_dbfs / 20.0);
    let current_peak = bus
        .left
        .iter()
        .chain(&bus.right)
        .fold(0.0f64, |a, &b| a.max(b.abs()));
    if current_peak > 0.0 {
        let gain = target_peak / current_peak;
        for sample in bus.left.iter_mut().chain(&mut bus.right) {
            *sample *= gain;
        }
    }
}

/// Soft clip both channels to tame inter-stem peaks.
pub fn soft_clip(bus: &mut StereoBus, threshold: f64) {
    for sample in bus.left.iter_mut().chain(&mut bus.right) {
        let abs = sample.abs();
        if abs > threshold {
            let excess = abs - threshold;
            let compressed = threshold + (1.0 - threshold) * (1.0 - (-excess * 3.0).exp());
            *sample = sample.signum() * compressed;
        }
    }
}
