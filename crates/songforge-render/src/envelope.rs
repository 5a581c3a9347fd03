//! ADSR envelope generator for shaping note amplitude over time.

/// ADSR envelope parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level (0.0 to 1.0).
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.5,
            release: 0.2,
        }
    }
}

impl AdsrParams {
    /// Creates new ADSR parameters with sanity clamping.
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }

    /// Percussive envelope: no sustain, release mirrors the decay.
    pub fn percussive(attack: f64, decay: f64) -> Self {
        Self {
            attack,
            decay,
            sustain: 0.0,
            release: decay,
        }
    }

    /// Pluck envelope: near-instant attack, medium decay.
    pub fn pluck(decay: f64) -> Self {
        Self {
            attack: 0.001,
            decay,
            sustain: 0.0,
            release: decay,
        }
    }

    /// Pad envelope: slow attack and release, full sustain.
    pub fn pad(attack: f64, release: f64) -> Self {
        Self {
            attack,
            decay: 0.0,
            sustain: 1.0,
            release,
        }
    }
}

/// Generates the envelope curve for a note of fixed total duration.
///
/// Release is scheduled so the envelope reaches zero by the end of the
/// buffer; for notes shorter than attack + decay + release the phases
/// compress proportionally rather than truncating to a click.
pub fn fixed_duration_curve(params: &AdsrParams, sample_rate: f64, duration: f64) -> Vec<f64> {
    let num_samples = (duration * sample_rate).ceil() as usize;
    if num_samples == 0 {
        return Vec::new();
    }

    let total = params.attack + params.decay + params.release;
    let scale = if total > duration && total > 0.0 {
        duration / total
    } else {
        1.0
    };
    let attack = params.attack * scale;
    let decay = params.decay * scale;
    let release = params.release * scale;
    let release_start = (duration - release).max(attack + decay);

    let mut curve = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f64 / sample_rate;
        let level = if t < attack {
            t / attack
        } else if t < attack + decay {
            1.0 - (t - attack) / decay * (1.0 - params.sustain)
        } else if t < release_start {
            params.sustain
        } else if release > 0.0 {
            (params.sustain * (1.0 - (t - release_start) / release)).max(0.0)
        } else {
            0.0
        };
        curve.push(level);
    }
    curve
}
