//! Drum kit voices.
//!
//! Each voice renders a single hit into its own buffer. Kicks are a sine
//! with an exponential pitch drop, snares mix a tonal body with filtered
//! noise, hats are short highpassed noise bursts.

use rand_pcg::Pcg32;

use crate::envelope::{fixed_duration_curve, AdsrParams};
use crate::filter::{Biquad, FilterShape};
use crate::noise;
use crate::oscillator::PhaseAccumulator;

/// One drum hit, ready to mix at a velocity-scaled gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumVoice {
    Kick,
    Snare,
    ClosedHat,
}

impl DrumVoice {
    /// Hit length in seconds.
    pub fn duration(self) -> f64 {
        match self {
            DrumVoice::Kick => 0.35,
            DrumVoice::Snare => 0.25,
            DrumVoice::ClosedHat => 0.08,
        }
    }

    /// Renders the hit.
    pub fn synthesize(self, sample_rate: f64, rng: &mut Pcg32) -> Vec<f64> {
        match self {
            DrumVoice::Kick => kick(sample_rate),
            DrumVoice::Snare => snare(sample_rate, rng),
            DrumVoice::ClosedHat => closed_hat(sample_rate, rng),
        }
    }
}

fn kick(sample_rate: f64) -> Vec<f64> {
    let duration = DrumVoice::Kick.duration();
    let num_samples = (duration * sample_rate).ceil() as usize;
    let env = fixed_duration_curve(
        &AdsrParams::percussive(0.002, duration - 0.002),
        sample_rate,
        duration,
    );

    let mut acc = PhaseAccumulator::new(sample_rate);
    let mut out = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f64 / sample_rate;
        // 120 Hz dropping toward 45 Hz.
        let freq = 45.0 + 75.0 * (-t * 18.0).exp();
        let phase = acc.advance(freq);
        out.push(phase.sin() * env[i]);
    }
    out
}

fn snare(sample_rate: f64, rng: &mut Pcg32) -> Vec<f64> {
    let duration = DrumVoice::Snare.duration();
    let num_samples = (duration * sample_rate).ceil() as usize;
    let env = fixed_duration_curve(
        &AdsrParams::percussive(0.001, duration - 0.001),
        sample_rate,
        duration,
    );

    let mut rattle = noise::white(num_samples, rng);
    Biquad::new(FilterShape::Highpass, 1800.0, 0.707, sample_rate).process_buffer(&mut rattle);

    let mut acc = PhaseAccumulator::new(sample_rate);
    let mut out = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let body = acc.advance(185.0).sin();
        out.push((0.4 * body + 0.6 * rattle[i]) * env[i]);
    }
    out
}

fn closed_hat(sample_rate: f64, rng: &mut Pcg32) -> Vec<f64> {
    let duration = DrumVoice::ClosedHat.duration();
    let num_samples = (duration * sample_rate).ceil() as usize;
    let env = fixed_duration_curve(
        &AdsrParams::percussive(0.001, duration - 0.001),
        sample_rate,
        duration,
    );

    let mut hiss = noise::white(num_samples, rng);
    Biquad::new(FilterShape::Highpass, 7000.0, 0.707, sample_rate).process_buffer(&mut hiss);

    hiss.iter().zip(&env).map(|(s, e)| s * e * 0.8).collect()
}
