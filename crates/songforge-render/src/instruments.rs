//! Genre-specific instrument voicing.
//!
//! An [`Instrument`] pairs a timbre with an amplitude envelope and optional
//! tone filter. The per-genre pickers decide what plays melody, harmony,
//! and bass.

use rand_pcg::Pcg32;

use songforge_core::Genre;

use crate::envelope::{fixed_duration_curve, AdsrParams};
use crate::filter::{Biquad, FilterShape};
use crate::karplus::PluckedString;
use crate::oscillator::{self, PhaseAccumulator};

/// Basic timbre of an instrument voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timbre {
    Sine,
    Saw,
    Square,
    Triangle,
    Pluck,
    BassPluck,
}

/// A playable instrument voice.
#[derive(Debug, Clone)]
pub struct Instrument {
    /// Waveform or physical model.
    pub timbre: Timbre,
    /// Amplitude envelope.
    pub envelope: AdsrParams,
    /// Output gain applied after the envelope.
    pub gain: f64,
    /// Optional lowpass cutoff in Hz for taming bright timbres.
    pub lowpass: Option<f64>,
}

impl Instrument {
    /// Renders one note.
    pub fn note(
        &self,
        frequency: f64,
        duration: f64,
        sample_rate: f64,
        rng: &mut Pcg32,
    ) -> Vec<f64> {
        let num_samples = (duration * sample_rate).ceil() as usize;
        if num_samples == 0 {
            return Vec::new();
        }

        let mut samples = match self.timbre {
            Timbre::Pluck => {
                PluckedString::guitar(frequency).synthesize(num_samples, sample_rate, rng)
            }
            Timbre::BassPluck => {
                PluckedString::bass(frequency).synthesize(num_samples, sample_rate, rng)
            }
            _ => self.oscillate(frequency, num_samples, sample_rate),
        };

        if let Some(cutoff) = self.lowpass {
            Biquad::new(FilterShape::Lowpass, cutoff, 0.707, sample_rate)
                .process_buffer(&mut samples);
        }

        // Plucks carry their own decay; oscillators need the envelope.
        if !matches!(self.timbre, Timbre::Pluck | Timbre::BassPluck) {
            let env = fixed_duration_curve(&self.envelope, sample_rate, duration);
            for (sample, level) in samples.iter_mut().zip(&env) {
                *sample *= level;
            }
        }
        for sample in &mut samples {
            *sample *= self.gain;
        }
        samples
    }

    fn oscillate(&self, frequency: f64, num_samples: usize, sample_rate: f64) -> Vec<f64> {
        let mut acc = PhaseAccumulator::new(sample_rate);
        let dt = frequency / sample_rate;
        let mut norm_phase = 0.0;
        let mut out = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            let phase = acc.advance(frequency);
            let sample = match self.timbre {
                Timbre::Sine => oscillator::sine(phase),
                Timbre::Triangle => oscillator::triangle(phase),
                Timbre::Saw => oscillator::polyblep_saw(norm_phase, dt),
                Timbre::Square => oscillator::polyblep_square(norm_phase, dt, 0.5),
                Timbre::Pluck | Timbre::BassPluck => unreachable!(),
            };
            out.push(sample);
            norm_phase += dt;
            if norm_phase >= 1.0 {
                norm_phase -= 1.0;
            }
        }
        out
    }
}

/// Melody voice per genre.
pub fn melody_instrument(genre: Genre) -> Instrument {
    match genre {
        Genre::Electronic => Instrument {
            timbre: Timbre::Saw,
            envelope: AdsrParams::new(0.01, 0.08, 0.7, 0.1),
            gain: 0.5,
            lowpass: Some(4000.0),
        },
        Genre::Rock => Instrument {
            timbre: Timbre::Saw,
            envelope: AdsrParams::new(0.005, 0.05, 0.8, 0.08),
            gain: 0.5,
            lowpass: Some(3000.0),
        },
        Genre::HipHop => Instrument {
            timbre: Timbre::Square,
            envelope: AdsrParams::new(0.01, 0.1, 0.6, 0.1),
            gain: 0.45,
            lowpass: Some(2500.0),
        },
        Genre::Country => Instrument {
            timbre: Timbre::Pluck,
            envelope: AdsrParams::pluck(0.3),
            gain: 0.6,
            lowpass: None,
        },
        Genre::Jazz => Instrument {
            timbre: Timbre::Triangle,
            envelope: AdsrParams::new(0.02, 0.1, 0.7, 0.15),
            gain: 0.55,
            lowpass: None,
        },
        Genre::Pop | Genre::Ballad => Instrument {
            timbre: Timbre::Sine,
            envelope: AdsrParams::new(0.015, 0.08, 0.75, 0.12),
            gain: 0.6,
            lowpass: None,
        },
    }
}

/// Harmony (chord pad) voice per genre.
pub fn harmony_instrument(genre: Genre) -> Instrument {
    match genre {
        Genre::Electronic | Genre::Pop | Genre::Ballad => Instrument {
            timbre: Timbre::Saw,
            envelope: AdsrParams::pad(0.2, 0.3),
            gain: 0.22,
            lowpass: Some(1500.0),
        },
        Genre::Jazz => Instrument {
            timbre: Timbre::Triangle,
            envelope: AdsrParams::pad(0.1, 0.2),
            gain: 0.3,
            lowpass: None,
        },
        _ => Instrument {
            timbre: Timbre::Square,
            envelope: AdsrParams::pad(0.05, 0.2),
            gain: 0.2,
            lowpass: Some(1200.0),
        },
    }
}

/// Bass voice per genre.
pub fn bass_instrument(genre: Genre) -> Instrument {
    match genre {
        Genre::Electronic | Genre::HipHop => Instrument {
            timbre: Timbre::Sine,
            envelope: AdsrParams::new(0.005, 0.05, 0.9, 0.05),
            gain: 0.7,
            lowpass: None,
        },
        _ => Instrument {
            timbre: Timbre::BassPluck,
            envelope: AdsrParams::pluck(0.4),
            gain: 0.65,
            lowpass: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn note_length_matches_duration() {
        let mut rng = Pcg32::seed_from_u64(2);
        for genre in Genre::all() {
            let note = melody_instrument(*genre).note(440.0, 0.5, 44100.0, &mut rng);
            assert_eq!(note.len(), 22050);
        }
    }

    #[test]
    fn gain_bounds_note_amplitude() {
        let mut rng = Pcg32::seed_from_u64(2);
        let inst = melody_instrument(Genre::Pop);
        let note = inst.note(440.0, 0.5, 44100.0, &mut rng);
        assert!(note.iter().all(|s| s.abs() <= inst.gain + 1e-9));
    }
}
