//! Vocal synthesis backends.
//!
//! Both backends share one DSP path: per melody note a glottal pulse train
//! (Rosenberg-style, with vibrato) is filtered through a vowel formant bank
//! and shaped by an ADSR. What differs is where the timbre comes from —
//! stock presets for the generic backend, embedding-derived parameters for
//! the cloning backend.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use songforge_core::arrangement::SymbolicArrangement;
use songforge_core::hash::{canonical_value_hash, derive_component_seed};
use songforge_core::note::midi_to_freq;
use songforge_core::{Stem, StemKind, VoiceSpec};
use songforge_render::envelope::{fixed_duration_curve, AdsrParams};
use songforge_render::filter::{Biquad, FilterShape};
use songforge_render::oscillator::TWO_PI;
use songforge_render::RENDER_SAMPLE_RATE;

use crate::bank::VoiceBank;
use crate::error::VoiceError;

mod cloning;
mod generic;

pub use cloning::CloningVocalSynthesizer;
pub use generic::GenericVocalSynthesizer;

/// A vocal synthesis backend.
///
/// Implementations fail only with `VoiceNotReady` or `Synthesis`; sample
/// validation and extraction problems surface earlier, at registration.
pub trait VocalSynthesizer: Send + Sync {
    /// Sings the arrangement's melody, returning the vocal stem.
    ///
    /// The stem duration equals the arrangement duration within one frame.
    fn synthesize_vocal(&self, arrangement: &SymbolicArrangement) -> Result<Stem, VoiceError>;
}

/// Picks the backend for a voice spec.
pub fn synthesizer_for(
    spec: &VoiceSpec,
    bank: Arc<VoiceBank>,
) -> Box<dyn VocalSynthesizer + Send + Sync> {
    match spec {
        VoiceSpec::Stock(voice) => Box::new(GenericVocalSynthesizer::new(*voice)),
        VoiceSpec::Cloned(id) => Box::new(CloningVocalSynthesizer::new(bank, id.clone())),
    }
}

/// Timbre parameters for the shared vocal DSP.
#[derive(Debug, Clone, Copy)]
pub struct VoiceTimbre {
    /// Multiplier on the vowel formant frequencies. Above 1.0 brightens.
    pub formant_scale: f64,
    /// Noise mixed into the glottal source (0.0 to 1.0).
    pub breathiness: f64,
    /// Vibrato rate in Hz.
    pub vibrato_rate: f64,
    /// Vibrato depth as a fraction of the note frequency.
    pub vibrato_depth: f64,
    /// Output gain.
    pub gain: f64,
}

/// Sung vowels, picked from the syllable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vowel {
    A,
    E,
    I,
    O,
    U,
}

impl Vowel {
    /// First vowel letter of the token decides the sung vowel; tokens with
    /// no vowel letter default to /a/.
    fn from_token(token: &str) -> Self {
        for c in token.chars() {
            match c.to_ascii_lowercase() {
                'a' => return Vowel::A,
                'e' => return Vowel::E,
                'i' | 'y' => return Vowel::I,
                'o' => return Vowel::O,
                'u' => return Vowel::U,
                _ => {}
            }
        }
        Vowel::A
    }

    /// Formant table: (center Hz, amplitude, Q) triples.
    fn formants(self) -> [(f64, f64, f64); 3] {
        match self {
            Vowel::A => [(800.0, 1.0, 5.0), (1200.0, 0.7, 6.0), (2800.0, 0.4, 7.0)],
            Vowel::E => [(530.0, 1.0, 5.0), (1840.0, 0.7, 6.0), (2480.0, 0.4, 7.0)],
            Vowel::I => [(280.0, 1.0, 5.0), (2250.0, 0.6, 6.0), (2890.0, 0.4, 7.0)],
            Vowel::O => [(500.0, 1.0, 5.0), (1000.0, 0.7, 6.0), (2800.0, 0.3, 7.0)],
            Vowel::U => [(310.0, 1.0, 5.0), (870.0, 0.6, 6.0), (2250.0, 0.3, 7.0)],
        }
    }
}

/// Renders the vocal stem for an arrangement with the given timbre.
///
/// Used by both backends; deterministic via a PCG32 stream seeded from the
/// arrangement hash and the caller's tag.
pub(crate) fn render_vocal_stem(
    arrangement: &SymbolicArrangement,
    timbre: &VoiceTimbre,
    seed_tag: &str,
) -> Result<Stem, VoiceError> {
    let sample_rate = RENDER_SAMPLE_RATE as f64;
    let num_samples = (arrangement.duration_seconds() * sample_rate).round() as usize;
    if num_samples == 0 {
        return Err(VoiceError::synthesis("arrangement has zero duration"));
    }

    let base_hash = canonical_value_hash(arrangement)
        .map_err(|e| VoiceError::synthesis(e.to_string()))?;
    let mut rng = Pcg32::seed_from_u64(derive_component_seed(&base_hash, seed_tag));

    let seconds_per_beat = 60.0 / arrangement.tempo_bpm;
    let mut buffer = vec![0.0; num_samples];
    let mut vowel = Vowel::A;

    for event in &arrangement.melody {
        if let Some(token_index) = event.lyric {
            if let Some(token) = arrangement.lyric_tokens.get(token_index) {
                vowel = Vowel::from_token(token);
            }
        }

        let duration = event.duration_beats * seconds_per_beat;
        let note = sing_note(
            midi_to_freq(event.pitch),
            duration,
            vowel,
            timbre,
            sample_rate,
            &mut rng,
        );
        let offset = (event.start_beat * seconds_per_beat * sample_rate) as usize;
        for (i, sample) in note.iter().enumerate() {
            let Some(slot) = buffer.get_mut(offset + i) else {
                break;
            };
            *slot += sample;
        }
    }

    Ok(Stem {
        kind: StemKind::Vocal,
        sample_rate: RENDER_SAMPLE_RATE,
        samples: buffer,
    })
}

/// Renders one sung note: vibrato'd glottal source through the vowel's
/// formant bank, normalized and enveloped.
fn sing_note(
    frequency: f64,
    duration: f64,
    vowel: Vowel,
    timbre: &VoiceTimbre,
    sample_rate: f64,
    rng: &mut Pcg32,
) -> Vec<f64> {
    let num_samples = (duration * sample_rate).ceil() as usize;
    if num_samples == 0 {
        return Vec::new();
    }

    // Glottal source.
    let mut excitation = Vec::with_capacity(num_samples);
    let mut phase = 0.0;
    for i in 0..num_samples {
        let t = i as f64 / sample_rate;
        let vibrato = 1.0 + timbre.vibrato_depth * (TWO_PI * timbre.vibrato_rate * t).sin();
        phase += frequency * vibrato / sample_rate;
        phase -= phase.floor();

        let pulse = glottal_pulse(phase);
        let noise = rng.gen_range(-1.0..1.0) * timbre.breathiness;
        excitation.push(pulse * (1.0 - timbre.breathiness * 0.5) + noise);
    }

    // Parallel formant bank.
    let mut output = vec![0.0; num_samples];
    for (center, amplitude, q) in vowel.formants() {
        let center = (center * timbre.formant_scale).min(sample_rate / 2.0 - 100.0);
        let mut filter = Biquad::new(FilterShape::Bandpass, center, q, sample_rate);
        for (slot, &exc) in output.iter_mut().zip(&excitation) {
            *slot += filter.process(exc) * amplitude;
        }
    }

    // Normalize, then envelope.
    let peak = output.iter().fold(0.0f64, |a, &b| a.max(b.abs()));
    if peak > 0.0 {
        let scale = timbre.gain / peak;
        for sample in &mut output {
            *sample *= scale;
        }
    }
    let env = fixed_duration_curve(
        &AdsrParams::new(0.02, 0.04, 0.85, 0.08),
        sample_rate,
        duration,
    );
    for (sample, level) in output.iter_mut().zip(&env) {
        *sample *= level;
    }
    output
}

/// Rosenberg-style glottal pulse over a normalized phase.
fn glottal_pulse(phase: f64) -> f64 {
    const OPEN: f64 = 0.4;
    const CLOSE: f64 = 0.3;
    if phase < OPEN {
        let t = phase / OPEN;
        3.0 * t * t - 2.0 * t * t * t
    } else if phase < OPEN + CLOSE {
        let t = (phase - OPEN) / CLOSE;
        1.0 - t * t
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use songforge_core::arrangement::{
        KeySignature, MelodyEvent, Section, SectionLabel, SymbolicArrangement,
    };
    use songforge_core::Genre;

    pub fn sung_arrangement() -> SymbolicArrangement {
        SymbolicArrangement {
            sections: vec![Section {
                label: SectionLabel::Verse,
                start_beat: 0.0,
                length_beats: 4.0,
            }],
            melody: vec![
                MelodyEvent {
                    pitch: 64,
                    start_beat: 0.0,
                    duration_beats: 1.5,
                    lyric: Some(0),
                },
                MelodyEvent {
                    pitch: 67,
                    start_beat: 2.0,
                    duration_beats: 1.5,
                    lyric: Some(1),
                },
            ],
            harmony: vec![],
            rhythm: vec![],
            tempo_bpm: 120.0,
            key: KeySignature::c_major(),
            genre: Genre::Pop,
            lyric_tokens: vec!["shine".into(), "on".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sung_arrangement;
    use super::*;

    fn test_timbre() -> VoiceTimbre {
        VoiceTimbre {
            formant_scale: 1.0,
            breathiness: 0.1,
            vibrato_rate: 5.0,
            vibrato_depth: 0.01,
            gain: 0.8,
        }
    }

    #[test]
    fn stem_duration_matches_arrangement_within_one_frame() {
        let arr = sung_arrangement();
        let stem = render_vocal_stem(&arr, &test_timbre(), "test").unwrap();
        let expected = arr.duration_seconds() * RENDER_SAMPLE_RATE as f64;
        assert!((stem.samples.len() as f64 - expected).abs() <= 1.0);
        assert_eq!(stem.kind, StemKind::Vocal);
    }

    #[test]
    fn vocal_is_deterministic() {
        let arr = sung_arrangement();
        let a = render_vocal_stem(&arr, &test_timbre(), "test").unwrap();
        let b = render_vocal_stem(&arr, &test_timbre(), "test").unwrap();
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn rests_render_silence() {
        let arr = sung_arrangement();
        let stem = render_vocal_stem(&arr, &test_timbre(), "test").unwrap();
        // Beats 1.5..2.0 (0.75 s to 1.0 s at 120 bpm) are a rest.
        let sr = RENDER_SAMPLE_RATE as f64;
        let rest_start = (0.76 * sr) as usize;
        let rest_end = (0.99 * sr) as usize;
        let peak = stem.samples[rest_start..rest_end]
            .iter()
            .fold(0.0f64, |a, &b| a.max(b.abs()));
        assert!(peak < 1e-6, "rest peak {}", peak);
    }

    /// Autocorrelation pitch estimate over the first second of a buffer.
    fn estimate_pitch(samples: &[f64], sample_rate: f64) -> f64 {
        let window = &samples[..(sample_rate as usize).min(samples.len())];
        let min_lag = (sample_rate / 500.0) as usize;
        let max_lag = (sample_rate / 60.0) as usize;
        let mut best_score = 0.0;
        let mut best_lag = min_lag;
        for lag in min_lag..=max_lag.min(window.len() / 2) {
            let mut corr = 0.0;
            let mut norm = 0.0;
            for i in 0..window.len() - lag {
                corr += window[i] * window[i + lag];
                norm += window[i] * window[i];
            }
            let score = corr / norm.max(1e-12);
            if score > best_score {
                best_score = score;
                best_lag = lag;
            }
        }
        sample_rate / best_lag as f64
    }

    #[test]
    fn sung_note_tracks_requested_pitch() {
        use songforge_core::arrangement::MelodyEvent;

        let mut arr = sung_arrangement();
        // A3 = 220 Hz, held for the whole verse.
        arr.melody = vec![MelodyEvent {
            pitch: 57,
            start_beat: 0.0,
            duration_beats: 4.0,
            lyric: Some(0),
        }];
        arr.lyric_tokens = vec!["la".into()];

        let stem = render_vocal_stem(&arr, &test_timbre(), "test").unwrap();
        let sr = RENDER_SAMPLE_RATE as f64;
        // Skip the attack before measuring.
        let sung = &stem.samples[(0.2 * sr) as usize..];
        let estimated = estimate_pitch(sung, sr);
        assert!(
            (estimated - 220.0).abs() < 15.0,
            "estimated {} Hz, wanted 220 Hz",
            estimated
        );
    }

    #[test]
    fn vowel_selection_from_tokens() {
        assert_eq!(Vowel::from_token("shine"), Vowel::I);
        assert_eq!(Vowel::from_token("on"), Vowel::O);
        assert_eq!(Vowel::from_token("tsk"), Vowel::A);
    }
}
