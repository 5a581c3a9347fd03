//! Arrangement-to-stem rendering.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use songforge_core::arrangement::{InstrumentEvent, SymbolicArrangement};
use songforge_core::hash::{canonical_value_hash, derive_component_seed};
use songforge_core::note::midi_to_freq;
use songforge_core::{Genre, Stem, StemKind};

use crate::error::RenderError;
use crate::instruments::{bass_instrument, harmony_instrument, melody_instrument, Instrument};
use crate::kit::DrumVoice;

/// Sample rate of all rendered stems.
pub const RENDER_SAMPLE_RATE: u32 = 44_100;

/// Seconds of tail past the final event so releases are not cut off.
const RELEASE_TAIL: f64 = 1.0;

/// Renders the instrumental stems (drums, bass, melody, harmony) for an
/// arrangement.
///
/// Rendering is deterministic: per-stem PCG32 streams are seeded from a
/// BLAKE3 hash of the arrangement, so independent stems never perturb each
/// other's noise even when instrument choices change.
pub fn render_instrumental(arrangement: &SymbolicArrangement) -> Result<Vec<Stem>, RenderError> {
    arrangement
        .validate()
        .map_err(|e| RenderError::InvalidArrangement {
            message: e.to_string(),
        })?;

    let sample_rate = RENDER_SAMPLE_RATE as f64;
    let num_samples =
        ((arrangement.duration_seconds() + RELEASE_TAIL) * sample_rate).ceil() as usize;
    if num_samples == 0 {
        return Err(RenderError::EmptyArrangement);
    }

    let base_hash =
        canonical_value_hash(arrangement).map_err(|e| RenderError::InvalidArrangement {
            message: e.to_string(),
        })?;
    let seconds_per_beat = 60.0 / arrangement.tempo_bpm;
    let genre = arrangement.genre;

    let melody_events: Vec<InstrumentEvent> = arrangement
        .melody
        .iter()
        .map(|e| InstrumentEvent {
            pitch: e.pitch,
            start_beat: e.start_beat,
            duration_beats: e.duration_beats,
            velocity: 100,
        })
        .collect();
    let melody = render_track(
        &melody_events,
        &melody_instrument(genre),
        num_samples,
        seconds_per_beat,
        Pcg32::seed_from_u64(derive_component_seed(&base_hash, "melody")),
    );
    let harmony = render_track(
        &arrangement.harmony,
        &harmony_instrument(genre),
        num_samples,
        seconds_per_beat,
        Pcg32::seed_from_u64(derive_component_seed(&base_hash, "harmony")),
    );
    let bass = render_track(
        &derive_bass_events(arrangement),
        &bass_instrument(genre),
        num_samples,
        seconds_per_beat,
        Pcg32::seed_from_u64(derive_component_seed(&base_hash, "bass")),
    );
    let drums = render_drums(
        &arrangement.rhythm,
        num_samples,
        seconds_per_beat,
        Pcg32::seed_from_u64(derive_component_seed(&base_hash, "drums")),
    );

    Ok(vec![
        Stem {
            kind: StemKind::Drums,
            sample_rate: RENDER_SAMPLE_RATE,
            samples: drums,
        },
        Stem {
            kind: StemKind::Bass,
            sample_rate: RENDER_SAMPLE_RATE,
            samples: bass,
        },
        Stem {
            kind: StemKind::Melody,
            sample_rate: RENDER_SAMPLE_RATE,
            samples: melody,
        },
        Stem {
            kind: StemKind::Harmony,
            sample_rate: RENDER_SAMPLE_RATE,
            samples: harmony,
        },
    ])
}

fn render_track(
    events: &[InstrumentEvent],
    instrument: &Instrument,
    num_samples: usize,
    seconds_per_beat: f64,
    mut rng: Pcg32,
) -> Vec<f64> {
    let sample_rate = RENDER_SAMPLE_RATE as f64;
    let mut buffer = vec![0.0; num_samples];
    for event in events {
        let duration = event.duration_beats * seconds_per_beat;
        let note = instrument.note(midi_to_freq(event.pitch), duration, sample_rate, &mut rng);
        let gain = event.velocity as f64 / 127.0;
        let offset = (event.start_beat * seconds_per_beat * sample_rate) as usize;
        mix_at(&mut buffer, &note, offset, gain);
    }
    buffer
}

fn render_drums(
    events: &[InstrumentEvent],
    num_samples: usize,
    seconds_per_beat: f64,
    mut rng: Pcg32,
) -> Vec<f64> {
    let sample_rate = RENDER_SAMPLE_RATE as f64;
    let mut buffer = vec![0.0; num_samples];
    for event in events {
        let Some(voice) = drum_voice(event.pitch) else {
            continue;
        };
        let hit = voice.synthesize(sample_rate, &mut rng);
        let gain = event.velocity as f64 / 127.0;
        let offset = (event.start_beat * seconds_per_beat * sample_rate) as usize;
        mix_at(&mut buffer, &hit, offset, gain);
    }
    buffer
}

/// Maps General MIDI percussion pitches onto kit voices. Unknown pitches
/// are skipped.
fn drum_voice(pitch: u8) -> Option<DrumVoice> {
    match pitch {
        35 | 36 => Some(DrumVoice::Kick),
        38 | 40 => Some(DrumVoice::Snare),
        42 | 44 => Some(DrumVoice::ClosedHat),
        _ => None,
    }
}

/// Derives the bass line from the harmony track: the lowest note of each
/// chord, an octave down. Electronic and hip-hop pulse it on every beat;
/// other genres hold it for the chord.
fn derive_bass_events(arrangement: &SymbolicArrangement) -> Vec<InstrumentEvent> {
    let mut roots: Vec<&InstrumentEvent> = Vec::new();
    for event in &arrangement.harmony {
        match roots.last_mut() {
            Some(last) if (last.start_beat - event.start_beat).abs() < 1e-9 => {
                if event.pitch < last.pitch {
                    *last = event;
                }
            }
            _ => roots.push(event),
        }
    }

    let pulsed = matches!(arrangement.genre, Genre::Electronic | Genre::HipHop);
    let mut events = Vec::new();
    for root in roots {
        let pitch = root.pitch.saturating_sub(12);
        if pulsed {
            let beats = root.duration_beats.floor() as usize;
            for beat in 0..beats.max(1) {
                events.push(InstrumentEvent {
                    pitch,
                    start_beat: root.start_beat + beat as f64,
                    duration_beats: 0.5,
                    velocity: root.velocity,
                });
            }
        } else {
            events.push(InstrumentEvent {
                pitch,
                start_beat: root.start_beat,
                duration_beats: root.duration_beats,
                velocity: root.velocity,
            });
        }
    }
    events
}

fn mix_at(buffer: &mut [f64], note: &[f64], offset: usize, gain: f64) {
    for (i, sample) in note.iter().enumerate() {
        let Some(slot) = buffer.get_mut(offset + i) else {
            break;
        };
        *slot += sample * gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songforge_core::arrangement::{KeySignature, MelodyEvent, Section, SectionLabel};

    fn tiny_arrangement() -> SymbolicArrangement {
        SymbolicArrangement {
            sections: vec![Section {
                label: SectionLabel::Verse,
                start_beat: 0.0,
                length_beats: 4.0,
            }],
            melody: vec![
                MelodyEvent {
                    pitch: 60,
                    start_beat: 0.0,
                    duration_beats: 1.0,
                    lyric: Some(0),
                },
                MelodyEvent {
                    pitch: 64,
                    start_beat: 1.0,
                    duration_beats: 1.0,
                    lyric: Some(1),
                },
            ],
            harmony: vec![
                InstrumentEvent {
                    pitch: 48,
                    start_beat: 0.0,
                    duration_beats: 4.0,
                    velocity: 80,
                },
                InstrumentEvent {
                    pitch: 52,
                    start_beat: 0.0,
                    duration_beats: 4.0,
                    velocity: 80,
                },
            ],
            rhythm: vec![InstrumentEvent {
                pitch: 35,
                start_beat: 0.0,
                duration_beats: 0.25,
                velocity: 110,
            }],
            tempo_bpm: 120.0,
            key: KeySignature::c_major(),
            genre: Genre::Pop,
            lyric_tokens: vec!["hel".into(), "lo".into()],
        }
    }

    #[test]
    fn renders_four_equal_length_stems() {
        let stems = render_instrumental(&tiny_arrangement()).unwrap();
        assert_eq!(stems.len(), 4);
        let len = stems[0].samples.len();
        assert!(len > 0);
        for stem in &stems {
            assert_eq!(stem.samples.len(), len);
            assert_eq!(stem.sample_rate, RENDER_SAMPLE_RATE);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let arr = tiny_arrangement();
        let a = render_instrumental(&arr).unwrap();
        let b = render_instrumental(&arr).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.samples, y.samples);
        }
    }

    #[test]
    fn melody_stem_has_audible_content() {
        let stems = render_instrumental(&tiny_arrangement()).unwrap();
        let melody = stems
            .iter()
            .find(|s| s.kind == StemKind::Melody)
            .expect("melody stem present");
        assert!(melody.rms() > 0.0);
    }

    #[test]
    fn invalid_arrangement_is_rejected() {
        let mut arr = tiny_arrangement();
        arr.melody[1].lyric = Some(0);
        assert!(matches!(
            render_instrumental(&arr),
            Err(RenderError::InvalidArrangement { .. })
        ));
    }

    #[test]
    fn bass_follows_lowest_chord_note() {
        let events = derive_bass_events(&tiny_arrangement());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pitch, 36);
    }
}
