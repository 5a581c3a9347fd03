//! Harmonic progression and rhythm pattern generation.

use songforge_core::arrangement::{InstrumentEvent, KeySignature, Section, SectionLabel};
use songforge_core::Genre;

use crate::template::BEATS_PER_BAR;

/// General MIDI percussion pitches used for the rhythm track.
pub const KICK: u8 = 35;
pub const SNARE: u8 = 38;
pub const CLOSED_HAT: u8 = 42;

/// Chord progression per genre, as scale degrees relative to the tonic.
/// One chord per bar, repeated to cover each section.
fn progression_for(genre: Genre) -> &'static [i32] {
    match genre {
        // I-V-vi-IV
        Genre::Pop => &[0, 4, 5, 3],
        // i-VI-III-VII
        Genre::Rock => &[0, 5, 2, 6],
        // i-VII-VI-VII
        Genre::Electronic => &[0, 6, 5, 6],
        // i-iv-i-v
        Genre::HipHop => &[0, 3, 0, 4],
        // I-IV-I-V
        Genre::Country => &[0, 3, 0, 4],
        // ii-V-I-vi
        Genre::Jazz => &[1, 4, 0, 5],
        // I-vi-IV-V
        Genre::Ballad => &[0, 5, 3, 4],
    }
}

/// Generates sustained triads for every section, one chord per bar.
pub fn generate_harmony(
    sections: &[Section],
    key: KeySignature,
    genre: Genre,
) -> Vec<InstrumentEvent> {
    let progression = progression_for(genre);
    let mut events = Vec::new();

    for section in sections {
        let bars = (section.length_beats / BEATS_PER_BAR) as usize;
        let velocity = section_velocity(section.label);
        for bar in 0..bars {
            let root_degree = progression[bar % progression.len()];
            let start = section.start_beat + bar as f64 * BEATS_PER_BAR;
            // Triad: root, third, fifth stacked in scale degrees.
            for offset in [0, 2, 4] {
                events.push(InstrumentEvent {
                    pitch: key.degree_pitch(root_degree + offset),
                    start_beat: start,
                    duration_beats: BEATS_PER_BAR,
                    velocity,
                });
            }
        }
    }

    events
}

/// Generates the drum track. Intros and outros get a thinned pattern so the
/// song breathes at its edges.
pub fn generate_rhythm(sections: &[Section], genre: Genre) -> Vec<InstrumentEvent> {
    let mut events = Vec::new();

    for section in sections {
        let bars = (section.length_beats / BEATS_PER_BAR) as usize;
        let thin = matches!(section.label, SectionLabel::Intro | SectionLabel::Outro);
        for bar in 0..bars {
            let start = section.start_beat + bar as f64 * BEATS_PER_BAR;
            fill_bar(genre, start, thin, &mut events);
        }
    }

    events
}

fn fill_bar(genre: Genre, bar_start: f64, thin: bool, out: &mut Vec<InstrumentEvent>) {
    let hit = |out: &mut Vec<InstrumentEvent>, pitch: u8, beat: f64, velocity: u8| {
        out.push(InstrumentEvent {
            pitch,
            start_beat: bar_start + beat,
            duration_beats: 0.25,
            velocity,
        });
    };

    match genre {
        Genre::Electronic => {
            // Four on the floor.
            for beat in 0..4 {
                hit(out, KICK, beat as f64, 110);
            }
            if !thin {
                hit(out, SNARE, 1.0, 96);
                hit(out, SNARE, 3.0, 96);
                for eighth in 0..8 {
                    hit(out, CLOSED_HAT, eighth as f64 * 0.5, 70);
                }
            }
        }
        Genre::HipHop => {
            hit(out, KICK, 0.0, 112);
            hit(out, KICK, 2.5, 100);
            if !thin {
                hit(out, SNARE, 1.0, 104);
                hit(out, SNARE, 3.0, 104);
                for eighth in 0..8 {
                    hit(out, CLOSED_HAT, eighth as f64 * 0.5, 64);
                }
            }
        }
        Genre::Ballad | Genre::Jazz => {
            hit(out, KICK, 0.0, 88);
            if !thin {
                hit(out, SNARE, 2.0, 76);
                hit(out, CLOSED_HAT, 1.0, 56);
                hit(out, CLOSED_HAT, 3.0, 56);
            }
        }
        // Rock, pop, country: backbeat.
        _ => {
            hit(out, KICK, 0.0, 108);
            hit(out, KICK, 2.0, 100);
            if !thin {
                hit(out, SNARE, 1.0, 100);
                hit(out, SNARE, 3.0, 100);
                for eighth in 0..8 {
                    hit(out, CLOSED_HAT, eighth as f64 * 0.5, 68);
                }
            }
        }
    }
}

fn section_velocity(label: SectionLabel) -> u8 {
    match label {
        SectionLabel::Chorus => 96,
        SectionLabel::Bridge | SectionLabel::PreChorus => 84,
        SectionLabel::Intro | SectionLabel::Outro => 64,
        _ => 76,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sections() -> Vec<Section> {
        vec![
            Section {
                label: SectionLabel::Intro,
                start_beat: 0.0,
                length_beats: 8.0,
            },
            Section {
                label: SectionLabel::Verse,
                start_beat: 8.0,
                length_beats: 16.0,
            },
        ]
    }

    #[test]
    fn harmony_stacks_triads_per_bar() {
        let events = generate_harmony(&test_sections(), KeySignature::c_major(), Genre::Pop);
        // 6 bars total, 3 notes per bar.
        assert_eq!(events.len(), 18);
        // First bar of I in C major: C-E-G around the default octave.
        assert_eq!(events[0].pitch, 60);
        assert_eq!(events[1].pitch, 64);
        assert_eq!(events[2].pitch, 67);
    }

    #[test]
    fn electronic_kick_lands_on_every_beat() {
        let sections = vec![Section {
            label: SectionLabel::Chorus,
            start_beat: 0.0,
            length_beats: 4.0,
        }];
        let events = generate_rhythm(&sections, Genre::Electronic);
        let kicks: Vec<f64> = events
            .iter()
            .filter(|e| e.pitch == KICK)
            .map(|e| e.start_beat)
            .collect();
        assert_eq!(kicks, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn intro_pattern_is_thinned() {
        let sections = vec![Section {
            label: SectionLabel::Intro,
            start_beat: 0.0,
            length_beats: 4.0,
        }];
        let events = generate_rhythm(&sections, Genre::Rock);
        assert!(events.iter().all(|e| e.pitch == KICK));
    }

    #[test]
    fn velocities_are_midi_range() {
        let sections = test_sections();
        let mut events = generate_harmony(&sections, KeySignature::c_major(), Genre::Pop);
        events.extend(generate_rhythm(&sections, Genre::Pop));
        for e in &events {
            assert!((1..=127).contains(&e.velocity), "velocity {}", e.velocity);
        }
        // Choruses push harder than intros.
        let chorus = vec![Section {
            label: SectionLabel::Chorus,
            start_beat: 0.0,
            length_beats: 4.0,
        }];
        let loud = generate_harmony(&chorus, KeySignature::c_major(), Genre::Pop);
        assert!(loud[0].velocity > events[0].velocity);
    }

    #[test]
    fn events_stay_inside_sections() {
        let sections = test_sections();
        let total = 24.0;
        for e in generate_harmony(&sections, KeySignature::a_minor(), Genre::Electronic) {
            assert!(e.start_beat + e.duration_beats <= total + 1e-9);
        }
        for e in generate_rhythm(&sections, Genre::Electronic) {
            assert!(e.start_beat + e.duration_beats <= total + 1e-9);
        }
    }
}
