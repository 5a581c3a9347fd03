//! Symbolic arrangement: the non-audio musical plan consumed by renderers.
//!
//! An arrangement carries the section structure, the lyric-bearing melody,
//! and the per-instrument harmony and rhythm tracks, all addressed in beats.
//! It is produced once by the composer, then shared immutably by the vocal
//! and instrumental renderers.

use serde::{Deserialize, Serialize};

use crate::error::SongError;
use crate::genre::Genre;

/// Role of a section within the song form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Outro,
}

impl SectionLabel {
    /// Whether the section carries lyrics.
    pub fn is_lyrical(&self) -> bool {
        !matches!(self, SectionLabel::Intro | SectionLabel::Outro)
    }
}

/// One section of the song form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section role.
    pub label: SectionLabel,
    /// Start position in beats from the top of the song.
    pub start_beat: f64,
    /// Length in beats.
    pub length_beats: f64,
}

/// A single melody note, optionally carrying a lyric token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelodyEvent {
    /// MIDI pitch.
    pub pitch: u8,
    /// Start position in beats.
    pub start_beat: f64,
    /// Duration in beats.
    pub duration_beats: f64,
    /// Index into the arrangement's lyric token list. `None` marks a
    /// melisma continuation note (the token was sung on an earlier note).
    pub lyric: Option<usize>,
}

/// A note event on an instrument track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentEvent {
    /// MIDI pitch. Rhythm tracks use General MIDI percussion numbers
    /// (35 kick, 38 snare, 42 closed hat).
    pub pitch: u8,
    /// Start position in beats.
    pub start_beat: f64,
    /// Duration in beats.
    pub duration_beats: f64,
    /// MIDI velocity, 0 to 127.
    pub velocity: u8,
}

/// Major or minor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

/// Key signature: a tonic pitch class plus a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    /// Tonic pitch class as a MIDI note (middle octave, 60..=71).
    pub tonic: u8,
    /// Major or minor.
    pub mode: Mode,
}

impl KeySignature {
    /// C major.
    pub fn c_major() -> Self {
        Self {
            tonic: 60,
            mode: Mode::Major,
        }
    }

    /// A minor.
    pub fn a_minor() -> Self {
        Self {
            tonic: 57,
            mode: Mode::Minor,
        }
    }

    /// Scale intervals in semitones from the tonic.
    pub fn intervals(&self) -> &'static [i32; 7] {
        match self.mode {
            Mode::Major => &[0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => &[0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// MIDI pitch of a scale degree. Degree 0 is the tonic; degrees beyond 6
    /// or below 0 wrap into neighboring octaves.
    pub fn degree_pitch(&self, degree: i32) -> u8 {
        let octave = degree.div_euclid(7);
        let step = degree.rem_euclid(7) as usize;
        let semis = self.intervals()[step] + octave * 12;
        (self.tonic as i32 + semis).clamp(0, 127) as u8
    }
}

/// The complete symbolic plan for one song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicArrangement {
    /// Ordered sections covering the whole song without gaps.
    pub sections: Vec<Section>,
    /// Lyric-bearing melody events, ordered by start beat.
    pub melody: Vec<MelodyEvent>,
    /// Harmony (chord) track events.
    pub harmony: Vec<InstrumentEvent>,
    /// Rhythm (percussion) track events.
    pub rhythm: Vec<InstrumentEvent>,
    /// Tempo in beats per minute.
    pub tempo_bpm: f64,
    /// Key signature.
    pub key: KeySignature,
    /// Genre tag.
    pub genre: Genre,
    /// Lyric tokens in original order; melody events reference them by index.
    pub lyric_tokens: Vec<String>,
}

impl SymbolicArrangement {
    /// Total length in beats (sum of section lengths).
    pub fn total_beats(&self) -> f64 {
        self.sections.iter().map(|s| s.length_beats).sum()
    }

    /// Duration in seconds at the arrangement tempo.
    pub fn duration_seconds(&self) -> f64 {
        self.total_beats() * 60.0 / self.tempo_bpm
    }

    /// Checks the structural invariants:
    ///
    /// - sections are contiguous from beat 0,
    /// - every lyric token is referenced by exactly one melody event,
    /// - melody events do not overlap in time,
    /// - every event lies inside the song.
    pub fn validate(&self) -> Result<(), SongError> {
        if self.tempo_bpm <= 0.0 {
            return Err(SongError::invalid_input(format!(
                "tempo must be positive, got {}",
                self.tempo_bpm
            )));
        }

        let mut cursor = 0.0_f64;
        for section in &self.sections {
            if (section.start_beat - cursor).abs() > 1e-9 {
                return Err(SongError::invalid_input(format!(
                    "section {:?} starts at beat {} but previous section ends at {}",
                    section.label, section.start_beat, cursor
                )));
            }
            if section.length_beats <= 0.0 {
                return Err(SongError::invalid_input(format!(
                    "section {:?} has non-positive length",
                    section.label
                )));
            }
            cursor += section.length_beats;
        }

        let total = self.total_beats();
        let mut seen = vec![0usize; self.lyric_tokens.len()];
        let mut prev_end = f64::NEG_INFINITY;
        let mut events = self.melody.clone();
        events.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat));
        for event in &events {
            if event.duration_beats <= 0.0 {
                return Err(SongError::invalid_input(
                    "melody event with non-positive duration",
                ));
            }
            if event.start_beat < prev_end - 1e-9 {
                return Err(SongError::invalid_input(format!(
                    "melody events overlap at beat {}",
                    event.start_beat
                )));
            }
            if event.start_beat + event.duration_beats > total + 1e-6 {
                return Err(SongError::invalid_input(
                    "melody event extends past the end of the song",
                ));
            }
            prev_end = event.start_beat + event.duration_beats;
            if let Some(token) = event.lyric {
                match seen.get_mut(token) {
                    Some(count) => *count += 1,
                    None => {
                        return Err(SongError::invalid_input(format!(
                            "melody event references unknown lyric token {}",
                            token
                        )))
                    }
                }
            }
        }
        for (idx, count) in seen.iter().enumerate() {
            if *count != 1 {
                return Err(SongError::invalid_input(format!(
                    "lyric token {} ('{}') assigned to {} melody events, expected 1",
                    idx, self.lyric_tokens[idx], count
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_arrangement() -> SymbolicArrangement {
        SymbolicArrangement {
            sections: vec![Section {
                label: SectionLabel::Verse,
                start_beat: 0.0,
                length_beats: 8.0,
            }],
            melody: vec![
                MelodyEvent {
                    pitch: 60,
                    start_beat: 0.0,
                    duration_beats: 1.0,
                    lyric: Some(0),
                },
                MelodyEvent {
                    pitch: 62,
                    start_beat: 1.0,
                    duration_beats: 1.0,
                    lyric: Some(1),
                },
            ],
            harmony: vec![],
            rhythm: vec![],
            tempo_bpm: 120.0,
            key: KeySignature::c_major(),
            genre: Genre::Pop,
            lyric_tokens: vec!["hello".into(), "world".into()],
        }
    }

    #[test]
    fn valid_arrangement_passes() {
        tiny_arrangement().validate().unwrap();
    }

    #[test]
    fn duration_follows_tempo() {
        let arr = tiny_arrangement();
        // 8 beats at 120 bpm = 4 seconds
        assert!((arr.duration_seconds() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn unassigned_token_fails() {
        let mut arr = tiny_arrangement();
        arr.lyric_tokens.push("orphan".into());
        let err = arr.validate().unwrap_err();
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn doubly_assigned_token_fails() {
        let mut arr = tiny_arrangement();
        arr.melody[1].lyric = Some(0);
        assert!(arr.validate().is_err());
    }

    #[test]
    fn overlapping_melody_fails() {
        let mut arr = tiny_arrangement();
        arr.melody[1].start_beat = 0.5;
        assert!(arr.validate().is_err());
    }

    #[test]
    fn gapped_sections_fail() {
        let mut arr = tiny_arrangement();
        arr.sections.push(Section {
            label: SectionLabel::Chorus,
            start_beat: 10.0,
            length_beats: 8.0,
        });
        assert!(arr.validate().is_err());
    }

    #[test]
    fn degree_pitch_wraps_octaves() {
        let key = KeySignature::c_major();
        assert_eq!(key.degree_pitch(0), 60);
        assert_eq!(key.degree_pitch(7), 72);
        assert_eq!(key.degree_pitch(-7), 48);
        assert_eq!(key.degree_pitch(4), 67); // G above middle C
    }
}
