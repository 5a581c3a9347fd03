//! Songforge Composer
//!
//! Converts lyrics plus style parameters into a
//! [`SymbolicArrangement`](songforge_core::arrangement::SymbolicArrangement):
//! section structure from a genre template, a lyric-bearing melody shaped by
//! syllable stress and section role, and harmony/rhythm tracks.
//!
//! # Determinism
//!
//! Composition is fully deterministic: the PCG32 stream is seeded from a
//! BLAKE3 hash of (lyrics, genre, tempo, composer version). Identical inputs
//! produce byte-identical arrangements across runs.
//!
//! # Guarantees
//!
//! - Every lyric token lands in exactly one melody event; lyrics are never
//!   dropped. A line with more syllables than its allotted beats compresses
//!   trailing syllables into equal subdivisions of its final beat.
//! - Lyric-bearing notes snap to the 1/16 beat grid; gaps become rests.
//! - Choruses get higher average pitch and narrower interval variance than
//!   verses.

pub mod compose;
pub mod error;
pub mod harmony;
pub mod lyrics;
pub mod melody;
pub mod template;

pub use compose::{compose, compose_with_tag};
pub use error::ComposeError;
pub use lyrics::LyricSheet;

#[cfg(test)]
mod tests {
    use super::*;
    use songforge_core::Genre;

    #[test]
    fn end_to_end_electronic() {
        let arr = compose(
            "Walking through the city lights tonight",
            Genre::Electronic,
            Some(128.0),
            None,
        )
        .unwrap();

        assert_eq!(arr.tempo_bpm, 128.0);
        assert!(!arr.sections.is_empty());
        assert!(!arr.melody.is_empty());
        arr.validate().unwrap();
    }

    #[test]
    fn deterministic_output() {
        let a = compose("la la la land", Genre::Pop, None, None).unwrap();
        let b = compose("la la la land", Genre::Pop, None, None).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn different_lyrics_different_melody() {
        let a = compose("sunrise over the water", Genre::Pop, None, None).unwrap();
        let b = compose("midnight under the city", Genre::Pop, None, None).unwrap();
        assert_ne!(a.melody, b.melody);
    }

    #[test]
    fn every_token_sung_once() {
        let text = "Every single word of this line must be sung\n\
                    And the second line as well, no token left behind\n\
                    Third line keeps on going with many more words here\n\
                    Fourth line wraps it up";
        let arr = compose(text, Genre::Rock, None, None).unwrap();
        let mut sung: Vec<usize> = arr.melody.iter().filter_map(|e| e.lyric).collect();
        sung.sort_unstable();
        let expected: Vec<usize> = (0..arr.lyric_tokens.len()).collect();
        assert_eq!(sung, expected);
        arr.validate().unwrap();
    }
}
