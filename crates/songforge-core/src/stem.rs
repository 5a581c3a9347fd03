//! Audio stems: single-instrument-category renders prior to mixing.

use serde::{Deserialize, Serialize};

/// Instrument category of a stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemKind {
    Vocal,
    Drums,
    Bass,
    Melody,
    Harmony,
}

impl StemKind {
    /// All stem kinds in mixing order.
    pub fn all() -> &'static [StemKind] {
        &[
            StemKind::Drums,
            StemKind::Bass,
            StemKind::Harmony,
            StemKind::Melody,
            StemKind::Vocal,
        ]
    }

    /// The non-vocal kinds produced by the instrumental renderer.
    pub fn instrumental() -> &'static [StemKind] {
        &[
            StemKind::Drums,
            StemKind::Bass,
            StemKind::Harmony,
            StemKind::Melody,
        ]
    }

    /// Stable lowercase name, used in file names and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            StemKind::Vocal => "vocal",
            StemKind::Drums => "drums",
            StemKind::Bass => "bass",
            StemKind::Melody => "melody",
            StemKind::Harmony => "harmony",
        }
    }
}

/// A rendered audio stem. The sample buffer is written once by the renderer
/// that produced it and treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Stem {
    /// Instrument category.
    pub kind: StemKind,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Mono samples in [-1.0, 1.0].
    pub samples: Vec<f64>,
}

impl Stem {
    /// Creates a stem from mono samples.
    pub fn new(kind: StemKind, sample_rate: u32, samples: Vec<f64>) -> Self {
        Self {
            kind,
            sample_rate,
            samples,
        }
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the stem holds no audio.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root-mean-square level of the buffer.
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| s * s).sum();
        (sum / self.samples.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_matches_sample_count() {
        let stem = Stem::new(StemKind::Bass, 44100, vec![0.0; 44100]);
        assert!((stem.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rms_of_silence_is_zero() {
        let stem = Stem::new(StemKind::Vocal, 44100, vec![0.0; 100]);
        assert_eq!(stem.rms(), 0.0);
    }

    #[test]
    fn rms_of_dc_is_level() {
        let stem = Stem::new(StemKind::Vocal, 44100, vec![0.5; 100]);
        assert!((stem.rms() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn instrumental_excludes_vocal() {
        assert!(!StemKind::instrumental().contains(&StemKind::Vocal));
        assert_eq!(StemKind::instrumental().len(), 4);
    }
}
