//! Output tiers, encoding formats, and the mixed master type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SongError;
use crate::stem::StemKind;

/// Purchasable output tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Watermarked, low-resolution preview.
    Preview,
    /// Full-quality non-watermarked master.
    Clean,
    /// Lossless master delivered together with the original stems.
    Studio,
}

impl Tier {
    /// All tiers in ascending quality order.
    pub fn all() -> &'static [Tier] {
        &[Tier::Preview, Tier::Clean, Tier::Studio]
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Preview => "preview",
            Tier::Clean => "clean",
            Tier::Studio => "studio",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = SongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(Tier::Preview),
            "clean" => Ok(Tier::Clean),
            "studio" => Ok(Tier::Studio),
            other => Err(SongError::invalid_input(format!(
                "unsupported tier '{}', expected preview, clean, or studio",
                other
            ))),
        }
    }
}

/// PCM encoding depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// 8-bit unsigned PCM. Reduced-resolution "lossy-grade" delivery.
    Pcm8,
    /// 16-bit signed PCM.
    Pcm16,
    /// 24-bit signed PCM. Mastering grade.
    Pcm24,
}

impl Encoding {
    /// Bits per sample.
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            Encoding::Pcm8 => 8,
            Encoding::Pcm16 => 16,
            Encoding::Pcm24 => 24,
        }
    }
}

/// Concrete delivery format of a master.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasterFormat {
    /// PCM encoding depth.
    pub encoding: Encoding,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Whether the format counts as lossless delivery.
    pub lossless: bool,
}

/// A fully mixed, encoded, tier-specific deliverable.
#[derive(Debug, Clone)]
pub struct Master {
    /// Output tier.
    pub tier: Tier,
    /// Delivery format.
    pub format: MasterFormat,
    /// Whether a watermark was injected.
    pub watermarked: bool,
    /// Whether the original stems ship alongside the master (studio only).
    pub stems_included: bool,
    /// Encoded master audio (WAV bytes).
    pub audio: Vec<u8>,
    /// Encoded stems, present only when `stems_included` is true.
    pub stem_audio: Vec<(StemKind, Vec<u8>)>,
    /// BLAKE3 hash of the master's PCM payload.
    pub pcm_hash: String,
}

impl Master {
    /// Checks the tier invariants from the delivery contract:
    /// preview is always watermarked and lossy, studio is always lossless
    /// with stems, clean is never watermarked.
    pub fn check_tier_invariants(&self) -> Result<(), SongError> {
        let ok = match self.tier {
            Tier::Preview => self.watermarked && !self.format.lossless && !self.stems_included,
            Tier::Clean => !self.watermarked && !self.stems_included,
            Tier::Studio => !self.watermarked && self.format.lossless && self.stems_included,
        };
        if ok {
            Ok(())
        } else {
            Err(SongError::encoding(
                self.tier.as_str(),
                "master violates tier policy",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master(tier: Tier, watermarked: bool, lossless: bool, stems: bool) -> Master {
        Master {
            tier,
            format: MasterFormat {
                encoding: Encoding::Pcm16,
                sample_rate: 44100,
                lossless,
            },
            watermarked,
            stems_included: stems,
            audio: vec![],
            stem_audio: vec![],
            pcm_hash: String::new(),
        }
    }

    #[test]
    fn tier_parse() {
        assert_eq!("studio".parse::<Tier>().unwrap(), Tier::Studio);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn preview_must_be_watermarked() {
        assert!(master(Tier::Preview, true, false, false)
            .check_tier_invariants()
            .is_ok());
        assert!(master(Tier::Preview, false, false, false)
            .check_tier_invariants()
            .is_err());
    }

    #[test]
    fn studio_must_include_stems_and_be_lossless() {
        assert!(master(Tier::Studio, false, true, true)
            .check_tier_invariants()
            .is_ok());
        assert!(master(Tier::Studio, false, true, false)
            .check_tier_invariants()
            .is_err());
        assert!(master(Tier::Studio, false, false, true)
            .check_tier_invariants()
            .is_err());
    }

    #[test]
    fn clean_must_not_be_watermarked() {
        assert!(master(Tier::Clean, false, false, false)
            .check_tier_invariants()
            .is_ok());
        assert!(master(Tier::Clean, true, false, false)
            .check_tier_invariants()
            .is_err());
    }
}
