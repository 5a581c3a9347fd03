//! Tier policy and the mastering entry point.

use songforge_core::{Encoding, Master, MasterFormat, Stem, Tier};

use crate::bus::{self, CompressorSettings};
use crate::encode;
use crate::error::MixError;
use crate::watermark::apply_watermark;

/// Per-tier mastering decisions.
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    /// Peak normalization target in dBFS.
    pub loudness_dbfs: f64,
    /// PCM depth of the deliverable.
    pub encoding: Encoding,
    /// Delivery sample rate in Hz.
    pub sample_rate: u32,
    /// Whether the format counts as lossless.
    pub lossless: bool,
    /// Whether the watermark is stamped on.
    pub watermark: bool,
    /// Whether encoded stems ship alongside the master.
    pub include_stems: bool,
    /// Bus compressor settings.
    pub compressor: CompressorSettings,
}

impl TierPolicy {
    /// The fixed policy for a tier.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Preview => Self {
                loudness_dbfs: -6.0,
                encoding: Encoding::Pcm8,
                sample_rate: 22_050,
                lossless: false,
                watermark: true,
                include_stems: false,
                compressor: CompressorSettings::heavy(),
            },
            Tier::Clean => Self {
                loudness_dbfs: -1.0,
                encoding: Encoding::Pcm16,
                sample_rate: 44_100,
                lossless: false,
                watermark: false,
                include_stems: false,
                compressor: CompressorSettings::gentle(),
            },
            Tier::Studio => Self {
                loudness_dbfs: -3.0,
                encoding: Encoding::Pcm24,
                sample_rate: 48_000,
                lossless: true,
                watermark: false,
                include_stems: true,
                compressor: CompressorSettings::gentle(),
            },
        }
    }
}

/// Mixes stems into the master for one tier.
///
/// Pure function of `(stems, tier)`: no shared state, so tiers can be
/// produced concurrently and in any order from the same stems.
pub fn mix(stems: &[Stem], tier: Tier) -> Result<Master, MixError> {
    if stems.is_empty() {
        return Err(MixError::EmptyStemSet);
    }
    let source_rate = stems[0].sample_rate;
    if stems.iter().any(|s| s.sample_rate != source_rate) {
        return Err(MixError::Encoding {
            tier,
            message: "stems disagree on sample rate".to_string(),
        });
    }

    let policy = TierPolicy::for_tier(tier);
    let mut bus = bus::sum_stems(stems);

    bus::compress(&mut bus, policy.compressor, source_rate as f64);
    bus::soft_clip(&mut bus, 0.95);
    bus::normalize(&mut bus, policy.loudness_dbfs);
    if policy.watermark {
        apply_watermark(&mut bus, source_rate as f64);
    }

    let left = encode::resample(&bus.left, source_rate, policy.sample_rate);
    let right = encode::resample(&bus.right, source_rate, policy.sample_rate);
    let pcm = encode::interleave_to_pcm(&left, &right, policy.encoding);
    if pcm.is_empty() {
        return Err(MixError::Encoding {
            tier,
            message: "mix produced no audio".to_string(),
        });
    }
    let pcm_hash = encode::pcm_hash(&pcm);
    let audio = encode::write_wav(&pcm, 2, policy.sample_rate, policy.encoding);

    let stem_audio = if policy.include_stems {
        stems
            .iter()
            .map(|stem| {
                let channel = encode::resample(&stem.samples, source_rate, policy.sample_rate);
                let stem_pcm = encode::mono_to_pcm(&channel, policy.encoding);
                let wav = encode::write_wav(&stem_pcm, 1, policy.sample_rate, policy.encoding);
                (stem.kind, wav)
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(Master {
        tier,
        format: MasterFormat {
            encoding: policy.encoding,
            sample_rate: policy.sample_rate,
            lossless: policy.lossless,
        },
        watermarked: policy.watermark,
        stems_included: policy.include_stems,
        audio,
        stem_audio,
        pcm_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use songforge_core::StemKind;

    fn tone_stem(kind: StemKind, frequency: f64) -> Stem {
        let sr = 44100;
        let samples = (0..sr)
            .map(|i| {
                (2.0 * std::f64::consts::PI * frequency * i as f64 / sr as f64).sin() * 0.4
            })
            .collect();
        Stem {
            kind,
            sample_rate: sr as u32,
            samples,
        }
    }

    fn full_stem_set() -> Vec<Stem> {
        vec![
            tone_stem(StemKind::Vocal, 440.0),
            tone_stem(StemKind::Drums, 80.0),
            tone_stem(StemKind::Bass, 55.0),
            tone_stem(StemKind::Melody, 660.0),
            tone_stem(StemKind::Harmony, 330.0),
        ]
    }

    #[test]
    fn empty_stem_set_is_rejected() {
        assert!(matches!(mix(&[], Tier::Clean), Err(MixError::EmptyStemSet)));
    }

    #[test]
    fn every_tier_satisfies_its_invariants() {
        let stems = full_stem_set();
        for &tier in Tier::all() {
            let master = mix(&stems, tier).unwrap();
            master.check_tier_invariants().unwrap();
            assert!(!master.audio.is_empty());
            assert!(!master.pcm_hash.is_empty());
        }
    }

    #[test]
    fn preview_is_reduced_resolution() {
        let master = mix(&full_stem_set(), Tier::Preview).unwrap();
        assert_eq!(master.format.encoding, Encoding::Pcm8);
        assert_eq!(master.format.sample_rate, 22_050);
        assert!(master.watermarked);
    }

    #[test]
    fn studio_ships_all_stems() {
        let master = mix(&full_stem_set(), Tier::Studio).unwrap();
        assert_eq!(master.stem_audio.len(), 5);
        assert!(master.format.lossless);
        for (_, wav) in &master.stem_audio {
            assert_eq!(&wav[0..4], b"RIFF");
        }
    }

    #[test]
    fn mixing_is_deterministic_per_tier() {
        let stems = full_stem_set();
        let a = mix(&stems, Tier::Clean).unwrap();
        let b = mix(&stems, Tier::Clean).unwrap();
        assert_eq!(a.pcm_hash, b.pcm_hash);
        assert_eq!(a.audio, b.audio);
    }

    #[test]
    fn tiers_differ_in_output() {
        let stems = full_stem_set();
        let preview = mix(&stems, Tier::Preview).unwrap();
        let clean = mix(&stems, Tier::Clean).unwrap();
        assert_ne!(preview.pcm_hash, clean.pcm_hash);
    }

    #[test]
    fn clean_peaks_near_minus_one_dbfs() {
        let master = mix(&full_stem_set(), Tier::Clean).unwrap();
        // Decode 16-bit interleaved samples and find the peak.
        let pcm = &master.audio[44..];
        let peak = pcm
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]).abs() as f64 / 32767.0)
            .fold(0.0f64, f64::max);
        let target = 10.0f64.powf(-1.0 / 20.0);
        assert!((peak - target).abs() < 0.02, "peak {}", peak);
    }
}
