//! Melodic contour generation and rhythm quantization.
//!
//! Each syllable becomes one melody event. Placement uses an eighth-note
//! grid (a subdivision of the 1/16 default grid); when a line carries more
//! syllables than its beats allow, the trailing syllables compress into
//! equal subdivisions of the line's final beat instead of being dropped.

use rand::Rng;
use rand_pcg::Pcg32;

use songforge_core::arrangement::{KeySignature, MelodyEvent, Section, SectionLabel};

use crate::lyrics::Syllable;
use crate::template::GRID_PER_BEAT;

/// A section together with the lyric lines assigned to it.
#[derive(Debug)]
pub struct SectionPlan<'a> {
    /// The positioned section.
    pub section: Section,
    /// Lines of syllables to sing in this section.
    pub lines: Vec<&'a [Syllable]>,
}

/// Pitch-selection policy per section role.
///
/// Choruses sit higher and move in smaller intervals so they read as hooky;
/// verses range wider and lower.
#[derive(Debug, Clone, Copy)]
struct PitchPolicy {
    /// Center scale degree, relative to the tonic.
    center: i32,
    /// Maximum distance from the center, in degrees.
    span: i32,
    /// Weights for step sizes 0, 1, 2, 3 (sign chosen separately).
    step_weights: [u32; 4],
}

fn policy_for(label: SectionLabel) -> PitchPolicy {
    match label {
        SectionLabel::Chorus => PitchPolicy {
            center: 7,
            span: 2,
            step_weights: [3, 5, 1, 0],
        },
        SectionLabel::PreChorus => PitchPolicy {
            center: 5,
            span: 3,
            step_weights: [2, 4, 2, 0],
        },
        SectionLabel::Bridge => PitchPolicy {
            center: 6,
            span: 3,
            step_weights: [2, 3, 2, 1],
        },
        // Verse and anything else lyrical: wider, lower.
        _ => PitchPolicy {
            center: 3,
            span: 4,
            step_weights: [1, 3, 2, 1],
        },
    }
}

/// Generates the melody for all planned sections.
pub fn generate_melody(
    plans: &[SectionPlan<'_>],
    key: KeySignature,
    rng: &mut Pcg32,
) -> Vec<MelodyEvent> {
    let mut melody = Vec::new();

    for plan in plans {
        if plan.lines.is_empty() {
            continue;
        }
        let policy = policy_for(plan.section.label);
        let line_beats = plan.section.length_beats / plan.lines.len() as f64;

        for (line_idx, line) in plan.lines.iter().enumerate() {
            let line_start = plan.section.start_beat + line_idx as f64 * line_beats;
            place_line(line, line_start, line_beats, policy, key, rng, &mut melody);
        }
    }

    melody.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat));
    melody
}

/// Places one line of syllables into its beat window.
fn place_line(
    line: &[Syllable],
    line_start: f64,
    line_beats: f64,
    policy: PitchPolicy,
    key: KeySignature,
    rng: &mut Pcg32,
    out: &mut Vec<MelodyEvent>,
) {
    if line.is_empty() {
        return;
    }

    let eighth_slots = (line_beats * 2.0).floor() as usize;
    let mut degree = policy.center;

    let mut emit = |syl: &Syllable, start: f64, duration: f64, degree: &mut i32| {
        *degree = next_degree(*degree, policy, syl.stressed, rng);
        out.push(MelodyEvent {
            pitch: key.degree_pitch(*degree),
            start_beat: quantize(start),
            duration_beats: duration,
            lyric: (syl.index_in_token == 0).then_some(syl.token),
        });
    };

    if line.len() <= eighth_slots {
        for (i, syl) in line.iter().enumerate() {
            emit(syl, line_start + i as f64 * 0.5, 0.5, &mut degree);
        }
    } else {
        // Overflow: fill the eighth grid up to the final beat, then divide
        // the final beat equally among whatever remains.
        let head = eighth_slots.saturating_sub(2).max(1);
        for (i, syl) in line.iter().take(head).enumerate() {
            emit(syl, line_start + i as f64 * 0.5, 0.5, &mut degree);
        }
        let tail = &line[head..];
        let final_beat_start = line_start + (line_beats - 1.0).max(head as f64 * 0.5);
        let step = (line_start + line_beats - final_beat_start) / tail.len() as f64;
        for (j, syl) in tail.iter().enumerate() {
            out.push(MelodyEvent {
                pitch: key.degree_pitch(next_degree(degree, policy, syl.stressed, rng)),
                start_beat: final_beat_start + j as f64 * step,
                duration_beats: step,
                lyric: (syl.index_in_token == 0).then_some(syl.token),
            });
        }
    }
}

/// Quantizes a beat position onto the 1/16 grid.
fn quantize(beat: f64) -> f64 {
    (beat * GRID_PER_BEAT).round() / GRID_PER_BEAT
}

/// Random-walks the scale degree under the section policy. Stressed
/// syllables bias upward.
fn next_degree(current: i32, policy: PitchPolicy, stressed: bool, rng: &mut Pcg32) -> i32 {
    let step = weighted_step(&policy.step_weights, rng);
    let up = if stressed {
        rng.gen::<f64>() < 0.65
    } else {
        rng.gen::<f64>() < 0.45
    };
    let candidate = if up { current + step } else { current - step };
    candidate.clamp(policy.center - policy.span, policy.center + policy.span)
}

fn weighted_step(weights: &[u32; 4], rng: &mut Pcg32) -> i32 {
    let total: u32 = weights.iter().sum();
    let mut pick = rng.gen_range(0..total);
    for (step, &w) in weights.iter().enumerate() {
        if pick < w {
            return step as i32;
        }
        pick -= w;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use songforge_core::arrangement::SectionLabel;

    fn syllables(n: usize) -> Vec<Syllable> {
        (0..n)
            .map(|i| Syllable {
                token: i,
                index_in_token: 0,
                stressed: i % 2 == 0,
            })
            .collect()
    }

    fn plan(syls: &[Syllable], length_beats: f64, label: SectionLabel) -> Vec<MelodyEvent> {
        let plans = vec![SectionPlan {
            section: Section {
                label,
                start_beat: 0.0,
                length_beats,
            },
            lines: vec![syls],
        }];
        let mut rng = Pcg32::seed_from_u64(7);
        generate_melody(&plans, KeySignature::c_major(), &mut rng)
    }

    #[test]
    fn fits_on_eighth_grid_when_room() {
        let syls = syllables(6);
        let melody = plan(&syls, 8.0, SectionLabel::Verse);
        assert_eq!(melody.len(), 6);
        for (i, event) in melody.iter().enumerate() {
            assert!((event.start_beat - i as f64 * 0.5).abs() < 1e-9);
            assert!((event.duration_beats - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn overflow_compresses_into_final_beat() {
        // 4-beat line holds 8 eighth slots; 12 syllables overflow.
        let syls = syllables(12);
        let melody = plan(&syls, 4.0, SectionLabel::Verse);
        assert_eq!(melody.len(), 12, "no syllable may be dropped");

        // All events stay inside the line and never overlap.
        let mut prev_end = 0.0;
        for event in &melody {
            assert!(event.start_beat >= prev_end - 1e-9);
            prev_end = event.start_beat + event.duration_beats;
        }
        assert!(prev_end <= 4.0 + 1e-9);
    }

    #[test]
    fn chorus_sits_higher_than_verse() {
        let syls = syllables(8);
        let verse = plan(&syls, 8.0, SectionLabel::Verse);
        let chorus = plan(&syls, 8.0, SectionLabel::Chorus);
        let mean = |m: &[MelodyEvent]| {
            m.iter().map(|e| e.pitch as f64).sum::<f64>() / m.len() as f64
        };
        assert!(mean(&chorus) > mean(&verse));
    }

    #[test]
    fn chorus_has_narrower_range_than_verse() {
        let syls = syllables(32);
        let verse = plan(&syls, 16.0, SectionLabel::Verse);
        let chorus = plan(&syls, 16.0, SectionLabel::Chorus);
        let range = |m: &[MelodyEvent]| {
            let hi = m.iter().map(|e| e.pitch).max().unwrap();
            let lo = m.iter().map(|e| e.pitch).min().unwrap();
            hi - lo
        };
        assert!(range(&chorus) <= range(&verse));
    }
}
