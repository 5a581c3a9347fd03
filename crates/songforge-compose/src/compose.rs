//! Top-level composition entry points.

use std::str::FromStr;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use songforge_core::arrangement::{Section, SectionLabel, SymbolicArrangement};
use songforge_core::hash::{canonical_value_hash, derive_component_seed};
use songforge_core::version::COMPOSER_VERSION;
use songforge_core::Genre;

use crate::error::ComposeError;
use crate::harmony::{generate_harmony, generate_rhythm};
use crate::lyrics::{parse_lyrics, Syllable};
use crate::melody::{generate_melody, SectionPlan};
use crate::template::{extension_pair, key_for, template_for, SectionTemplate};

/// Tempo bounds. Requests outside this range are clamped rather than
/// rejected, matching how most DAWs treat out-of-range tempo input.
const MIN_TEMPO: f64 = 40.0;
const MAX_TEMPO: f64 = 240.0;

/// Lines a single lyrical section will hold before the template grows.
const MAX_LINES_PER_SECTION: usize = 2;

/// Upper bound on verse/chorus pairs added to reach a duration target.
const MAX_DURATION_EXTENSIONS: usize = 8;

/// Composes a full symbolic arrangement from lyrics and style parameters.
///
/// `tempo_bpm` defaults to the genre's idiomatic tempo. `target_duration`
/// (seconds), when given, appends instrumental verse/chorus pairs until the
/// song reaches at least that length; a song already longer than the target
/// is left alone, since lyrics are never cut.
pub fn compose(
    lyrics: &str,
    genre: Genre,
    tempo_bpm: Option<f64>,
    target_duration: Option<f64>,
) -> Result<SymbolicArrangement, ComposeError> {
    let sheet = parse_lyrics(lyrics)?;
    let tempo = tempo_bpm
        .unwrap_or_else(|| genre.default_tempo())
        .clamp(MIN_TEMPO, MAX_TEMPO);

    let mut template = template_for(genre);
    while sheet.lines.len() > MAX_LINES_PER_SECTION * template.lyrical_count() {
        extend_before_outro(&mut template);
    }
    if let Some(target) = target_duration {
        let seconds_per_beat = 60.0 / tempo;
        let mut added = 0;
        while template.total_beats() * seconds_per_beat < target
            && added < MAX_DURATION_EXTENSIONS
        {
            extend_before_outro(&mut template);
            added += 1;
        }
    }

    let sections = position_sections(&template);
    let key = key_for(genre);

    let base_hash = canonical_value_hash(&(lyrics, genre.as_str(), tempo))
        .map_err(|e| ComposeError::Invalid {
            message: e.to_string(),
        })?;
    let mut rng = Pcg32::seed_from_u64(derive_component_seed(&base_hash, COMPOSER_VERSION));

    let plans = assign_lines(&sections, &sheet.lines);
    let melody = generate_melody(&plans, key, &mut rng);
    let harmony = generate_harmony(&sections, key, genre);
    let rhythm = generate_rhythm(&sections, genre);

    let arrangement = SymbolicArrangement {
        sections,
        melody,
        harmony,
        rhythm,
        tempo_bpm: tempo,
        key,
        genre,
        lyric_tokens: sheet.tokens,
    };
    arrangement.validate().map_err(|e| ComposeError::Invalid {
        message: e.to_string(),
    })?;
    Ok(arrangement)
}

/// Like [`compose`] but takes the genre as a free-form tag.
pub fn compose_with_tag(
    lyrics: &str,
    genre_tag: &str,
    tempo_bpm: Option<f64>,
    target_duration: Option<f64>,
) -> Result<SymbolicArrangement, ComposeError> {
    let genre = Genre::from_str(genre_tag).map_err(|_| ComposeError::UnknownGenre {
        tag: genre_tag.to_string(),
    })?;
    compose(lyrics, genre, tempo_bpm, target_duration)
}

/// Inserts a verse/chorus pair before the trailing outro, or appends one if
/// the template has no outro.
fn extend_before_outro(template: &mut SectionTemplate) {
    let at = template
        .sections
        .iter()
        .rposition(|s| s.label == SectionLabel::Outro)
        .unwrap_or(template.sections.len());
    for (i, section) in extension_pair().into_iter().enumerate() {
        template.sections.insert(at + i, section);
    }
}

/// Lays the template out on the beat timeline.
fn position_sections(template: &SectionTemplate) -> Vec<Section> {
    let mut start = 0.0;
    template
        .sections
        .iter()
        .map(|s| {
            let section = Section {
                label: s.label,
                start_beat: start,
                length_beats: s.beats(),
            };
            start += s.beats();
            section
        })
        .collect()
}

/// Distributes lyric lines across the lyrical sections in order, as evenly
/// as possible. Trailing lyrical sections may stay instrumental when the
/// lyrics run short.
fn assign_lines<'a>(sections: &[Section], lines: &'a [Vec<Syllable>]) -> Vec<SectionPlan<'a>> {
    let lyrical: Vec<&Section> = sections.iter().filter(|s| s.label.is_lyrical()).collect();
    let base = lines.len() / lyrical.len();
    let extra = lines.len() % lyrical.len();

    let mut cursor = 0;
    lyrical
        .into_iter()
        .enumerate()
        .map(|(i, section)| {
            let take = base + usize::from(i < extra);
            let assigned: Vec<&'a [Syllable]> = lines[cursor..cursor + take]
                .iter()
                .map(Vec::as_slice)
                .collect();
            cursor += take;
            SectionPlan {
                section: *section,
                lines: assigned,
            }
        })
        .collect()
}
