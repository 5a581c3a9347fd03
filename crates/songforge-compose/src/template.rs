//! Genre section templates.

use songforge_core::arrangement::{KeySignature, SectionLabel};
use songforge_core::Genre;

/// Beats per bar. The whole system runs in 4/4.
pub const BEATS_PER_BAR: f64 = 4.0;

/// Default quantization grid: sixteenth notes.
pub const GRID_PER_BEAT: f64 = 4.0;

/// One section slot in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSection {
    /// Section role.
    pub label: SectionLabel,
    /// Length in bars.
    pub bars: u32,
}

impl TemplateSection {
    /// Section length in beats.
    pub fn beats(&self) -> f64 {
        self.bars as f64 * BEATS_PER_BAR
    }
}

/// Ordered section plan for a genre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTemplate {
    /// Sections in playback order.
    pub sections: Vec<TemplateSection>,
}

impl SectionTemplate {
    /// Number of lyric-bearing sections.
    pub fn lyrical_count(&self) -> usize {
        self.sections.iter().filter(|s| s.label.is_lyrical()).count()
    }

    /// Total length in beats.
    pub fn total_beats(&self) -> f64 {
        self.sections.iter().map(|s| s.beats()).sum()
    }
}

fn sec(label: SectionLabel, bars: u32) -> TemplateSection {
    TemplateSection { label, bars }
}

/// Section template for a genre.
///
/// Pop and friends follow the classic verse-chorus form; electronic leans on
/// longer instrumental bookends; ballads run shorter sections at low tempo.
pub fn template_for(genre: Genre) -> SectionTemplate {
    use SectionLabel::*;
    let sections = match genre {
        Genre::Pop => vec![
            sec(Intro, 2),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Bridge, 2),
            sec(Chorus, 4),
            sec(Outro, 2),
        ],
        Genre::Rock => vec![
            sec(Intro, 2),
            sec(Verse, 4),
            sec(PreChorus, 2),
            sec(Chorus, 4),
            sec(Verse, 4),
            sec(PreChorus, 2),
            sec(Chorus, 4),
            sec(Outro, 2),
        ],
        Genre::Electronic => vec![
            sec(Intro, 4),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Outro, 4),
        ],
        Genre::HipHop => vec![
            sec(Intro, 2),
            sec(Verse, 8),
            sec(Chorus, 4),
            sec(Verse, 8),
            sec(Chorus, 4),
            sec(Outro, 2),
        ],
        Genre::Country => vec![
            sec(Intro, 2),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Outro, 2),
        ],
        Genre::Jazz => vec![
            sec(Intro, 4),
            sec(Verse, 8),
            sec(Bridge, 4),
            sec(Verse, 8),
            sec(Outro, 4),
        ],
        Genre::Ballad => vec![
            sec(Intro, 2),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Verse, 4),
            sec(Chorus, 4),
            sec(Bridge, 2),
            sec(Chorus, 4),
            sec(Outro, 2),
        ],
    };
    SectionTemplate { sections }
}

/// A verse/chorus pair appended when the lyrics outrun the base template.
pub fn extension_pair() -> Vec<TemplateSection> {
    vec![
        sec(SectionLabel::Verse, 4),
        sec(SectionLabel::Chorus, 4),
    ]
}

/// Default key signature per genre.
pub fn key_for(genre: Genre) -> KeySignature {
    match genre {
        Genre::Pop | Genre::Ballad => KeySignature::c_major(),
        Genre::Rock | Genre::Electronic | Genre::HipHop => KeySignature::a_minor(),
        Genre::Country => KeySignature {
            tonic: 67,
            mode: songforge_core::arrangement::Mode::Major,
        },
        Genre::Jazz => KeySignature {
            tonic: 65,
            mode: songforge_core::arrangement::Mode::Major,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_genre_has_a_template() {
        for genre in Genre::all() {
            let t = template_for(*genre);
            assert!(t.lyrical_count() >= 2, "{} needs lyric sections", genre);
            assert!(t.total_beats() > 0.0);
        }
    }

    #[test]
    fn pop_is_verse_chorus_form() {
        let t = template_for(Genre::Pop);
        let labels: Vec<_> = t.sections.iter().map(|s| s.label).collect();
        use SectionLabel::*;
        assert_eq!(
            labels,
            vec![Intro, Verse, Chorus, Verse, Chorus, Bridge, Chorus, Outro]
        );
    }
}
