//! Lyric parsing: lines, tokens, syllables, stress.

use crate::error::ComposeError;

/// One syllable of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syllable {
    /// Index of the owning token in [`LyricSheet::tokens`].
    pub token: usize,
    /// Position of this syllable within its token (0 = first).
    pub index_in_token: usize,
    /// Whether the syllable carries lexical stress.
    pub stressed: bool,
}

/// Parsed lyrics: the flat token list plus syllables grouped by line.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricSheet {
    /// All tokens in original order.
    pub tokens: Vec<String>,
    /// Syllables per line, referencing tokens by index.
    pub lines: Vec<Vec<Syllable>>,
}

impl LyricSheet {
    /// Total syllable count across all lines.
    pub fn syllable_count(&self) -> usize {
        self.lines.iter().map(|l| l.len()).sum()
    }
}

/// Parses raw lyric text into lines, tokens, and syllables.
///
/// Fails with [`ComposeError::EmptyLyrics`] when no word survives
/// tokenization.
pub fn parse_lyrics(text: &str) -> Result<LyricSheet, ComposeError> {
    let mut tokens = Vec::new();
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let words: Vec<String> = raw_line
            .split_whitespace()
            .map(clean_word)
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            continue;
        }

        let mut line = Vec::new();
        for word in words {
            let token_idx = tokens.len();
            let syllables = syllable_count(&word);
            for s in 0..syllables {
                line.push(Syllable {
                    token: token_idx,
                    index_in_token: s,
                    stressed: is_stressed(&word, s, syllables),
                });
            }
            tokens.push(word);
        }
        lines.push(line);
    }

    if tokens.is_empty() {
        return Err(ComposeError::EmptyLyrics);
    }

    Ok(LyricSheet { tokens, lines })
}

/// Strips punctuation from both ends of a word, keeping internal
/// apostrophes ("don't" stays one token).
fn clean_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .trim_matches('\'')
        .to_string()
}

/// Estimates syllable count with a vowel-group heuristic.
///
/// Counts maximal runs of vowels (y counts as a vowel when not word-initial)
/// and discounts a trailing silent 'e'. Always returns at least 1.
pub fn syllable_count(word: &str) -> usize {
    let lower = word.to_ascii_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    if chars.is_empty() {
        return 1;
    }

    let is_vowel = |i: usize| -> bool {
        let c = chars[i];
        matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') || (c == 'y' && i > 0)
    };

    let mut groups = 0usize;
    let mut in_group = false;
    for i in 0..chars.len() {
        if is_vowel(i) {
            if !in_group {
                groups += 1;
                in_group = true;
            }
        } else {
            in_group = false;
        }
    }

    // Silent trailing 'e' ("lights", "name") unless it forms "-le" ("table").
    if groups > 1 && chars.last() == Some(&'e') {
        let penultimate_is_consonant = chars
            .len()
            .checked_sub(2)
            .map(|i| !is_vowel(i) && chars[i] != 'l')
            .unwrap_or(false);
        if penultimate_is_consonant {
            groups -= 1;
        }
    }

    groups.max(1)
}

/// Stress heuristic: multi-syllable words stress their first syllable;
/// monosyllables are stressed when they look like content words.
fn is_stressed(word: &str, syllable: usize, total: usize) -> bool {
    if total > 1 {
        syllable == 0
    } else {
        word.len() >= 4
    }
}
