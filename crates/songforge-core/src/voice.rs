//! Voice specification: which voice sings the vocal stem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SongError;

/// Opaque identifier for a registered voice profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

impl ProfileId {
    /// Wraps an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in stock voices for the generic synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockVoice {
    /// Bright, high-register voice.
    Nova,
    /// Warm mid-register voice.
    Ember,
    /// Dark low-register voice.
    Sage,
}

impl StockVoice {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockVoice::Nova => "nova",
            StockVoice::Ember => "ember",
            StockVoice::Sage => "sage",
        }
    }
}

impl FromStr for StockVoice {
    type Err = SongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nova" => Ok(StockVoice::Nova),
            "ember" => Ok(StockVoice::Ember),
            "sage" => Ok(StockVoice::Sage),
            other => Err(SongError::invalid_input(format!(
                "unknown stock voice '{}', expected nova, ember, or sage",
                other
            ))),
        }
    }
}

/// Selects the synthesis backend for the vocal stem: a named stock voice
/// (generic text-to-speech) or a registered profile (speaker-conditioned
/// cloning).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "voice")]
pub enum VoiceSpec {
    /// Generic backend with a stock voice. Always available.
    Stock(StockVoice),
    /// Cloning backend conditioned on a ready profile's embedding.
    Cloned(ProfileId),
}

impl VoiceSpec {
    /// Stable string form, used inside cache keys.
    pub fn cache_tag(&self) -> String {
        match self {
            VoiceSpec::Stock(v) => format!("stock:{}", v.as_str()),
            VoiceSpec::Cloned(id) => format!("cloned:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_voice_parse() {
        assert_eq!("Nova".parse::<StockVoice>().unwrap(), StockVoice::Nova);
        assert!("karen".parse::<StockVoice>().is_err());
    }

    #[test]
    fn cache_tags_are_distinct() {
        let a = VoiceSpec::Stock(StockVoice::Nova);
        let b = VoiceSpec::Cloned(ProfileId::new("abc123"));
        assert_ne!(a.cache_tag(), b.cache_tag());
        assert!(b.cache_tag().contains("abc123"));
    }
}
