//! Genre enumeration shared by the composer and the instrumental renderer.
//!
//! Both components must agree on the genre set, so it lives here rather than
//! in either crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SongError;

/// Supported genre tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Pop,
    Rock,
    Electronic,
    HipHop,
    Country,
    Jazz,
    Ballad,
}

impl Genre {
    /// All supported genres, in a stable order.
    pub fn all() -> &'static [Genre] {
        &[
            Genre::Pop,
            Genre::Rock,
            Genre::Electronic,
            Genre::HipHop,
            Genre::Country,
            Genre::Jazz,
            Genre::Ballad,
        ]
    }

    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Pop => "pop",
            Genre::Rock => "rock",
            Genre::Electronic => "electronic",
            Genre::HipHop => "hiphop",
            Genre::Country => "country",
            Genre::Jazz => "jazz",
            Genre::Ballad => "ballad",
        }
    }

    /// Default tempo for the genre when the caller does not supply one.
    pub fn default_tempo(&self) -> f64 {
        match self {
            Genre::Pop => 118.0,
            Genre::Rock => 126.0,
            Genre::Electronic => 128.0,
            Genre::HipHop => 92.0,
            Genre::Country => 104.0,
            Genre::Jazz => 110.0,
            Genre::Ballad => 72.0,
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = SongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pop" => Ok(Genre::Pop),
            "rock" => Ok(Genre::Rock),
            "electronic" | "edm" => Ok(Genre::Electronic),
            "hiphop" | "hip-hop" | "hip hop" => Ok(Genre::HipHop),
            "country" => Ok(Genre::Country),
            "jazz" => Ok(Genre::Jazz),
            "ballad" => Ok(Genre::Ballad),
            other => Err(SongError::invalid_input(format!(
                "unsupported genre '{}', expected one of: {}",
                other,
                Genre::all()
                    .iter()
                    .map(|g| g.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for genre in Genre::all() {
            let parsed: Genre = genre.as_str().parse().unwrap();
            assert_eq!(parsed, *genre);
        }
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("hip-hop".parse::<Genre>().unwrap(), Genre::HipHop);
        assert_eq!("EDM".parse::<Genre>().unwrap(), Genre::Electronic);
    }

    #[test]
    fn unknown_genre_is_invalid_input() {
        let err = "polka".parse::<Genre>().unwrap_err();
        assert!(matches!(err, SongError::InvalidInput { .. }));
        assert!(err.to_string().contains("polka"));
    }
}
