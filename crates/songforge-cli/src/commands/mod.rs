//! CLI command implementations.

pub mod compose;
pub mod sing;
pub mod status;
pub mod voices;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Resolves song lyrics from either an inline argument or a file.
pub(crate) fn resolve_lyrics(lyrics: Option<String>, lyrics_file: Option<PathBuf>) -> Result<String> {
    match (lyrics, lyrics_file) {
        (Some(text), None) => Ok(text),
        (None, Some(path)) => {
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
        }
        (Some(_), Some(_)) => bail!("pass either --lyrics or --lyrics-file, not both"),
        (None, None) => bail!("lyrics are required: pass --lyrics or --lyrics-file"),
    }
}
