//! `songforge compose` - dump the symbolic arrangement as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::resolve_lyrics;

#[derive(Args)]
pub struct ComposeOpts {
    /// Lyrics text, one line per sung line
    #[arg(short, long)]
    lyrics: Option<String>,

    /// File containing the lyrics
    #[arg(long)]
    lyrics_file: Option<PathBuf>,

    /// Genre tag (pop, rock, electronic, hiphop, country, jazz, ballad)
    #[arg(short, long)]
    genre: String,

    /// Tempo in BPM (default: the genre's idiomatic tempo)
    #[arg(short, long)]
    tempo: Option<f64>,

    /// Minimum song duration in seconds, padded with instrumental sections
    #[arg(short, long)]
    duration: Option<f64>,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(short, long)]
    pretty: bool,
}

pub fn cmd_compose(opts: ComposeOpts) -> Result<()> {
    let lyrics = resolve_lyrics(opts.lyrics, opts.lyrics_file)?;
    let arrangement =
        songforge_compose::compose_with_tag(&lyrics, &opts.genre, opts.tempo, opts.duration)
            .context("composition failed")?;

    let json = if opts.pretty {
        serde_json::to_string_pretty(&arrangement)?
    } else {
        serde_json::to_string(&arrangement)?
    };
    match opts.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{}", json),
    }
    Ok(())
}
