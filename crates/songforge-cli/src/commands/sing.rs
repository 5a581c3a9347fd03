//! `songforge sing` - run the full pipeline and write masters to disk.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use songforge_core::master::Tier;
use songforge_core::voice::{ProfileId, StockVoice, VoiceSpec};
use songforge_pipeline::{JobId, JobStatus, PipelineConfig, SongService};
use songforge_voice::ProfileStatus;
use tracing::info;

use super::resolve_lyrics;

#[derive(Args)]
pub struct SingOpts {
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

    /// Stock voice name (nova, ember, sage) or a registered profile id
    #[arg(short, long, default_value = "ember")]
    voice: String,

    /// WAV sample to clone the voice from, instead of --voice
    #[arg(long)]
    clone_sample: Option<PathBuf>,

    /// Display name for the cloned voice
    #[arg(long, default_value = "cloned voice")]
    clone_name: String,

    /// Tier(s) to master (preview, clean, studio); repeatable
    #[arg(long = "tier", default_values = ["clean"])]
    tiers: Vec<String>,

    /// Output directory for the master WAVs
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Data directory for persistent jobs and caches
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Per-stage timeout in seconds
    #[arg(long, default_value_t = 300)]
    stage_timeout: u64,
}

pub async fn cmd_sing(opts: SingOpts) -> Result<()> {
    let lyrics = resolve_lyrics(opts.lyrics, opts.lyrics_file)?;
    let tiers = parse_tiers(&opts.tiers)?;

    let mut config = PipelineConfig::default()
        .with_tiers(tiers.clone())
        .with_stage_timeout(Duration::from_secs(opts.stage_timeout));
    if let Some(dir) = opts.data_dir {
        config = config.with_data_dir(dir);
    }
    let service = SongService::new(config)?;

    let voice_spec = match &opts.clone_sample {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let id = service.register_voice(&bytes, &opts.clone_name)?;
            wait_for_voice(&service, &id).await?;
            info!(profile = %id, "cloned voice ready");
            VoiceSpec::Cloned(id)
        }
        None => match StockVoice::from_str(&opts.voice) {
            Ok(stock) => VoiceSpec::Stock(stock),
            Err(_) => VoiceSpec::Cloned(ProfileId::new(opts.voice.clone())),
        },
    };

    let job = service.create_song(&lyrics, &opts.genre, voice_spec, opts.tempo)?;
    info!(job = %job, "job submitted");
    wait_for_job(&service, &job).await?;

    fs::create_dir_all(&opts.out)
        .with_context(|| format!("creating {}", opts.out.display()))?;
    for tier in tiers {
        let (record, bytes) = service.master(&job, tier).await?;
        let path = opts.out.join(format!("{}-{}.wav", job, tier.as_str()));
        fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        println!("{}", path.display());

        for (kind, stem_bytes) in service.master_stems(&record)? {
            let stem_path = opts
                .out
                .join(format!("{}-{}-{}.wav", job, tier.as_str(), kind.as_str()));
            fs::write(&stem_path, &stem_bytes)
                .with_context(|| format!("writing {}", stem_path.display()))?;
            println!("{}", stem_path.display());
        }
    }
    Ok(())
}

fn parse_tiers(tags: &[String]) -> Result<Vec<Tier>> {
    let mut tiers = Vec::with_capacity(tags.len());
    for tag in tags {
        let tier = Tier::from_str(tag)?;
        if !tiers.contains(&tier) {
            tiers.push(tier);
        }
    }
    Ok(tiers)
}

async fn wait_for_voice(service: &SongService, id: &ProfileId) -> Result<()> {
    loop {
        let profile = service
            .list_voices()
            .into_iter()
            .find(|p| &p.id == id)
            .context("profile vanished during extraction")?;
        match profile.status {
            ProfileStatus::Pending => tokio::time::sleep(Duration::from_millis(100)).await,
            ProfileStatus::Ready => return Ok(()),
            ProfileStatus::Failed { reason } => bail!("voice extraction failed: {}", reason),
        }
    }
}

async fn wait_for_job(service: &SongService, id: &JobId) -> Result<()> {
    loop {
        match service.job_status(id)? {
            JobStatus::Completed => return Ok(()),
            JobStatus::Failed { stage, kind } => {
                bail!("job {} failed in {} ({})", id, stage, kind)
            }
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}
