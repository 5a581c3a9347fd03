//! `songforge voices` - register, list and delete voice profiles.
//!
//! Profiles live in the service's voice bank, which is scoped to the
//! process; register a voice in the same run that uses it (see
//! `sing --clone-sample`).

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use songforge_core::voice::ProfileId;
use songforge_pipeline::{PipelineConfig, SongService};
use songforge_voice::ProfileStatus;

#[derive(Subcommand)]
pub enum VoicesCmd {
    /// Register a voice from a WAV sample and run embedding extraction
    Register {
        /// PCM16 WAV file, at least 3 seconds of voice
        #[arg(short, long)]
        sample: PathBuf,

        /// Display name for the profile
        #[arg(short, long)]
        name: String,
    },

    /// List the profiles registered in this session
    List,

    /// Delete a profile by id
    Delete {
        /// Profile id
        id: String,
    },
}

pub async fn cmd_voices(cmd: VoicesCmd) -> Result<()> {
    let service = SongService::new(PipelineConfig::default())?;
    match cmd {
        VoicesCmd::Register { sample, name } => register(&service, &sample, &name).await,
        VoicesCmd::List => {
            let profiles = service.list_voices();
            if profiles.is_empty() {
                println!("no voice profiles registered in this session");
                return Ok(());
            }
            for profile in profiles {
                println!(
                    "{}  {:<20}  {:?}",
                    profile.id, profile.display_name, profile.status
                );
            }
            Ok(())
        }
        VoicesCmd::Delete { id } => {
            service.delete_voice(&ProfileId::new(id.clone()))?;
            println!("deleted {}", id);
            Ok(())
        }
    }
}

async fn register(service: &SongService, sample: &PathBuf, name: &str) -> Result<()> {
    let bytes = fs::read(sample).with_context(|| format!("reading {}", sample.display()))?;
    let id = service.register_voice(&bytes, name)?;
    loop {
        let profile = service
            .list_voices()
            .into_iter()
            .find(|p| p.id == id)
            .context("profile vanished during extraction")?;
        match profile.status {
            ProfileStatus::Pending => tokio::time::sleep(Duration::from_millis(100)).await,
            ProfileStatus::Ready => {
                println!("registered {} ({})", id, name);
                return Ok(());
            }
            ProfileStatus::Failed { reason } => {
                anyhow::bail!("embedding extraction failed: {}", reason)
            }
        }
    }
}
