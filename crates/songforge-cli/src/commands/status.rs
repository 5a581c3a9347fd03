//! `songforge status` - print a persisted job record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use songforge_pipeline::{JobId, JobStore};

#[derive(Args)]
pub struct StatusOpts {
    /// Job id to look up
    job: String,

    /// Data directory the job was run with
    #[arg(long)]
    data_dir: PathBuf,

    /// Pretty-print the record JSON
    #[arg(short, long)]
    pretty: bool,
}

pub fn cmd_status(opts: StatusOpts) -> Result<()> {
    let store = JobStore::open(opts.data_dir.join("jobs"))?;
    let record = store
        .get(&JobId::from(opts.job.as_str()))
        .context("job not found")?;
    let json = if opts.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{}", json);
    Ok(())
}
