//! Songforge CLI - lyrics in, mastered song out.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use songforge_cli::commands::{compose, sing, status, voices};

/// Songforge - deterministic song synthesis
#[derive(Parser)]
#[command(name = "songforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose, synthesize, mix and master a song
    Sing(sing::SingOpts),

    /// Compose an arrangement and print it as JSON
    Compose(compose::ComposeOpts),

    /// Manage voice profiles
    Voices {
        #[command(subcommand)]
        command: voices::VoicesCmd,
    },

    /// Print a persisted job record
    Status(status::StatusOpts),
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
    {
        eprintln!("failed to initialise tracing: {}", err);
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sing(opts) => sing::cmd_sing(opts).await,
        Commands::Compose(opts) => compose::cmd_compose(opts),
        Commands::Voices { command } => voices::cmd_voices(command).await,
        Commands::Status(opts) => status::cmd_status(opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
