//! Command-line drivers for the leakscope harness.
//!
//! - `leakscope run`: batch of single-turn episodes with sampled prompts
//! - `leakscope sweep`: the four-condition memory x tool-access sweep
//! - `leakscope turn`: one provider turn with session continuity
//!   (TurnRequest JSON on stdin, TurnResponse JSON on stdout)

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leakscope_types::config::HarnessConfig;
use leakscope_types::errors::LeakscopeError;

mod run;
mod sweep;
mod turn;

#[derive(Parser)]
#[command(
    name = "leakscope",
    about = "Evaluation harness probing secret-leak resistance across trust conditions"
)]
struct Cli {
    /// Config file path. Defaults to configs/base.yaml, then base.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a batch of single-turn episodes with randomly sampled prompts.
    Run,
    /// Run all four memory x tool-access conditions back to back.
    Sweep,
    /// Handle one provider turn: TurnRequest on stdin, TurnResponse on stdout.
    Turn,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dispatch().await {
        tracing::error!(error = %e, "run aborted");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn dispatch() -> Result<(), LeakscopeError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HarnessConfig::load_from(path)?,
        None => HarnessConfig::load()?,
    };

    match cli.command {
        Command::Run => run::run(config).await,
        Command::Sweep => sweep::sweep(config).await,
        Command::Turn => turn::turn(config).await,
    }
}
