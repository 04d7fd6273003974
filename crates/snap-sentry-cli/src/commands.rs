use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "snap-sentry")]
#[command(about = "Checks what a snapraid sync would delete before running it", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run diff and dup, classify removals and write the continuation script
    Run(RunArgs),
    /// Classify saved diff and dup reports without calling snapraid
    Classify(ClassifyArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Proceed regardless of how many files would be deleted
    #[arg(long)]
    pub ignore_delete_threshold: bool,

    /// Where to write the continuation script
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Skip looking for same-named copies on disk
    #[arg(long)]
    pub no_probe: bool,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Saved `snapraid diff` output
    #[arg(long)]
    pub diff: PathBuf,

    /// Saved `snapraid dup` output
    #[arg(long)]
    pub dup: Option<PathBuf>,

    /// Look for same-named copies under the configured storage root
    #[arg(long)]
    pub probe: bool,

    /// Print the classification as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(long)]
    pub ignore_delete_threshold: bool,
}
