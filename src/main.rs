use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod check;
mod concours;
mod sync;

#[derive(Parser)]
#[command(name = "chapter-sync", version, about = "Chapter content synchronizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute content versions, write changed chapters and the manifest
    Sync {
        #[arg(short, long, value_name = "PATH", env = "CHAPTER_PROJECT_ROOT")]
        project_root: PathBuf,
    },

    /// Report dirty chapters and quiz rule violations, without writing
    Check {
        #[arg(short, long, value_name = "PATH", env = "CHAPTER_PROJECT_ROOT")]
        project_root: PathBuf,
    },

    /// Concours index maintenance
    Concours {
        #[command(subcommand)]
        command: concours::Command,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sync { project_root } => sync::run(project_root).await,
        Command::Check { project_root } => check::run(project_root).await,
        Command::Concours { command } => concours::run(command).await,
    }
}
