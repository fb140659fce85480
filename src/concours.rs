use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use pedago_chapter_sync::{ConcoursStore, ProjectStorage};

#[derive(Subcommand)]
pub enum Command {
    /// Import a concours JSON file into a type
    Import {
        #[arg(short, long, value_name = "PATH", env = "CHAPTER_PROJECT_ROOT")]
        project_root: PathBuf,

        /// Concours JSON file to import
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Target type id, e.g. "medecine"
        #[arg(short = 't', long, value_name = "TYPE")]
        concours_type: String,
    },

    /// Remove a concours from the index
    Remove {
        #[arg(short, long, value_name = "PATH", env = "CHAPTER_PROJECT_ROOT")]
        project_root: PathBuf,

        #[arg(long, value_name = "ID")]
        id: String,

        #[arg(short = 't', long, value_name = "TYPE")]
        concours_type: String,
    },

    /// Export a concours record as JSON to stdout
    Export {
        #[arg(short, long, value_name = "PATH", env = "CHAPTER_PROJECT_ROOT")]
        project_root: PathBuf,

        #[arg(long, value_name = "ID")]
        id: String,
    },

    /// Print index statistics
    Stats {
        #[arg(short, long, value_name = "PATH", env = "CHAPTER_PROJECT_ROOT")]
        project_root: PathBuf,
    },
}

pub async fn run(command: Command) -> Result<()> {
    match command {
        Command::Import {
            project_root,
            file,
            concours_type,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let store = ConcoursStore::new(ProjectStorage::new(project_root));
            let entry = store.import(&content, &concours_type).await?;
            println!("imported {} -> {}", entry.id, entry.file);
        }
        Command::Remove {
            project_root,
            id,
            concours_type,
        } => {
            let store = ConcoursStore::new(ProjectStorage::new(project_root));
            store.remove(&concours_type, &id).await?;
            println!("removed {id} from {concours_type}");
        }
        Command::Export { project_root, id } => {
            let store = ConcoursStore::new(ProjectStorage::new(project_root));
            let json = store.export(&id).await?;
            println!("{json}");
        }
        Command::Stats { project_root } => {
            let store = ConcoursStore::new(ProjectStorage::new(project_root));
            let stats = store.load_index().await.statistics();

            println!("total: {}", stats.total);
            println!("by type:");
            for (concours_type, count) in &stats.by_type {
                println!("  {concours_type}: {count}");
            }
            println!("by year:");
            for (annee, count) in &stats.by_year {
                println!("  {annee}: {count}");
            }
        }
    }

    Ok(())
}
