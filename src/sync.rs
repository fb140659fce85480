use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use pedago_chapter_sync::{ContentStore, ProjectStorage};

pub async fn run(project_root: PathBuf) -> Result<()> {
    let store = ContentStore::new(ProjectStorage::new(project_root));
    let mut project = store.load_project().await.context(
        "failed to open project: ensure 'manifest.json' and a 'chapters' directory exist at the project root",
    )?;

    let report = store.save_all(&mut project).await?;

    println!(
        "{} chapter(s) saved, {} failed",
        report.saved.len(),
        report.failed.len()
    );
    for (key, err) in &report.failed {
        eprintln!("  {key}: {err}");
    }
    if report.manifest_written {
        println!("manifest.json updated");
    }

    if !report.failed.is_empty() {
        bail!("{} chapter(s) failed to save", report.failed.len());
    }

    Ok(())
}
