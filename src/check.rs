use std::path::PathBuf;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use pedago_chapter_sync::{validate_question, ContentStore, ProjectStorage};

static CLASS_LEVELS: Lazy<Vec<(&str, &str)>> = Lazy::new(|| {
    vec![
        ("tcs", "Tronc Commun Scientifique"),
        ("1bse", "1ère Bac Sciences Expérimentales"),
        ("1bsm", "1ère Bac Sciences Mathématiques"),
        ("2bse", "2ème Bac Sciences Expérimentales"),
        ("2bsm", "2ème Bac Sciences Mathématiques"),
    ]
});

pub async fn run(project_root: PathBuf) -> Result<()> {
    let store = ContentStore::new(ProjectStorage::new(project_root));
    let project = store.load_project().await.context(
        "failed to open project: ensure 'manifest.json' and a 'chapters' directory exist at the project root",
    )?;

    for class_type in project.manifest.classes.keys() {
        if !CLASS_LEVELS.iter().any(|(value, _)| value == class_type) {
            println!("warning: unknown class level '{class_type}' in manifest");
        }
    }

    let mut dirty = 0;
    let mut violations = 0;

    for (key, chapter) in &project.chapters {
        if chapter.is_dirty()? {
            dirty += 1;
            println!("dirty: {key} ({})", chapter.chapter_name);
        }

        for question in &chapter.quiz_questions {
            for violation in validate_question(question) {
                violations += 1;
                println!("quiz {key}/{}: {violation}", question.id);
            }
        }
    }

    println!(
        "{} chapter(s) loaded, {dirty} dirty, {violations} quiz violation(s)",
        project.chapters.len()
    );

    Ok(())
}
