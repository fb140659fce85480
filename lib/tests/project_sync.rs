use pedago_chapter_sync::{ChapterKey, ContentStore, ProjectStorage};
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "1bsm": [
    {"id": "ch1", "file": "1bsm/1bsm_logique.json", "isActive": true, "version": "v000"}
  ],
  "tcs": [
    {"id": "ens", "file": "tcs_ensembles.json", "isActive": false, "version": "v000"}
  ]
}"#;

const LOGIQUE: &str = r#"{
  "class": "1bsm",
  "chapter": "Logique",
  "sessionDates": ["2025-09-01T00:00:00Z", "2025-09-08T00:00:00Z"],
  "videos": [
    {"id": "v1", "title": "Intro", "youtubeId": "abc123", "duration": "3:24",
     "description": "", "thumbnail": ""}
  ],
  "quiz": [
    {"id": "q1", "question": "Vrai ou faux?", "type": "mcq",
     "options": [{"text": "Vrai", "is_correct": true, "explanation": "car"},
                  {"text": "Faux", "is_correct": false}],
     "steps": []}
  ],
  "exercises": [
    {"id": "exo1", "title": "Exercice 1", "statement": "Montrer que...",
     "sub_questions": [
       {"text": "a", "questionNumber": "1", "sub_sub_questions": []},
       {"text": "b", "questionNumber": "2", "sub_sub_questions": [{"text": "i"}]}
     ],
     "hint": [{"text": "h1", "questionNumber": "1"},
               {"text": "h2", "questionNumber": "2"}]}
  ],
  "version": "v000"
}"#;

const ENSEMBLES: &str = r#"{
  "class": "tcs",
  "chapter": "Ensembles",
  "sessionDates": [],
  "videos": [],
  "quiz": [],
  "exercises": [],
  "version": "v000"
}"#;

async fn seed(dir: &TempDir) -> ContentStore {
    let storage = ProjectStorage::new(dir.path());
    storage
        .write_atomic("manifest.json", MANIFEST.as_bytes())
        .await
        .expect("seed manifest");
    storage
        .write_atomic("chapters/1bsm/1bsm_logique.json", LOGIQUE.as_bytes())
        .await
        .expect("seed logique");
    storage
        .write_atomic("chapters/tcs_ensembles.json", ENSEMBLES.as_bytes())
        .await
        .expect("seed ensembles");
    ContentStore::new(storage)
}

#[tokio::test]
async fn edit_save_reload_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let store = seed(&dir).await;

    let mut project = store.load_project().await.expect("load");
    assert_eq!(project.chapters.len(), 2);

    let key = ChapterKey::new("1bsm", "ch1");
    {
        let chapter = &project.chapters[&key];
        // Hints resolved into their sub-questions at load.
        let exercise = &chapter.exercises[0];
        assert_eq!(exercise.sub_questions[0].hint.as_deref(), Some("h1"));
        assert_eq!(exercise.sub_questions[1].hint.as_deref(), Some("h2"));
        // Question-level explanation stayed on the option.
        assert_eq!(
            chapter.quiz_questions[0].options[0].explanation.as_deref(),
            Some("car")
        );
    }

    // First pass settles every chapter onto fingerprint versions.
    let report = store.save_all(&mut project).await.expect("first save");
    assert_eq!(report.saved.len(), 2);
    assert!(report.manifest_written);

    // Edit one hint and blank another; only that chapter should rewrite.
    {
        let chapter = project.chapters.get_mut(&key).expect("chapter");
        chapter.exercises[0].sub_questions[0].hint = Some("indice revu".to_owned());
        chapter.exercises[0].sub_questions[1].hint = Some("   ".to_owned());
    }
    let report = store.save_all(&mut project).await.expect("second save");
    assert_eq!(report.saved, vec![key.clone()]);
    assert!(report.failed.is_empty());

    let reloaded = store.load_project().await.expect("reload");
    let chapter = &reloaded.chapters[&key];
    let exercise = &chapter.exercises[0];
    assert_eq!(exercise.sub_questions[0].hint.as_deref(), Some("indice revu"));
    // The blanked hint was dropped from the serialized hint list.
    assert_eq!(exercise.sub_questions[1].hint, None);

    // Manifest and file agree on the version, which matches the content.
    let entry = reloaded.manifest.entry(&key).expect("entry");
    assert_eq!(entry.version, chapter.version);
    assert_eq!(
        chapter.version,
        chapter.content_version().expect("fingerprint")
    );

    // Nothing left to do.
    let mut reloaded = reloaded;
    let report = store.save_all(&mut reloaded).await.expect("third save");
    assert!(report.saved.is_empty());
    assert!(!report.manifest_written);
}

#[tokio::test]
async fn single_chapter_save_reports_outcome() {
    let dir = TempDir::new().expect("temp dir");
    let store = seed(&dir).await;
    let mut project = store.load_project().await.expect("load");

    let key = ChapterKey::new("tcs", "ens");
    let mut chapter = project.chapters.remove(&key).expect("chapter");
    let mut entry = project
        .manifest
        .entry(&key)
        .expect("manifest entry")
        .clone();

    let outcome = store
        .save_chapter(&mut chapter, &mut entry)
        .await
        .expect("save");
    assert!(outcome.written);
    assert_ne!(outcome.new_version, "v000");
    assert_eq!(chapter.version, outcome.new_version);
    assert_eq!(entry.version, outcome.new_version);

    let outcome = store
        .save_chapter(&mut chapter, &mut entry)
        .await
        .expect("save again");
    assert!(!outcome.written);
    assert_eq!(outcome.new_version, chapter.version);
}
