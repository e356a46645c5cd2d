use nevermore_core::{ArtifactNames, CourseLayout, QuestionStore};
use std::collections::HashSet;
use tempfile::TempDir;
use tokio::fs;

const POOL: &str = r#"[
    {"question": "What does a modifier do?", "correct_answer": "Wraps a function", "wrong_answer_1": "Deploys", "wrong_answer_2": "Emits", "wrong_answer_3": "Reverts", "explanation": "Modifiers wrap function bodies."}
]"#;

async fn make_lesson(section: &std::path::Path, name: &str, pool: Option<&str>) {
    let lesson = section.join(name);
    fs::create_dir_all(&lesson).await.unwrap();
    if let Some(pool) = pool {
        fs::write(lesson.join("questions.json"), pool).await.unwrap();
    }
}

#[tokio::test]
async fn test_lessons_follow_natural_order_and_omissions() {
    let temp_dir = TempDir::new().unwrap();
    let section = temp_dir.path().join("1-solidity");

    for name in ["10-events", "2-modifiers", "1-introduction", "recap", "3-storage"] {
        make_lesson(&section, name, Some(POOL)).await;
    }

    let layout = CourseLayout::new(temp_dir.path(), ArtifactNames::default());
    let sections = layout.sections().unwrap();
    assert_eq!(sections.len(), 1);

    let omitted: HashSet<String> = ["1-introduction".to_string()].into_iter().collect();
    let lessons = layout.lessons(&sections[0], &omitted).unwrap();
    let names: Vec<_> = lessons.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["2-modifiers", "3-storage", "10-events", "recap"]);

    let all = layout.all_lessons(&sections[0]).unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].name, "1-introduction");
}

#[tokio::test]
async fn test_store_reads_each_lesson_pool() {
    let temp_dir = TempDir::new().unwrap();
    let section = temp_dir.path().join("1-solidity");

    make_lesson(&section, "1-with-pool", Some(POOL)).await;
    make_lesson(&section, "2-without-pool", None).await;
    make_lesson(&section, "3-broken-pool", Some("{ not json")).await;

    let layout = CourseLayout::new(temp_dir.path(), ArtifactNames::default());
    let sections = layout.sections().unwrap();
    let lessons = layout.lessons(&sections[0], &HashSet::new()).unwrap();
    let store = QuestionStore::new(&layout.names().questions_file);

    let mut counts = Vec::new();
    for lesson in &lessons {
        assert_eq!(store.questions_path(&lesson.path), layout.questions_path(lesson));
        counts.push(store.load(&lesson.path).await.len());
    }
    assert_eq!(counts, vec![1, 0, 0]);
}
