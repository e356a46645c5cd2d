/// Quiz assembly module
///
/// Primary quizzes take one question from each lesson of a fixed-size lesson
/// group. Summary quizzes are then drawn from the questions those quizzes
/// left unused, and a course-level manifest records which lessons each
/// quiz covers.

pub mod batcher;
pub mod summary;
pub mod mapping;

// Re-export main types
pub use batcher::{Quiz, QuizBatcher};
pub use mapping::{MappingReporter, QuizMapping};
pub use summary::{SummaryQuizBuilder, UsedQuestions};

use nevermore_core::{CourseError, CourseLayout, QuestionRecord, QuestionStore, Section};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Error types for quiz assembly
#[derive(thiserror::Error, Debug)]
pub enum QuizError {
    /// A lesson without questions reached a quiz group
    #[error("Lesson '{lesson}' has no questions to sample from")]
    EmptyLessonPool { lesson: String },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Course(#[from] CourseError),
}

/// A lesson and the questions it can contribute
#[derive(Debug, Clone, PartialEq)]
pub struct LessonPool {
    pub lesson: String,
    pub questions: Vec<QuestionRecord>,
}

impl LessonPool {
    pub fn new(lesson: impl Into<String>, questions: Vec<QuestionRecord>) -> Self {
        Self {
            lesson: lesson.into(),
            questions,
        }
    }
}

/// Load the non-empty question pools of a section, in lesson order
pub async fn section_pools(
    layout: &CourseLayout,
    store: &QuestionStore,
    section: &Section,
    omitted: &HashSet<String>,
) -> Result<Vec<LessonPool>, QuizError> {
    let mut pools = Vec::new();

    for lesson in layout.lessons(section, omitted)? {
        let questions = store.load(&lesson.path).await;
        if questions.is_empty() {
            info!("📭 No usable questions in lesson {}", lesson.name);
            continue;
        }
        pools.push(LessonPool::new(lesson.name, questions));
    }

    Ok(pools)
}

/// What happened to the artifacts of one write pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl ArtifactReport {
    pub fn merge(&mut self, other: ArtifactReport) {
        self.written.extend(other.written);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }

    /// Record the outcome of a single artifact write
    pub fn record(&mut self, path: PathBuf, outcome: &Result<WriteOutcome, QuizError>) {
        match outcome {
            Ok(WriteOutcome::Written) => self.written.push(path),
            Ok(WriteOutcome::SkippedExisting) => self.skipped.push(path),
            Err(_) => self.failed.push(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    SkippedExisting,
}

/// Write `value` as pretty JSON, replacing the target only once the whole
/// document is on disk.
pub async fn write_json_artifact<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    skip_existing: bool,
) -> Result<WriteOutcome, QuizError> {
    if skip_existing && path.exists() {
        debug!("Keeping existing artifact {}", path.display());
        return Ok(WriteOutcome::SkippedExisting);
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| QuizError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let write_failure = |source| QuizError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&tmp_path, json).await.map_err(write_failure)?;
    if let Err(source) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(write_failure(source));
    }

    Ok(WriteOutcome::Written)
}

/// Delete numbered artifacts left over from an earlier, larger run
pub async fn remove_stale(existing: &[PathBuf], current: &[PathBuf]) {
    for path in existing {
        if current.contains(path) {
            continue;
        }
        match fs::remove_file(path).await {
            Ok(()) => info!("🗑️ Removed stale artifact {}", path.display()),
            Err(e) => warn!("Failed to remove stale artifact {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_json_artifact_preserves_unicode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quiz-1.json");

        let outcome = write_json_artifact(&path, &vec!["Qu'est-ce qu'un café ☕?"], false)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("café ☕"));
        assert!(content.contains("\n  \""));
        assert!(!dir.path().join("quiz-1.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_json_artifact_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quiz-1.json");
        fs::write(&path, "[\"old\"]").await.unwrap();

        let outcome = write_json_artifact(&path, &vec!["new"], true).await.unwrap();
        assert_eq!(outcome, WriteOutcome::SkippedExisting);
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "[\"old\"]");

        let outcome = write_json_artifact(&path, &vec!["new"], false).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert!(fs::read_to_string(&path).await.unwrap().contains("new"));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-section").join("quiz-1.json");

        let result = write_json_artifact(&path, &vec![1, 2, 3], false).await;
        assert!(matches!(result, Err(QuizError::WriteFailure { .. })));

        let mut report = ArtifactReport::default();
        report.record(path.clone(), &result);
        assert_eq!(report.failed, vec![path]);
    }

    #[tokio::test]
    async fn test_remove_stale_keeps_current() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("summary_quiz-1.json");
        let stale = dir.path().join("summary_quiz-2.json");
        fs::write(&keep, "[]").await.unwrap();
        fs::write(&stale, "[]").await.unwrap();

        remove_stale(&[keep.clone(), stale.clone()], &[keep.clone()]).await;
        assert!(keep.exists());
        assert!(!stale.exists());
    }
}
