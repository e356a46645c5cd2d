//! Loading of per-lesson question pools

use crate::{CourseError, QuestionRecord, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Default name of the per-lesson question artifact
pub const QUESTIONS_FILE: &str = "questions.json";

/// Reads `questions.json` artifacts from lesson directories
#[derive(Debug, Clone)]
pub struct QuestionStore {
    questions_file: String,
}

impl Default for QuestionStore {
    fn default() -> Self {
        Self::new(QUESTIONS_FILE)
    }
}

impl QuestionStore {
    pub fn new(questions_file: impl Into<String>) -> Self {
        Self {
            questions_file: questions_file.into(),
        }
    }

    /// Path of the question artifact inside a lesson directory
    pub fn questions_path(&self, lesson_dir: &Path) -> PathBuf {
        lesson_dir.join(&self.questions_file)
    }

    /// Load a lesson's questions, treating any problem as "no questions".
    pub async fn load(&self, lesson_dir: &Path) -> Vec<QuestionRecord> {
        match self.try_load(lesson_dir).await {
            Ok(records) => records,
            Err(CourseError::MissingArtifact(path)) => {
                debug!("No {} found at {}", self.questions_file, path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("⚠️ Skipping questions for {}: {}", lesson_dir.display(), e);
                Vec::new()
            }
        }
    }

    /// Load a lesson's questions, reporting why nothing could be loaded.
    ///
    /// The artifact must be a non-empty JSON array. Elements that are not
    /// question-shaped, or whose question text is blank, are dropped with a
    /// warning while the rest of the pool is kept.
    pub async fn try_load(&self, lesson_dir: &Path) -> Result<Vec<QuestionRecord>> {
        let path = self.questions_path(lesson_dir);
        if !path.exists() {
            return Err(CourseError::MissingArtifact(path));
        }

        let content = fs::read_to_string(&path).await?;
        let value: Value = serde_json::from_str(&content).map_err(|e| CourseError::MalformedArtifact {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let items = match value {
            Value::Array(items) if !items.is_empty() => items,
            _ => {
                return Err(CourseError::MalformedArtifact {
                    path,
                    reason: "content is not a non-empty list".to_string(),
                })
            }
        };

        let total = items.len();
        let mut records = Vec::with_capacity(total);
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<QuestionRecord>(item) {
                Ok(record) if record.is_valid() => records.push(record),
                Ok(_) => warn!("Dropping entry {} in {}: blank question text", index, path.display()),
                Err(e) => warn!("Dropping entry {} in {}: {}", index, path.display(), e),
            }
        }

        debug!("📚 Loaded {}/{} questions from {}", records.len(), total, path.display());
        Ok(records)
    }
}
